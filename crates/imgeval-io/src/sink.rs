//! Directory-backed artifact sink.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;

use imgeval_metrics::RgbaImage;
use imgeval_report::{Artifact, ArtifactSink};

use crate::error::IoError;

/// Writes artifacts as PNG files into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// A sink writing into `root`, created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Io`] if the directory cannot be created.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| IoError::io(&root, e))?;
        Ok(Self { root })
    }

    /// The output directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    type Error = IoError;

    fn write_png(&mut self, name: &str, image: &RgbaImage) -> Result<Artifact, IoError> {
        let path = self.root.join(name);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| IoError::Encode {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "wrote artifact");
        Ok(Artifact::describe(name, image))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn writes_png_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::create(dir.path().join("nested/out")).unwrap();
        let image = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));

        let artifact = sink.write_png("A-L1.png", &image).unwrap();
        assert_eq!(artifact.name, "A-L1.png");
        assert_eq!((artifact.width, artifact.height), (4, 3));

        let back = image::open(sink.root().join("A-L1.png")).unwrap().to_rgba8();
        assert_eq!(back, image);
    }
}
