//! Artifact naming and the sink abstraction for generated images.
//!
//! The report engine never touches the filesystem. It hands every
//! generated image to an [`ArtifactSink`], which stores it under a
//! deterministic name and returns an [`Artifact`] descriptor.
//! `imgeval-io` provides a directory-backed sink; [`MemorySink`] keeps
//! images in memory.

use std::collections::BTreeMap;
use std::convert::Infallible;

use imgeval_metrics::{Metric, RgbaImage};

use crate::error::ReportError;
use crate::model::REFERENCE_LABEL;

/// File name of the scene thumbnail.
pub const THUMBNAIL_FILE_NAME: &str = "thumb.png";

/// File name of a test's LDR preview: `{label}.png`.
#[must_use]
pub fn ldr_file_name(label: &str) -> String {
    format!("{label}.png")
}

/// File name of a test's false-color image: `{label}-{METRIC}.png`.
#[must_use]
pub fn falsecolor_file_name(label: &str, metric: Metric) -> String {
    format!("{label}-{}.png", metric.name())
}

/// File name of a test's signed visualization: `{label}-NP.png`.
#[must_use]
pub fn negpos_file_name(label: &str) -> String {
    format!("{label}-NP.png")
}

/// File name of the reference LDR preview.
#[must_use]
pub fn reference_file_name() -> String {
    ldr_file_name(REFERENCE_LABEL)
}

/// Descriptor of a stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name, relative to the sink's location.
    pub name: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Artifact {
    /// Describe `image` stored as `name`.
    #[must_use]
    pub fn describe(name: &str, image: &RgbaImage) -> Self {
        Self {
            name: name.to_owned(),
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Destination for generated images.
///
/// Writing the same name twice replaces the earlier image.
pub trait ArtifactSink {
    /// Error returned when an image cannot be stored.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `image` as a PNG named `name`.
    ///
    /// # Errors
    ///
    /// Implementation-defined storage failures.
    fn write_png(&mut self, name: &str, image: &RgbaImage) -> Result<Artifact, Self::Error>;
}

/// Store `image` in `sink`, wrapping failures as
/// [`ReportError::Artifact`].
pub(crate) fn store<S: ArtifactSink>(
    sink: &mut S,
    name: &str,
    image: &RgbaImage,
) -> Result<Artifact, ReportError> {
    sink.write_png(name, image)
        .map_err(|e| ReportError::Artifact {
            name: name.to_owned(),
            source: Box::new(e),
        })
}

/// An in-memory sink, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    images: BTreeMap<String, RgbaImage>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The image stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RgbaImage> {
        self.images.get(name)
    }

    /// Stored names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    /// Number of stored images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    type Error = Infallible;

    fn write_png(&mut self, name: &str, image: &RgbaImage) -> Result<Artifact, Self::Error> {
        self.images.insert(name.to_owned(), image.clone());
        Ok(Artifact::describe(name, image))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_deterministic() {
        assert_eq!(ldr_file_name("PSSMLT"), "PSSMLT.png");
        assert_eq!(falsecolor_file_name("PSSMLT", Metric::Mrse), "PSSMLT-MRSE.png");
        assert_eq!(negpos_file_name("PSSMLT"), "PSSMLT-NP.png");
        assert_eq!(reference_file_name(), "Reference.png");
    }

    #[test]
    fn memory_sink_replaces_same_name() {
        let mut sink = MemorySink::new();
        let small = RgbaImage::new(1, 1);
        let large = RgbaImage::new(3, 2);
        sink.write_png("a.png", &small).unwrap();
        let artifact = sink.write_png("a.png", &large).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!((artifact.width, artifact.height), (3, 2));
        assert_eq!(sink.get("a.png").unwrap().width(), 3);
    }
}
