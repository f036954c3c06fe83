//! HDR input loading.
//!
//! Decoding is delegated to the `image` crate's `exr` and `hdr` codecs;
//! the result is widened from `f32` RGB to an [`HdrImage`].

use std::path::{Path, PathBuf};

use tracing::debug;

use imgeval_metrics::HdrImage;

use crate::error::IoError;

/// Supported input extensions, in probing order.
pub const HDR_EXTENSIONS: [&str; 2] = ["exr", "hdr"];

fn has_hdr_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HDR_EXTENSIONS.iter().any(|h| e.eq_ignore_ascii_case(h)))
}

/// Load an `.exr` or `.hdr` image.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for any other extension,
/// [`IoError::MissingFile`] if the file does not exist and
/// [`IoError::Decode`] if decoding fails.
pub fn load_hdr(path: &Path) -> Result<HdrImage, IoError> {
    if !has_hdr_extension(path) {
        return Err(IoError::UnsupportedFormat(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(IoError::MissingFile(path.to_path_buf()));
    }

    let decoded = image::open(path).map_err(|source| IoError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = HdrImage::from_rgb32f(&decoded.to_rgb32f());
    debug!(path = %path.display(), shape = %image.shape(), "loaded HDR image");
    Ok(image)
}

/// Find the extension of `stem` by probing `stem.exr`, then `stem.hdr`.
///
/// # Errors
///
/// Returns [`IoError::MissingFile`] naming the `.exr` candidate if
/// neither exists.
pub fn detect_extension(stem: &Path) -> Result<&'static str, IoError> {
    HDR_EXTENSIONS
        .into_iter()
        .find(|ext| with_extension(stem, ext).is_file())
        .ok_or_else(|| IoError::MissingFile(with_extension(stem, HDR_EXTENSIONS[0])))
}

/// `stem` with `.ext` appended, keeping any dots already in the stem.
fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Default report label for an input file: its stem with `-` replaced by
/// spaces.
///
/// ```
/// use std::path::Path;
/// use imgeval_io::default_label;
///
/// assert_eq!(default_label(Path::new("renders/path-tracer.exr")), "path tracer");
/// ```
#[must_use]
pub fn default_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace('-', " "))
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use imgeval_metrics::Rgb32FImage;

    #[test]
    fn rejects_unsupported_extension_before_reading() {
        let result = load_hdr(Path::new("does/not/exist.png"));
        assert!(matches!(result, Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn reports_missing_file() {
        let result = load_hdr(Path::new("does/not/exist.exr"));
        assert!(matches!(result, Err(IoError::MissingFile(_))));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_hdr_extension(Path::new("a.EXR")));
        assert!(has_hdr_extension(Path::new("a.Hdr")));
        assert!(!has_hdr_extension(Path::new("a.exr.png")));
        assert!(!has_hdr_extension(Path::new("exr")));
    }

    #[test]
    fn loads_exr_as_f64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.exr");
        let source = Rgb32FImage::from_fn(3, 2, |x, y| {
            #[allow(clippy::cast_precision_loss)]
            let v = (y * 3 + x) as f32 * 0.5;
            image::Rgb([v, v + 0.25, 4.0])
        });
        source.save(&path).unwrap();

        let image = load_hdr(&path).unwrap();
        assert_eq!(image.shape().height, 2);
        assert_eq!(image.shape().width, 3);
        assert_eq!(image.shape().channels, 3);
        assert_eq!(image.get(1, 2, 0), Some(2.5));
        assert_eq!(image.get(1, 2, 1), Some(2.75));
        assert_eq!(image.get(0, 0, 2), Some(4.0));
    }

    #[test]
    fn probes_exr_then_hdr() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("PT_1");
        assert!(matches!(detect_extension(&stem), Err(IoError::MissingFile(_))));

        std::fs::write(dir.path().join("PT_1.hdr"), b"").unwrap();
        assert_eq!(detect_extension(&stem).unwrap(), "hdr");

        std::fs::write(dir.path().join("PT_1.exr"), b"").unwrap();
        assert_eq!(detect_extension(&stem).unwrap(), "exr");
    }

    #[test]
    fn default_labels() {
        assert_eq!(default_label(Path::new("a/b/bdpt-mis.hdr")), "bdpt mis");
        assert_eq!(default_label(Path::new("PSSMLT.exr")), "PSSMLT");
    }
}
