//! Errors raised by filesystem operations.

use std::path::PathBuf;

use imgeval_report::ReportError;

/// Errors produced while reading inputs or writing report files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// An input image does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// An input image is neither `.exr` nor `.hdr`.
    #[error("unsupported image format: {} (expected .exr or .hdr)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The `image` crate could not decode an input.
    #[error("failed to decode {}", path.display())]
    Decode {
        /// Offending file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The `image` crate could not encode a PNG artifact.
    #[error("failed to encode {}", path.display())]
    Encode {
        /// Destination file.
        path: PathBuf,
        /// Encoder error.
        #[source]
        source: image::ImageError,
    },

    /// A plain filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// `data.json` could not be parsed or serialized.
    #[error("invalid report data in {}", path.display())]
    Json {
        /// Report file.
        path: PathBuf,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The report engine rejected the operation.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// A partial-render directory holds no numbered frames.
    #[error("no partial renders found in {}", .0.display())]
    NoPartials(PathBuf),
}

impl IoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
