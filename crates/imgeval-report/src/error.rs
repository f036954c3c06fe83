//! Errors raised while building, updating or tracking a report.

use imgeval_metrics::MetricError;

/// Errors produced by the report engine.
///
/// Every error aborts the current build/update/track call before the
/// report model is mutated.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Metric computation failed (shape mismatch, invalid data).
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// The analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),

    /// A test label cannot be used as a report entry or file name.
    #[error("invalid test label {0:?}")]
    InvalidLabel(String),

    /// An image has no pixels, so its mean error is undefined.
    #[error("{0} image is empty")]
    EmptyImage(String),

    /// The same label appears more than once in one batch.
    #[error("duplicate test label {0:?} in batch")]
    DuplicateLabel(String),

    /// A partial-render set has a different number of timestamps than
    /// frames.
    #[error("{label}: {timestamps} timestamps for {frames} partial renders")]
    LengthMismatch {
        /// Label of the offending test.
        label: String,
        /// Number of timestamps read from the time log.
        timestamps: usize,
        /// Number of partial-render frames.
        frames: usize,
    },

    /// A metric has no matching series in the report.
    #[error("report has no series for metric {0}")]
    UnknownSeries(String),

    /// New tests cannot be appended because the requested metrics do
    /// not cover every series in the report.
    #[error("metrics [{provided}] do not cover report series [{expected}]")]
    MetricSetMismatch {
        /// Series labels present in the report.
        expected: String,
        /// Metrics requested for the update.
        provided: String,
    },

    /// A partial-render file name has no numeric `_<n>` suffix.
    #[error("partial render {0:?} has no numeric suffix")]
    InvalidPartialName(String),

    /// A time-log entry is not a number.
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp {
        /// The offending entry.
        value: String,
    },

    /// The report violates its alignment invariant.
    #[error("corrupt report: {0}")]
    Corrupt(String),

    /// An artifact sink failed to store an image.
    #[error("failed to write artifact {name}")]
    Artifact {
        /// Artifact file name.
        name: String,
        /// Underlying sink error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
