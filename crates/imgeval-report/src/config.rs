//! Analysis configuration shared by build, update and tracking.

use serde::{Deserialize, Serialize};

use imgeval_metrics::{Clip, Metric};

use crate::error::ReportError;

/// Parameters of a report build or update.
///
/// # Invariants
///
/// Checked by [`validate`](Self::validate) at the start of every
/// operation: at least one metric, no metric repeated, `epsilon` finite
/// and strictly positive, clip bounds finite with `min <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Metrics to compute, in report order.
    pub metrics: Vec<Metric>,

    /// Error range mapped onto the false-color scale.
    pub clip: Clip,

    /// Stabilizer added to metric and false-color denominators.
    pub epsilon: f64,

    /// Whether to add the signed-SMAPE image box.
    pub negpos: bool,
}

impl AnalysisConfig {
    /// Default `epsilon`.
    pub const DEFAULT_EPSILON: f64 = 1e-2;

    /// Default clip range.
    pub const DEFAULT_CLIP: Clip = Clip::new(0.0, 1.0);

    /// A default configuration computing `metrics`.
    #[must_use]
    pub fn with_metrics(metrics: Vec<Metric>) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidConfig`] describing the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.metrics.is_empty() {
            return Err(ReportError::InvalidConfig(
                "at least one metric is required".into(),
            ));
        }
        for (i, metric) in self.metrics.iter().enumerate() {
            if self.metrics[..i].contains(metric) {
                return Err(ReportError::InvalidConfig(format!(
                    "metric {metric} is listed twice"
                )));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ReportError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !(self.clip.min.is_finite() && self.clip.max.is_finite()) || self.clip.min > self.clip.max
        {
            return Err(ReportError::InvalidConfig(format!(
                "clip range [{}, {}] is invalid",
                self.clip.min, self.clip.max
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metrics: Metric::ALL.to_vec(),
            clip: Self::DEFAULT_CLIP,
            epsilon: Self::DEFAULT_EPSILON,
            negpos: false,
        }
    }
}
