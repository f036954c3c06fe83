//! Per pixel-channel error metrics.
//!
//! Every metric is a deterministic formula over `(reference, test,
//! epsilon)` with `d = reference - test`:
//!
//! ```text
//! L1     |d|
//! L2     d²
//! MRSE   d² / (reference² + ε)
//! MAPE   |d| / (reference + ε)
//! SMAPE  2|d| / (reference + test + ε)
//! ```
//!
//! `ε` only guards against division by zero and is used exactly as
//! given. No metric reduces across channels; callers take the mean.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{ErrorMap, HdrImage, MetricError};

/// The fixed set of supported error metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Absolute error.
    L1,
    /// Squared error.
    L2,
    /// Relative squared error.
    Mrse,
    /// Relative absolute error.
    Mape,
    /// Symmetric relative absolute error.
    Smape,
}

impl Metric {
    /// Every metric, in declaration order.
    pub const ALL: [Self; 5] = [Self::L1, Self::L2, Self::Mrse, Self::Mape, Self::Smape];

    /// Upper-case name used for series labels, image-box titles and
    /// false-color file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::Mrse => "MRSE",
            Self::Mape => "MAPE",
            Self::Smape => "SMAPE",
        }
    }

    /// Error for a single pixel-channel value pair.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn evaluate(self, reference: f64, test: f64, epsilon: f64) -> f64 {
        let d = reference - test;
        match self {
            Self::L1 => d.abs(),
            Self::L2 => d * d,
            Self::Mrse => d * d / (reference * reference + epsilon),
            Self::Mape => d.abs() / (reference + epsilon),
            Self::Smape => 2.0 * d.abs() / (reference + test + epsilon),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MetricError::InvalidMetric(s.to_owned()))
    }
}

/// Compute the per pixel-channel error map between `reference` and
/// `test` for `metric`.
///
/// # Errors
///
/// Returns [`MetricError::ShapeMismatch`] if the two images differ in
/// shape.
pub fn compute_metric(
    reference: &HdrImage,
    test: &HdrImage,
    metric: Metric,
    epsilon: f64,
) -> Result<ErrorMap, MetricError> {
    if reference.shape() != test.shape() {
        return Err(MetricError::ShapeMismatch {
            reference: reference.shape(),
            test: test.shape(),
        });
    }

    let data = reference
        .data()
        .iter()
        .zip(test.data())
        .map(|(&r, &t)| metric.evaluate(r, t, epsilon))
        .collect();
    Ok(ErrorMap::from_parts(reference.shape(), data))
}

/// Format a mean error the way report series store it: six decimals.
#[must_use]
pub fn format_error(mean: f64) -> String {
    format!("{mean:.6}")
}
