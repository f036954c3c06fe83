//! Convergence tracking over sequences of partial renders.
//!
//! A renderer writes `{name}_1.exr`, `{name}_2.exr`, ... at intervals and
//! logs one timestamp per frame. Every frame is compared against the
//! reference and the resulting `(timestamps, errors)` curve is appended
//! to each requested series' `track`. Labels, data and image boxes are
//! never touched.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use imgeval_metrics::{HdrImage, Metric, MetricError, compute_metric, format_error};

use crate::error::ReportError;
use crate::evaluate::require_pixels;
use crate::model::ReportModel;

/// One partial render: its source file name and decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialFrame {
    /// File name carrying the `_<n>` sequence number.
    pub name: String,
    /// Decoded HDR data.
    pub image: HdrImage,
}

impl PartialFrame {
    /// Pair a file name with an image.
    #[must_use]
    pub fn new(name: impl Into<String>, image: HdrImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// All partial renders of one test, with the time log.
///
/// `timestamps[k]` belongs to the `k`-th frame in sequence-number order,
/// whatever order `frames` is given in.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRenderSet {
    /// Test label, for diagnostics.
    pub label: String,
    /// Frames in any order.
    pub frames: Vec<PartialFrame>,
    /// Elapsed time per frame, in seconds.
    pub timestamps: Vec<f64>,
}

/// Sequence number of a partial render: the digits after the last `_`
/// of the file name, up to the next `.`.
///
/// ```
/// use imgeval_report::partial_index;
///
/// assert_eq!(partial_index("scene_12.exr"), Some(12));
/// assert_eq!(partial_index("out/my_scene_3.hdr"), Some(3));
/// assert_eq!(partial_index("pt-v1.2_3.exr"), Some(3));
/// assert_eq!(partial_index("scene.exr"), None);
/// ```
#[must_use]
pub fn partial_index(file_name: &str) -> Option<u64> {
    let base = Path::new(file_name).file_name()?.to_str()?;
    let (_, tail) = base.rsplit_once('_')?;
    tail.split('.').next()?.parse().ok()
}

/// Parse a time log: numbers separated by newlines or commas.
///
/// # Errors
///
/// Returns [`ReportError::InvalidTimestamp`] for an entry that is not a
/// number.
pub fn parse_time_log(text: &str) -> Result<Vec<f64>, ReportError> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>()
                .map_err(|_| ReportError::InvalidTimestamp {
                    value: item.to_owned(),
                })
        })
        .collect()
}

/// Round a timestamp to the nearest multiple of ten seconds.
#[must_use]
pub fn round_to_ten(seconds: f64) -> f64 {
    (seconds / 10.0).round() * 10.0
}

/// A set whose frames have been ordered and checked.
struct OrderedSet<'a> {
    label: &'a str,
    frames: Vec<&'a HdrImage>,
    timestamps: Vec<f64>,
}

fn order_set<'a>(
    set: &'a PartialRenderSet,
    reference: &HdrImage,
) -> Result<OrderedSet<'a>, ReportError> {
    if set.frames.len() != set.timestamps.len() {
        return Err(ReportError::LengthMismatch {
            label: set.label.clone(),
            timestamps: set.timestamps.len(),
            frames: set.frames.len(),
        });
    }

    let mut indexed = set
        .frames
        .iter()
        .map(|frame| {
            partial_index(&frame.name)
                .map(|n| (n, frame))
                .ok_or_else(|| ReportError::InvalidPartialName(frame.name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    indexed.sort_by_key(|&(n, _)| n);

    for (_, frame) in &indexed {
        if frame.image.shape() != reference.shape() {
            return Err(MetricError::ShapeMismatch {
                reference: reference.shape(),
                test: frame.image.shape(),
            }
            .into());
        }
    }

    let timestamps: Vec<f64> = set.timestamps.iter().copied().map(round_to_ten).collect();
    for (k, t) in timestamps.iter().enumerate() {
        if timestamps[..k].contains(t) {
            warn!(label = %set.label, timestamp = *t, "rounded timestamps collide");
            break;
        }
    }

    Ok(OrderedSet {
        label: &set.label,
        frames: indexed.into_iter().map(|(_, frame)| &frame.image).collect(),
        timestamps,
    })
}

/// Per-frame errors of every metric: `result[m][k]` is metric `m` on
/// frame `k`, rounded through its six-decimal string form.
fn frame_errors(
    reference: &HdrImage,
    frames: &[&HdrImage],
    metrics: &[Metric],
    epsilon: f64,
) -> Result<Vec<Vec<f64>>, ReportError> {
    let per_frame = frames
        .par_iter()
        .map(|frame| {
            metrics
                .iter()
                .map(|&metric| {
                    let mean = compute_metric(reference, frame, metric, epsilon)?.mean();
                    Ok(rounded(mean))
                })
                .collect::<Result<Vec<f64>, MetricError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((0..metrics.len())
        .map(|m| per_frame.iter().map(|errors| errors[m]).collect())
        .collect())
}

fn rounded(mean: f64) -> f64 {
    format_error(mean).parse().unwrap_or(mean)
}

/// Append one convergence curve per set to every series in `metrics`.
///
/// Curves are appended in set order. All sets are checked before any
/// metric is computed, and the model is only replaced once every curve
/// is ready.
///
/// # Errors
///
/// [`ReportError::InvalidConfig`] for a non-positive `epsilon` or a
/// repeated metric,
/// [`ReportError::EmptyImage`] for a reference without pixels,
/// [`ReportError::Corrupt`] if the model is already misaligned,
/// [`ReportError::UnknownSeries`], [`ReportError::LengthMismatch`],
/// [`ReportError::InvalidPartialName`] and shape mismatch. The model is
/// unchanged on error.
pub fn track(
    model: &mut ReportModel,
    reference: &HdrImage,
    sets: &[PartialRenderSet],
    metrics: &[Metric],
    epsilon: f64,
) -> Result<(), ReportError> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(ReportError::InvalidConfig(format!(
            "epsilon must be finite and positive, got {epsilon}"
        )));
    }
    for (k, metric) in metrics.iter().enumerate() {
        if metrics[..k].contains(metric) {
            return Err(ReportError::InvalidConfig(format!(
                "metric {metric} requested more than once"
            )));
        }
    }
    require_pixels(reference)?;
    model.validate()?;

    let series = metrics
        .iter()
        .map(|&m| {
            model
                .series_index(m)
                .ok_or_else(|| ReportError::UnknownSeries(m.name().to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ordered = sets
        .iter()
        .map(|set| order_set(set, reference))
        .collect::<Result<Vec<_>, _>>()?;

    let mut staged = model.clone();
    for set in ordered {
        info!(label = set.label, frames = set.frames.len(), "tracking convergence");
        let errors = frame_errors(reference, &set.frames, metrics, epsilon)?;
        for (&series, y) in series.iter().zip(errors) {
            debug!(label = set.label, series, points = y.len(), "appending track");
            staged.append_track(series, set.timestamps.clone(), y)?;
        }
    }

    *model = staged;
    Ok(())
}
