//! Merge new or re-rendered tests into an existing report.
//!
//! Each incoming label is looked up once, before anything changes:
//!
//! - [`LabelLookup::NotFound`]: the test is appended to the labels, every
//!   series, the `"Images"` box, every metric box and the NP box (if the
//!   report has one).
//! - [`LabelLookup::Found`]: the test's values are overwritten in place.
//!   Its artifacts are regenerated under the same file names, so the
//!   metric-box elements stay as they are.
//!
//! Series are matched to metrics by label, not by position, so an
//! update may list its metrics in any order. A batch that appends a new
//! test must cover every series in the report.

use tracing::info;

use imgeval_metrics::HdrImage;

use crate::artifact::ArtifactSink;
use crate::config::AnalysisConfig;
use crate::error::ReportError;
use crate::evaluate::{TestImage, evaluate_all, validate_batch, write_artifacts};
use crate::model::{LabelLookup, ReportModel};

/// What happened to one incoming test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new test was appended at `index`.
    Appended {
        /// Test label.
        label: String,
        /// Position in `labels`.
        index: usize,
    },
    /// An existing test at `index` was overwritten.
    Overwritten {
        /// Test label.
        label: String,
        /// Position in `labels`.
        index: usize,
    },
}

/// Per-test outcomes of an update, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// One outcome per incoming test.
    pub outcomes: Vec<UpdateOutcome>,
}

impl UpdateSummary {
    /// Labels that were appended.
    pub fn appended(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            UpdateOutcome::Appended { label, .. } => Some(label.as_str()),
            UpdateOutcome::Overwritten { .. } => None,
        })
    }

    /// Labels that were overwritten.
    pub fn overwritten(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            UpdateOutcome::Overwritten { label, .. } => Some(label.as_str()),
            UpdateOutcome::Appended { .. } => None,
        })
    }
}

/// Merge `tests` into `model`.
///
/// `config.clip`, `config.epsilon` and `config.metrics` drive the
/// recomputation; `config.negpos` is ignored in favor of the report's
/// own layout.
///
/// # Errors
///
/// All validation happens before any artifact is written:
/// [`ReportError::InvalidConfig`], [`ReportError::Corrupt`] (model
/// already misaligned), [`ReportError::InvalidLabel`],
/// [`ReportError::DuplicateLabel`] (label repeated within `tests`),
/// [`ReportError::EmptyImage`], shape mismatch, [`ReportError::UnknownSeries`] (metric not in the report)
/// and [`ReportError::MetricSetMismatch`] (new test without every
/// series). [`ReportError::Artifact`] is returned if the sink fails; the
/// model is left unchanged in every error case.
pub fn update<S: ArtifactSink>(
    model: &mut ReportModel,
    reference: &HdrImage,
    tests: &[TestImage],
    config: &AnalysisConfig,
    sink: &mut S,
) -> Result<UpdateSummary, ReportError> {
    config.validate()?;
    model.validate()?;
    validate_batch(reference, tests)?;

    let series = config
        .metrics
        .iter()
        .map(|&m| {
            model
                .series_index(m)
                .ok_or_else(|| ReportError::UnknownSeries(m.name().to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let lookups: Vec<LabelLookup> = tests.iter().map(|t| model.lookup(&t.label)).collect();
    let appends = lookups.contains(&LabelLookup::NotFound);
    if appends && series.len() != model.series().len() {
        return Err(ReportError::MetricSetMismatch {
            expected: join(model.series().iter().map(|s| s.label.as_str())),
            provided: join(config.metrics.iter().map(|m| m.name())),
        });
    }

    info!(
        tests = tests.len(),
        metrics = config.metrics.len(),
        existing = model.test_count(),
        "updating report"
    );

    let evaluations = evaluate_all(
        reference,
        tests,
        &config.metrics,
        config.clip,
        config.epsilon,
        model.has_negpos(),
    )?;

    let mut staged = model.clone();
    let mut summary = UpdateSummary::default();
    for (evaluation, lookup) in evaluations.into_iter().zip(lookups) {
        let entry = write_artifacts(sink, evaluation, &series)?;
        let label = entry.label.clone();
        match lookup {
            LabelLookup::NotFound => {
                info!(%label, "appending new test");
                staged.append_test(entry)?;
                summary.outcomes.push(UpdateOutcome::Appended {
                    label,
                    index: staged.test_count() - 1,
                });
            }
            LabelLookup::Found(index) => {
                info!(%label, index, "overwriting existing test");
                let values = entry.values.into_iter().map(|v| (v.series, v.value)).collect();
                staged.overwrite_test(index, entry.ldr, values)?;
                summary.outcomes.push(UpdateOutcome::Overwritten { label, index });
            }
        }
    }

    *model = staged;
    Ok(summary)
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
