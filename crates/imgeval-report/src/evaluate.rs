//! Pure evaluation of test images against the reference.
//!
//! Each test is independent: LDR preview, per-metric mean and false
//! color, optional signed visualization. Tests are evaluated in
//! parallel and collected in input order; nothing here writes
//! artifacts or touches a report.

use rayon::prelude::*;
use tracing::debug;

use imgeval_metrics::tonemap::DEFAULT_GAMMA;
use imgeval_metrics::{
    Clip, HdrImage, Metric, MetricError, RgbaImage, compute_metric, falsecolor, falsecolor_np,
    format_error, to_rgba8, tonemap,
};

use crate::artifact::{
    ArtifactSink, falsecolor_file_name, ldr_file_name, negpos_file_name, store,
};
use crate::error::ReportError;
use crate::model::{ImageElement, REFERENCE_LABEL, SeriesValue, TestEntry};

/// A decoded test image and its report label.
#[derive(Debug, Clone, PartialEq)]
pub struct TestImage {
    /// Label shown in the report and used in artifact file names.
    pub label: String,
    /// Decoded HDR data.
    pub image: HdrImage,
}

impl TestImage {
    /// Pair a label with an image.
    #[must_use]
    pub fn new(label: impl Into<String>, image: HdrImage) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

/// One metric's result for one test.
#[derive(Debug, Clone)]
pub(crate) struct MetricEvaluation {
    pub metric: Metric,
    pub mean: f64,
    pub falsecolor: RgbaImage,
}

/// All results for one test.
#[derive(Debug, Clone)]
pub(crate) struct TestEvaluation {
    pub label: String,
    pub ldr: RgbaImage,
    pub metrics: Vec<MetricEvaluation>,
    pub negpos: Option<RgbaImage>,
}

/// Check that a label can name report entries and artifact files.
///
/// # Errors
///
/// Returns [`ReportError::InvalidLabel`] for empty labels, labels with
/// path separators, and the reserved reference label.
pub fn validate_label(label: &str) -> Result<(), ReportError> {
    let reserved = label == REFERENCE_LABEL;
    let unsafe_path = label.is_empty()
        || label.contains(['/', '\\'])
        || label == "."
        || label == "..";
    if reserved || unsafe_path {
        return Err(ReportError::InvalidLabel(label.to_owned()));
    }
    Ok(())
}

/// Validate a batch before any work: labels valid and unique, every
/// image shaped like the reference.
pub(crate) fn validate_batch(reference: &HdrImage, tests: &[TestImage]) -> Result<(), ReportError> {
    require_pixels(reference)?;
    for (i, test) in tests.iter().enumerate() {
        validate_label(&test.label)?;
        if tests[..i].iter().any(|t| t.label == test.label) {
            return Err(ReportError::DuplicateLabel(test.label.clone()));
        }
        if test.image.shape() != reference.shape() {
            return Err(MetricError::ShapeMismatch {
                reference: reference.shape(),
                test: test.image.shape(),
            }
            .into());
        }
    }
    Ok(())
}

/// Reject an empty reference; tests share its shape, so this covers
/// them too.
pub(crate) fn require_pixels(reference: &HdrImage) -> Result<(), ReportError> {
    if reference.shape().is_empty() {
        return Err(ReportError::EmptyImage(REFERENCE_LABEL.to_owned()));
    }
    Ok(())
}

/// Evaluate every test, in parallel, preserving input order.
pub(crate) fn evaluate_all(
    reference: &HdrImage,
    tests: &[TestImage],
    metrics: &[Metric],
    clip: Clip,
    epsilon: f64,
    negpos: bool,
) -> Result<Vec<TestEvaluation>, ReportError> {
    tests
        .par_iter()
        .map(|test| evaluate(reference, test, metrics, clip, epsilon, negpos))
        .collect()
}

fn evaluate(
    reference: &HdrImage,
    test: &TestImage,
    metrics: &[Metric],
    clip: Clip,
    epsilon: f64,
    negpos: bool,
) -> Result<TestEvaluation, ReportError> {
    let metrics = metrics
        .iter()
        .map(|&metric| {
            let error = compute_metric(reference, &test.image, metric, epsilon)?;
            let mean = error.mean();
            debug!(label = %test.label, %metric, mean, "computed metric");
            Ok(MetricEvaluation {
                metric,
                mean,
                falsecolor: to_rgba8(&falsecolor(&error, clip, epsilon)),
            })
        })
        .collect::<Result<Vec<_>, MetricError>>()?;

    let negpos = if negpos {
        Some(to_rgba8(&falsecolor_np(reference, &test.image, epsilon)?))
    } else {
        None
    };

    Ok(TestEvaluation {
        label: test.label.clone(),
        ldr: tonemap(&test.image, DEFAULT_GAMMA),
        metrics,
        negpos,
    })
}

/// Write one evaluation's images to `sink` and describe the result as a
/// report entry.
///
/// `series` gives, for each evaluated metric in order, the index of the
/// report series it belongs to.
pub(crate) fn write_artifacts<S: ArtifactSink>(
    sink: &mut S,
    evaluation: TestEvaluation,
    series: &[usize],
) -> Result<TestEntry, ReportError> {
    let label = evaluation.label;
    let ldr = store(sink, &ldr_file_name(&label), &evaluation.ldr)?;

    let values = evaluation
        .metrics
        .iter()
        .zip(series)
        .map(|(result, &series)| {
            let name = falsecolor_file_name(&label, result.metric);
            let artifact = store(sink, &name, &result.falsecolor)?;
            Ok(SeriesValue {
                series,
                value: format_error(result.mean),
                falsecolor: ImageElement::new(label.as_str(), artifact.name),
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    let negpos = match &evaluation.negpos {
        Some(image) => {
            let artifact = store(sink, &negpos_file_name(&label), image)?;
            Some(ImageElement::new(label.as_str(), artifact.name))
        }
        None => None,
    };

    Ok(TestEntry {
        ldr: ImageElement::new(label.as_str(), ldr.name),
        label,
        values,
        negpos,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use imgeval_metrics::Shape;

    fn image(value: f64) -> HdrImage {
        HdrImage::filled(Shape::new(2, 2, 3), value)
    }

    #[test]
    fn labels_are_validated() {
        assert!(validate_label("PSSMLT").is_ok());
        assert!(validate_label("path tracer").is_ok());
        for bad in ["", "Reference", "a/b", "a\\b", ".."] {
            assert!(
                matches!(validate_label(bad), Err(ReportError::InvalidLabel(_))),
                "{bad:?} accepted",
            );
        }
    }

    #[test]
    fn batch_rejects_duplicates() {
        let tests = [TestImage::new("A", image(0.0)), TestImage::new("A", image(1.0))];
        assert!(matches!(
            validate_batch(&image(1.0), &tests),
            Err(ReportError::DuplicateLabel(ref l)) if l == "A"
        ));
    }

    #[test]
    fn batch_rejects_empty_images() {
        let empty = HdrImage::filled(Shape::new(0, 0, 3), 0.0);
        let tests = [TestImage::new("A", empty.clone())];
        assert!(matches!(
            validate_batch(&empty, &tests),
            Err(ReportError::EmptyImage(ref l)) if l == "Reference"
        ));
        assert!(matches!(
            validate_batch(&empty, &[]),
            Err(ReportError::EmptyImage(_))
        ));
    }

    #[test]
    fn batch_rejects_shape_mismatch() {
        let tests = [TestImage::new(
            "A",
            HdrImage::filled(Shape::new(2, 3, 3), 0.0),
        )];
        assert!(matches!(
            validate_batch(&image(1.0), &tests),
            Err(ReportError::Metric(MetricError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn evaluation_preserves_order() {
        let tests: Vec<TestImage> = (0..8)
            .map(|i| TestImage::new(format!("T{i}"), image(f64::from(i) * 0.1)))
            .collect();
        let results =
            evaluate_all(&image(1.0), &tests, &[Metric::L1], Clip::default(), 0.01, false)
                .unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7"]);
        for (i, result) in results.iter().enumerate() {
            let expected = 1.0 - i as f64 * 0.1;
            assert!((result.metrics[0].mean - expected).abs() < 1e-9);
        }
    }
}
