//! Build a report from scratch.

use tracing::info;

use imgeval_metrics::tonemap::DEFAULT_GAMMA;
use imgeval_metrics::{HdrImage, thumbnail, tonemap};

use crate::artifact::{ArtifactSink, THUMBNAIL_FILE_NAME, reference_file_name, store};
use crate::config::AnalysisConfig;
use crate::error::ReportError;
use crate::evaluate::{TestImage, evaluate_all, validate_batch, write_artifacts};
use crate::model::{ImageElement, REFERENCE_LABEL, ReportModel};

/// Build a report comparing every test against `reference`.
///
/// Tests keep their input order and metrics keep `config.metrics` order.
/// The resulting report has one label per test, one series and one
/// false-color box per metric (plus the NP box when `config.negpos` is
/// set), all index-aligned.
///
/// Artifacts written to `sink`: `Reference.png`, `thumb.png`, and per
/// test `{label}.png`, `{label}-{METRIC}.png` and, with `negpos`,
/// `{label}-NP.png`.
///
/// # Errors
///
/// Returns [`ReportError::InvalidConfig`], [`ReportError::InvalidLabel`],
/// [`ReportError::DuplicateLabel`], [`ReportError::EmptyImage`] or a
/// shape mismatch before any artifact is written, and [`ReportError::Artifact`] if the sink fails.
pub fn build<S: ArtifactSink>(
    reference: &HdrImage,
    tests: &[TestImage],
    config: &AnalysisConfig,
    sink: &mut S,
) -> Result<ReportModel, ReportError> {
    config.validate()?;
    validate_batch(reference, tests)?;

    info!(
        tests = tests.len(),
        metrics = config.metrics.len(),
        negpos = config.negpos,
        "building report"
    );

    let evaluations = evaluate_all(
        reference,
        tests,
        &config.metrics,
        config.clip,
        config.epsilon,
        config.negpos,
    )?;

    let reference_ldr = store(
        sink,
        &reference_file_name(),
        &tonemap(reference, DEFAULT_GAMMA),
    )?;
    let mut model = ReportModel::new(
        ImageElement::new(REFERENCE_LABEL, reference_ldr.name),
        &config.metrics,
        config.negpos,
    );

    // Series are created in metric order, so metric k lives in series k.
    let series: Vec<usize> = (0..config.metrics.len()).collect();
    for evaluation in evaluations {
        info!(label = %evaluation.label, "adding test");
        let entry = write_artifacts(sink, evaluation, &series)?;
        model.append_test(entry)?;
    }

    store(sink, THUMBNAIL_FILE_NAME, &thumbnail(reference))?;
    Ok(model)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::artifact::MemorySink;
    use crate::model::{IMAGES_BOX, image_slot, metric_box_index};
    use imgeval_metrics::{Metric, Shape};

    fn shape() -> Shape {
        Shape::new(2, 2, 3)
    }

    fn tests(n: usize) -> Vec<TestImage> {
        (0..n)
            .map(|i| TestImage::new(format!("T{i}"), HdrImage::filled(shape(), 0.1 * i as f64)))
            .collect()
    }

    #[test]
    fn lengths_follow_tests_and_metrics() {
        let metrics = vec![Metric::L1, Metric::L2, Metric::Smape];
        let config = AnalysisConfig::with_metrics(metrics.clone());
        let mut sink = MemorySink::new();
        let model = build(&HdrImage::filled(shape(), 1.0), &tests(4), &config, &mut sink).unwrap();

        assert_eq!(model.labels().len(), 4);
        assert_eq!(model.series().len(), 3);
        for series in model.series() {
            assert_eq!(series.data.len(), 4);
        }
        assert_eq!(model.image_boxes().len(), 4);
        assert_eq!(model.image_boxes()[IMAGES_BOX].elements.len(), 5);
        model.validate().unwrap();
    }

    #[test]
    fn image_boxes_follow_metric_order() {
        let metrics = vec![Metric::Smape, Metric::L1];
        let config = AnalysisConfig::with_metrics(metrics.clone());
        let mut sink = MemorySink::new();
        let model = build(&HdrImage::filled(shape(), 1.0), &tests(2), &config, &mut sink).unwrap();

        for (m, metric) in metrics.iter().enumerate() {
            assert_eq!(model.series()[m].label, metric.name());
            let image_box = &model.image_boxes()[metric_box_index(m)];
            assert_eq!(image_box.title, metric.name());
            assert_eq!(image_box.elements[1].image, format!("T1-{metric}.png"));
        }
        let images = &model.image_boxes()[IMAGES_BOX];
        assert_eq!(images.elements[0].title, "Reference");
        assert_eq!(images.elements[image_slot(1)].image, "T1.png");
    }

    #[test]
    fn writes_every_artifact() {
        let config = AnalysisConfig {
            negpos: true,
            ..AnalysisConfig::with_metrics(vec![Metric::L1, Metric::Mape])
        };
        let mut sink = MemorySink::new();
        let model = build(&HdrImage::filled(shape(), 1.0), &tests(2), &config, &mut sink).unwrap();

        let names: Vec<&str> = sink.names().collect();
        assert_eq!(
            names,
            [
                "Reference.png",
                "T0-L1.png",
                "T0-MAPE.png",
                "T0-NP.png",
                "T0.png",
                "T1-L1.png",
                "T1-MAPE.png",
                "T1-NP.png",
                "T1.png",
                "thumb.png",
            ]
        );
        assert!(model.has_negpos());
        let np = model.image_boxes().last().unwrap();
        assert_eq!(np.title, "NP SMAPE");
        assert_eq!(np.elements[1].image, "T1-NP.png");
        assert_eq!(sink.get("thumb.png").unwrap().dimensions(), (640, 360));
    }

    #[test]
    fn mean_errors_are_formatted() {
        let config = AnalysisConfig::with_metrics(vec![Metric::L1, Metric::Smape]);
        let mut sink = MemorySink::new();
        let reference = HdrImage::filled(shape(), 1.0);
        let zeros = [TestImage::new("zeros", HdrImage::filled(shape(), 0.0))];
        let model = build(&reference, &zeros, &config, &mut sink).unwrap();
        assert_eq!(model.series()[0].data, ["1.000000"]);
        assert_eq!(model.series()[1].data, ["1.980198"]);
    }

    #[test]
    fn invalid_input_writes_nothing() {
        let config = AnalysisConfig::with_metrics(vec![Metric::L1]);
        let mut sink = MemorySink::new();
        let bad = [
            TestImage::new("A", HdrImage::filled(shape(), 0.0)),
            TestImage::new("B", HdrImage::filled(Shape::new(1, 1, 3), 0.0)),
        ];
        let result = build(&HdrImage::filled(shape(), 1.0), &bad, &config, &mut sink);
        assert!(result.is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_batch_builds_reference_only_report() {
        let config = AnalysisConfig::with_metrics(vec![Metric::L2]);
        let mut sink = MemorySink::new();
        let model = build(&HdrImage::filled(shape(), 1.0), &[], &config, &mut sink).unwrap();
        assert!(model.labels().is_empty());
        assert_eq!(model.image_boxes()[IMAGES_BOX].elements.len(), 1);
        model.validate().unwrap();
    }
}
