//! Integration test: build a report, persist it as JSON, reload it, merge
//! an update and append convergence curves.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use imgeval_metrics::{HdrImage, Metric, Shape};
use imgeval_report::{
    AnalysisConfig, LabelLookup, MemorySink, PartialFrame, PartialRenderSet, ReportModel,
    TestImage, build, image_slot, metric_box_index, track, update,
};

fn gradient(scale: f64) -> HdrImage {
    HdrImage::from_fn(Shape::new(4, 6, 3), |y, x, c| {
        scale * (0.1 + 0.05 * (y * 6 + x) as f64 + 0.01 * c as f64)
    })
}

#[test]
fn build_reload_update_track() {
    let reference = gradient(1.0);
    let config = AnalysisConfig {
        negpos: true,
        ..AnalysisConfig::with_metrics(vec![Metric::L1, Metric::Mrse, Metric::Smape])
    };
    let mut sink = MemorySink::new();

    let tests = [
        TestImage::new("BDPT", gradient(0.9)),
        TestImage::new("PSSMLT", gradient(1.2)),
    ];
    let model = build(&reference, &tests, &config, &mut sink).expect("build should succeed");
    model.validate().unwrap();

    // Round-trip through the persisted form.
    let json = serde_json::to_string_pretty(&model).unwrap();
    let mut model: ReportModel = serde_json::from_str(&json).unwrap();
    model.validate().unwrap();
    assert_eq!(model.metrics().unwrap(), config.metrics);
    assert!(model.has_negpos());

    // Re-render one test, add a new one.
    let incoming = [
        TestImage::new("PSSMLT", gradient(1.0)),
        TestImage::new("Path", gradient(0.5)),
    ];
    let summary = update(&mut model, &reference, &incoming, &config, &mut sink).unwrap();
    assert_eq!(summary.overwritten().collect::<Vec<_>>(), ["PSSMLT"]);
    assert_eq!(summary.appended().collect::<Vec<_>>(), ["Path"]);
    model.validate().unwrap();

    assert_eq!(model.labels(), ["BDPT", "PSSMLT", "Path"]);
    assert_eq!(model.lookup("PSSMLT"), LabelLookup::Found(1));
    for series in model.series() {
        assert_eq!(series.data[1], "0.000000");
    }
    assert_eq!(model.image_boxes()[0].elements[image_slot(2)].image, "Path.png");
    assert_eq!(
        model.image_boxes()[metric_box_index(2)].elements[2].image,
        "Path-SMAPE.png"
    );
    assert!(sink.get("Path-NP.png").is_some());

    // Convergence of a fourth renderer, frames out of order on input.
    let sets = [PartialRenderSet {
        label: "Path".into(),
        frames: vec![
            PartialFrame::new("Path_10.exr", gradient(0.99)),
            PartialFrame::new("Path_2.exr", gradient(0.8)),
            PartialFrame::new("Path_1.exr", gradient(0.5)),
        ],
        timestamps: vec![11.0, 19.0, 101.0],
    }];
    track(&mut model, &reference, &sets, &config.metrics, config.epsilon).unwrap();
    model.validate().unwrap();

    let l1 = &model.series()[0].track;
    assert_eq!(l1.x, [[10.0, 20.0, 100.0]]);
    assert!(l1.y[0].windows(2).all(|w| w[0] > w[1]));
    // Tracking leaves the tabulated values alone.
    assert_eq!(model.labels().len(), 3);
    assert_eq!(model.series()[0].data.len(), 3);
}
