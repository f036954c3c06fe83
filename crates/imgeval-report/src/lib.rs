//! imgeval-report: Report model, builder, incremental updater and
//! convergence tracker (sans-IO).
//!
//! Turns metric results into the report consumed by the viewer:
//! build from scratch -> merge new or re-rendered tests -> append
//! convergence curves from partial renders.
//!
//! Generated images go through the [`ArtifactSink`] trait and the model
//! is plain serde data, so this crate never touches the filesystem.
//! Directory-backed sinks and `data.json` persistence live in
//! `imgeval-io`.

pub mod artifact;
pub mod builder;
pub mod config;
pub mod convergence;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod updater;

pub use artifact::{Artifact, ArtifactSink, MemorySink, THUMBNAIL_FILE_NAME};
pub use builder::build;
pub use config::AnalysisConfig;
pub use convergence::{
    PartialFrame, PartialRenderSet, parse_time_log, partial_index, round_to_ten, track,
};
pub use error::ReportError;
pub use evaluate::{TestImage, validate_label};
pub use model::{
    ImageBox, ImageElement, LabelLookup, ReportModel, Series, Stats, Track, image_slot,
    metric_box_index,
};
pub use updater::{UpdateOutcome, UpdateSummary, update};
