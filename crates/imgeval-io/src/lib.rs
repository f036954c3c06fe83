//! imgeval-io: Filesystem collaborators for the report engine.
//!
//! Loads `.exr`/`.hdr` inputs, writes PNG artifacts through
//! [`DirectorySink`], persists the report as `data.json` + `data.js`, and
//! reads partial-render directories and scene layouts for convergence
//! tracking.

pub mod error;
pub mod hdr;
pub mod partials;
pub mod persist;
pub mod scene;
pub mod sink;

pub use error::IoError;
pub use hdr::{HDR_EXTENSIONS, default_label, detect_extension, load_hdr};
pub use partials::{load_partial_set, partial_frames, partial_name, read_time_log};
pub use persist::{DATA_JS, DATA_JSON, read_report, to_json, write_report};
pub use scene::{Scene, SceneTest, discover_scene};
pub use sink::DirectorySink;
