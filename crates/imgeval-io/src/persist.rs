//! Report persistence: `data.json` and its `data.js` twin.
//!
//! Both files carry the same four-space-indented JSON; `data.js` wraps it
//! in a `const data =` declaration so the viewer can load it from a
//! `<script>` tag.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use imgeval_report::ReportModel;

use crate::error::IoError;

/// Report file read back by `update`.
pub const DATA_JSON: &str = "data.json";

/// Report file loaded by the viewer.
pub const DATA_JS: &str = "data.js";

/// Prefix of [`DATA_JS`].
pub const DATA_JS_PREFIX: &str = "const data =\n";

/// Serialize `model` as JSON indented by four spaces.
///
/// # Errors
///
/// Returns [`IoError::Json`] if serialization fails.
pub fn to_json(model: &ReportModel) -> Result<String, IoError> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    model
        .serialize(&mut serializer)
        .map_err(|source| IoError::Json {
            path: PathBuf::from(DATA_JSON),
            source,
        })?;
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Write `data.json` and `data.js` into `dir`.
///
/// # Errors
///
/// Returns [`IoError::Io`] if a file cannot be written and
/// [`IoError::Json`] if serialization fails.
pub fn write_report(dir: &Path, model: &ReportModel) -> Result<(), IoError> {
    let json = to_json(model)?;
    let json_path = dir.join(DATA_JSON);
    std::fs::write(&json_path, &json).map_err(|e| IoError::io(&json_path, e))?;
    let js_path = dir.join(DATA_JS);
    std::fs::write(&js_path, format!("{DATA_JS_PREFIX}{json}"))
        .map_err(|e| IoError::io(&js_path, e))?;
    info!(
        dir = %dir.display(),
        tests = model.test_count(),
        series = model.series().len(),
        "wrote report"
    );
    Ok(())
}

/// Read and validate `data.json` from `dir`.
///
/// # Errors
///
/// Returns [`IoError::MissingFile`] if there is no report,
/// [`IoError::Json`] if it cannot be parsed and [`IoError::Report`] if
/// it violates the alignment invariant.
pub fn read_report(dir: &Path) -> Result<ReportModel, IoError> {
    let path = dir.join(DATA_JSON);
    if !path.is_file() {
        return Err(IoError::MissingFile(path));
    }
    let text = std::fs::read_to_string(&path).map_err(|e| IoError::io(&path, e))?;
    let model: ReportModel =
        serde_json::from_str(&text).map_err(|source| IoError::Json { path, source })?;
    model.validate()?;
    Ok(model)
}
