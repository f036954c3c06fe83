//! Partial-render directories.
//!
//! Layout of `<scene>/{name}_partial/`:
//!
//! ```text
//! {name}_1.exr  {name}_2.exr  ...  {name}_time.csv
//! ```
//!
//! Frames share one extension, found by probing `{name}_1.exr` then
//! `{name}_1.hdr`. The time log holds one elapsed time per frame.

use std::path::{Path, PathBuf};

use tracing::info;

use imgeval_report::{PartialFrame, PartialRenderSet, parse_time_log, partial_index};

use crate::error::IoError;
use crate::hdr::{detect_extension, load_hdr};

/// Suffix of a partial-render directory name.
pub const PARTIAL_DIR_SUFFIX: &str = "_partial";

/// Test name of a partial-render directory: its name without
/// [`PARTIAL_DIR_SUFFIX`].
///
/// Returns `None` if the directory name does not end in the suffix.
#[must_use]
pub fn partial_name(dir: &Path) -> Option<String> {
    let base = dir.file_name()?.to_str()?;
    base.strip_suffix(PARTIAL_DIR_SUFFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Path of the time log inside `dir`: `{name}_time.csv`.
#[must_use]
pub fn time_log_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_time.csv"))
}

fn require_name(dir: &Path) -> Result<String, IoError> {
    partial_name(dir).ok_or_else(|| IoError::NoPartials(dir.to_path_buf()))
}

/// Numbered frames `{name}_{n}.{ext}` of `dir`, in sequence order.
///
/// # Errors
///
/// Returns [`IoError::NoPartials`] if the directory name lacks the
/// `_partial` suffix or holds no frames, [`IoError::MissingFile`] if
/// `{name}_1` exists in no supported format and [`IoError::Io`] if the
/// directory cannot be listed.
pub fn partial_frames(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let name = require_name(dir)?;
    let ext = detect_extension(&dir.join(format!("{name}_1")))?;
    let prefix = format!("{name}_");

    let entries = std::fs::read_dir(dir).map_err(|e| IoError::io(dir, e))?;
    let mut frames = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| IoError::io(dir, e))?.path();
        let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let numbered = file_name
            .strip_prefix(&prefix)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
        if !numbered || path.extension().is_none_or(|e| e != ext) {
            continue;
        }
        if let Some(n) = partial_index(file_name) {
            frames.push((n, path));
        }
    }

    if frames.is_empty() {
        return Err(IoError::NoPartials(dir.to_path_buf()));
    }
    frames.sort_by_key(|(n, _)| *n);
    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

/// Read the time log of `dir`.
///
/// # Errors
///
/// Returns [`IoError::MissingFile`] if the log is absent,
/// [`IoError::Io`] if it cannot be read and [`IoError::Report`] for a
/// malformed entry.
pub fn read_time_log(dir: &Path) -> Result<Vec<f64>, IoError> {
    let name = require_name(dir)?;
    let path = time_log_path(dir, &name);
    if !path.is_file() {
        return Err(IoError::MissingFile(path));
    }
    let text = std::fs::read_to_string(&path).map_err(|e| IoError::io(&path, e))?;
    Ok(parse_time_log(&text)?)
}

/// Load every frame and the time log of `dir`.
///
/// The set is labelled with the directory's test name. Frame/timestamp
/// count agreement is checked by the tracker, not here.
///
/// # Errors
///
/// See [`partial_frames`], [`read_time_log`] and
/// [`load_hdr`](crate::load_hdr).
pub fn load_partial_set(dir: &Path) -> Result<PartialRenderSet, IoError> {
    let label = require_name(dir)?;
    let paths = partial_frames(dir)?;
    let timestamps = read_time_log(dir)?;
    info!(dir = %dir.display(), frames = paths.len(), "loading partial renders");

    let frames = paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(PartialFrame::new(name, load_hdr(path)?))
        })
        .collect::<Result<Vec<_>, IoError>>()?;

    Ok(PartialRenderSet {
        label,
        frames,
        timestamps,
    })
}
