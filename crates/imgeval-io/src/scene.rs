//! Automatic scene discovery.
//!
//! A scene directory holds `Reference.exr` and one `{name}_partial`
//! directory per renderer. Each renderer's most recently written frame
//! stands in as its test image.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::info;

use crate::error::IoError;
use crate::partials::{partial_frames, partial_name};

/// Reference file name expected in a scene directory.
pub const SCENE_REFERENCE: &str = "Reference.exr";

/// One renderer found in a scene directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTest {
    /// Test name, from the partial directory name.
    pub name: String,
    /// Most recently modified frame.
    pub image: PathBuf,
    /// The `{name}_partial` directory.
    pub partial_dir: PathBuf,
}

/// Everything automatic mode needs from a scene directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// `Reference.exr` inside the scene directory.
    pub reference: PathBuf,
    /// Renderers sorted by name.
    pub tests: Vec<SceneTest>,
}

/// Discover the reference and every partial-render directory of `dir`.
///
/// # Errors
///
/// Returns [`IoError::MissingFile`] if `Reference.exr` is absent,
/// [`IoError::NoPartials`] if there is no partial directory or one of them
/// has no frames, and [`IoError::Io`] if a directory cannot be listed.
pub fn discover_scene(dir: &Path) -> Result<Scene, IoError> {
    let reference = dir.join(SCENE_REFERENCE);
    if !reference.is_file() {
        return Err(IoError::MissingFile(reference));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IoError::io(dir, e))?;
    let mut partial_dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| IoError::io(dir, e))?.path();
        if path.is_dir()
            && let Some(name) = partial_name(&path)
        {
            partial_dirs.push((name, path));
        }
    }
    if partial_dirs.is_empty() {
        return Err(IoError::NoPartials(dir.to_path_buf()));
    }
    partial_dirs.sort();

    let tests = partial_dirs
        .into_iter()
        .map(|(name, partial_dir)| {
            let image = newest(&partial_frames(&partial_dir)?)?;
            info!(name, image = %image.display(), "representative frame");
            Ok(SceneTest {
                name,
                image,
                partial_dir,
            })
        })
        .collect::<Result<Vec<_>, IoError>>()?;

    Ok(Scene { reference, tests })
}

/// The most recently modified of `frames`; later frames win ties.
fn newest(frames: &[PathBuf]) -> Result<PathBuf, IoError> {
    let mut best: Option<(SystemTime, &PathBuf)> = None;
    for frame in frames {
        let modified = std::fs::metadata(frame)
            .and_then(|m| m.modified())
            .map_err(|e| IoError::io(frame, e))?;
        if best.is_none_or(|(time, _)| modified >= time) {
            best = Some((modified, frame));
        }
    }
    best.map(|(_, frame)| frame.clone())
        .ok_or_else(|| IoError::NoPartials(PathBuf::new()))
}
