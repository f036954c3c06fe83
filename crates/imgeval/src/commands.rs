//! Subcommand implementations.

use std::path::{Path, PathBuf};

use tracing::info;

use imgeval_io::{
    DirectorySink, IoError, default_label, discover_scene, load_hdr, load_partial_set,
    read_report, write_report,
};
use imgeval_metrics::{
    MetricError, RgbaImage, compute_metric, falsecolor, format_error, to_rgba8,
};
use imgeval_report::{
    AnalysisConfig, ArtifactSink, PartialRenderSet, ReportError, TestImage, build, track, update,
};

use crate::cli::{AnalyzeArgs, MetricArgs, UpdateArgs, clip_from_cli, config_from_cli};

/// Errors surfaced to the user by a subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Arguments are individually valid but inconsistent.
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// Inputs of a report build.
struct Inputs {
    reference: PathBuf,
    tests: Vec<(String, PathBuf)>,
    partials: Vec<PathBuf>,
}

/// Pair each test path with its label: the matching `--names` entry, or
/// the default derived from the file name.
fn labelled(tests: &[PathBuf], names: &[String]) -> Result<Vec<(String, PathBuf)>, CommandError> {
    if !names.is_empty() && names.len() != tests.len() {
        return Err(CommandError::Usage(format!(
            "{} names given for {} tests",
            names.len(),
            tests.len()
        )));
    }
    Ok(tests
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let label = names.get(i).cloned().unwrap_or_else(|| default_label(path));
            (label, path.clone())
        })
        .collect())
}

fn resolve_inputs(args: &AnalyzeArgs) -> Result<Inputs, CommandError> {
    if let Some(ref scene_dir) = args.automatic {
        let scene = discover_scene(scene_dir)?;
        let tests = scene
            .tests
            .iter()
            .map(|t| (t.name.clone(), t.image.clone()))
            .collect();
        let partials = scene.tests.into_iter().map(|t| t.partial_dir).collect();
        return Ok(Inputs {
            reference: scene.reference,
            tests,
            partials,
        });
    }

    let reference = args.reference.clone().ok_or_else(|| {
        CommandError::Usage("--ref is required unless --automatic is given".into())
    })?;
    Ok(Inputs {
        reference,
        tests: labelled(&args.tests, &args.names)?,
        partials: args.partials.clone(),
    })
}

fn load_tests(tests: &[(String, PathBuf)]) -> Result<Vec<TestImage>, IoError> {
    tests
        .iter()
        .map(|(label, path)| {
            info!(%label, path = %path.display(), "loading test image");
            Ok(TestImage::new(label.as_str(), load_hdr(path)?))
        })
        .collect()
}

/// `analyze`: build a report and optionally track convergence.
pub fn analyze(args: &AnalyzeArgs) -> Result<(), CommandError> {
    let config = config_from_cli(&args.eval, args.negpos).map_err(CommandError::Usage)?;
    config.validate()?;
    let inputs = resolve_inputs(args)?;

    let reference = load_hdr(&inputs.reference)?;
    let tests = load_tests(&inputs.tests)?;
    let sets = inputs
        .partials
        .iter()
        .map(|dir| load_partial_set(dir))
        .collect::<Result<Vec<PartialRenderSet>, _>>()?;

    let mut sink = DirectorySink::create(&args.dir)?;
    let mut model = build(&reference, &tests, &config, &mut sink)?;
    if !sets.is_empty() {
        track(&mut model, &reference, &sets, &config.metrics, config.epsilon)?;
    }
    write_report(&args.dir, &model)?;
    info!(dir = %args.dir.display(), tests = model.test_count(), "analysis complete");
    Ok(())
}

/// `update`: merge tests into the report stored in `--dir`.
pub fn update_report(args: &UpdateArgs) -> Result<(), CommandError> {
    let config = config_from_cli(&args.eval, false).map_err(CommandError::Usage)?;
    config.validate()?;
    let mut model = read_report(&args.dir)?;

    let reference = load_hdr(&args.reference)?;
    let tests = load_tests(&labelled(&args.tests, &args.names)?)?;

    let mut sink = DirectorySink::create(&args.dir)?;
    let summary = update(&mut model, &reference, &tests, &config, &mut sink)?;
    write_report(&args.dir, &model)?;
    info!(
        appended = summary.appended().count(),
        overwritten = summary.overwritten().count(),
        "update complete"
    );
    Ok(())
}

/// `metric`: print one metric's statistics and optionally write the
/// false-color heatmap.
pub fn metric(args: &MetricArgs) -> Result<(), CommandError> {
    let clip = clip_from_cli(args.clip.as_deref());
    if let Some(ref out) = args.falsecolor
        && !out
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
    {
        return Err(CommandError::Usage(format!(
            "false-color output {} must be a .png file",
            out.display()
        )));
    }

    let reference = load_hdr(&args.reference)?;
    let test = load_hdr(&args.test)?;
    let error = compute_metric(&reference, &test, args.metric, args.epsilon)?;
    let summary = error.summary();

    if args.plain {
        println!("{}", format_error(summary.mean));
    } else {
        println!(
            "{} = {:.4} (Min = {:.4}, Max = {:.4}, Var = {:.4})",
            args.metric, summary.mean, summary.min, summary.max, summary.variance
        );
    }

    if let Some(ref out) = args.falsecolor {
        if clip != AnalysisConfig::DEFAULT_CLIP {
            println!("Clipping values in range: [{:.2}, {:.2}]", clip.min, clip.max);
        }
        write_png(out, &to_rgba8(&falsecolor(&error, clip, args.epsilon)))?;
        println!("False color heatmap written to: {}", out.display());
    }
    Ok(())
}

fn write_png(path: &Path, image: &RgbaImage) -> Result<(), CommandError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CommandError::Usage(format!("invalid output path {}", path.display())))?;
    DirectorySink::create(dir)?.write_png(name, image)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_to_file_stems() {
        let tests = [PathBuf::from("r/path-tracer.exr"), PathBuf::from("BDPT.hdr")];
        let labelled = labelled(&tests, &[]).unwrap();
        assert_eq!(labelled[0].0, "path tracer");
        assert_eq!(labelled[1].0, "BDPT");
    }

    #[test]
    fn explicit_names_win() {
        let tests = [PathBuf::from("a.exr")];
        let labelled = labelled(&tests, &["Ours".to_owned()]).unwrap();
        assert_eq!(labelled[0], ("Ours".to_owned(), PathBuf::from("a.exr")));
    }

    #[test]
    fn name_count_must_match() {
        let tests = [PathBuf::from("a.exr"), PathBuf::from("b.exr")];
        assert!(matches!(
            labelled(&tests, &["A".to_owned()]),
            Err(CommandError::Usage(_))
        ));
    }
}
