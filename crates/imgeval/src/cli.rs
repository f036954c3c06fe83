//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use imgeval_metrics::{Clip, Metric};
use imgeval_report::AnalysisConfig;

/// Compare rendered HDR images against a reference and build an
/// interactive error report.
#[derive(Parser, Debug)]
#[command(name = "imgeval", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a report from scratch, optionally tracking convergence.
    Analyze(AnalyzeArgs),
    /// Merge new or re-rendered tests into an existing report.
    Update(UpdateArgs),
    /// Print statistics of one metric between two images.
    Metric(MetricArgs),
}

/// Metric parameters shared by `analyze` and `update`.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Error metrics (l1, l2, mrse, mape, smape), in report order.
    #[arg(short, long, num_args = 1.., required_unless_present = "config_json")]
    pub metrics: Vec<Metric>,

    /// Stabilizer added to metric denominators.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_EPSILON)]
    pub epsilon: f64,

    /// Error range mapped onto the false-color scale.
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["MIN", "MAX"],
        allow_negative_numbers = true
    )]
    pub clip: Option<Vec<f64>>,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, `--metrics`, `--epsilon`, `--clip` and `--negpos`
    /// are ignored. The JSON must be a valid `AnalysisConfig`
    /// serialization; missing fields take their defaults.
    #[arg(long)]
    pub config_json: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Reference image (.exr or .hdr).
    #[arg(short, long = "ref", required_unless_present = "automatic")]
    pub reference: Option<PathBuf>,

    /// Test images (.exr or .hdr).
    #[arg(short, long, num_args = 1.., required_unless_present = "automatic")]
    pub tests: Vec<PathBuf>,

    /// Test names, one per test. Defaults to each file stem with `-`
    /// replaced by spaces.
    #[arg(short, long, num_args = 1..)]
    pub names: Vec<String>,

    /// Partial-render directories (`{name}_partial`) to track convergence.
    #[arg(short, long, num_args = 1..)]
    pub partials: Vec<PathBuf>,

    /// Add a signed SMAPE image box.
    #[arg(long)]
    pub negpos: bool,

    /// Report output directory.
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Scene directory for automatic mode: uses `Reference.exr` and every
    /// `*_partial` directory in it.
    #[arg(
        short = 'A',
        long,
        conflicts_with_all = ["reference", "tests", "names", "partials"]
    )]
    pub automatic: Option<PathBuf>,

    #[command(flatten)]
    pub eval: EvalArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Reference image (.exr or .hdr).
    #[arg(short, long = "ref")]
    pub reference: PathBuf,

    /// Test images to add or replace.
    #[arg(short, long, num_args = 1.., required = true)]
    pub tests: Vec<PathBuf>,

    /// Test names, one per test.
    #[arg(short, long, num_args = 1..)]
    pub names: Vec<String>,

    /// Directory holding the report to update.
    #[arg(short, long)]
    pub dir: PathBuf,

    #[command(flatten)]
    pub eval: EvalArgs,
}

#[derive(Args, Debug)]
pub struct MetricArgs {
    /// Reference image (.exr or .hdr).
    #[arg(short, long = "ref")]
    pub reference: PathBuf,

    /// Test image (.exr or .hdr).
    #[arg(short, long)]
    pub test: PathBuf,

    /// Error metric.
    #[arg(short, long)]
    pub metric: Metric,

    /// Stabilizer added to metric denominators.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_EPSILON)]
    pub epsilon: f64,

    /// Error range mapped onto the false-color scale.
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["MIN", "MAX"],
        allow_negative_numbers = true
    )]
    pub clip: Option<Vec<f64>>,

    /// Print only the six-decimal mean error.
    #[arg(short, long)]
    pub plain: bool,

    /// Write the false-color heatmap to this PNG file.
    #[arg(long)]
    pub falsecolor: Option<PathBuf>,
}

/// Clip range from a `--clip MIN MAX` pair.
pub fn clip_from_cli(clip: Option<&[f64]>) -> Clip {
    match clip {
        Some(&[min, max]) => Clip::new(min, max),
        _ => AnalysisConfig::DEFAULT_CLIP,
    }
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
pub fn config_from_cli(eval: &EvalArgs, negpos: bool) -> Result<AnalysisConfig, String> {
    if let Some(ref json) = eval.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(AnalysisConfig {
        metrics: eval.metrics.clone(),
        clip: clip_from_cli(eval.clip.as_deref()),
        epsilon: eval.epsilon,
        negpos,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("imgeval").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_with_explicit_inputs() {
        let cli = parse(&[
            "analyze", "-r", "ref.exr", "-t", "a.exr", "b-c.hdr", "-m", "l1", "SMAPE",
            "--negpos", "-c", "-0.5", "2", "-d", "out",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            unreachable!("parsed the analyze subcommand");
        };
        assert_eq!(args.reference.as_deref(), Some(std::path::Path::new("ref.exr")));
        assert_eq!(args.tests.len(), 2);
        assert!(args.negpos);

        let config = config_from_cli(&args.eval, args.negpos).unwrap();
        assert_eq!(config.metrics, [Metric::L1, Metric::Smape]);
        assert_eq!(config.clip, Clip::new(-0.5, 2.0));
        assert!((config.epsilon - AnalysisConfig::DEFAULT_EPSILON).abs() < f64::EPSILON);
        assert!(config.negpos);
    }

    #[test]
    fn automatic_mode_conflicts_with_explicit_inputs() {
        assert!(parse(&["analyze", "-A", "scene", "-m", "l2", "-d", "out"]).is_ok());
        for conflicting in [
            ["-t", "a.exr"],
            ["-r", "ref.exr"],
            ["-n", "A"],
            ["-p", "A_partial"],
        ] {
            let mut args = vec!["analyze", "-A", "scene", "-m", "l2", "-d", "out"];
            args.extend(conflicting);
            assert!(parse(&args).is_err(), "{conflicting:?} accepted");
        }
    }

    #[test]
    fn analyze_requires_inputs_without_automatic_mode() {
        assert!(parse(&["analyze", "-m", "l1", "-d", "out"]).is_err());
        assert!(parse(&["analyze", "-r", "ref.exr", "-m", "l1", "-d", "out"]).is_err());
    }

    #[test]
    fn unknown_metric_is_rejected() {
        assert!(parse(&["metric", "-r", "a.exr", "-t", "b.exr", "-m", "rmse"]).is_err());
    }

    #[test]
    fn config_json_replaces_metric_flags() {
        let cli = parse(&[
            "update",
            "-r",
            "ref.exr",
            "-t",
            "a.exr",
            "-d",
            "out",
            "--config-json",
            r#"{"metrics": ["mape"], "epsilon": 0.5}"#,
        ])
        .unwrap();
        let Command::Update(args) = cli.command else {
            unreachable!("parsed the update subcommand");
        };
        let config = config_from_cli(&args.eval, false).unwrap();
        assert_eq!(config.metrics, [Metric::Mape]);
        assert!((config.epsilon - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_config_json_is_reported() {
        let eval = EvalArgs {
            metrics: vec![],
            epsilon: AnalysisConfig::DEFAULT_EPSILON,
            clip: None,
            config_json: Some("{".into()),
        };
        assert!(config_from_cli(&eval, false).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn metric_command_flags() {
        let cli = parse(&[
            "metric", "-r", "a.exr", "-t", "b.exr", "-m", "mrse", "--plain", "--falsecolor",
            "fc.png",
        ])
        .unwrap();
        let Command::Metric(args) = cli.command else {
            unreachable!("parsed the metric subcommand");
        };
        assert_eq!(args.metric, Metric::Mrse);
        assert!(args.plain);
        assert_eq!(clip_from_cli(args.clip.as_deref()), AnalysisConfig::DEFAULT_CLIP);
    }
}
