//! imgeval: compare rendered HDR images against a reference.
//!
//! Builds the report consumed by the interactive viewer (`data.json`,
//! `data.js` and PNG thumbnails), merges new renders into an existing
//! report, and prints single-pair metric statistics.
//!
//! # Usage
//!
//! ```text
//! imgeval analyze -r Reference.exr -t pt.exr bdpt.exr -m l1 smape -d viewer/scene
//! imgeval analyze -A renders/scene -m l1 mrse -d viewer/scene
//! imgeval update -r Reference.exr -t bdpt.exr -m l1 smape -d viewer/scene
//! imgeval metric -r Reference.exr -t pt.exr -m mape --falsecolor pt-mape.png
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod logging;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let Err(io) = e.print() {
                eprintln!("Error: failed to print usage: {io}");
            }
            return if is_informational(e.kind()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    logging::init_tracing();

    let result = match &cli.command {
        Command::Analyze(args) => commands::analyze(args),
        Command::Update(args) => commands::update_report(args),
        Command::Metric(args) => commands::metric(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

/// Parse outcomes that are requested output rather than usage errors.
const fn is_informational(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

/// `error: cause: cause ...`, skipping causes already in the message.
fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_is_not_a_failure() {
        let help = Cli::try_parse_from(["imgeval", "--help"]).map(|_| ());
        assert!(help.is_err_and(|e| is_informational(e.kind())));

        let bogus = Cli::try_parse_from(["imgeval", "bogus"]).map(|_| ());
        assert!(bogus.is_err_and(|e| !is_informational(e.kind())));
    }
}
