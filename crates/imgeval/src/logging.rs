//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: compact lines on stderr, filtered by
/// `RUST_LOG` and defaulting to `info`.
///
/// Stdout stays reserved for command results such as `metric --plain`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(e) = installed {
        eprintln!("warning: logging unavailable: {e}");
    }
}
