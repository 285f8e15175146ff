//! Logging initialization for the CLI.
//!
//! Library crates only emit `tracing` events; the binary decides where they go.
//! Logs always go to stderr so stdout stays parseable.

use tracing::Level;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "STORYFORGE_LOG";

fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Build the filter: env directive (or `warn`) plus storyforge crates at `verbosity`.
pub fn filter(verbosity: u8) -> EnvFilter {
    let level = level_for(verbosity);
    let base = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    ["storyforge_core", "storyforge_cli"]
        .iter()
        .filter_map(|target| format!("{target}={level}").parse::<Directive>().ok())
        .fold(base, EnvFilter::add_directive)
}

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = INFO, 1 = DEBUG, 2+ = TRACE
/// * `json` - If true, output JSON lines to stderr
///
/// JSON line format:
/// ```json
/// {"timestamp":"...","level":"WARN","fields":{"message":"..."},"target":"storyforge_core::paths"}
/// ```
pub fn init(verbosity: u8, json: bool) {
    let subscriber = tracing_subscriber::registry().with(filter(verbosity));

    let result = if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_err() {
        eprintln!("warning: logging was already initialized");
    }
}
