//! # Structured Logging
//!
//! Installs the `tracing` subscriber. Output goes to stderr so stdout stays
//! clean for `pledge-node sign`, which prints a signed call as JSON.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Initialize the global tracing subscriber. Call once, early in `main()`.
///
/// `RUST_LOG` overrides `default_level` when set, e.g.
///
/// ```text
/// RUST_LOG=pledge_node=debug,pledge_contracts=debug,tower_http=info
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
