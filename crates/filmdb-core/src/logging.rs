//! Structured logging setup using tracing.
//!
//! Everything goes to stderr so `--format json` output on stdout stays
//! machine-readable. Human-readable with ANSI colors on a terminal, JSON
//! lines when piped or when `logging.json` is set.

use std::io::IsTerminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Install the global subscriber. `RUST_LOG` overrides `settings.level`.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init_logging(settings: &LoggingSettings) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let json = settings.json || !std::io::stderr().is_terminal();

    let installed = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(true))
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
