//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! forwards those records alongside the CLI's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var. Output goes to
/// stderr so command results on stdout stay machine readable.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log the outcome of an engine command
pub fn log_command(command: &str, duration_ms: u64, ok: bool) {
    if !ok {
        tracing::warn!(command = command, duration_ms = duration_ms, "Command failed");
    } else if duration_ms > 1000 {
        tracing::warn!(command = command, duration_ms = duration_ms, "Slow command");
    } else {
        tracing::info!(command = command, duration_ms = duration_ms, "Command completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_command() {
        // Just ensure it doesn't panic without a subscriber
        log_command("standings", 12, true);
        log_command("forfeit", 1500, true);
        log_command("bracket", 3, false);
    }
}
