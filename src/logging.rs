//! Process-wide tracing setup.
//!
//! Logs go to stderr so the conversation printed on stdout stays readable.

use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Filter override, takes precedence over `RUST_LOG`
pub const ENV_LOG: &str = "CHATWIRE_LOG";

const DEFAULT_FILTER: &str = "warn";

static INIT: OnceCell<()> = OnceCell::new();

fn resolve_env_filter() -> tracing_subscriber::EnvFilter {
    if let Ok(level) = std::env::var(ENV_LOG) {
        if let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level) {
            return filter;
        }
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging once per process.
///
/// Environment variables:
/// - `CHATWIRE_LOG`: level/filter (`debug`, `chatwire::sse=trace`, ...)
/// - `RUST_LOG`: fallback filter
pub fn init_logging() {
    INIT.get_or_init(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true);

        // A subscriber installed elsewhere (tests, embedding apps) wins
        let _ = tracing_subscriber::registry()
            .with(resolve_env_filter())
            .with(fmt_layer)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        tracing::debug!("still fine");
    }
}
