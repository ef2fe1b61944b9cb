//! Log subscriber setup for the CLI and embedding hosts

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_VAR: &str = "BEEDASH_LOG_JSON";

/// Install the global subscriber: pretty on stderr, or JSON lines when
/// `BEEDASH_LOG_JSON=1`. `RUST_LOG` overrides the default `info` filter.
/// Later calls are no-ops.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(LOG_JSON_VAR)
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
