//! Logging setup for the binary. Library code only emits `tracing` events.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "MISSING_EVENTS_LOG_JSON";

/// Install the global subscriber on stderr. `RUST_LOG` overrides the `info`
/// default; `MISSING_EVENTS_LOG_JSON=1` switches to JSON lines.
/// A second call is a no-op.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_requested(std::env::var(LOG_JSON_ENV).ok().as_deref()) {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn json_requested(value: Option<&str>) -> bool {
    value.map(str::trim) == Some("1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_requested() {
        assert!(json_requested(Some("1")));
        assert!(json_requested(Some(" 1\n")));
        assert!(!json_requested(Some("0")));
        assert!(!json_requested(Some("true")));
        assert!(!json_requested(None));
    }

    #[test]
    fn test_init_twice() {
        init_logging();
        init_logging();
        tracing::info!("still fine");
    }
}
