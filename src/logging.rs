//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Pick the filter directive: `--debug` forces `debug`, then `RUST_LOG`, then
/// the configured level.
pub fn filter_directive(debug: bool, env: Option<&str>, configured: &str) -> String {
    if debug {
        return "debug".to_string();
    }
    match env {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ => configured.to_string(),
    }
}

/// Initialize logging to stderr.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(debug: bool, configured: &str) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(debug, env.as_deref(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins() {
        assert_eq!(filter_directive(true, Some("warn"), "info"), "debug");
    }

    #[test]
    fn env_overrides_config() {
        assert_eq!(filter_directive(false, Some("jobreplay=trace"), "info"), "jobreplay=trace");
    }

    #[test]
    fn blank_env_falls_back_to_config() {
        assert_eq!(filter_directive(false, Some("  "), "warn"), "warn");
        assert_eq!(filter_directive(false, None, "error"), "error");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false, "info");
        init(true, "info");
    }
}
