//! Logging and tracing initialization.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Crates whose per-frame diagnostics are enabled by `--verbose`.
const FRAME_LOOP_TARGETS: &[&str] = &[
    "airsketch_processing",
    "airsketch_pipeline",
    "airsketch_render",
];

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(config));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Logging config for the CLI: `verbose` raises the frame-loop crates to
/// `debug` while keeping dependencies at `info`.
pub fn cli_logging_config(verbose: bool, json: bool) -> LoggingConfig {
    let level = if verbose {
        let mut directives: Vec<String> = FRAME_LOOP_TARGETS
            .iter()
            .map(|target| format!("{target}=debug"))
            .collect();
        directives.push("info".to_string());
        directives.join(",")
    } else {
        "info".to_string()
    };
    LoggingConfig { level, json }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.level).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {:?} ({e}); falling back to info", config.level);
        EnvFilter::new("info")
    })
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_frame_loop_targets() {
        let config = cli_logging_config(true, false);
        assert!(config.level.contains("airsketch_processing=debug"));
        assert!(config.level.ends_with(",info"));
    }

    #[test]
    fn quiet_is_plain_info() {
        let config = cli_logging_config(false, true);
        assert_eq!(config.level, "info");
        assert!(config.json);
    }
}
