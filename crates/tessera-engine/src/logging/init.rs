use std::sync::Once;

/// Filter used when neither the config nor `RUST_LOG` provides one.
///
/// The graphics stack logs validation chatter at `info`; keep it at `warn`.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "debug",
/// "tessera_engine=trace,wgpu_core=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter this config resolves to: explicit, then `RUST_LOG`, then [`DEFAULT_FILTER`].
    pub fn resolve_filter(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok().filter(|f| !f.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; later calls are ignored. Call early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter();

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // Another logger may already be installed (e.g. by a test harness).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized with filter '{filter}'");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let c = LoggingConfig::default().with_filter("trace");
        assert_eq!(c.resolve_filter(), "trace");
    }

    #[test]
    fn default_filter_quiets_graphics_stack() {
        for target in ["wgpu_core=warn", "wgpu_hal=warn", "naga=warn"] {
            assert!(DEFAULT_FILTER.contains(target));
        }
        assert!(DEFAULT_FILTER.starts_with("info"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default().with_filter("warn"));
        init_logging(LoggingConfig::default().with_filter("trace"));
    }
}
