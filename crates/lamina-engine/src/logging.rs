//! Logger bootstrap for hosts embedding the engine.
//!
//! The crate itself only speaks the `log` facade; this module wires that
//! facade to `env_logger` for binaries that have no logger of their own.
//! Hosts with an existing logger setup should skip it entirely.

use std::sync::Once;

/// How the global logger gets configured.
///
/// An explicit `filter` wins; otherwise `RUST_LOG` is consulted, and the
/// fallback level applies when neither is present. Filter strings use the
/// `env_logger` directive syntax, e.g. `"lamina_engine::scene=trace"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub fallback_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            fallback_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Config with a fixed filter string, ignoring `RUST_LOG`.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

static INSTALL: Once = Once::new();

/// Installs the global logger. Safe to call more than once; only the first
/// call takes effect.
pub fn init_logging(config: LoggingConfig) {
    INSTALL.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let directives = config
            .filter
            .or_else(|| std::env::var("RUST_LOG").ok());
        match directives {
            Some(directives) => {
                builder.parse_filters(&directives);
            }
            None => {
                builder.filter_level(config.fallback_level);
            }
        }

        builder.write_style(config.write_style);
        builder.init();
    });
}
