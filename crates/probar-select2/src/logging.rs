//! Tracing subscriber setup for test binaries.
//!
//! The library only emits `tracing` events. Test suites that want to see them
//! call [`init_logging`] once; later calls are no-ops.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted when `RUST_LOG` is unset
pub const LOG_LEVEL_ENV: &str = "PROBAR_SELECT2_LOG";

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "probar_select2=debug")
    pub log_level: Option<String>,
    /// Output format
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Set the fallback filter directive
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Emit JSON events
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| {
                let level = self
                    .log_level
                    .clone()
                    .or_else(|| std::env::var(LOG_LEVEL_ENV).ok())
                    .unwrap_or_else(|| "info".to_string());
                EnvFilter::try_new(level)
            })
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install a global subscriber.
///
/// Returns `false` when a subscriber was already installed, which is the
/// normal case for every test after the first one in a binary.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.filter());
    let installed = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_test_writer()).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_test_writer())
            .try_init(),
    };
    installed.is_ok()
}
