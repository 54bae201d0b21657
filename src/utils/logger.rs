//! Logging utilities
//!
//! Configures the tracing subscriber used for diagnostics. Step progress is
//! printed separately through [`crate::output`].

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
}

impl LogLevel {
    /// Level selected by the `--enable-logging` flag
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        }
    }

    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Warn => Level::WARN,
        }
    }

    /// Filter directive scoped to this crate
    pub fn directive(self) -> String {
        format!(
            "api_acceptance_test={}",
            self.to_tracing_level().as_str().to_lowercase()
        )
    }
}

/// Initialize the logger with specified level
///
/// `RUST_LOG` wins over the level when it is set.
pub fn init_logger(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
