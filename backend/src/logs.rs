//! Tracing subscriber setup

use std::path::PathBuf;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::BackendError;

/// Log verbosity, lowest to highest priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub log_level: LogLevel,

    /// Log to stdout; when false, logs roll daily into `log_dir`
    pub stdout: bool,

    pub log_dir: PathBuf,

    pub json_format: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            stdout: true,
            log_dir: PathBuf::from("/var/log/servergem"),
            json_format: false,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging(options: LogOptions) -> Result<(), BackendError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    match (options.stdout, options.json_format) {
        (true, true) => registry.with(fmt::layer().json()).try_init(),
        (true, false) => registry.with(fmt::layer()).try_init(),
        (false, json) => {
            let writer = tracing_appender::rolling::daily(&options.log_dir, "servergem.log");
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            if json {
                registry.with(layer.json()).try_init()
            } else {
                registry.with(layer).try_init()
            }
        }
    }
    .map_err(|e| BackendError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
