//! Structured logging for startup resolution.
//!
//! Resolution runs before the runtime's own logging exists, so the embedder
//! may ask bootopts to install a subscriber first. Output goes to stderr so
//! it never mixes with program output.
//!
//! # Example
//!
//! ```rust,ignore
//! use bootopts_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::debug!(option = "nthreads", "resolving");
//! ```

use serde::Deserialize;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "`bootopts_core=debug`").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Environment variable whose value, when set, replaces `level`.
    pub filter_env: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            filter_env: Some(DEFAULT_FILTER_ENV.to_string()),
        }
    }
}

/// Variable consulted for a filter override unless configured otherwise.
pub const DEFAULT_FILTER_ENV: &str = "BOOTOPTS_LOG";

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            ..Self::default()
        }
    }

    /// Logging turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// The filter directive in effect: the override variable if it is set
    /// and non-empty, otherwise `level`.
    pub fn effective_filter(&self) -> String {
        self.filter_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.level.clone())
    }
}

/// Initializes the global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for a bad filter directive and
/// `TelemetryError::LoggingInit` if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.effective_filter())?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    let layer = match config.format {
        LogFormat::Json => base.json().with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a string.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("Invalid log filter {filter:?}: {e}")))
}

/// Field names used by bootopts log events.
pub mod fields {
    /// Option identifier.
    pub const OPTION: &str = "option";

    /// Source name.
    pub const SOURCE: &str = "source";

    /// Candidate provenance ("label (source)").
    pub const ORIGIN: &str = "origin";

    /// Consistency rule name.
    pub const RULE: &str = "rule";

    /// Number of options in a snapshot.
    pub const OPTIONS: &str = "options";

    /// Error field name.
    pub const ERROR: &str = "error";
}

/// Logs a successful startup resolution.
#[macro_export]
macro_rules! log_startup_complete {
    ($options:expr, $supplied:expr) => {
        tracing::info!(
            options = $options,
            supplied = $supplied,
            "Startup configuration ready"
        );
    };
}

/// Logs a failed startup.
#[macro_export]
macro_rules! log_startup_failed {
    ($error:expr) => {
        tracing::error!(error = %$error, "Startup failed");
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "warn");
        assert_eq!(config.filter_env.as_deref(), Some(DEFAULT_FILTER_ENV));
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.span_events);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LogConfig =
            serde_json::from_str(r#"{"level": "trace", "format": "compact"}"#).unwrap();
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.enabled);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result: Result<LogConfig, _> = serde_json::from_str(r#"{"colour": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_effective_filter_without_override() {
        let config = LogConfig {
            filter_env: None,
            level: "bootopts_core=trace".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(config.effective_filter(), "bootopts_core=trace");
    }

    #[test]
    fn test_effective_filter_ignores_unset_variable() {
        let config = LogConfig {
            filter_env: Some("BOOTOPTS_TEST_FILTER_THAT_IS_NEVER_SET".to_string()),
            ..LogConfig::default()
        };
        assert_eq!(config.effective_filter(), "warn");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("bootopts_core=debug,warn").is_ok());

        let err = create_env_filter("bootopts_core=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidConfig(_)));
    }

    #[test]
    fn test_disabled_logging() {
        assert!(init_logging(&LogConfig::disabled()).is_ok());
    }
}
