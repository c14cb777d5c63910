//! Startup error types.

use bootopts_core::OptionsError;
use bootopts_telemetry::TelemetryError;
use thiserror::Error;

/// Result type for startup.
pub type StartupResult<T> = Result<T, StartupError>;

/// Why startup did not reach or complete the bootstrap hand-off.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Options could not be resolved.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// Logging could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The bootstrap collaborator failed.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StartupError {
    /// The options error, if resolution failed.
    pub fn as_options(&self) -> Option<&OptionsError> {
        match self {
            Self::Options(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_options_error_is_transparent() {
        let err = StartupError::from(OptionsError::unknown_option("nthread"));
        assert_eq!(err.to_string(), OptionsError::unknown_option("nthread").to_string());
        assert!(err.as_options().is_some());
    }

    #[test]
    fn test_bootstrap_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "sys.so missing");
        let err = StartupError::Bootstrap(Box::new(io));

        assert_eq!(err.to_string(), "Bootstrap failed: sys.so missing");
        assert!(err.source().is_some());
        assert!(err.as_options().is_none());
    }
}
