//! Logging setup for bootopts.
//!
//! The resolution engine only emits `tracing` events; this crate installs a
//! subscriber for embedders that do not have one yet:
//!
//! - **JSON** output for production
//! - **Pretty** or **compact** output for development
//! - Filter overrides through an environment variable (`BOOTOPTS_LOG`)
//!
//! # Example
//!
//! ```rust,ignore
//! use bootopts_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```
//!
//! Log levels used by the engine:
//!
//! | Level | Events |
//! |-------|--------|
//! | `info` | resolution finished |
//! | `warn` | candidate ignored by an option's source restriction |
//! | `debug` | source read, option resolved, lenient unknown skipped |
//! | `trace` | every candidate, defaults, rule checks |

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
