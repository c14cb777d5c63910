//! # bootopts
//!
//! **Startup option resolution for language runtimes**
//!
//! bootopts turns the command line, environment, configuration files and
//! embedder defaults into one validated, immutable configuration, then hands
//! it to the code that brings the runtime up:
//!
//! - **Declared options** - every option has a kind, default, validator and
//!   source restrictions
//! - **Deterministic precedence** - command line, then environment, then
//!   file, then embedder; ties go to the earlier source
//! - **All or nothing** - one bad value fails startup with an error naming
//!   the option and where it came from
//! - **Typed hand-off** - [`RuntimeOptions`] for the bundled runtime schema
//!
//! ## Quick Start
//!
//! ```
//! use bootopts::prelude::*;
//!
//! # fn main() -> Result<(), StartupError> {
//! let cli = CommandLineSource::new()
//!     .value("nthreads", "4")
//!     .value("project", "@.");
//!
//! let threads = Startup::runtime()?
//!     .source(cli)
//!     .source(runtime_env_source().from_vars([("BOOT_NTHREADS", "2")]))
//!     .run(|config: ResolvedConfiguration| {
//!         let options = RuntimeOptions::from_resolved(&config)?;
//!         Ok::<_, OptionsError>(options.nthreads)
//!     })?;
//!
//! assert_eq!(threads, 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Sources → Collector → Resolver (table + rules) → ResolvedConfiguration → Bootstrap
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod startup;

pub use error::{StartupError, StartupResult};
pub use startup::{Bootstrap, Startup};

// Re-export the engine
pub use bootopts_core as core;
pub use bootopts_core::{
    CommandLineSource, EmbedderDefaults, EnvSource, FileFormat, FileSource, OptionsError,
    ResolvedConfiguration,
};

// Re-export the runtime schema
pub use bootopts_runtime as runtime;
pub use bootopts_runtime::{runtime_env_source, RuntimeOptions};

// Re-export logging setup
pub use bootopts_telemetry as telemetry;
pub use bootopts_telemetry::{LogConfig, LogFormat};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use bootopts::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Bootstrap, Startup, StartupError, StartupResult};

    // Engine types
    pub use bootopts_core::{
        CommandLineSource, ConsistencyRule, DescriptorTable, EmbedderDefaults, EnvSource,
        FileFormat, FileSource, OptionDescriptor, OptionValue, OptionsError, OptionsResult, Origin,
        ResolvedConfiguration, Source, SourceKind, Validator,
    };

    // Runtime schema
    pub use bootopts_runtime::{runtime_env_source, runtime_rules, runtime_table, RuntimeOptions};

    // Logging
    pub use bootopts_telemetry::{LogConfig, LogFormat};
}
