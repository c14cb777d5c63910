//! Startup options of a language runtime, declared for `bootopts-core`.
//!
//! This crate provides:
//! - [`runtime_table`] - the process-wide option table (built once)
//! - [`runtime_rules`] - consistency rules between runtime options
//! - [`runtime_env_source`] - `BOOT_*` environment variables and aliases
//! - [`RuntimeOptions`] - a typed, owned view for the bootstrap code
//!
//! # Example
//!
//! ```
//! use bootopts_core::{Collector, CommandLineSource, Resolver};
//! use bootopts_runtime::{runtime_rules, runtime_table, RuntimeOptions, Switch};
//!
//! # fn main() -> Result<(), bootopts_core::OptionsError> {
//! let cli = CommandLineSource::new()
//!     .value("nthreads", "4")
//!     .value("banner", "no");
//!
//! let config = Resolver::new(runtime_table()?)
//!     .with_rules(runtime_rules())
//!     .resolve_sources(Collector::new().source(cli))?;
//!
//! let options = RuntimeOptions::from_resolved(&config)?;
//! assert_eq!(options.nthreads, 4);
//! assert_eq!(options.banner, Switch::No);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod choices;
mod env;
mod options;
mod rules;
mod schema;

pub use choices::{CheckBounds, CompileMode, CompiledModules, DepWarn, Switch, Tracking, TrimMode};
pub use env::{runtime_env_source, ENV_ALIASES, ENV_PREFIX};
pub use options::RuntimeOptions;
pub use rules::runtime_rules;
pub use schema::{build_runtime_table, runtime_table, ALL_OUTPUTS, MAX_THREADS, NATIVE_OUTPUTS};
