//! Startup option resolution for language runtimes.
//!
//! A runtime declares its options once in a [`DescriptorTable`], gathers
//! candidate values from an ordered list of sources and resolves them into a
//! single immutable [`ResolvedConfiguration`]:
//!
//! - [`CommandLineSource`] - already-tokenized command-line pairs
//! - [`EnvSource`] - prefixed and aliased environment variables
//! - [`FileSource`] - TOML or JSON configuration files
//! - [`EmbedderDefaults`] - typed values from the embedding program
//!
//! # Resolution
//!
//! For each declared option the resolver picks the candidate from the
//! highest-precedence source (1 is highest, then earliest in the source
//! list), converts it to the option's [`ValueKind`], normalizes and
//! validates it, and falls back to the declared default when no source
//! supplied one. [`ConsistencyRule`]s then check relationships between
//! options. Any failure aborts the whole pass: either every option resolves
//! or an [`OptionsError`] names the first failing option.
//!
//! # Example
//!
//! ```
//! use bootopts_core::{
//!     Collector, CommandLineSource, DescriptorTable, EnvSource, OptionDescriptor, Resolver,
//!     SumWithinTotal,
//! };
//!
//! # fn main() -> Result<(), bootopts_core::OptionsError> {
//! let table = DescriptorTable::builder()
//!     .register(OptionDescriptor::int("nthreads", 1))?
//!     .register(OptionDescriptor::uint_list("nthreads_per_pool", Vec::new()))?
//!     .register(OptionDescriptor::bool("quiet", false))?
//!     .build();
//!
//! let sources = Collector::new()
//!     .source(CommandLineSource::new().value("nthreads", "4").flag("quiet"))
//!     .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS_PER_POOL", "3,1")]));
//!
//! let config = Resolver::new(&table)
//!     .with_rule(SumWithinTotal::new("nthreads_per_pool", "nthreads"))
//!     .resolve_sources(sources)?;
//!
//! assert_eq!(config.get_i64("nthreads")?, 4);
//! assert_eq!(config.get_u64_list("nthreads_per_pool")?, &[3, 1]);
//! assert!(config.get_bool("quiet")?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod collector;
mod descriptor;
mod error;
mod file;
mod resolved;
mod resolver;
mod rules;
mod source;
mod table;
mod value;

pub use collector::{Candidates, Collector, RawCandidate};
pub use descriptor::{Normalizer, OptionDescriptor, PrecedenceRule, Validator};
pub use error::{OptionsError, OptionsResult};
pub use file::{FileFormat, FileSource};
pub use resolved::{Origin, ResolvedConfiguration, ResolvedEntry};
pub use resolver::Resolver;
pub use rules::{
    AtMostOne, ConsistencyRule, FnRule, LengthMatches, NotAbove, RequiresAny, SumWithinTotal,
};
pub use source::{
    CommandLineSource, EmbedderDefaults, EnvSource, Provenance, Source, SourceEntry, SourceKind,
};
pub use table::{DescriptorTable, DescriptorTableBuilder};
pub use value::{parse_bool, parse_byte_size, OptionValue, RawValue, ValueKind};
