//! The startup pipeline and the bootstrap hand-off.

use bootopts_core::{
    Collector, ConsistencyRule, DescriptorTable, ResolvedConfiguration, Resolver, Source,
};
use bootopts_runtime::{runtime_rules, runtime_table, RuntimeOptions};
use bootopts_telemetry::{init_logging, log_startup_complete, log_startup_failed, LogConfig};

use crate::error::{StartupError, StartupResult};

/// The collaborator that brings the runtime up from a resolved configuration.
///
/// `bootstrap` consumes both the collaborator and the configuration, so the
/// hand-off happens exactly once. Closures taking a
/// [`ResolvedConfiguration`] implement this trait.
pub trait Bootstrap {
    /// What a successful bootstrap produces.
    type Output;

    /// Why bootstrap failed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start the runtime.
    fn bootstrap(self, config: ResolvedConfiguration) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Bootstrap for F
where
    F: FnOnce(ResolvedConfiguration) -> Result<T, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn bootstrap(self, config: ResolvedConfiguration) -> Result<T, E> {
        self(config)
    }
}

/// One startup attempt: a table, its rules, ordered sources and optional
/// logging setup.
///
/// # Example
///
/// ```
/// use bootopts::{CommandLineSource, Startup};
///
/// # fn main() -> Result<(), bootopts::StartupError> {
/// let options = Startup::runtime()?
///     .source(CommandLineSource::new().value("nthreads", "4"))
///     .runtime_options()?;
///
/// assert_eq!(options.nthreads, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Startup<'t> {
    table: &'t DescriptorTable,
    rules: Vec<Box<dyn ConsistencyRule>>,
    sources: Collector,
    logging: Option<LogConfig>,
}

impl Startup<'static> {
    /// Start from the runtime schema and its consistency rules.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Options` if the runtime table cannot be built.
    pub fn runtime() -> StartupResult<Self> {
        Ok(Self::new(runtime_table()?).rules(runtime_rules()))
    }
}

impl<'t> Startup<'t> {
    /// Start from a custom table with no rules and no sources.
    pub fn new(table: &'t DescriptorTable) -> Self {
        Self {
            table,
            rules: Vec::new(),
            sources: Collector::new(),
            logging: None,
        }
    }

    /// Add a consistency rule.
    pub fn rule(mut self, rule: impl ConsistencyRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Add boxed consistency rules.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Box<dyn ConsistencyRule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Append a source. Sources listed earlier win ties.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources = self.sources.source(source);
        self
    }

    /// Install a global log subscriber before resolving.
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Resolve the configuration.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Telemetry` if logging setup fails and
    /// `StartupError::Options` if resolution fails.
    pub fn resolve(self) -> StartupResult<ResolvedConfiguration> {
        if let Some(logging) = &self.logging {
            init_logging(logging)?;
        }

        let _span = tracing::info_span!("startup", sources = self.sources.len()).entered();

        let result = Resolver::new(self.table)
            .with_rules(self.rules)
            .resolve_sources(self.sources);

        match result {
            Ok(config) => {
                log_startup_complete!(config.len(), config.supplied().count());
                Ok(config)
            }
            Err(err) => {
                log_startup_failed!(err);
                Err(err.into())
            }
        }
    }

    /// Resolve and read the result as [`RuntimeOptions`].
    ///
    /// The table must declare every runtime option.
    pub fn runtime_options(self) -> StartupResult<RuntimeOptions> {
        let config = self.resolve()?;
        Ok(RuntimeOptions::from_resolved(&config)?)
    }

    /// Resolve, then hand the configuration to `collaborator`.
    ///
    /// The collaborator runs only when resolution succeeded, and at most once.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or `StartupError::Bootstrap` wrapping the
    /// collaborator's own error.
    pub fn run<B: Bootstrap>(self, collaborator: B) -> StartupResult<B::Output> {
        let config = self.resolve()?;
        collaborator.bootstrap(config).map_err(|err| {
            log_startup_failed!(err);
            StartupError::Bootstrap(Box::new(err))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use bootopts_core::{CommandLineSource, OptionDescriptor, OptionsError, SumWithinTotal};

    use super::*;

    fn table() -> DescriptorTable {
        DescriptorTable::builder()
            .register(OptionDescriptor::int("nthreads", 1))
            .and_then(|b| b.register(OptionDescriptor::uint_list("nthreads_per_pool", Vec::new())))
            .unwrap()
            .build()
    }

    #[derive(Debug, thiserror::Error)]
    #[error("image not found")]
    struct MissingImage;

    #[test]
    fn test_run_hands_off_once() {
        let table = table();
        let calls = Cell::new(0);

        let threads = Startup::new(&table)
            .source(CommandLineSource::new().value("nthreads", "3"))
            .run(|config: ResolvedConfiguration| {
                calls.set(calls.get() + 1);
                config.get_i64("nthreads")
            })
            .unwrap();

        assert_eq!(threads, 3);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_collaborator_not_called_on_failure() {
        let table = table();
        let calls = Cell::new(0);

        let err = Startup::new(&table)
            .rule(SumWithinTotal::new("nthreads_per_pool", "nthreads"))
            .source(
                CommandLineSource::new()
                    .value("nthreads", "2")
                    .value("nthreads_per_pool", "2,2"),
            )
            .run(|_: ResolvedConfiguration| {
                calls.set(calls.get() + 1);
                Ok::<_, OptionsError>(())
            })
            .unwrap_err();

        assert_eq!(calls.get(), 0);
        assert!(matches!(
            err.as_options(),
            Some(OptionsError::ConsistencyViolation { .. })
        ));
    }

    #[test]
    fn test_collaborator_error_is_wrapped() {
        let table = table();
        let err = Startup::new(&table)
            .run(|_: ResolvedConfiguration| Err::<(), _>(MissingImage))
            .unwrap_err();

        assert!(matches!(err, StartupError::Bootstrap(_)));
        assert_eq!(err.to_string(), "Bootstrap failed: image not found");
    }

    #[test]
    fn test_disabled_logging_is_accepted() {
        let table = table();
        let config = Startup::new(&table)
            .logging(LogConfig::disabled())
            .resolve()
            .unwrap();
        assert_eq!(config.get_i64("nthreads").unwrap(), 1);
    }

    #[test]
    fn test_runtime_options_need_runtime_table() {
        let table = table();
        let err = Startup::new(&table).runtime_options().unwrap_err();
        assert!(matches!(
            err.as_options(),
            Some(OptionsError::UnknownOption { .. })
        ));
    }
}
