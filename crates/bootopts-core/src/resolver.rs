//! The option resolver.
//!
//! Resolution is a single synchronous pass:
//!
//! 1. group candidates by option identifier
//! 2. pick the winning source per option (rank, then source list position)
//! 3. convert the raw value to the option's kind
//! 4. normalize and validate it
//! 5. run cross-option consistency rules
//! 6. publish the snapshot
//!
//! Any failure aborts the pass; a partial configuration is never returned.

use indexmap::IndexMap;

use crate::collector::{Collector, RawCandidate};
use crate::descriptor::OptionDescriptor;
use crate::resolved::{Origin, ResolvedConfiguration, ResolvedEntry};
use crate::rules::ConsistencyRule;
use crate::table::DescriptorTable;
use crate::{OptionsError, OptionsResult};

/// Turns candidate values into a [`ResolvedConfiguration`].
///
/// A resolver borrows its table and owns its rules; build a fresh one per
/// resolution attempt when several run concurrently.
///
/// # Example
///
/// ```
/// use bootopts_core::{
///     Collector, CommandLineSource, DescriptorTable, EnvSource, OptionDescriptor, Resolver,
/// };
///
/// # fn main() -> Result<(), bootopts_core::OptionsError> {
/// let table = DescriptorTable::builder()
///     .register(OptionDescriptor::int("nthreads", 1))?
///     .build();
///
/// let sources = Collector::new()
///     .source(CommandLineSource::new().value("nthreads", "8"))
///     .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS", "4")]));
///
/// let config = Resolver::new(&table).resolve(sources.collect())?;
/// assert_eq!(config.get_i64("nthreads")?, 8);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Resolver<'t> {
    table: &'t DescriptorTable,
    rules: Vec<Box<dyn ConsistencyRule>>,
}

impl<'t> Resolver<'t> {
    /// Create a resolver over a descriptor table, with no consistency rules.
    pub fn new(table: &'t DescriptorTable) -> Self {
        Self {
            table,
            rules: Vec::new(),
        }
    }

    /// Add a consistency rule. Rules run in the order they are added.
    pub fn with_rule(mut self, rule: impl ConsistencyRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Add several boxed consistency rules.
    pub fn with_rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ConsistencyRule>>,
    {
        self.rules.extend(rules);
        self
    }

    /// The descriptor table this resolver reads.
    pub fn table(&self) -> &'t DescriptorTable {
        self.table
    }

    /// Collect from the given sources and resolve.
    pub fn resolve_sources(&self, collector: Collector) -> OptionsResult<ResolvedConfiguration> {
        self.resolve(collector.collect())
    }

    /// Resolve a stream of candidates.
    ///
    /// # Errors
    ///
    /// Returns the first failure, in this order:
    /// - `SourceRead` from the candidate stream
    /// - `UnknownOption` for identifiers from strict sources (or rules) that
    ///   the table does not declare
    /// - `TypeMismatch` / `ValidationFailed` for the first failing option in
    ///   table order
    /// - `ConsistencyViolation` from the first failing rule
    pub fn resolve<I>(&self, candidates: I) -> OptionsResult<ResolvedConfiguration>
    where
        I: IntoIterator<Item = OptionsResult<RawCandidate>>,
    {
        let _span = tracing::debug_span!("resolve_options", options = self.table.len()).entered();

        self.check_rule_options()?;

        let mut grouped: IndexMap<String, Vec<RawCandidate>> = IndexMap::new();
        for candidate in candidates {
            let candidate = candidate?;
            if !self.table.contains(&candidate.option) {
                if candidate.strict {
                    return Err(OptionsError::unknown_option(candidate.option));
                }
                tracing::debug!(
                    option = %candidate.option,
                    origin = %candidate.provenance,
                    "ignoring unknown option from lenient source"
                );
                continue;
            }
            grouped
                .entry(candidate.option.clone())
                .or_default()
                .push(candidate);
        }

        let mut entries = IndexMap::with_capacity(self.table.len());
        for descriptor in self.table {
            let candidates = grouped.swap_remove(descriptor.id()).unwrap_or_default();
            let entry = resolve_option(descriptor, candidates)?;
            match &entry.origin {
                Origin::Default => {
                    tracing::trace!(option = descriptor.id(), value = %entry.value, "using default");
                }
                Origin::Source(provenance) => tracing::debug!(
                    option = descriptor.id(),
                    value = %entry.value,
                    origin = %provenance,
                    "resolved option"
                ),
            }
            entries.insert(descriptor.id().to_string(), entry);
        }

        let config = ResolvedConfiguration::new(entries);
        for rule in &self.rules {
            tracing::trace!(rule = rule.name(), "checking consistency rule");
            rule.check(&config)?;
        }

        tracing::info!(
            options = config.len(),
            supplied = config.supplied().count(),
            "startup options resolved"
        );
        Ok(config)
    }

    fn check_rule_options(&self) -> OptionsResult<()> {
        for rule in &self.rules {
            if let Some(missing) = rule.options().into_iter().find(|id| !self.table.contains(id)) {
                return Err(OptionsError::unknown_option(missing));
            }
        }
        Ok(())
    }
}

// The candidates from the winning source. Never empty.
struct Winning {
    key: (u32, usize),
    first: RawCandidate,
    rest: Vec<RawCandidate>,
}

fn resolve_option(
    descriptor: &OptionDescriptor,
    candidates: Vec<RawCandidate>,
) -> OptionsResult<ResolvedEntry> {
    let mut winning: Option<Winning> = None;
    for candidate in candidates {
        let Some(rank) = descriptor.precedence().rank(&candidate.provenance) else {
            tracing::warn!(
                option = descriptor.id(),
                origin = %candidate.provenance,
                "source may not supply this option; ignoring"
            );
            continue;
        };

        let key = (rank, candidate.provenance.index);
        match winning.as_mut() {
            Some(w) if w.key == key => w.rest.push(candidate),
            Some(w) if w.key < key => {}
            _ => {
                winning = Some(Winning {
                    key,
                    first: candidate,
                    rest: Vec::new(),
                });
            }
        }
    }

    let Some(Winning { first, rest, .. }) = winning else {
        let value = descriptor.check(descriptor.default_value().clone())?;
        return Ok(ResolvedEntry {
            value,
            origin: Origin::Default,
        });
    };

    let kind = descriptor.kind();
    let mismatch = |candidate: &RawCandidate| {
        OptionsError::type_mismatch(
            descriptor.id(),
            candidate.provenance.to_string(),
            candidate.value.to_string(),
            kind.to_string(),
        )
    };
    let convert = |candidate: &RawCandidate| kind.parse(&candidate.value).ok_or_else(|| mismatch(candidate));

    // Lists gather every occurrence in source order; scalars keep the last.
    let mut value = convert(&first)?;
    let mut last = first;
    for candidate in rest {
        if kind.is_list() {
            if !value.extend(convert(&candidate)?) {
                return Err(mismatch(&candidate));
            }
        } else {
            value = convert(&candidate)?;
        }
        last = candidate;
    }

    Ok(ResolvedEntry {
        value: descriptor.check(value)?,
        origin: Origin::Source(last.provenance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AtMostOne, SumWithinTotal};
    use crate::source::{CommandLineSource, EmbedderDefaults, EnvSource, SourceKind};
    use crate::{OptionValue, Validator};

    fn table() -> DescriptorTable {
        DescriptorTable::builder()
            .register_all([
                OptionDescriptor::int("nthreads", 1),
                OptionDescriptor::uint_list("nthreads_per_pool", Vec::new()),
                OptionDescriptor::string_list("cmds"),
                OptionDescriptor::bool("quiet", false),
                OptionDescriptor::uint("opt_level", 2).with_validator(Validator::uint_range(0, 3)),
                OptionDescriptor::string("cookie", "").only_from([SourceKind::CommandLine]),
            ])
            .unwrap()
            .build()
    }

    #[test]
    fn test_defaults_when_nothing_supplied() {
        let table = table();
        let config = Resolver::new(&table).resolve_sources(Collector::new()).unwrap();

        assert_eq!(config.len(), table.len());
        assert_eq!(config.get_i64("nthreads").unwrap(), 1);
        assert_eq!(config.origin("nthreads").unwrap(), &Origin::Default);
    }

    #[test]
    fn test_higher_precedence_wins_regardless_of_list_order() {
        let table = table();
        let sources = Collector::new()
            .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS", "4")]))
            .source(CommandLineSource::new().value("nthreads", "8"));

        let config = Resolver::new(&table).resolve_sources(sources).unwrap();
        assert_eq!(config.get_i64("nthreads").unwrap(), 8);
    }

    #[test]
    fn test_equal_precedence_earlier_source_wins() {
        let table = table();
        let sources = Collector::new()
            .source(EmbedderDefaults::new("first").set("nthreads", 3_i64))
            .source(EmbedderDefaults::new("second").set("nthreads", 5_i64));

        let config = Resolver::new(&table).resolve_sources(sources).unwrap();
        assert_eq!(config.get_i64("nthreads").unwrap(), 3);
        match config.origin("nthreads").unwrap() {
            Origin::Source(provenance) => assert_eq!(provenance.source, "first"),
            Origin::Default => panic!("expected a source origin"),
        }
    }

    #[test]
    fn test_last_occurrence_wins_within_a_source() {
        let table = table();
        let cli = CommandLineSource::new()
            .value("nthreads", "2")
            .value("nthreads", "6");

        let config = Resolver::new(&table)
            .resolve_sources(Collector::new().source(cli))
            .unwrap();
        assert_eq!(config.get_i64("nthreads").unwrap(), 6);
    }

    #[test]
    fn test_list_occurrences_accumulate() {
        let table = table();
        let cli = CommandLineSource::new()
            .value("cmds", "using Foo")
            .value("cmds", "main()");

        let config = Resolver::new(&table)
            .resolve_sources(Collector::new().source(cli))
            .unwrap();
        assert_eq!(config.get_list("cmds").unwrap(), &["using Foo", "main()"]);
    }

    #[test]
    fn test_list_takes_only_winning_source_occurrences() {
        let table = table();
        let env = EnvSource::with_prefix("BOOT").from_vars([("BOOT_CMDS", "env()")]);
        let cli = CommandLineSource::new()
            .value("cmds", "first()")
            .value("cmds", "second()");

        let config = Resolver::new(&table)
            .resolve_sources(Collector::new().source(env).source(cli))
            .unwrap();
        assert_eq!(config.get_list("cmds").unwrap(), &["first()", "second()"]);
        match config.origin("cmds").unwrap() {
            Origin::Source(prov) => assert_eq!(prov.kind, SourceKind::CommandLine),
            Origin::Default => panic!("expected a command-line origin"),
        }
    }

    #[test]
    fn test_flags_read_as_true() {
        let table = table();
        let config = Resolver::new(&table)
            .resolve_sources(Collector::new().source(CommandLineSource::new().flag("quiet")))
            .unwrap();
        assert!(config.get_bool("quiet").unwrap());
    }

    #[test]
    fn test_restricted_option_ignores_other_sources() {
        let table = table();
        let sources = Collector::new()
            .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_COOKIE", "from-env")]));

        let config = Resolver::new(&table).resolve_sources(sources).unwrap();
        assert_eq!(config.get_str("cookie").unwrap(), "");
        assert!(!config.is_supplied("cookie").unwrap());
    }

    #[test]
    fn test_unknown_option_from_strict_source() {
        let table = table();
        let err = Resolver::new(&table)
            .resolve_sources(Collector::new().source(CommandLineSource::new().value("nthread", "2")))
            .unwrap_err();
        assert_eq!(err, OptionsError::unknown_option("nthread"));
    }

    #[test]
    fn test_unknown_option_from_lenient_source_is_skipped() {
        let table = table();
        let sources = Collector::new()
            .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_UNRELATED", "x")]));
        assert!(Resolver::new(&table).resolve_sources(sources).is_ok());
    }

    #[test]
    fn test_type_mismatch_names_option_and_source() {
        let table = table();
        let err = Resolver::new(&table)
            .resolve_sources(Collector::new().source(CommandLineSource::new().value("opt_level", "-1")))
            .unwrap_err();

        match err {
            OptionsError::TypeMismatch {
                option,
                origin,
                value,
                ..
            } => {
                assert_eq!(option, "opt_level");
                assert!(origin.contains("--opt_level"));
                assert_eq!(value, "-1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_failure() {
        let table = table();
        let err = Resolver::new(&table)
            .resolve_sources(Collector::new().source(CommandLineSource::new().value("opt_level", "7")))
            .unwrap_err();
        assert!(matches!(err, OptionsError::ValidationFailed { ref option, .. } if option == "opt_level"));
    }

    #[test]
    fn test_consistency_rule_aborts_resolution() {
        let table = table();
        let resolver = Resolver::new(&table)
            .with_rule(SumWithinTotal::new("nthreads_per_pool", "nthreads"));
        let cli = CommandLineSource::new()
            .value("nthreads", "4")
            .value("nthreads_per_pool", "2,3");

        let err = resolver
            .resolve_sources(Collector::new().source(cli))
            .unwrap_err();
        assert_eq!(err.options(), vec!["nthreads_per_pool", "nthreads"]);
    }

    #[test]
    fn test_rule_over_undeclared_option() {
        let table = table();
        let err = Resolver::new(&table)
            .with_rule(AtMostOne::new(["quiet", "banner"]))
            .resolve_sources(Collector::new())
            .unwrap_err();
        assert_eq!(err, OptionsError::unknown_option("banner"));
    }

    #[test]
    fn test_source_read_error_propagates() {
        let table = table();
        let candidates = vec![Err(OptionsError::source_read("boot.toml", "bad syntax"))];
        let err = Resolver::new(&table).resolve(candidates).unwrap_err();
        assert!(matches!(err, OptionsError::SourceRead { .. }));
    }

    #[test]
    fn test_typed_embedder_value() {
        let table = table();
        let sources = Collector::new()
            .source(EmbedderDefaults::new("host").set("nthreads_per_pool", vec![3_u64, 1]));
        let config = Resolver::new(&table).resolve_sources(sources).unwrap();
        assert_eq!(config.get("nthreads_per_pool").unwrap(), &OptionValue::UIntList(vec![3, 1]));
    }
}
