//! End-to-end resolution across every source type.

use std::io::Write;

use bootopts_core::{
    AtMostOne, Collector, CommandLineSource, DescriptorTable, EmbedderDefaults, EnvSource,
    FileFormat, FileSource, OptionDescriptor, OptionsError, Origin, Resolver, SourceKind,
    SumWithinTotal, Validator,
};

fn table() -> DescriptorTable {
    DescriptorTable::builder()
        .register_all([
            OptionDescriptor::int("nthreads", 1).with_validator(Validator::int_range(1, 1024)),
            OptionDescriptor::uint_list("nthreads_per_pool", Vec::new()),
            OptionDescriptor::byte_size("heap_target_increment", 0),
            OptionDescriptor::choice("banner", ["auto", "yes", "no"], "auto"),
            OptionDescriptor::string("project", ""),
            OptionDescriptor::bool("emit_object", false),
            OptionDescriptor::bool("emit_bitcode", false),
            OptionDescriptor::string_list("cmds"),
        ])
        .unwrap()
        .build()
}

fn resolver(table: &DescriptorTable) -> Resolver<'_> {
    Resolver::new(table)
        .with_rule(SumWithinTotal::new("nthreads_per_pool", "nthreads"))
        .with_rule(AtMostOne::new(["emit_object", "emit_bitcode"]))
}

#[test]
fn test_default_used_when_unsupplied() {
    let table = table();
    let config = resolver(&table).resolve_sources(Collector::new()).unwrap();

    assert_eq!(config.get_i64("nthreads").unwrap(), 1);
    assert_eq!(config.get_str("banner").unwrap(), "auto");
    assert!(config.get_list("cmds").unwrap().is_empty());
}

#[test]
fn test_command_line_beats_environment() {
    let table = table();
    let sources = Collector::new()
        .source(CommandLineSource::new().value("nthreads", "8"))
        .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS", "4")]));

    let config = resolver(&table).resolve_sources(sources).unwrap();
    assert_eq!(config.get_i64("nthreads").unwrap(), 8);
}

#[test]
fn test_negative_unsigned_value_is_type_mismatch() {
    let table = table();
    let sources =
        Collector::new().source(CommandLineSource::new().value("heap_target_increment", "-5"));

    let err = resolver(&table).resolve_sources(sources).unwrap_err();
    assert!(matches!(
        err,
        OptionsError::TypeMismatch { ref option, .. } if option == "heap_target_increment"
    ));
}

#[test]
fn test_pool_sizes_exceeding_thread_count() {
    let table = table();
    let sources = Collector::new()
        .source(CommandLineSource::new().value("nthreads", "4"))
        .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS_PER_POOL", "2,3")]));

    let err = resolver(&table).resolve_sources(sources).unwrap_err();
    let options = err.options();
    assert!(options.contains(&"nthreads"));
    assert!(options.contains(&"nthreads_per_pool"));
}

#[test]
fn test_exclusive_outputs_set_by_different_sources() {
    let table = table();
    let sources = Collector::new()
        .source(CommandLineSource::new().flag("emit_object"))
        .source(EmbedderDefaults::new("host").set("emit_bitcode", true));

    let err = resolver(&table).resolve_sources(sources).unwrap_err();
    assert!(matches!(err, OptionsError::ConsistencyViolation { .. }));
    assert_eq!(err.options(), vec!["emit_object", "emit_bitcode"]);
}

#[test]
fn test_every_source_type_together() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "nthreads = 2").unwrap();
    writeln!(file, "heap_target_increment = \"64M\"").unwrap();
    writeln!(file, "project = \"@.\"").unwrap();

    let table = table();
    let sources = Collector::new()
        .source(CommandLineSource::new().value("banner", "no"))
        .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS", "6")]))
        .source(FileSource::new(file.path()))
        .source(EmbedderDefaults::new("host").set("project", "@app"));

    let config = resolver(&table).resolve_sources(sources).unwrap();

    assert_eq!(config.get_str("banner").unwrap(), "no");
    assert_eq!(config.get_i64("nthreads").unwrap(), 6);
    assert_eq!(config.get_u64("heap_target_increment").unwrap(), 64 * 1024 * 1024);
    assert_eq!(config.get_str("project").unwrap(), "@.");

    match config.origin("project").unwrap() {
        Origin::Source(provenance) => assert_eq!(provenance.kind, SourceKind::File),
        Origin::Default => panic!("project should come from the file"),
    }
}

#[test]
fn test_file_overriding_environment_precedence() {
    let table = table();
    let sources = Collector::new()
        .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS", "6")]))
        .source(FileSource::from_string("nthreads = 3", FileFormat::Toml).with_precedence(1));

    let config = resolver(&table).resolve_sources(sources).unwrap();
    assert_eq!(config.get_i64("nthreads").unwrap(), 3);
}

#[test]
fn test_failure_yields_no_configuration() {
    let table = table();
    let sources = Collector::new()
        .source(CommandLineSource::new().value("nthreads", "4").value("banner", "maybe"));

    let err = resolver(&table).resolve_sources(sources).unwrap_err();
    assert!(matches!(err, OptionsError::TypeMismatch { ref option, .. } if option == "banner"));
}

#[test]
fn test_first_error_follows_table_order() {
    let table = table();
    // banner is declared after nthreads, so nthreads is reported.
    let sources = Collector::new().source(
        CommandLineSource::new()
            .value("banner", "maybe")
            .value("nthreads", "0"),
    );

    let err = resolver(&table).resolve_sources(sources).unwrap_err();
    assert!(matches!(err, OptionsError::ValidationFailed { ref option, .. } if option == "nthreads"));
}

#[test]
fn test_unreadable_file_is_surfaced() {
    let table = table();
    let sources = Collector::new()
        .source(CommandLineSource::new().value("nthreads", "4"))
        .source(FileSource::from_string("nthreads = [", FileFormat::Toml));

    let err = resolver(&table).resolve_sources(sources).unwrap_err();
    assert!(matches!(err, OptionsError::SourceRead { .. }));
}

#[test]
fn test_snapshot_covers_whole_table() {
    let table = table();
    let config = resolver(&table)
        .resolve_sources(Collector::new().source(CommandLineSource::new().value("nthreads", "2")))
        .unwrap();

    let ids: Vec<&str> = config.iter().map(|(id, _)| id).collect();
    let declared: Vec<&str> = table.ids().collect();
    assert_eq!(ids, declared);
    assert_eq!(config.supplied().collect::<Vec<_>>(), vec!["nthreads"]);
}
