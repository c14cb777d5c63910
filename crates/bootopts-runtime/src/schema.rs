//! The runtime's option table.
//!
//! Declaration order is resolution order, so it is also the order in which
//! errors are reported and snapshots are dumped.

use std::sync::OnceLock;

use bootopts_core::{
    DescriptorTable, Normalizer, OptionDescriptor, OptionsResult, SourceKind, Validator,
};

use crate::choices::{
    CheckBounds, CompileMode, CompiledModules, DepWarn, Switch, Tracking, TrimMode,
};

static RUNTIME_TABLE: OnceLock<DescriptorTable> = OnceLock::new();

/// Largest thread count any thread option accepts.
pub const MAX_THREADS: u64 = i16::MAX as u64;

/// The process-wide runtime table, built on first use.
///
/// # Errors
///
/// Returns the table construction error if a descriptor is malformed. A
/// failed build is not cached; the next call tries again.
pub fn runtime_table() -> OptionsResult<&'static DescriptorTable> {
    if let Some(table) = RUNTIME_TABLE.get() {
        return Ok(table);
    }

    let table = build_runtime_table()?;
    tracing::debug!(options = table.len(), "installed runtime option table");
    Ok(RUNTIME_TABLE.get_or_init(|| table))
}

/// Build a fresh copy of the runtime table.
///
/// Most callers want [`runtime_table`]; this is for embedders that extend
/// the schema with options of their own.
pub fn build_runtime_table() -> OptionsResult<DescriptorTable> {
    DescriptorTable::builder()
        .register_all(general())?
        .register_all(threads())?
        .register_all(compilation())?
        .register_all(instrumentation())?
        .register_all(distributed())?
        .register_all(outputs())?
        .register_all(memory())?
        .register_all(signals())
        .map(|builder| builder.build())
}

fn path(id: &str, description: &str) -> OptionDescriptor {
    OptionDescriptor::string(id, "")
        .with_normalizer(Normalizer::trim())
        .with_description(description)
}

fn general() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::bool("quiet", false).with_description("Suppress the startup banner and warnings"),
        OptionDescriptor::choice("banner", Switch::CHOICES.iter().copied(), "auto")
            .with_description("Show the startup banner"),
        OptionDescriptor::string("bindir", "")
            .only_from([SourceKind::Embedder])
            .with_description("Directory holding the runtime executable"),
        OptionDescriptor::string("executable", "")
            .only_from([SourceKind::Embedder])
            .with_description("Path of the runtime executable"),
        OptionDescriptor::string_list("cmds").with_description("Expressions to evaluate, in order"),
        path("image_file", "System image to load"),
        OptionDescriptor::string("cpu_target", "")
            .with_normalizer(Normalizer::trim())
            .with_description("Target CPU for code generation"),
        path("project", "Project environment to activate"),
        path("program_file", "Script to run"),
        OptionDescriptor::bool("isinteractive", false).with_description("Start an interactive session"),
        OptionDescriptor::choice("color", Switch::CHOICES.iter().copied(), "auto")
            .with_description("Colored terminal output"),
        OptionDescriptor::bool("historyfile", true).with_description("Load and save REPL history"),
        OptionDescriptor::bool("startupfile", true).with_description("Run the user startup file"),
    ]
}

fn threads() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::int("nthreads", 1)
            .with_validator(Validator::int_range(1, i64::from(i16::MAX)))
            .with_description("Total worker threads"),
        OptionDescriptor::uint("nthreadpools", 1)
            .with_validator(Validator::uint_range(1, 2))
            .with_description("Number of thread pools"),
        OptionDescriptor::uint_list("nthreads_per_pool", Vec::new())
            .with_validator(Validator::max_len(2).and(Validator::each_in_range(0, MAX_THREADS)))
            .with_description("Threads in each pool, interactive pool first"),
        OptionDescriptor::uint("nmarkthreads", 0)
            .with_validator(Validator::uint_range(0, MAX_THREADS))
            .with_description("GC mark threads (0 picks automatically)"),
        OptionDescriptor::uint("nsweepthreads", 0)
            .with_validator(Validator::uint_range(0, 1))
            .with_description("Concurrent GC sweep threads"),
        OptionDescriptor::uint("nprocs", 0)
            .with_validator(Validator::uint_range(0, u64::from(u32::MAX >> 1)))
            .with_description("Local worker processes to launch"),
        path("machine_file", "Hosts to launch workers on"),
    ]
}

fn compilation() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::choice("compile_enabled", CompileMode::CHOICES.iter().copied(), "yes")
            .with_description("Compiler mode"),
        OptionDescriptor::uint("opt_level", 2)
            .with_validator(Validator::uint_range(0, 3))
            .with_description("Optimization level"),
        OptionDescriptor::uint("opt_level_min", 0)
            .with_validator(Validator::uint_range(0, 3))
            .with_description("Lower bound on per-module optimization level"),
        OptionDescriptor::uint("debug_level", 1)
            .with_validator(Validator::uint_range(0, 2))
            .with_description("Debug info level"),
        OptionDescriptor::choice("check_bounds", CheckBounds::CHOICES.iter().copied(), "default")
            .with_description("Bounds checking policy"),
        OptionDescriptor::choice("depwarn", DepWarn::CHOICES.iter().copied(), "no")
            .with_description("Deprecation warnings"),
        OptionDescriptor::bool("warn_overwrite", false).with_description("Warn on method overwrite"),
        OptionDescriptor::bool("warn_scope", true).with_description("Warn on ambiguous top-level scope"),
        OptionDescriptor::bool("can_inline", true).with_description("Allow inlining"),
        OptionDescriptor::bool("polly", true).with_description("Enable polyhedral optimization"),
        OptionDescriptor::bool("fast_math", false).with_description("Allow unsafe floating point rewrites"),
        OptionDescriptor::bool("use_experimental_features", false),
        OptionDescriptor::bool("use_sysimage_native_code", true)
            .with_description("Use native code from the system image"),
        OptionDescriptor::choice(
            "use_compiled_modules",
            CompiledModules::CHOICES.iter().copied(),
            "yes",
        )
        .with_description("Use precompiled module caches"),
        OptionDescriptor::bool("use_pkgimages", true).with_description("Use native package images"),
        OptionDescriptor::bool("image_codegen", false).with_description("Generate code as if building an image"),
        OptionDescriptor::choice("trim", TrimMode::CHOICES.iter().copied(), "no")
            .with_description("Remove unreachable code from output images"),
    ]
}

fn instrumentation() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::choice("code_coverage", Tracking::CHOICES.iter().copied(), "none")
            .with_description("Count executions of source lines"),
        OptionDescriptor::choice("malloc_log", Tracking::CHOICES.iter().copied(), "none")
            .with_description("Count bytes allocated by source lines"),
        path("tracked_path", "Only track files under this path"),
        path("trace_compile", "Write precompile statements to this file"),
        OptionDescriptor::bool("trace_compile_timing", false)
            .with_description("Include compile times in trace output"),
        path("trace_dispatch", "Write dynamic dispatch statements to this file"),
        OptionDescriptor::bool("task_metrics", false).with_description("Collect per-task timing"),
    ]
}

fn distributed() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::bool("worker", false).with_description("Run as a worker process"),
        OptionDescriptor::string("cookie", "")
            .only_from([SourceKind::CommandLine, SourceKind::Embedder])
            .with_description("Cluster cookie"),
        OptionDescriptor::string("bindto", "")
            .with_normalizer(Normalizer::trim())
            .with_description("Address workers listen on"),
    ]
}

fn outputs() -> Vec<OptionDescriptor> {
    vec![
        path("outputbc", "Write optimized LLVM bitcode"),
        path("outputunoptbc", "Write unoptimized LLVM bitcode"),
        path("outputo", "Write an object file"),
        path("outputasm", "Write assembly"),
        path("outputji", "Write a system image"),
        path("output_code_coverage", "Write coverage data to this file"),
        OptionDescriptor::bool("incremental", false).with_description("Build on top of the loaded image"),
        OptionDescriptor::bool("strip_metadata", false).with_description("Drop docstrings and source locations"),
        OptionDescriptor::bool("strip_ir", false).with_description("Drop IR from output images"),
        OptionDescriptor::bool("permalloc_pkgimg", false),
    ]
}

fn memory() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::byte_size("heap_size_hint", 0)
            .with_description("Collect more aggressively above this heap size"),
        OptionDescriptor::byte_size("hard_heap_limit", 0)
            .with_description("Abort above this heap size (0 means unlimited)"),
        OptionDescriptor::byte_size("heap_target_increment", 0)
            .with_description("Heap growth between collections"),
        OptionDescriptor::bool("gc_sweep_always_full", false),
        OptionDescriptor::int("timeout_for_safepoint_straggler_s", -1)
            .with_validator(Validator::int_range(-1, i64::from(i16::MAX)))
            .with_description("Seconds before reporting a thread stuck outside a safepoint (-1 disables)"),
    ]
}

fn signals() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::bool("handle_signals", true).with_description("Install signal handlers"),
        OptionDescriptor::bool("rr_detach", false),
    ]
}

/// Identifiers of the native output artifacts.
pub const NATIVE_OUTPUTS: [&str; 4] = ["outputo", "outputbc", "outputunoptbc", "outputasm"];

/// Identifiers of every output artifact.
pub const ALL_OUTPUTS: [&str; 5] = ["outputo", "outputbc", "outputunoptbc", "outputasm", "outputji"];
