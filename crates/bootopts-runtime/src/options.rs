//! Typed view of a resolved runtime configuration.

use bootopts_core::{OptionsError, OptionsResult, ResolvedConfiguration};
use serde::Serialize;

use crate::choices::{
    CheckBounds, CompileMode, CompiledModules, DepWarn, Switch, Tracking, TrimMode,
};

/// Runtime startup options with Rust types.
///
/// Built from a [`ResolvedConfiguration`] produced over
/// [`runtime_table`](crate::runtime_table). Unset paths are `None`; choices
/// are enums; counts use the narrowest type that holds every accepted value.
/// Field meanings are the option descriptions in the table.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeOptions {
    pub quiet: bool,
    pub banner: Switch,
    pub bindir: Option<String>,
    pub executable: Option<String>,
    pub cmds: Vec<String>,
    pub image_file: Option<String>,
    /// Whether `image_file` came from a source rather than the default.
    pub image_file_specified: bool,
    pub cpu_target: Option<String>,
    pub project: Option<String>,
    pub program_file: Option<String>,
    pub isinteractive: bool,
    pub color: Switch,
    pub historyfile: bool,
    pub startupfile: bool,

    pub nthreads: u16,
    pub nthreadpools: u8,
    pub nthreads_per_pool: Vec<u16>,
    pub nmarkthreads: u16,
    pub nsweepthreads: u8,
    pub nprocs: u32,
    pub machine_file: Option<String>,

    pub compile_enabled: CompileMode,
    pub opt_level: u8,
    pub opt_level_min: u8,
    pub debug_level: u8,
    pub check_bounds: CheckBounds,
    pub depwarn: DepWarn,
    pub warn_overwrite: bool,
    pub warn_scope: bool,
    pub can_inline: bool,
    pub polly: bool,
    pub fast_math: bool,
    pub use_experimental_features: bool,
    pub use_sysimage_native_code: bool,
    pub use_compiled_modules: CompiledModules,
    pub use_pkgimages: bool,
    pub image_codegen: bool,
    pub trim: TrimMode,

    pub code_coverage: Tracking,
    pub malloc_log: Tracking,
    pub tracked_path: Option<String>,
    pub trace_compile: Option<String>,
    pub trace_compile_timing: bool,
    pub trace_dispatch: Option<String>,
    pub task_metrics: bool,

    pub worker: bool,
    pub cookie: Option<String>,
    pub bindto: Option<String>,

    pub outputbc: Option<String>,
    pub outputunoptbc: Option<String>,
    pub outputo: Option<String>,
    pub outputasm: Option<String>,
    pub outputji: Option<String>,
    pub output_code_coverage: Option<String>,
    pub incremental: bool,
    pub strip_metadata: bool,
    pub strip_ir: bool,
    pub permalloc_pkgimg: bool,

    /// Bytes; 0 when unset.
    pub heap_size_hint: u64,
    /// Bytes; 0 means unlimited.
    pub hard_heap_limit: u64,
    /// Bytes; 0 when unset.
    pub heap_target_increment: u64,
    pub gc_sweep_always_full: bool,
    /// `None` when disabled.
    pub timeout_for_safepoint_straggler_s: Option<u16>,

    pub handle_signals: bool,
    pub rr_detach: bool,
}

impl RuntimeOptions {
    /// Read every runtime option out of a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOption` when the configuration was resolved over a
    /// table missing a runtime option and `TypeMismatch` when a value does
    /// not fit its Rust type.
    pub fn from_resolved(config: &ResolvedConfiguration) -> OptionsResult<Self> {
        let r = Reader(config);
        Ok(Self {
            quiet: r.flag("quiet")?,
            banner: r.choice("banner", Switch::from_choice)?,
            bindir: r.path("bindir")?,
            executable: r.path("executable")?,
            cmds: config.get_list("cmds")?.to_vec(),
            image_file: r.path("image_file")?,
            image_file_specified: config.is_supplied("image_file")?,
            cpu_target: r.path("cpu_target")?,
            project: r.path("project")?,
            program_file: r.path("program_file")?,
            isinteractive: r.flag("isinteractive")?,
            color: r.choice("color", Switch::from_choice)?,
            historyfile: r.flag("historyfile")?,
            startupfile: r.flag("startupfile")?,

            nthreads: r.signed("nthreads")?,
            nthreadpools: r.unsigned("nthreadpools")?,
            nthreads_per_pool: r.unsigned_list("nthreads_per_pool")?,
            nmarkthreads: r.unsigned("nmarkthreads")?,
            nsweepthreads: r.unsigned("nsweepthreads")?,
            nprocs: r.unsigned("nprocs")?,
            machine_file: r.path("machine_file")?,

            compile_enabled: r.choice("compile_enabled", CompileMode::from_choice)?,
            opt_level: r.unsigned("opt_level")?,
            opt_level_min: r.unsigned("opt_level_min")?,
            debug_level: r.unsigned("debug_level")?,
            check_bounds: r.choice("check_bounds", CheckBounds::from_choice)?,
            depwarn: r.choice("depwarn", DepWarn::from_choice)?,
            warn_overwrite: r.flag("warn_overwrite")?,
            warn_scope: r.flag("warn_scope")?,
            can_inline: r.flag("can_inline")?,
            polly: r.flag("polly")?,
            fast_math: r.flag("fast_math")?,
            use_experimental_features: r.flag("use_experimental_features")?,
            use_sysimage_native_code: r.flag("use_sysimage_native_code")?,
            use_compiled_modules: r.choice("use_compiled_modules", CompiledModules::from_choice)?,
            use_pkgimages: r.flag("use_pkgimages")?,
            image_codegen: r.flag("image_codegen")?,
            trim: r.choice("trim", TrimMode::from_choice)?,

            code_coverage: r.choice("code_coverage", Tracking::from_choice)?,
            malloc_log: r.choice("malloc_log", Tracking::from_choice)?,
            tracked_path: r.path("tracked_path")?,
            trace_compile: r.path("trace_compile")?,
            trace_compile_timing: r.flag("trace_compile_timing")?,
            trace_dispatch: r.path("trace_dispatch")?,
            task_metrics: r.flag("task_metrics")?,

            worker: r.flag("worker")?,
            cookie: r.path("cookie")?,
            bindto: r.path("bindto")?,

            outputbc: r.path("outputbc")?,
            outputunoptbc: r.path("outputunoptbc")?,
            outputo: r.path("outputo")?,
            outputasm: r.path("outputasm")?,
            outputji: r.path("outputji")?,
            output_code_coverage: r.path("output_code_coverage")?,
            incremental: r.flag("incremental")?,
            strip_metadata: r.flag("strip_metadata")?,
            strip_ir: r.flag("strip_ir")?,
            permalloc_pkgimg: r.flag("permalloc_pkgimg")?,

            heap_size_hint: config.get_u64("heap_size_hint")?,
            hard_heap_limit: config.get_u64("hard_heap_limit")?,
            heap_target_increment: config.get_u64("heap_target_increment")?,
            gc_sweep_always_full: r.flag("gc_sweep_always_full")?,
            timeout_for_safepoint_straggler_s: match config
                .get_i64("timeout_for_safepoint_straggler_s")?
            {
                -1 => None,
                _ => Some(r.signed("timeout_for_safepoint_straggler_s")?),
            },

            handle_signals: r.flag("handle_signals")?,
            rr_detach: r.flag("rr_detach")?,
        })
    }

    /// Whether any output artifact was requested.
    pub fn has_output(&self) -> bool {
        [
            &self.outputo,
            &self.outputbc,
            &self.outputunoptbc,
            &self.outputasm,
            &self.outputji,
        ]
        .iter()
        .any(|output| output.is_some())
    }

    /// Threads per pool, interactive pool first.
    ///
    /// Without an explicit split every thread goes to the default pool and
    /// the interactive pool is empty.
    pub fn pool_sizes(&self) -> Vec<u16> {
        if self.nthreads_per_pool.is_empty() {
            vec![0, self.nthreads]
        } else {
            self.nthreads_per_pool.clone()
        }
    }
}

struct Reader<'a>(&'a ResolvedConfiguration);

impl Reader<'_> {
    fn flag(&self, id: &str) -> OptionsResult<bool> {
        self.0.get_bool(id)
    }

    fn path(&self, id: &str) -> OptionsResult<Option<String>> {
        let value = self.0.get_str(id)?;
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    fn choice<T>(&self, id: &str, parse: impl FnOnce(&str) -> Option<T>) -> OptionsResult<T> {
        let value = self.0.get_str(id)?;
        parse(value).ok_or_else(|| mismatch(id, value, "a known choice"))
    }

    fn signed<T: TryFrom<i64>>(&self, id: &str) -> OptionsResult<T> {
        let value = self.0.get_i64(id)?;
        T::try_from(value).map_err(|_| mismatch(id, value, std::any::type_name::<T>()))
    }

    fn unsigned<T: TryFrom<u64>>(&self, id: &str) -> OptionsResult<T> {
        let value = self.0.get_u64(id)?;
        T::try_from(value).map_err(|_| mismatch(id, value, std::any::type_name::<T>()))
    }

    fn unsigned_list<T: TryFrom<u64>>(&self, id: &str) -> OptionsResult<Vec<T>> {
        self.0
            .get_u64_list(id)?
            .iter()
            .map(|v| T::try_from(*v).map_err(|_| mismatch(id, v, std::any::type_name::<T>())))
            .collect()
    }
}

fn mismatch(id: &str, value: impl ToString, expected: &str) -> OptionsError {
    OptionsError::type_mismatch(id, "runtime options", value.to_string(), expected)
}
