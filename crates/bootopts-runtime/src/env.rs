//! Environment variables understood by the runtime.

use bootopts_core::EnvSource;

/// Prefix for runtime variables: `BOOT_NTHREADS` supplies `nthreads`.
pub const ENV_PREFIX: &str = "BOOT";

/// Short names accepted alongside the prefixed form.
///
/// When both spellings are present the prefixed one wins.
pub const ENV_ALIASES: [(&str, &str); 4] = [
    ("BOOT_NUM_THREADS", "nthreads"),
    ("BOOT_PROJECT", "project"),
    ("BOOT_CPU_TARGET", "cpu_target"),
    ("BOOT_HEAP_SIZE_HINT", "heap_size_hint"),
];

/// Environment source for the runtime schema, reading the process
/// environment.
pub fn runtime_env_source() -> EnvSource {
    ENV_ALIASES
        .iter()
        .fold(EnvSource::with_prefix(ENV_PREFIX), |env, (var, option)| {
            env.alias(*var, *option)
        })
}
