//! Option sources.
//!
//! A [`Source`] produces zero or more `(identifier, raw value)` entries and is
//! consumed by the read. Built-in sources:
//!
//! - [`CommandLineSource`] - already-tokenized command-line pairs and flags
//! - [`EnvSource`] - prefixed and aliased environment variables
//! - [`FileSource`](crate::FileSource) - TOML or JSON configuration files
//! - [`EmbedderDefaults`] - typed values supplied by the embedding program

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::{OptionValue, RawValue};
use crate::{OptionsError, OptionsResult};

/// The category of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Command-line arguments.
    CommandLine,
    /// Environment variables.
    Environment,
    /// Configuration file.
    File,
    /// Defaults supplied by the embedding program.
    Embedder,
}

impl SourceKind {
    /// Precedence used when a source does not override it (1 is highest).
    pub const fn default_precedence(self) -> u8 {
        match self {
            Self::CommandLine => 1,
            Self::Environment => 2,
            Self::File => 3,
            Self::Embedder => 4,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine => f.write_str("command line"),
            Self::Environment => f.write_str("environment"),
            Self::File => f.write_str("file"),
            Self::Embedder => f.write_str("embedder"),
        }
    }
}

/// Where a candidate value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Category of the source.
    pub kind: SourceKind,
    /// Name of the source (e.g. `environment`, `/etc/boot.toml`).
    pub source: String,
    /// Label of the entry within the source (e.g. `--nthreads`, `BOOT_NTHREADS`).
    pub label: String,
    /// Declared precedence of the source (lower wins).
    pub precedence: u8,
    /// Position of the source in the collector's source list.
    pub index: usize,
}

impl Provenance {
    /// Create a provenance record.
    pub fn new(
        kind: SourceKind,
        source: impl Into<String>,
        label: impl Into<String>,
        precedence: u8,
        index: usize,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
            label: label.into(),
            precedence,
            index,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label == self.source {
            write!(f, "{}", self.label)
        } else {
            write!(f, "{} ({})", self.label, self.source)
        }
    }
}

/// One `(identifier, raw value)` pair produced by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Option identifier.
    pub option: String,
    /// Raw value.
    pub value: RawValue,
    /// Entry label for diagnostics; defaults to the source name.
    pub label: Option<String>,
}

impl SourceEntry {
    /// Create an unlabelled entry.
    pub fn new(option: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            option: option.into(),
            value: value.into(),
            label: None,
        }
    }

    /// Attach a diagnostic label.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A producer of candidate option values.
///
/// Sources are read exactly once; `read` consumes the source.
pub trait Source {
    /// Category of the source.
    fn kind(&self) -> SourceKind;

    /// Name used in provenance and error messages.
    fn name(&self) -> String {
        self.kind().to_string()
    }

    /// Declared precedence (1 is highest).
    fn precedence(&self) -> u8 {
        self.kind().default_precedence()
    }

    /// Whether identifiers unknown to the table are errors.
    ///
    /// Lenient sources (such as the environment) have their unknown entries
    /// skipped instead.
    fn is_strict(&self) -> bool {
        true
    }

    /// Produce the source's entries.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::SourceRead` if the source cannot be read.
    fn read(self: Box<Self>) -> OptionsResult<Vec<SourceEntry>>;
}

/// Command-line values, already split into `(identifier, value)` pairs.
///
/// Tokenizing `argv` is the embedder's job; this source only carries the
/// result.
///
/// # Example
///
/// ```
/// use bootopts_core::CommandLineSource;
///
/// let cli = CommandLineSource::new()
///     .value("nthreads", "8")
///     .flag("quiet");
/// ```
#[derive(Debug, Clone)]
pub struct CommandLineSource {
    entries: Vec<SourceEntry>,
    precedence: u8,
}

impl Default for CommandLineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandLineSource {
    /// Create an empty command-line source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            precedence: SourceKind::CommandLine.default_precedence(),
        }
    }

    /// Create a source from tokenized pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |cli, (key, value)| cli.value(key, value))
    }

    /// Add `--option=value`.
    pub fn value(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        let option = option.into();
        let label = format!("--{option}");
        self.entries
            .push(SourceEntry::new(option, RawValue::Text(value.into())).labelled(label));
        self
    }

    /// Add a bare `--option` flag.
    pub fn flag(mut self, option: impl Into<String>) -> Self {
        let option = option.into();
        let label = format!("--{option}");
        self.entries
            .push(SourceEntry::new(option, RawValue::Flag).labelled(label));
        self
    }

    /// Override the declared precedence.
    pub fn with_precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }
}

impl Source for CommandLineSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CommandLine
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }

    fn read(self: Box<Self>) -> OptionsResult<Vec<SourceEntry>> {
        Ok(self.entries)
    }
}

/// Environment variables mapped to options.
///
/// With prefix `BOOT`, `BOOT_NTHREADS` supplies `nthreads` and
/// `BOOT_GC__FULL` supplies `gc.full`. Explicit aliases map arbitrary variable
/// names; when an alias and a prefixed name target the same option, the
/// prefixed name wins. Empty values are skipped.
///
/// # Example
///
/// ```
/// use bootopts_core::EnvSource;
///
/// let env = EnvSource::with_prefix("BOOT")
///     .alias("BOOT_NUM_THREADS", "nthreads")
///     .from_vars([("BOOT_NTHREADS", "4")]);
/// ```
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: Option<String>,
    aliases: IndexMap<String, String>,
    vars: Option<Vec<(OsString, OsString)>>,
    dotenv: Option<PathBuf>,
    precedence: u8,
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSource {
    /// Create a source with no prefix and no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: None,
            aliases: IndexMap::new(),
            vars: None,
            dotenv: None,
            precedence: SourceKind::Environment.default_precedence(),
        }
    }

    /// Create a source reading `PREFIX_*` variables.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.trim_end_matches('_').to_uppercase()),
            ..Self::new()
        }
    }

    /// Map a variable name to an option.
    pub fn alias(mut self, var: impl Into<String>, option: impl Into<String>) -> Self {
        self.aliases.insert(var.into(), option.into());
        self
    }

    /// Read from an explicit variable list instead of the process environment.
    pub fn from_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Also read `.env` in the working directory.
    ///
    /// See [`with_dotenv_path`](Self::with_dotenv_path).
    pub fn with_dotenv(self) -> Self {
        self.with_dotenv_path(".env")
    }

    /// Also read variables from a dotenv file.
    ///
    /// The file never touches the process environment. Its variables are
    /// read before the real (or explicit) ones, so a real variable wins.
    /// A missing file is not an error.
    pub fn with_dotenv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(path.into());
        self
    }

    /// Override the declared precedence.
    pub fn with_precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }

    // Map a variable name to (option, is_prefixed). Aliases are matched
    // before the prefix so `BOOT_NUM_THREADS` can alias `nthreads`.
    fn option_for(&self, var: &str) -> Option<(String, bool)> {
        if let Some(option) = self.aliases.get(var) {
            return Some((option.clone(), false));
        }
        if let Some(prefix) = &self.prefix {
            if let Some(rest) = var
                .strip_prefix(prefix.as_str())
                .and_then(|r| r.strip_prefix('_'))
            {
                if !rest.is_empty() {
                    return Some((rest.to_lowercase().replace("__", "."), true));
                }
            }
        }
        None
    }
}

impl Source for EnvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }

    fn is_strict(&self) -> bool {
        false
    }

    fn read(mut self: Box<Self>) -> OptionsResult<Vec<SourceEntry>> {
        let mut vars = match &self.dotenv {
            Some(path) => read_dotenv(path)?,
            None => Vec::new(),
        };
        vars.extend(
            self.vars
                .take()
                .unwrap_or_else(|| env::vars_os().collect()),
        );

        let mut mapped = Vec::new();
        for (name, value) in vars {
            let lossy = name.to_string_lossy();
            let Some((option, prefixed)) = self.option_for(&lossy) else {
                continue;
            };

            let (Some(var), Some(text)) = (name.to_str(), value.to_str()) else {
                return Err(OptionsError::source_read(
                    "environment",
                    format!("variable {lossy} is not valid UTF-8"),
                ));
            };

            if text.is_empty() {
                tracing::trace!(var, "skipping empty environment variable");
                continue;
            }

            mapped.push((prefixed, var.to_string(), option, text.to_string()));
        }

        // Process order is unspecified; sort so aliases precede prefixed names
        // and the prefixed name is the last occurrence. The sort is stable, so
        // a dotenv value stays ahead of a real variable with the same name.
        mapped.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        Ok(mapped
            .into_iter()
            .map(|(_, var, option, text)| SourceEntry::new(option, text).labelled(var))
            .collect())
    }
}

fn read_dotenv(path: &std::path::Path) -> OptionsResult<Vec<(OsString, OsString)>> {
    let label = path.display().to_string();
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => return Ok(Vec::new()),
        Err(err) => return Err(OptionsError::source_read(label, err.to_string())),
    };

    let mut vars = Vec::new();
    for item in iter {
        let (name, value) = item.map_err(|err| OptionsError::source_read(&label, err.to_string()))?;
        vars.push((OsString::from(name), OsString::from(value)));
    }
    tracing::debug!(path = %label, count = vars.len(), "read dotenv file");
    Ok(vars)
}

/// Typed defaults supplied by the embedding program.
///
/// # Example
///
/// ```
/// use bootopts_core::EmbedderDefaults;
///
/// let defaults = EmbedderDefaults::new("host app")
///     .set("nthreads", 2_i64)
///     .set("banner", "no");
/// ```
#[derive(Debug, Clone)]
pub struct EmbedderDefaults {
    name: String,
    entries: Vec<SourceEntry>,
    precedence: u8,
}

impl EmbedderDefaults {
    /// Create an empty set of embedder defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            precedence: SourceKind::Embedder.default_precedence(),
        }
    }

    /// Supply a typed value.
    pub fn set(mut self, option: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries
            .push(SourceEntry::new(option, RawValue::Typed(value.into())));
        self
    }

    /// Supply a textual value, converted like any other source's text.
    pub fn text(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .push(SourceEntry::new(option, RawValue::Text(value.into())));
        self
    }

    /// Override the declared precedence.
    pub fn with_precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }
}

impl Source for EmbedderDefaults {
    fn kind(&self) -> SourceKind {
        SourceKind::Embedder
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }

    fn read(self: Box<Self>) -> OptionsResult<Vec<SourceEntry>> {
        Ok(self.entries)
    }
}
