//! The resolved configuration snapshot.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::source::Provenance;
use crate::value::OptionValue;
use crate::{OptionsError, OptionsResult};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum Origin {
    /// No source supplied the option; the descriptor default was used.
    Default,
    /// The winning candidate's source.
    Source(Provenance),
}

/// One resolved option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    /// Final typed value.
    pub value: OptionValue,
    /// Where the value came from.
    pub origin: Origin,
}

/// Immutable, fully validated option values, one per declared option.
///
/// Produced by [`Resolver::resolve`](crate::Resolver::resolve) and never
/// mutated afterwards; share it with [`into_shared`](Self::into_shared).
///
/// # Example
///
/// ```
/// use bootopts_core::{Collector, DescriptorTable, OptionDescriptor, Resolver};
///
/// # fn main() -> Result<(), bootopts_core::OptionsError> {
/// let table = DescriptorTable::builder()
///     .register(OptionDescriptor::int("nthreads", 1))?
///     .build();
///
/// let config = Resolver::new(&table).resolve(Collector::new().collect())?;
/// assert_eq!(config.get_i64("nthreads")?, 1);
/// assert!(!config.is_supplied("nthreads")?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedConfiguration {
    entries: IndexMap<String, ResolvedEntry>,
}

impl ResolvedConfiguration {
    pub(crate) fn new(entries: IndexMap<String, ResolvedEntry>) -> Self {
        Self { entries }
    }

    /// Look up a resolved entry.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::UnknownOption` if the option is not in the schema.
    pub fn entry(&self, id: &str) -> OptionsResult<&ResolvedEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| OptionsError::unknown_option(id))
    }

    /// Look up a resolved value.
    pub fn get(&self, id: &str) -> OptionsResult<&OptionValue> {
        self.entry(id).map(|entry| &entry.value)
    }

    /// Where the value of an option came from.
    pub fn origin(&self, id: &str) -> OptionsResult<&Origin> {
        self.entry(id).map(|entry| &entry.origin)
    }

    /// Whether a source supplied the option (as opposed to its default).
    pub fn is_supplied(&self, id: &str) -> OptionsResult<bool> {
        self.origin(id).map(|origin| matches!(origin, Origin::Source(_)))
    }

    /// Get a boolean option.
    pub fn get_bool(&self, id: &str) -> OptionsResult<bool> {
        self.typed(id, "boolean", OptionValue::as_bool)
    }

    /// Get a signed integer option.
    pub fn get_i64(&self, id: &str) -> OptionsResult<i64> {
        self.typed(id, "integer", OptionValue::as_i64)
    }

    /// Get an unsigned integer or byte-size option.
    pub fn get_u64(&self, id: &str) -> OptionsResult<u64> {
        self.typed(id, "unsigned integer", OptionValue::as_u64)
    }

    /// Get a string or enumerated option.
    pub fn get_str(&self, id: &str) -> OptionsResult<&str> {
        self.typed(id, "string", OptionValue::as_str)
    }

    /// Get a string list option.
    pub fn get_list(&self, id: &str) -> OptionsResult<&[String]> {
        self.typed(id, "string list", OptionValue::as_list)
    }

    /// Get an unsigned integer list option.
    pub fn get_u64_list(&self, id: &str) -> OptionsResult<&[u64]> {
        self.typed(id, "unsigned integer list", OptionValue::as_u64_list)
    }

    fn typed<'a, T>(
        &'a self,
        id: &str,
        expected: &str,
        read: impl FnOnce(&'a OptionValue) -> Option<T>,
    ) -> OptionsResult<T> {
        let value = self.get(id)?;
        read(value).ok_or_else(|| {
            OptionsError::type_mismatch(id, "resolved configuration", value.to_string(), expected)
        })
    }

    /// Check if the option is in the schema.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schema was empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(identifier, entry)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Identifiers of options that a source supplied.
    pub fn supplied(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, entry)| matches!(entry.origin, Origin::Source(_)))
            .map(|(id, _)| id)
    }

    /// Render as pretty JSON for diagnostics.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Move into an `Arc` for sharing across threads.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
