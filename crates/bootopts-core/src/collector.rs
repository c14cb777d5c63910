//! Source collection.
//!
//! The [`Collector`] owns an ordered list of sources and turns them into a
//! lazy stream of [`RawCandidate`]s. It tags provenance and nothing else;
//! conflicts are the resolver's business.

use std::iter::FusedIterator;

use crate::source::{Provenance, Source};
use crate::value::RawValue;
use crate::OptionsResult;

/// One candidate value for one option, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Option identifier.
    pub option: String,
    /// Raw value.
    pub value: RawValue,
    /// Origin of the value.
    pub provenance: Provenance,
    /// Whether an unknown identifier from this source is an error.
    pub strict: bool,
}

/// Ordered list of sources, highest priority conventionally listed first.
///
/// The list order is also the tie-break: between sources of equal precedence
/// the earlier one wins.
///
/// # Example
///
/// ```
/// use bootopts_core::{Collector, CommandLineSource, EnvSource};
///
/// let candidates: Vec<_> = Collector::new()
///     .source(CommandLineSource::new().value("nthreads", "8"))
///     .source(EnvSource::with_prefix("BOOT").from_vars([("BOOT_NTHREADS", "4")]))
///     .collect()
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(candidates.len(), 2);
/// ```
#[derive(Default)]
pub struct Collector {
    sources: Vec<Box<dyn Source>>,
}

impl Collector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Append an already boxed source.
    pub fn boxed(mut self, source: Box<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no sources were added.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Start the collection pass.
    ///
    /// Sources are read one at a time, in list order, as the returned stream
    /// is consumed. The stream yields at most one error and then ends.
    #[allow(clippy::should_implement_trait)]
    pub fn collect(self) -> Candidates {
        Candidates {
            sources: self.sources.into_iter().enumerate(),
            pending: Vec::new().into_iter(),
            failed: false,
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("Collector").field("sources", &names).finish()
    }
}

/// Lazy, single-pass stream of candidates produced by [`Collector::collect`].
pub struct Candidates {
    sources: std::iter::Enumerate<std::vec::IntoIter<Box<dyn Source>>>,
    pending: std::vec::IntoIter<RawCandidate>,
    failed: bool,
}

impl Iterator for Candidates {
    type Item = OptionsResult<RawCandidate>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(candidate) = self.pending.next() {
                tracing::trace!(
                    option = %candidate.option,
                    origin = %candidate.provenance,
                    value = %candidate.value,
                    "collected candidate"
                );
                return Some(Ok(candidate));
            }
            if self.failed {
                return None;
            }

            let (index, source) = self.sources.next()?;
            let kind = source.kind();
            let name = source.name();
            let precedence = source.precedence();
            let strict = source.is_strict();

            let entries = match source.read() {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::debug!(source = %name, error = %err, "failed to read source");
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            tracing::debug!(
                source = %name,
                kind = %kind,
                precedence,
                entries = entries.len(),
                "read option source"
            );

            self.pending = entries
                .into_iter()
                .map(|entry| {
                    let label = entry.label.unwrap_or_else(|| name.clone());
                    RawCandidate {
                        option: entry.option,
                        value: entry.value,
                        provenance: Provenance::new(kind, name.clone(), label, precedence, index),
                        strict,
                    }
                })
                .collect::<Vec<_>>()
                .into_iter();
        }
    }
}

impl FusedIterator for Candidates {}

impl std::fmt::Debug for Candidates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidates")
            .field("pending", &self.pending.len())
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
