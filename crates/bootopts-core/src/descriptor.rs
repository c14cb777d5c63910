//! Option descriptors.
//!
//! A descriptor is the static schema of one option: identifier, value kind,
//! default, precedence rule and optional normalizer/validator. Descriptors are
//! assembled with `with_*` chaining and become read-only once registered in a
//! [`DescriptorTable`](crate::DescriptorTable).

use std::fmt;
use std::sync::Arc;

use crate::source::{Provenance, SourceKind};
use crate::value::{OptionValue, ValueKind};
use crate::{OptionsError, OptionsResult};

type ValidateFn = dyn Fn(&OptionValue) -> Result<(), String> + Send + Sync;
type NormalizeFn = dyn Fn(OptionValue) -> OptionValue + Send + Sync;

/// Per-option check run after conversion.
///
/// The closure returns a human-readable reason on rejection.
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    /// Wrap a validation closure.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&OptionValue) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Accept unsigned values within `min..=max`.
    pub fn uint_range(min: u64, max: u64) -> Self {
        Self::new(move |value| match value.as_u64() {
            Some(v) if (min..=max).contains(&v) => Ok(()),
            Some(v) => Err(format!("{v} is outside {min}..={max}")),
            None => Err(format!("expected an unsigned value, got {value}")),
        })
    }

    /// Accept signed values within `min..=max`.
    pub fn int_range(min: i64, max: i64) -> Self {
        Self::new(move |value| match value.as_i64() {
            Some(v) if (min..=max).contains(&v) => Ok(()),
            Some(v) => Err(format!("{v} is outside {min}..={max}")),
            None => Err(format!("expected an integer, got {value}")),
        })
    }

    /// Reject empty strings and empty lists.
    pub fn non_empty() -> Self {
        Self::new(|value| {
            if value.is_set() {
                Ok(())
            } else {
                Err("must not be empty".to_string())
            }
        })
    }

    /// Accept unsigned lists whose every element is within `min..=max`.
    pub fn each_in_range(min: u64, max: u64) -> Self {
        Self::new(move |value| {
            let items = value
                .as_u64_list()
                .ok_or_else(|| format!("expected an unsigned list, got {value}"))?;
            match items.iter().find(|v| !(min..=max).contains(*v)) {
                Some(bad) => Err(format!("element {bad} is outside {min}..={max}")),
                None => Ok(()),
            }
        })
    }

    /// Accept lists with at most `max` elements.
    pub fn max_len(max: usize) -> Self {
        Self::new(move |value| {
            let len = match value {
                OptionValue::StringList(items) => items.len(),
                OptionValue::UIntList(items) => items.len(),
                other => return Err(format!("expected a list, got {other}")),
            };
            if len > max {
                return Err(format!("{len} entries, at most {max} allowed"));
            }
            Ok(())
        })
    }

    /// Run `self`, then `other`.
    pub fn and(self, other: Validator) -> Self {
        Self::new(move |value| {
            self.check(value)?;
            other.check(value)
        })
    }

    /// Run the validator.
    pub fn check(&self, value: &OptionValue) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Per-option rewrite applied after conversion, before validation.
#[derive(Clone)]
pub struct Normalizer(Arc<NormalizeFn>);

impl Normalizer {
    /// Wrap a normalizing closure.
    pub fn new<F>(rewrite: F) -> Self
    where
        F: Fn(OptionValue) -> OptionValue + Send + Sync + 'static,
    {
        Self(Arc::new(rewrite))
    }

    /// Trim surrounding whitespace from strings and list elements.
    pub fn trim() -> Self {
        Self::new(|value| match value {
            OptionValue::String(s) => OptionValue::String(s.trim().to_string()),
            OptionValue::StringList(items) => OptionValue::StringList(
                items.into_iter().map(|s| s.trim().to_string()).collect(),
            ),
            other => other,
        })
    }

    /// Run the normalizer.
    pub fn apply(&self, value: OptionValue) -> OptionValue {
        (self.0)(value)
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Normalizer(..)")
    }
}

/// Which sources may supply an option, and in what order they rank.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrecedenceRule {
    /// Rank sources by their declared precedence (lower wins).
    #[default]
    Standard,
    /// Only these source kinds may supply the option, ranked in listed order.
    Only(Vec<SourceKind>),
}

impl PrecedenceRule {
    /// Rank of a candidate under this rule, or `None` if the rule excludes it.
    pub fn rank(&self, provenance: &Provenance) -> Option<u32> {
        match self {
            Self::Standard => Some(u32::from(provenance.precedence)),
            Self::Only(kinds) => kinds
                .iter()
                .position(|kind| *kind == provenance.kind)
                .and_then(|pos| u32::try_from(pos).ok()),
        }
    }
}

/// Static metadata describing one option.
///
/// # Example
///
/// ```
/// use bootopts_core::{OptionDescriptor, Validator};
///
/// let nthreads = OptionDescriptor::int("nthreads", 1)
///     .with_description("Number of worker threads")
///     .with_validator(Validator::int_range(1, 1024));
///
/// assert_eq!(nthreads.id(), "nthreads");
/// ```
#[derive(Debug, Clone)]
pub struct OptionDescriptor {
    id: String,
    kind: ValueKind,
    default: OptionValue,
    precedence: PrecedenceRule,
    validator: Option<Validator>,
    normalizer: Option<Normalizer>,
    description: String,
}

impl OptionDescriptor {
    /// Create a descriptor from its parts.
    pub fn new(id: impl Into<String>, kind: ValueKind, default: impl Into<OptionValue>) -> Self {
        Self {
            id: id.into(),
            kind,
            default: default.into(),
            precedence: PrecedenceRule::Standard,
            validator: None,
            normalizer: None,
            description: String::new(),
        }
    }

    /// Boolean option.
    pub fn bool(id: impl Into<String>, default: bool) -> Self {
        Self::new(id, ValueKind::Bool, default)
    }

    /// Signed integer option.
    pub fn int(id: impl Into<String>, default: i64) -> Self {
        Self::new(id, ValueKind::Int, default)
    }

    /// Unsigned integer option.
    pub fn uint(id: impl Into<String>, default: u64) -> Self {
        Self::new(id, ValueKind::UInt, default)
    }

    /// Byte-size option (`512M`, `4G`, ...).
    pub fn byte_size(id: impl Into<String>, default: u64) -> Self {
        Self::new(id, ValueKind::ByteSize, default)
    }

    /// String option.
    pub fn string(id: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(id, ValueKind::String, OptionValue::String(default.into()))
    }

    /// String list option, empty by default.
    pub fn string_list(id: impl Into<String>) -> Self {
        Self::new(id, ValueKind::StringList, OptionValue::StringList(Vec::new()))
    }

    /// Unsigned integer list option.
    pub fn uint_list(id: impl Into<String>, default: Vec<u64>) -> Self {
        Self::new(id, ValueKind::UIntList, default)
    }

    /// Enumerated option.
    pub fn choice<I, S>(id: impl Into<String>, choices: I, default: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, ValueKind::choices(choices), default)
    }

    /// Set the help text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the validator.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set the normalizer.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Set the precedence rule.
    pub fn with_precedence(mut self, precedence: PrecedenceRule) -> Self {
        self.precedence = precedence;
        self
    }

    /// Restrict the option to the given source kinds, highest priority first.
    pub fn only_from(self, kinds: impl IntoIterator<Item = SourceKind>) -> Self {
        self.with_precedence(PrecedenceRule::Only(kinds.into_iter().collect()))
    }

    /// Unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value kind.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Default value.
    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    /// Precedence rule.
    pub fn precedence(&self) -> &PrecedenceRule {
        &self.precedence
    }

    /// Help text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Normalize and validate a converted value.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::ValidationFailed` if the validator rejects the
    /// value or the normalizer changed its kind.
    pub fn check(&self, value: OptionValue) -> OptionsResult<OptionValue> {
        let value = match &self.normalizer {
            Some(normalizer) => normalizer.apply(value),
            None => value,
        };

        if !self.kind.accepts(&value) {
            return Err(OptionsError::validation_failed(
                &self.id,
                format!("{value} is not a valid {}", self.kind),
            ));
        }

        if let Some(validator) = &self.validator {
            validator
                .check(&value)
                .map_err(|reason| OptionsError::validation_failed(&self.id, reason))?;
        }

        Ok(value)
    }
}
