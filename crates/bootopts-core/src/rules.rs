//! Cross-option consistency rules.
//!
//! Rules run after every option has been resolved individually, against the
//! not-yet-published snapshot. A failing rule aborts resolution with
//! `OptionsError::ConsistencyViolation` naming every option involved.

use std::fmt;
use std::sync::Arc;

use crate::resolved::ResolvedConfiguration;
use crate::value::OptionValue;
use crate::{OptionsError, OptionsResult};

/// A check spanning several options.
pub trait ConsistencyRule: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Identifiers the rule reads; each must be declared in the table.
    fn options(&self) -> Vec<&str>;

    /// Check the resolved values.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::ConsistencyViolation` when the values conflict.
    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()>;
}

fn numeric(value: &OptionValue) -> Option<i128> {
    match value {
        OptionValue::Int(v) => Some(i128::from(*v)),
        OptionValue::UInt(v) => Some(i128::from(*v)),
        _ => None,
    }
}

fn read_numeric(config: &ResolvedConfiguration, id: &str) -> OptionsResult<i128> {
    let value = config.get(id)?;
    numeric(value).ok_or_else(|| {
        OptionsError::type_mismatch(id, "consistency rule", value.to_string(), "number")
    })
}

/// The elements of a list option must not add up to more than a total.
///
/// Only enforced when a source supplied both options; an explicit mismatch
/// is an error, never a silent override. With
/// [`against_defaults`](Self::against_defaults) a supplied list is also
/// checked against a defaulted total.
#[derive(Debug, Clone)]
pub struct SumWithinTotal {
    parts: String,
    total: String,
    against_defaults: bool,
}

impl SumWithinTotal {
    /// `sum(parts) <= total`.
    pub fn new(parts: impl Into<String>, total: impl Into<String>) -> Self {
        Self {
            parts: parts.into(),
            total: total.into(),
            against_defaults: false,
        }
    }

    /// Enforce whenever `parts` was supplied, even if `total` is a default.
    #[must_use]
    pub fn against_defaults(mut self) -> Self {
        self.against_defaults = true;
        self
    }
}

impl ConsistencyRule for SumWithinTotal {
    fn name(&self) -> &str {
        "sum_within_total"
    }

    fn options(&self) -> Vec<&str> {
        vec![self.parts.as_str(), self.total.as_str()]
    }

    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()> {
        if !config.is_supplied(&self.parts)?
            || !(self.against_defaults || config.is_supplied(&self.total)?)
        {
            return Ok(());
        }

        let parts = config.get_u64_list(&self.parts)?;
        let sum: u128 = parts.iter().map(|v| u128::from(*v)).sum();
        let total = read_numeric(config, &self.total)?;

        if i128::try_from(sum).map_or(true, |sum| sum > total) {
            return Err(OptionsError::consistency(
                [self.parts.as_str(), self.total.as_str()],
                format!(
                    "{} sums to {sum}, which exceeds {} = {total}",
                    self.parts, self.total
                ),
            ));
        }
        Ok(())
    }
}

/// A count option must equal the length of a list option.
///
/// Only enforced when a source supplied both options, unless
/// [`against_defaults`](Self::against_defaults) is set.
#[derive(Debug, Clone)]
pub struct LengthMatches {
    list: String,
    count: String,
    against_defaults: bool,
}

impl LengthMatches {
    /// `len(list) == count`.
    pub fn new(list: impl Into<String>, count: impl Into<String>) -> Self {
        Self {
            list: list.into(),
            count: count.into(),
            against_defaults: false,
        }
    }

    /// Enforce whenever `list` was supplied, even if `count` is a default.
    #[must_use]
    pub fn against_defaults(mut self) -> Self {
        self.against_defaults = true;
        self
    }
}

impl ConsistencyRule for LengthMatches {
    fn name(&self) -> &str {
        "length_matches"
    }

    fn options(&self) -> Vec<&str> {
        vec![self.list.as_str(), self.count.as_str()]
    }

    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()> {
        if !config.is_supplied(&self.list)?
            || !(self.against_defaults || config.is_supplied(&self.count)?)
        {
            return Ok(());
        }

        let len = match config.get(&self.list)? {
            OptionValue::StringList(items) => items.len(),
            OptionValue::UIntList(items) => items.len(),
            other => {
                return Err(OptionsError::type_mismatch(
                    &self.list,
                    "consistency rule",
                    other.to_string(),
                    "list",
                ))
            }
        };
        let count = read_numeric(config, &self.count)?;

        if i128::try_from(len).map_or(true, |len| len != count) {
            return Err(OptionsError::consistency(
                [self.list.as_str(), self.count.as_str()],
                format!(
                    "{} has {len} entries but {} = {count}",
                    self.list, self.count
                ),
            ));
        }
        Ok(())
    }
}

/// At most one of a group of options may be set.
///
/// "Set" follows [`OptionValue::is_set`]: `true`, non-empty strings and lists,
/// non-zero numbers.
#[derive(Debug, Clone)]
pub struct AtMostOne {
    options: Vec<String>,
}

impl AtMostOne {
    /// Mutually exclusive group.
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConsistencyRule for AtMostOne {
    fn name(&self) -> &str {
        "at_most_one"
    }

    fn options(&self) -> Vec<&str> {
        self.options.iter().map(String::as_str).collect()
    }

    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()> {
        let mut selected = Vec::new();
        for id in &self.options {
            if config.get(id)?.is_set() {
                selected.push(id.as_str());
            }
        }

        if selected.len() > 1 {
            return Err(OptionsError::consistency(
                selected.iter().copied(),
                format!("{} are mutually exclusive", selected.join(" and ")),
            ));
        }
        Ok(())
    }
}

/// A numeric option must not exceed a ceiling option.
///
/// With `zero_is_unlimited`, a ceiling of zero disables the check.
#[derive(Debug, Clone)]
pub struct NotAbove {
    value: String,
    ceiling: String,
    zero_is_unlimited: bool,
}

impl NotAbove {
    /// `value <= ceiling`.
    pub fn new(value: impl Into<String>, ceiling: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ceiling: ceiling.into(),
            zero_is_unlimited: false,
        }
    }

    /// Treat a zero ceiling as "no ceiling".
    pub fn zero_is_unlimited(mut self) -> Self {
        self.zero_is_unlimited = true;
        self
    }
}

impl ConsistencyRule for NotAbove {
    fn name(&self) -> &str {
        "not_above"
    }

    fn options(&self) -> Vec<&str> {
        vec![self.value.as_str(), self.ceiling.as_str()]
    }

    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()> {
        let ceiling = read_numeric(config, &self.ceiling)?;
        if self.zero_is_unlimited && ceiling == 0 {
            return Ok(());
        }

        let value = read_numeric(config, &self.value)?;
        if value > ceiling {
            return Err(OptionsError::consistency(
                [self.value.as_str(), self.ceiling.as_str()],
                format!(
                    "{} = {value} exceeds {} = {ceiling}",
                    self.value, self.ceiling
                ),
            ));
        }
        Ok(())
    }
}

/// When an option is set, at least one of a group must be set too.
#[derive(Debug, Clone)]
pub struct RequiresAny {
    option: String,
    any_of: Vec<String>,
}

impl RequiresAny {
    /// `option` set implies one of `any_of` set.
    pub fn new<I, S>(option: impl Into<String>, any_of: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            option: option.into(),
            any_of: any_of.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConsistencyRule for RequiresAny {
    fn name(&self) -> &str {
        "requires_any"
    }

    fn options(&self) -> Vec<&str> {
        std::iter::once(self.option.as_str())
            .chain(self.any_of.iter().map(String::as_str))
            .collect()
    }

    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()> {
        if !config.get(&self.option)?.is_set() {
            return Ok(());
        }

        for id in &self.any_of {
            if config.get(id)?.is_set() {
                return Ok(());
            }
        }

        Err(OptionsError::consistency(
            self.options(),
            format!("{} requires one of {}", self.option, self.any_of.join(", ")),
        ))
    }
}

type CheckFn = dyn Fn(&ResolvedConfiguration) -> Result<(), String> + Send + Sync;

/// A rule backed by a closure.
///
/// The closure returns a reason on failure; the error names every option the
/// rule declared.
#[derive(Clone)]
pub struct FnRule {
    name: String,
    options: Vec<String>,
    check: Arc<CheckFn>,
}

impl FnRule {
    /// Create a rule over `options`.
    pub fn new<I, S, F>(name: impl Into<String>, options: I, check: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ResolvedConfiguration) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ConsistencyRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> Vec<&str> {
        self.options.iter().map(String::as_str).collect()
    }

    fn check(&self, config: &ResolvedConfiguration) -> OptionsResult<()> {
        (self.check)(config).map_err(|reason| OptionsError::consistency(self.options(), reason))
    }
}
