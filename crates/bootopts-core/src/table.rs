//! The option descriptor table.

use indexmap::IndexMap;

use crate::descriptor::OptionDescriptor;
use crate::{OptionsError, OptionsResult};

/// Read-only schema of every known option, in registration order.
///
/// Lookup by identifier is O(1). A table is assembled once through
/// [`DescriptorTableBuilder`] and never mutated afterwards; embedders that
/// want a process-wide table keep it behind a `OnceLock`.
///
/// # Example
///
/// ```
/// use bootopts_core::{DescriptorTable, OptionDescriptor};
///
/// # fn main() -> Result<(), bootopts_core::OptionsError> {
/// let table = DescriptorTable::builder()
///     .register(OptionDescriptor::int("nthreads", 1))?
///     .register(OptionDescriptor::bool("quiet", false))?
///     .build();
///
/// assert_eq!(table.describe("nthreads")?.id(), "nthreads");
/// assert!(table.describe("nope").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    descriptors: IndexMap<String, OptionDescriptor>,
}

impl DescriptorTable {
    /// Start building a table.
    #[must_use]
    pub fn builder() -> DescriptorTableBuilder {
        DescriptorTableBuilder::default()
    }

    /// Look up a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::UnknownOption` if the identifier is not declared.
    pub fn describe(&self, id: &str) -> OptionsResult<&OptionDescriptor> {
        self.descriptors
            .get(id)
            .ok_or_else(|| OptionsError::unknown_option(id))
    }

    /// Look up a descriptor without failing.
    pub fn get(&self, id: &str) -> Option<&OptionDescriptor> {
        self.descriptors.get(id)
    }

    /// Check if an option is declared.
    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Number of declared options.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the table declares no options.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterate descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.descriptors.values()
    }

    /// Iterate identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a DescriptorTable {
    type Item = &'a OptionDescriptor;
    type IntoIter = indexmap::map::Values<'a, String, OptionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.values()
    }
}

/// Builder for [`DescriptorTable`].
#[derive(Debug, Default)]
pub struct DescriptorTableBuilder {
    descriptors: IndexMap<String, OptionDescriptor>,
}

impl DescriptorTableBuilder {
    /// Register a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError` if:
    /// - the identifier is empty or already registered
    /// - the default value does not match the descriptor's kind
    /// - the default value is rejected by the descriptor's own validator
    pub fn register(mut self, descriptor: OptionDescriptor) -> OptionsResult<Self> {
        let id = descriptor.id().to_string();

        if id.is_empty() {
            return Err(OptionsError::invalid_descriptor(id, "identifier must not be empty"));
        }
        if self.descriptors.contains_key(&id) {
            return Err(OptionsError::duplicate_option(id));
        }
        if !descriptor.kind().accepts(descriptor.default_value()) {
            return Err(OptionsError::invalid_descriptor(
                id,
                format!(
                    "default {} is not a valid {}",
                    descriptor.default_value(),
                    descriptor.kind()
                ),
            ));
        }
        descriptor
            .check(descriptor.default_value().clone())
            .map_err(|err| OptionsError::invalid_descriptor(&id, format!("default rejected: {err}")))?;

        tracing::trace!(option = %id, kind = %descriptor.kind(), "registered option");
        self.descriptors.insert(id, descriptor);
        Ok(self)
    }

    /// Register several descriptors.
    pub fn register_all<I>(self, descriptors: I) -> OptionsResult<Self>
    where
        I: IntoIterator<Item = OptionDescriptor>,
    {
        descriptors
            .into_iter()
            .try_fold(self, DescriptorTableBuilder::register)
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> DescriptorTable {
        DescriptorTable {
            descriptors: self.descriptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OptionValue, Validator, ValueKind};

    #[test]
    fn test_register_and_describe() {
        let table = DescriptorTable::builder()
            .register(OptionDescriptor::int("nthreads", 1))
            .unwrap()
            .build();

        let def = table.describe("nthreads").unwrap();
        assert_eq!(def.default_value(), &OptionValue::Int(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_describe_unknown() {
        let table = DescriptorTable::builder().build();
        let err = table.describe("nthreads").unwrap_err();
        assert_eq!(err, OptionsError::unknown_option("nthreads"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_registration() {
        let result = DescriptorTable::builder()
            .register(OptionDescriptor::bool("quiet", false))
            .unwrap()
            .register(OptionDescriptor::bool("quiet", true));

        assert!(matches!(result, Err(OptionsError::DuplicateOption { .. })));
    }

    #[test]
    fn test_default_must_match_kind() {
        let result = DescriptorTable::builder().register(OptionDescriptor::new(
            "nthreads",
            ValueKind::UInt,
            OptionValue::from("four"),
        ));
        assert!(matches!(result, Err(OptionsError::InvalidDescriptor { .. })));

        let result = DescriptorTable::builder()
            .register(OptionDescriptor::choice("color", ["yes", "no"], "auto"));
        assert!(matches!(result, Err(OptionsError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_default_must_pass_validator() {
        let result = DescriptorTable::builder().register(
            OptionDescriptor::uint("opt_level", 9).with_validator(Validator::uint_range(0, 3)),
        );
        assert!(matches!(result, Err(OptionsError::InvalidDescriptor { ref option, .. }) if option == "opt_level"));
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let table = DescriptorTable::builder()
            .register_all([
                OptionDescriptor::bool("quiet", false),
                OptionDescriptor::int("nthreads", 1),
                OptionDescriptor::string("project", ""),
            ])
            .unwrap()
            .build();

        let ids: Vec<&str> = table.ids().collect();
        assert_eq!(ids, vec!["quiet", "nthreads", "project"]);
        assert_eq!((&table).into_iter().count(), 3);
    }
}
