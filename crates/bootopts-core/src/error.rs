//! Resolution error types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type OptionsResult<T> = Result<T, OptionsError>;

/// Errors that can occur while building a descriptor table or resolving options.
///
/// Every variant names the offending option(s).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// The identifier is not declared in the descriptor table.
    #[error("unknown option: {option}")]
    UnknownOption {
        /// The unknown identifier.
        option: String,
    },

    /// A source could not be read (I/O failure, malformed encoding, bad syntax).
    #[error("failed to read source {origin}: {reason}")]
    SourceRead {
        /// Label of the failing source.
        origin: String,
        /// Explanation of the failure.
        reason: String,
    },

    /// A raw value could not be converted to the option's kind.
    #[error("option {option} from {origin}: cannot read {value:?} as {expected}")]
    TypeMismatch {
        /// The option being resolved.
        option: String,
        /// Where the value came from.
        origin: String,
        /// The offending raw value.
        value: String,
        /// The expected value kind.
        expected: String,
    },

    /// A typed value was rejected by the option's validator.
    #[error("invalid value for option {option}: {reason}")]
    ValidationFailed {
        /// The option whose value was rejected.
        option: String,
        /// Explanation from the validator.
        reason: String,
    },

    /// Two or more resolved options contradict each other.
    #[error("inconsistent options [{}]: {reason}", .options.join(", "))]
    ConsistencyViolation {
        /// Every option involved in the conflict.
        options: Vec<String>,
        /// Explanation of the conflict.
        reason: String,
    },

    /// An identifier was registered twice in the same table.
    #[error("option {option} is already registered")]
    DuplicateOption {
        /// The repeated identifier.
        option: String,
    },

    /// A descriptor is malformed (e.g. its default violates its own kind).
    #[error("invalid descriptor for option {option}: {reason}")]
    InvalidDescriptor {
        /// The option being registered.
        option: String,
        /// Explanation of the defect.
        reason: String,
    },
}

impl OptionsError {
    /// Create a new unknown option error.
    pub fn unknown_option(option: impl Into<String>) -> Self {
        Self::UnknownOption {
            option: option.into(),
        }
    }

    /// Create a new source read error.
    pub fn source_read(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceRead {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Create a new type mismatch error.
    pub fn type_mismatch(
        option: impl Into<String>,
        origin: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            option: option.into(),
            origin: origin.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation_failed(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Create a new consistency violation naming the conflicting options.
    pub fn consistency<I, S>(options: I, reason: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ConsistencyViolation {
            options: options.into_iter().map(Into::into).collect(),
            reason: reason.into(),
        }
    }

    /// Create a new duplicate option error.
    pub fn duplicate_option(option: impl Into<String>) -> Self {
        Self::DuplicateOption {
            option: option.into(),
        }
    }

    /// Create a new invalid descriptor error.
    pub fn invalid_descriptor(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// The option identifiers this error refers to, if any.
    pub fn options(&self) -> Vec<&str> {
        match self {
            Self::UnknownOption { option }
            | Self::TypeMismatch { option, .. }
            | Self::ValidationFailed { option, .. }
            | Self::DuplicateOption { option }
            | Self::InvalidDescriptor { option, .. } => vec![option.as_str()],
            Self::ConsistencyViolation { options, .. } => {
                options.iter().map(String::as_str).collect()
            }
            Self::SourceRead { .. } => Vec::new(),
        }
    }
}
