//! Option value kinds, typed values and raw source values.
//!
//! Sources hand the resolver [`RawValue`]s; the resolver converts them into
//! [`OptionValue`]s according to the descriptor's [`ValueKind`].

use std::fmt;

use serde::Serialize;

/// The type of value an option holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    UInt,
    /// Unsigned byte count, written with an optional `K`/`M`/`G`/`T` suffix.
    ByteSize,
    /// Free-form string.
    String,
    /// Ordered list of strings.
    StringList,
    /// Ordered list of unsigned integers.
    UIntList,
    /// One of a fixed set of choices, matched case-insensitively.
    Enum(Vec<String>),
}

impl ValueKind {
    /// Create an enumerated kind from its choices.
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(choices.into_iter().map(Into::into).collect())
    }

    /// Whether values of this kind accumulate across repeated occurrences.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::StringList | Self::UIntList)
    }

    /// Check if a typed value has the shape this kind produces.
    pub fn accepts(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Self::Bool, OptionValue::Bool(_))
            | (Self::Int, OptionValue::Int(_))
            | (Self::UInt | Self::ByteSize, OptionValue::UInt(_))
            | (Self::String, OptionValue::String(_))
            | (Self::StringList, OptionValue::StringList(_))
            | (Self::UIntList, OptionValue::UIntList(_)) => true,
            (Self::Enum(choices), OptionValue::String(v)) => choices.contains(v),
            _ => false,
        }
    }

    /// Convert a raw source value into a typed value of this kind.
    ///
    /// Returns `None` when the raw value cannot be read as this kind; the
    /// resolver turns that into a type mismatch naming the option and source.
    pub fn parse(&self, raw: &RawValue) -> Option<OptionValue> {
        match raw {
            RawValue::Flag => match self {
                Self::Bool => Some(OptionValue::Bool(true)),
                _ => None,
            },
            RawValue::Text(text) => self.parse_text(text),
            RawValue::List(items) => match self {
                Self::StringList => Some(OptionValue::StringList(items.clone())),
                Self::UIntList => items
                    .iter()
                    .map(|item| parse_uint(item))
                    .collect::<Option<Vec<_>>>()
                    .map(OptionValue::UIntList),
                _ => match items.as_slice() {
                    [single] => self.parse_text(single),
                    _ => None,
                },
            },
            RawValue::Typed(value) => self.coerce(value),
        }
    }

    fn parse_text(&self, text: &str) -> Option<OptionValue> {
        match self {
            Self::Bool => parse_bool(text).map(OptionValue::Bool),
            Self::Int => text.trim().parse().ok().map(OptionValue::Int),
            Self::UInt => parse_uint(text).map(OptionValue::UInt),
            Self::ByteSize => parse_byte_size(text).map(OptionValue::UInt),
            Self::String => Some(OptionValue::String(text.to_string())),
            Self::StringList => Some(OptionValue::StringList(split_list(text))),
            Self::UIntList => split_list(text)
                .iter()
                .map(|item| parse_uint(item))
                .collect::<Option<Vec<_>>>()
                .map(OptionValue::UIntList),
            Self::Enum(choices) => {
                let wanted = text.trim();
                choices
                    .iter()
                    .find(|choice| choice.eq_ignore_ascii_case(wanted))
                    .map(|choice| OptionValue::String(choice.clone()))
            }
        }
    }

    // Typed values from embedders: integers cross signedness when they fit,
    // enum strings are canonicalised, everything else must match exactly.
    fn coerce(&self, value: &OptionValue) -> Option<OptionValue> {
        match (self, value) {
            (Self::UInt | Self::ByteSize, OptionValue::Int(v)) => {
                u64::try_from(*v).ok().map(OptionValue::UInt)
            }
            (Self::Int, OptionValue::UInt(v)) => i64::try_from(*v).ok().map(OptionValue::Int),
            (Self::Enum(_), OptionValue::String(v)) => self.parse_text(v),
            _ if self.accepts(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("boolean"),
            Self::Int => f.write_str("integer"),
            Self::UInt => f.write_str("unsigned integer"),
            Self::ByteSize => f.write_str("byte size"),
            Self::String => f.write_str("string"),
            Self::StringList => f.write_str("string list"),
            Self::UIntList => f.write_str("unsigned integer list"),
            Self::Enum(choices) => write!(f, "one of [{}]", choices.join(", ")),
        }
    }
}

/// A strongly-typed option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer or byte size.
    UInt(u64),
    /// String or enumerated choice.
    String(String),
    /// List of strings.
    StringList(Vec<String>),
    /// List of unsigned integers.
    UIntList(Vec<u64>),
}

impl OptionValue {
    /// Get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as unsigned integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as string list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(v) => Some(v),
            _ => None,
        }
    }

    /// Get as unsigned integer list.
    pub fn as_u64_list(&self) -> Option<&[u64]> {
        match self {
            Self::UIntList(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value counts as "selected".
    ///
    /// `true`, non-zero numbers, non-empty strings and non-empty lists are
    /// set; `false`, zero, `""` and empty lists are not.
    pub fn is_set(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::UInt(v) => *v != 0,
            Self::String(v) => !v.is_empty(),
            Self::StringList(v) => !v.is_empty(),
            Self::UIntList(v) => !v.is_empty(),
        }
    }

    /// Append another list value of the same shape.
    pub(crate) fn extend(&mut self, other: Self) -> bool {
        match (self, other) {
            (Self::StringList(a), Self::StringList(b)) => a.extend(b),
            (Self::UIntList(a), Self::UIntList(b)) => a.extend(b),
            _ => return false,
        }
        true
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::StringList(v) => f.write_str(&v.join(",")),
            Self::UIntList(v) => {
                let items: Vec<String> = v.iter().map(u64::to_string).collect();
                f.write_str(&items.join(","))
            }
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for OptionValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringList(v)
    }
}

impl From<Vec<u64>> for OptionValue {
    fn from(v: Vec<u64>) -> Self {
        Self::UIntList(v)
    }
}

/// A value as delivered by a source, before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// The option was given without a value (`--quiet`).
    Flag,
    /// Textual value.
    Text(String),
    /// Several textual items (file arrays).
    List(Vec<String>),
    /// Already-typed value supplied by an embedder.
    Typed(OptionValue),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("<flag>"),
            Self::Text(v) => f.write_str(v),
            Self::List(v) => write!(f, "[{}]", v.join(", ")),
            Self::Typed(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<OptionValue> for RawValue {
    fn from(v: OptionValue) -> Self {
        Self::Typed(v)
    }
}

/// Parse a boolean from a string.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a byte count such as `512`, `64K`, `1.5G` or `2TB`.
///
/// Suffixes are binary multiples and case-insensitive. A fraction must come
/// out to a whole number of bytes.
pub fn parse_byte_size(s: &str) -> Option<u64> {
    let text = s.trim();
    if text.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    let text = text
        .strip_suffix(|c: char| c.eq_ignore_ascii_case(&'b'))
        .unwrap_or(text);

    let multiplier: u64 = match text.chars().last()?.to_ascii_lowercase() {
        'k' => 1 << 10,
        'm' => 1 << 20,
        'g' => 1 << 30,
        't' => 1 << 40,
        _ => 1,
    };
    let number = if multiplier == 1 {
        text
    } else {
        &text[..text.len() - 1]
    };
    let number = number.trim();

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier);
    }

    let fractional: f64 = number.parse().ok()?;
    if !fractional.is_finite() || fractional < 0.0 {
        return None;
    }
    let bytes = fractional * multiplier as f64;
    if bytes.fract() > 0.0 || bytes >= u64::MAX as f64 {
        return None;
    }
    Some(bytes as u64)
}

fn parse_uint(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    s.parse().ok()
}

fn split_list(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(',').map(|item| item.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("512"), Some(512));
        assert_eq!(parse_byte_size("64K"), Some(64 * 1024));
        assert_eq!(parse_byte_size("64kb"), Some(64 * 1024));
        assert_eq!(parse_byte_size("2M"), Some(2 * 1024 * 1024));
        assert_eq!(parse_byte_size("1.5G"), Some(3 * 512 * 1024 * 1024));
        assert_eq!(parse_byte_size("1T"), Some(1 << 40));
        assert_eq!(parse_byte_size("16B"), Some(16));
        assert_eq!(parse_byte_size("0.5K"), Some(512));
        assert_eq!(parse_byte_size("2.0"), Some(2));

        assert_eq!(parse_byte_size("1.5"), None);
        assert_eq!(parse_byte_size("0.3K"), None);

        assert_eq!(parse_byte_size("-5"), None);
        assert_eq!(parse_byte_size("-1G"), None);
        assert_eq!(parse_byte_size("lots"), None);
        assert_eq!(parse_byte_size(""), None);
        assert_eq!(parse_byte_size("inf"), None);
        assert_eq!(parse_byte_size("99999999999T"), None);
    }

    #[test]
    fn test_uint_rejects_negative_text() {
        assert_eq!(ValueKind::UInt.parse(&RawValue::from("-5")), None);
        assert_eq!(ValueKind::UInt.parse(&RawValue::from("+5")), None);
        assert_eq!(
            ValueKind::UInt.parse(&RawValue::from(" 42 ")),
            Some(OptionValue::UInt(42))
        );
    }

    #[test]
    fn test_flag_only_reads_as_bool() {
        assert_eq!(ValueKind::Bool.parse(&RawValue::Flag), Some(OptionValue::Bool(true)));
        assert_eq!(ValueKind::Int.parse(&RawValue::Flag), None);
        assert_eq!(ValueKind::String.parse(&RawValue::Flag), None);
    }

    #[test]
    fn test_lists_split_on_commas() {
        assert_eq!(
            ValueKind::UIntList.parse(&RawValue::from("2, 3")),
            Some(OptionValue::UIntList(vec![2, 3]))
        );
        assert_eq!(
            ValueKind::StringList.parse(&RawValue::from("")),
            Some(OptionValue::StringList(Vec::new()))
        );
        assert_eq!(ValueKind::UIntList.parse(&RawValue::from("2,x")), None);
        assert_eq!(
            ValueKind::UIntList.parse(&RawValue::List(vec!["4".into(), "1".into()])),
            Some(OptionValue::UIntList(vec![4, 1]))
        );
    }

    #[test]
    fn test_single_item_list_reads_as_scalar() {
        assert_eq!(
            ValueKind::Int.parse(&RawValue::List(vec!["7".into()])),
            Some(OptionValue::Int(7))
        );
        assert_eq!(
            ValueKind::Int.parse(&RawValue::List(vec!["7".into(), "8".into()])),
            None
        );
    }

    #[test]
    fn test_enum_is_case_insensitive_and_canonical() {
        let kind = ValueKind::choices(["auto", "yes", "no"]);
        assert_eq!(kind.parse(&RawValue::from("YES")), Some(OptionValue::from("yes")));
        assert_eq!(kind.parse(&RawValue::from("sometimes")), None);
        assert_eq!(kind.to_string(), "one of [auto, yes, no]");
    }

    #[test]
    fn test_typed_values_cross_signedness_when_they_fit() {
        assert_eq!(
            ValueKind::UInt.parse(&RawValue::Typed(OptionValue::Int(3))),
            Some(OptionValue::UInt(3))
        );
        assert_eq!(ValueKind::UInt.parse(&RawValue::Typed(OptionValue::Int(-3))), None);
        assert_eq!(
            ValueKind::Int.parse(&RawValue::Typed(OptionValue::UInt(u64::MAX))),
            None
        );
        assert_eq!(ValueKind::Bool.parse(&RawValue::Typed(OptionValue::from("true"))), None);
    }

    #[test]
    fn test_is_set() {
        assert!(OptionValue::Bool(true).is_set());
        assert!(!OptionValue::Bool(false).is_set());
        assert!(!OptionValue::from("").is_set());
        assert!(OptionValue::from("out.o").is_set());
        assert!(!OptionValue::UIntList(Vec::new()).is_set());
        assert!(!OptionValue::UInt(0).is_set());
    }

    #[test]
    fn test_extend_lists() {
        let mut value = OptionValue::StringList(vec!["a".into()]);
        assert!(value.extend(OptionValue::StringList(vec!["b".into()])));
        assert_eq!(value, OptionValue::StringList(vec!["a".into(), "b".into()]));
        assert!(!value.extend(OptionValue::Bool(true)));
    }

    #[test]
    fn test_display() {
        assert_eq!(OptionValue::UIntList(vec![2, 3]).to_string(), "2,3");
        assert_eq!(RawValue::Flag.to_string(), "<flag>");
    }
}
