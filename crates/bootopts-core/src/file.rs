//! Configuration file source.
//!
//! Supports TOML (`.toml`) and JSON (`.json`) documents. Nested tables
//! flatten to dotted identifiers (`[gc] full = true` supplies `gc.full`),
//! arrays become list values and every scalar is handed to the resolver as
//! text so files go through the same conversion as the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::source::{Source, SourceEntry, SourceKind};
use crate::value::RawValue;
use crate::{OptionsError, OptionsResult};

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML document.
    Toml,
    /// JSON document.
    Json,
}

impl FileFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        Self::from_name(extension.as_deref()?)
    }

    /// Parse a format name (`toml` or `json`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Origin {
    Path { path: PathBuf, optional: bool },
    Inline { name: String, content: String },
}

/// Options read from a TOML or JSON document.
///
/// # Example
///
/// ```
/// use bootopts_core::{FileFormat, FileSource};
///
/// let file = FileSource::from_string(
///     r#"
///         nthreads = 4
///         nthreads_per_pool = [3, 1]
///     "#,
///     FileFormat::Toml,
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    origin: Origin,
    format: Option<FileFormat>,
    precedence: u8,
}

impl FileSource {
    /// Read options from a file that must exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Path {
                path: path.into(),
                optional: false,
            },
            format: None,
            precedence: SourceKind::File.default_precedence(),
        }
    }

    /// Read options from a file if it exists; a missing file supplies nothing.
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Path {
                path: path.into(),
                optional: true,
            },
            ..Self::new(PathBuf::new())
        }
    }

    /// Read options from an in-memory document.
    pub fn from_string(content: impl Into<String>, format: FileFormat) -> Self {
        Self {
            origin: Origin::Inline {
                name: "<inline>".to_string(),
                content: content.into(),
            },
            format: Some(format),
            precedence: SourceKind::File.default_precedence(),
        }
    }

    /// Force a format instead of detecting it from the extension.
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Override the declared precedence.
    pub fn with_precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }

    fn load(&self) -> OptionsResult<Option<String>> {
        match &self.origin {
            Origin::Inline { content, .. } => Ok(Some(content.clone())),
            Origin::Path { path, optional } => {
                if !path.exists() {
                    if *optional {
                        tracing::debug!(path = %path.display(), "optional options file not found");
                        return Ok(None);
                    }
                    return Err(OptionsError::source_read(
                        path.display().to_string(),
                        "file not found",
                    ));
                }
                fs::read_to_string(path).map(Some).map_err(|e| {
                    OptionsError::source_read(path.display().to_string(), e.to_string())
                })
            }
        }
    }

    fn parse(&self, content: &str) -> OptionsResult<Value> {
        let format = match (&self.format, &self.origin) {
            (Some(format), _) => *format,
            (None, Origin::Path { path, .. }) => FileFormat::from_path(path).ok_or_else(|| {
                OptionsError::source_read(self.name(), "unsupported configuration file format")
            })?,
            (None, Origin::Inline { .. }) => FileFormat::Toml,
        };

        match format {
            FileFormat::Toml => toml::from_str::<toml::Table>(content)
                .map(|table| toml_to_json(toml::Value::Table(table)))
                .map_err(|e| OptionsError::source_read(self.name(), e.to_string())),
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| OptionsError::source_read(self.name(), e.to_string())),
        }
    }
}

impl Source for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn name(&self) -> String {
        match &self.origin {
            Origin::Path { path, .. } => path.display().to_string(),
            Origin::Inline { name, .. } => name.clone(),
        }
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }

    fn read(self: Box<Self>) -> OptionsResult<Vec<SourceEntry>> {
        let Some(content) = self.load()? else {
            return Ok(Vec::new());
        };

        let Value::Object(root) = self.parse(&content)? else {
            return Err(OptionsError::source_read(
                self.name(),
                "top level must be a table",
            ));
        };

        let name = self.name();
        let mut entries = Vec::new();
        for (key, value) in root {
            flatten(&name, key, value, &mut entries)?;
        }
        Ok(entries)
    }
}

fn flatten(
    source: &str,
    key: String,
    value: Value,
    entries: &mut Vec<SourceEntry>,
) -> OptionsResult<()> {
    let raw = match value {
        Value::Null => return Ok(()),
        Value::Object(map) => {
            for (child, value) in map {
                flatten(source, format!("{key}.{child}"), value, entries)?;
            }
            return Ok(());
        }
        Value::Array(items) => RawValue::List(
            items
                .into_iter()
                .map(|item| {
                    scalar_text(item).ok_or_else(|| {
                        OptionsError::source_read(
                            source,
                            format!("{key}: arrays may only contain scalars"),
                        )
                    })
                })
                .collect::<OptionsResult<_>>()?,
        ),
        scalar => match scalar_text(scalar) {
            Some(text) => RawValue::Text(text),
            None => return Ok(()),
        },
    };

    entries.push(SourceEntry::new(key.clone(), raw).labelled(key));
    Ok(())
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::String(f.to_string()),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn read(source: FileSource) -> OptionsResult<Vec<SourceEntry>> {
        Box::new(source).read()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("boot.toml")), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_path(Path::new("BOOT.JSON")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("boot.yaml")), None);
        assert_eq!(FileFormat::from_path(Path::new("boot")), None);
    }

    #[test]
    fn test_toml_flattening() {
        let toml = r#"
            nthreads = 4
            quiet = true
            nthreads_per_pool = [3, 1]

            [gc]
            sweep_always_full = false
        "#;
        let entries = read(FileSource::from_string(toml, FileFormat::Toml)).unwrap();

        let find = |id: &str| entries.iter().find(|e| e.option == id).map(|e| e.value.clone());
        assert_eq!(find("nthreads"), Some(RawValue::from("4")));
        assert_eq!(find("quiet"), Some(RawValue::from("true")));
        assert_eq!(
            find("nthreads_per_pool"),
            Some(RawValue::List(vec!["3".into(), "1".into()]))
        );
        assert_eq!(find("gc.sweep_always_full"), Some(RawValue::from("false")));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{"project": "@.", "cmds": ["println(1)", "exit()"], "cookie": null}"#;
        let entries = read(FileSource::from_string(json, FileFormat::Json)).unwrap();

        assert_eq!(entries.len(), 2);
        let project = entries.iter().find(|e| e.option == "project").unwrap();
        assert_eq!(project.value, RawValue::from("@."));
        assert_eq!(project.label.as_deref(), Some("project"));
    }

    #[test]
    fn test_invalid_toml_is_a_read_error() {
        let err = read(FileSource::from_string("nthreads = ", FileFormat::Toml)).unwrap_err();
        assert!(matches!(err, OptionsError::SourceRead { .. }));
    }

    #[test]
    fn test_json_top_level_must_be_table() {
        let err = read(FileSource::from_string("[1, 2]", FileFormat::Json)).unwrap_err();
        assert!(err.to_string().contains("top level must be a table"));
    }

    #[test]
    fn test_nested_arrays_rejected() {
        let err = read(FileSource::from_string(r#"{"cmds": [[1]]}"#, FileFormat::Json)).unwrap_err();
        assert!(err.to_string().contains("cmds"));
    }

    #[test]
    fn test_missing_file() {
        let err = read(FileSource::new("/nonexistent/boot.toml")).unwrap_err();
        assert!(err.to_string().contains("file not found"));

        let entries = read(FileSource::optional("/nonexistent/boot.toml")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_file_on_disk() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "heap_size_hint = \"2G\"").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.name(), file.path().display().to_string());

        let entries = read(source).unwrap();
        assert_eq!(entries[0].value, RawValue::from("2G"));
    }

    #[test]
    fn test_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "nthreads = 4").unwrap();

        let err = read(FileSource::new(file.path())).unwrap_err();
        assert!(err.to_string().contains("unsupported"));

        let entries = read(FileSource::new(file.path()).with_format(FileFormat::Toml)).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_a_read_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(&[0x6e, 0x3d, 0xff, 0xfe]).unwrap();

        let err = read(FileSource::new(file.path())).unwrap_err();
        assert!(matches!(err, OptionsError::SourceRead { .. }));
    }
}
