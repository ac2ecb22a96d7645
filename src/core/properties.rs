//! User-defined document properties stored in a `.meta` side-car

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::error::{StoreError, StoreResult};

/// Extension of the property side-car file
pub const PROPERTIES_EXTENSION: &str = "meta";

/// A scalar property value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Interpret user input: booleans and numbers are recognised, the rest is text
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Self::Bool(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Self::Bool(false)
        } else if let Ok(i) = trimmed.parse::<i64>() {
            Self::Integer(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                Self::Float(f)
            } else {
                Self::Text(input.to_string())
            }
        } else {
            Self::Text(input.to_string())
        }
    }

    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Property map, ordered by key
pub type PropertySet = BTreeMap<String, PropertyValue>;

/// `<dir>/<stem>.meta` for a document path.
///
/// Only the last extension is replaced, so a dotfile such as `.bashrc` keeps
/// its name and gets `.bashrc.meta`.
pub fn properties_path(document_path: &Path) -> PathBuf {
    document_path.with_extension(PROPERTIES_EXTENSION)
}

/// Read the property file. A missing file is an empty set.
pub fn load(path: &Path) -> StoreResult<PropertySet> {
    if !path.exists() {
        return Ok(PropertySet::new());
    }

    let data = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let value: Value = serde_json::from_str(&data).map_err(|e| StoreError::json(path, e))?;
    let Value::Object(object) = value else {
        return Err(StoreError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut properties = PropertySet::new();
    for (key, value) in object {
        match PropertyValue::from_json(value) {
            Some(value) => {
                properties.insert(key, value);
            }
            None => tracing::warn!("Skipping non-scalar property '{}' in {}", key, path.display()),
        }
    }
    Ok(properties)
}

/// Write the set as a JSON object, or remove the file when the set is empty
pub fn save(path: &Path, properties: &PropertySet) -> StoreResult<()> {
    if properties.is_empty() {
        return match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        };
    }

    let content =
        serde_json::to_string_pretty(properties).map_err(|e| StoreError::json(path, e))?;
    fs::write(path, content).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_path() {
        assert_eq!(
            properties_path(Path::new("/docs/report.final.html")),
            PathBuf::from("/docs/report.final.meta")
        );
        assert_eq!(
            properties_path(Path::new("/docs/README")),
            PathBuf::from("/docs/README.meta")
        );
    }

    #[test]
    fn test_properties_path_for_dotfile() {
        assert_eq!(
            properties_path(Path::new("/home/user/.bashrc")),
            PathBuf::from("/home/user/.bashrc.meta")
        );
        assert_eq!(
            properties_path(Path::new("/home/user/.notes.txt")),
            PathBuf::from("/home/user/.notes.meta")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.meta");

        let mut props = PropertySet::new();
        props.insert("Author".into(), "Alice".into());
        props.insert("Pages".into(), 12i64.into());
        props.insert("Draft".into(), true.into());
        props.insert("Score".into(), 4.5.into());
        save(&path, &props).unwrap();

        assert_eq!(load(&path).unwrap(), props);
    }

    #[test]
    fn test_save_empty_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.meta");
        fs::write(&path, "{}").unwrap();

        save(&path, &PropertySet::new()).unwrap();
        assert!(!path.exists());
        // Already gone is fine too
        save(&path, &PropertySet::new()).unwrap();
    }

    #[test]
    fn test_load_skips_non_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.meta");
        fs::write(&path, r#"{"Title": "T", "Tags": ["a"], "Empty": null}"#).unwrap();

        let props = load(&path).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props["Title"], PropertyValue::from("T"));
    }

    #[test]
    fn test_load_rejects_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.meta");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(StoreError::Json { .. })));

        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(load(&path), Err(StoreError::NotAnObject { .. })));
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(PropertyValue::parse("TRUE"), PropertyValue::Bool(true));
        assert_eq!(PropertyValue::parse("42"), PropertyValue::Integer(42));
        assert_eq!(PropertyValue::parse("2.5"), PropertyValue::Float(2.5));
        assert_eq!(PropertyValue::parse("Alice"), PropertyValue::from("Alice"));
        assert_eq!(PropertyValue::parse("inf"), PropertyValue::from("inf"));
    }
}
