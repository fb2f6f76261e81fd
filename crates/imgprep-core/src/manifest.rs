//! Dataset manifest produced by the fetch stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Required keys, each with the spellings accepted on disk.
const REQUIRED_KEYS: &[(&str, &[&str])] = &[
    ("categories", &["categories"]),
    ("label_index", &["label_index", "index"]),
    ("row_file", &["row_file", "file"]),
    ("asset_root", &["asset_root", "data"]),
];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("manifest {} is missing required key `{key}`", path.display())]
    MissingKey { path: PathBuf, key: &'static str },
}

/// Label vocabulary plus the locations of the row file and asset folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub categories: Vec<String>,
    #[serde(alias = "index")]
    pub label_index: BTreeMap<String, u32>,
    /// Relative to the directory holding the manifest.
    #[serde(alias = "file")]
    pub row_file: PathBuf,
    /// Relative to the data directory.
    #[serde(alias = "data")]
    pub asset_root: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ManifestError::Read { path: path.to_path_buf(), source: e }),
        };
        Self::from_slice(path, &bytes)
    }

    fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self, ManifestError> {
        let malformed = |reason: String| ManifestError::Malformed { path: path.to_path_buf(), reason };

        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let Some(object) = value.as_object() else {
            return Err(malformed("top-level value must be an object".to_string()));
        };

        for &(key, spellings) in REQUIRED_KEYS {
            if !spellings.iter().any(|s| object.contains_key(*s)) {
                return Err(ManifestError::MissingKey { path: path.to_path_buf(), key });
            }
        }

        let manifest: Self = serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        if manifest.label_index.is_empty() {
            return Err(malformed("label index must not be empty".to_string()));
        }
        Ok(manifest)
    }

    /// Resolve a raw row label to its integer index.
    ///
    /// Category names are looked up in the label index. A bare integer is
    /// accepted when it is one of the indices the manifest defines.
    #[must_use]
    pub fn resolve_label(&self, raw: &str) -> Option<u32> {
        let raw = raw.trim();
        if let Some(idx) = self.label_index.get(raw) {
            return Some(*idx);
        }
        raw.parse::<u32>().ok().filter(|idx| self.label_index.values().any(|v| v == idx))
    }

    /// Manifest entries as `(key, value)` pairs for logging.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("categories", self.categories.join(", ")),
            (
                "label_index",
                self.label_index.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(", "),
            ),
            ("row_file", self.row_file.display().to_string()),
            ("asset_root", self.asset_root.display().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(temp: &TempDir, content: &str) -> PathBuf {
        let path = temp.path().join("fetch.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_fetch_stage_keys() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            r#"{"categories": ["tacos", "burrito"], "index": {"tacos": 0, "burrito": 1}, "file": "prepped.csv", "data": "train"}"#,
        );

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.categories, vec!["tacos", "burrito"]);
        assert_eq!(manifest.label_index.get("burrito"), Some(&1));
        assert_eq!(manifest.row_file, PathBuf::from("prepped.csv"));
        assert_eq!(manifest.asset_root, PathBuf::from("train"));
    }

    #[test]
    fn test_load_canonical_keys() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            r#"{"categories": ["a"], "label_index": {"a": 0}, "row_file": "rows.csv", "asset_root": "images"}"#,
        );
        assert!(Manifest::load(&path).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Manifest::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }

    #[test]
    fn test_load_empty_file_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "");
        assert!(matches!(Manifest::load(&path).unwrap_err(), ManifestError::Malformed { .. }));
    }

    #[test]
    fn test_load_non_object_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "[1, 2, 3]");
        assert!(matches!(Manifest::load(&path).unwrap_err(), ManifestError::Malformed { .. }));
    }

    #[test]
    fn test_load_missing_key() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, r#"{"categories": ["a"], "index": {"a": 0}, "data": "train"}"#);
        match Manifest::load(&path).unwrap_err() {
            ManifestError::MissingKey { key, .. } => assert_eq!(key, "row_file"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_empty_label_index() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, r#"{"categories": [], "index": {}, "file": "rows.csv", "data": "train"}"#);
        assert!(matches!(Manifest::load(&path).unwrap_err(), ManifestError::Malformed { .. }));
    }

    #[test]
    fn test_resolve_label() {
        let manifest = Manifest {
            categories: vec!["tacos".to_string(), "burrito".to_string()],
            label_index: BTreeMap::from([("tacos".to_string(), 0), ("burrito".to_string(), 1)]),
            row_file: PathBuf::from("rows.csv"),
            asset_root: PathBuf::from("train"),
        };

        assert_eq!(manifest.resolve_label("burrito"), Some(1));
        assert_eq!(manifest.resolve_label(" 0 "), Some(0));
        assert_eq!(manifest.resolve_label("7"), None);
        assert_eq!(manifest.resolve_label("pizza"), None);
    }
}
