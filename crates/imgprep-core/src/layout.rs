use crate::error::PrepResult;
use crate::manifest::Manifest;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "fetch.json";
pub const CONTAINER_FILE_NAME: &str = "images.records";
pub const SUMMARY_FILE_NAME: &str = "images.summary.json";

/// Filesystem layout for one prep run.
///
/// - `data_dir`: root of the asset store; the manifest's `asset_root` is relative to it
/// - `output_dir`: output of the fetch stage, holding `fetch.json` and the row file
/// - `target_dir`: where the container and its summary are written
#[derive(Debug, Clone)]
pub struct PrepLayout {
    data_dir: PathBuf,
    output_dir: PathBuf,
    target_dir: PathBuf,
}

impl PrepLayout {
    #[must_use]
    pub fn new(data_dir: PathBuf, output_dir: PathBuf, target_dir: PathBuf) -> Self {
        Self { data_dir, output_dir, target_dir }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE_NAME)
    }

    #[must_use]
    pub fn row_file_path(&self, manifest: &Manifest) -> PathBuf {
        self.output_dir.join(&manifest.row_file)
    }

    #[must_use]
    pub fn asset_root(&self, manifest: &Manifest) -> PathBuf {
        self.data_dir.join(&manifest.asset_root)
    }

    #[must_use]
    pub fn container_path(&self) -> PathBuf {
        self.target_dir.join(CONTAINER_FILE_NAME)
    }

    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.target_dir.join(SUMMARY_FILE_NAME)
    }

    pub fn ensure_target_dir(&self) -> PrepResult<()> {
        std::fs::create_dir_all(&self.target_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = PrepLayout::new(PathBuf::from("data"), PathBuf::from("out"), PathBuf::from("target"));
        let manifest = Manifest {
            categories: vec!["a".to_string()],
            label_index: BTreeMap::from([("a".to_string(), 0)]),
            row_file: PathBuf::from("rows.csv"),
            asset_root: PathBuf::from("train"),
        };

        assert_eq!(layout.manifest_path(), PathBuf::from("out/fetch.json"));
        assert_eq!(layout.row_file_path(&manifest), PathBuf::from("out/rows.csv"));
        assert_eq!(layout.asset_root(&manifest), PathBuf::from("data/train"));
        assert_eq!(layout.container_path(), PathBuf::from("target/images.records"));
    }

    #[test]
    fn test_ensure_target_dir() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a").join("b");
        let layout = PrepLayout::new(temp.path().to_path_buf(), temp.path().to_path_buf(), target.clone());
        layout.ensure_target_dir().unwrap();
        assert!(target.is_dir());
    }
}
