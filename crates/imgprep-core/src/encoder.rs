use crate::codec::ImageCodec;
use crate::error::RowError;
use crate::manifest::Manifest;
use crate::record::{FeatureRecord, RECORD_DEPTH};
use crate::rows::ManifestRow;
use std::path::PathBuf;
use std::sync::Arc;

/// Default edge length of the square images written to the container.
pub const DEFAULT_IMAGE_SIZE: u32 = 160;

/// Largest 8-bit channel value, used to scale samples into `[0, 1]`.
const MAX_CHANNEL_VALUE: f32 = 255.0;

/// Turns one manifest row into a [`FeatureRecord`].
#[derive(Clone)]
pub struct RecordEncoder {
    asset_root: PathBuf,
    manifest: Arc<Manifest>,
    target_size: u32,
    codec: Arc<dyn ImageCodec>,
}

impl RecordEncoder {
    #[must_use]
    pub fn new(asset_root: PathBuf, manifest: Arc<Manifest>, target_size: u32, codec: Arc<dyn ImageCodec>) -> Self {
        Self { asset_root, manifest, target_size, codec }
    }

    fn asset_path(&self, row: &ManifestRow) -> PathBuf {
        self.asset_root.join(&row.relative_path)
    }

    pub fn encode(&self, row: &ManifestRow) -> Result<FeatureRecord, RowError> {
        let path = self.asset_path(row);

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RowError::AssetNotFound { path });
            }
            Err(e) => return Err(RowError::Decode { path, reason: e.to_string() }),
        };

        let decoded = self
            .codec
            .decode(&bytes)
            .map_err(|e| RowError::Decode { path: path.clone(), reason: e.to_string() })?;
        let grid = self
            .codec
            .resize(&decoded, self.target_size)
            .map_err(|e| RowError::Decode { path: path.clone(), reason: e.to_string() })?;

        if grid.depth() != RECORD_DEPTH {
            return Err(RowError::InvalidChannel { path, depth: grid.depth() });
        }

        let pixels = grid.samples().iter().map(|&v| f32::from(v) / MAX_CHANNEL_VALUE).collect();

        let label = self
            .manifest
            .resolve_label(&row.label_raw)
            .ok_or_else(|| RowError::UnknownLabel { label: row.label_raw.clone() })?;

        Ok(FeatureRecord { height: grid.height(), width: grid.width(), depth: grid.depth(), label, pixels })
    }
}
