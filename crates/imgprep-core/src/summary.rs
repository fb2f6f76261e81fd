use crate::error::{PrepError, PrepResult, RowErrorKind};
use crate::supervisor::{RunReport, SkippedRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Identifier for one prep run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrepRunId(pub String);

impl PrepRunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// First eight characters, for log prefixes.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for PrepRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrepRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short())
    }
}

/// What a finished run produced. Written next to the container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepSummary {
    pub run_id: PrepRunId,
    pub created_at: DateTime<Utc>,
    pub container: PathBuf,
    pub container_sha256: String,
    pub image_size: u32,
    pub rows_seen: u64,
    pub written: u64,
    pub skipped: u64,
    #[serde(default)]
    pub skipped_by_kind: BTreeMap<RowErrorKind, u64>,
    #[serde(default)]
    pub skips: Vec<SkippedRow>,
}

impl PrepSummary {
    pub fn new(run_id: PrepRunId, container: PathBuf, image_size: u32, report: RunReport) -> PrepResult<Self> {
        let container_sha256 = sha256_file(&container)?;
        let skipped_by_kind = report.skipped_by_kind();
        Ok(Self {
            run_id,
            created_at: Utc::now(),
            container,
            container_sha256,
            image_size,
            rows_seen: report.seen,
            written: report.written,
            skipped: report.skipped,
            skipped_by_kind,
            skips: report.skips,
        })
    }

    pub fn write_json(&self, path: &Path) -> PrepResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> PrepResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub fn sha256_file(path: &Path) -> PrepResult<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| PrepError::Read(format!("{}: {}", path.display(), e)))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
