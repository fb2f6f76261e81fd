use crate::manifest::ManifestError;
use crate::supervisor::RowState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type PrepResult<T> = std::result::Result<T, PrepError>;

/// Fatal errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("row file error: {0}")]
    RowSource(String),

    #[error("failed to write container {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid feature record: {0}")]
    InvalidRecord(String),

    #[error("container read error: {0}")]
    Read(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("encoding worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors scoped to a single row. The supervisor skips the row and continues.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("malformed row at line {line}: {reason}")]
    RowFormat { line: u64, reason: String },

    #[error("asset not found: {}", path.display())]
    AssetNotFound { path: PathBuf },

    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("{} has {depth} channels, expected 3", path.display())]
    InvalidChannel { path: PathBuf, depth: u32 },

    #[error("unknown label `{label}`")]
    UnknownLabel { label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    RowFormat,
    AssetNotFound,
    Decode,
    InvalidChannel,
    UnknownLabel,
}

impl RowErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RowFormat => "row_format",
            Self::AssetNotFound => "asset_not_found",
            Self::Decode => "decode",
            Self::InvalidChannel => "invalid_channel",
            Self::UnknownLabel => "unknown_label",
        }
    }
}

impl std::fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RowError {
    #[must_use]
    pub fn kind(&self) -> RowErrorKind {
        match self {
            Self::RowFormat { .. } => RowErrorKind::RowFormat,
            Self::AssetNotFound { .. } => RowErrorKind::AssetNotFound,
            Self::Decode { .. } => RowErrorKind::Decode,
            Self::InvalidChannel { .. } => RowErrorKind::InvalidChannel,
            Self::UnknownLabel { .. } => RowErrorKind::UnknownLabel,
        }
    }

    /// The last state the row reached before failing.
    #[must_use]
    pub fn stage(&self) -> RowState {
        match self {
            Self::RowFormat { .. } => RowState::Pending,
            Self::AssetNotFound { .. } | Self::Decode { .. } => RowState::Decoding,
            Self::InvalidChannel { .. } | Self::UnknownLabel { .. } => RowState::Encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_kind_and_stage() {
        let err = RowError::AssetNotFound { path: PathBuf::from("data/cats/1.jpg") };
        assert_eq!(err.kind(), RowErrorKind::AssetNotFound);
        assert_eq!(err.stage(), RowState::Decoding);
        assert!(err.to_string().contains("data/cats/1.jpg"));

        let err = RowError::UnknownLabel { label: "zebra".to_string() };
        assert_eq!(err.kind().to_string(), "unknown_label");
        assert_eq!(err.stage(), RowState::Encoding);
    }

    #[test]
    fn test_row_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&RowErrorKind::InvalidChannel).unwrap();
        assert_eq!(json, "\"invalid_channel\"");
    }
}
