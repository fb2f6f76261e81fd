//! imgprep core
//!
//! Dataset materialization primitives for:
//! - Loading the fetch-stage manifest (`Manifest`) and streaming its row file (`RowSource`)
//! - Decoding, resizing and normalizing images into `FeatureRecord`s
//! - Writing and reading the binary record container
//! - Running the per-row failure boundary (`Supervisor`) and the full pipeline

pub mod codec;
pub mod config;
pub mod container;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod rows;
pub mod summary;
pub mod supervisor;

#[cfg(test)]
mod test_support;

pub use codec::{CodecError, ImageCodec, ImageCrateCodec, PixelGrid};
pub use config::PrepConfig;
pub use container::{ContainerReader, ContainerSink, ContainerWriter};
pub use encoder::{RecordEncoder, DEFAULT_IMAGE_SIZE};
pub use error::{PrepError, PrepResult, RowError, RowErrorKind};
pub use layout::PrepLayout;
pub use manifest::{Manifest, ManifestError};
pub use pipeline::{run_pipeline, PrepOptions};
pub use progress::{NullProgressSink, PrepEvent, ProgressSink, StdoutProgressSink};
pub use record::FeatureRecord;
pub use rows::{ManifestRow, RowSource};
pub use summary::{PrepRunId, PrepSummary};
pub use supervisor::{RowState, RunReport, SkippedRow, Supervisor};
