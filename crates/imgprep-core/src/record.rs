use crate::error::{PrepError, PrepResult};

/// Channel depth every record must carry (RGB).
pub const RECORD_DEPTH: u32 = 3;

/// One materialized sample: dimensions, label and normalized pixels.
///
/// Encoded as a protobuf message so each field is tagged on the wire and a
/// reader needs no external schema beyond this definition.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FeatureRecord {
    #[prost(uint32, tag = "1")]
    pub height: u32,
    #[prost(uint32, tag = "2")]
    pub width: u32,
    #[prost(uint32, tag = "3")]
    pub depth: u32,
    #[prost(uint32, tag = "4")]
    pub label: u32,
    /// Row-major, channel-interleaved intensities in `[0, 1]`.
    #[prost(float, repeated, tag = "5")]
    pub pixels: Vec<f32>,
}

impl FeatureRecord {
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.height as usize * self.width as usize * self.depth as usize
    }

    /// Check the shape invariant. A failure here is an encoding bug, so it is
    /// reported as a fatal error rather than a row skip.
    pub fn validate(&self) -> PrepResult<()> {
        if self.depth != RECORD_DEPTH {
            return Err(PrepError::InvalidRecord(format!("depth is {}, expected {RECORD_DEPTH}", self.depth)));
        }
        if self.pixels.len() != self.expected_len() {
            return Err(PrepError::InvalidRecord(format!(
                "{} pixels for a {}x{}x{} record",
                self.pixels.len(),
                self.height,
                self.width,
                self.depth
            )));
        }
        Ok(())
    }
}
