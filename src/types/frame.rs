//! Frame record type shared by every generator

use serde::{Deserialize, Serialize};

/// One unit of synthetic codec output: a payload and the time to wait before the next one.
///
/// The payload contents are filler (zeros for every generator in this crate); its length
/// is the meaningful field. Packetizers slice the payload of the inner frame, so whatever
/// an inner generator writes into it reaches the consumer unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct FrameRecord {
    /// Encoded frame or packet contents
    pub payload: Vec<u8>,

    /// Seconds the consumer waits before advancing to the next record
    pub seconds_to_next: f64,
}

impl FrameRecord {
    /// Create a record from an explicit payload
    pub fn new(payload: Vec<u8>, seconds_to_next: f64) -> Self {
        Self { payload, seconds_to_next }
    }

    /// Create a zero-filled record of `size` bytes
    pub fn filler(size: usize, seconds_to_next: f64) -> Self {
        Self { payload: vec![0; size], seconds_to_next }
    }

    /// Payload length in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Payload length in bits
    pub fn bits(&self) -> f64 {
        self.payload.len() as f64 * 8.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filler_records_report_size_and_bits() {
        let record = FrameRecord::filler(1250, 0.04);
        assert_eq!(record.size(), 1250);
        assert_eq!(record.bits(), 10_000.0);
        assert!(record.payload.iter().all(|b| *b == 0));
    }

    #[test]
    fn default_record_is_empty() {
        let record = FrameRecord::default();
        assert_eq!(record.size(), 0);
        assert_eq!(record.seconds_to_next, 0.0);
    }
}
