//! Constant-size, rate-adaptive interval codec

use tracing::{debug, trace};

use super::rate::{DEFAULT_TARGET_RATE_BPS, MAX_FRAME_SIZE, TargetRate};
use crate::generator::{Generator, HasPayloadLimit};
use crate::types::FrameRecord;

/// The smoothest synthetic codec.
///
/// Every record carries exactly `payload_size` bytes. The interval between records is
/// `payload_size * 8 / target_rate`, so as long as the target rate is stable the output
/// has no bursts, no noise and fits the target rate exactly.
#[derive(Debug, Clone)]
pub struct ConstantRateGenerator {
    payload_size: usize,
    rate: TargetRate,
    record: FrameRecord,
}

impl ConstantRateGenerator {
    /// Create a generator emitting `payload_size`-byte packets at the default target rate
    pub fn new(payload_size: usize) -> Self {
        Self::with_rate(payload_size, DEFAULT_TARGET_RATE_BPS)
    }

    /// Create a generator with an explicit initial target rate (bps)
    pub fn with_rate(payload_size: usize, rate_bps: f64) -> Self {
        let mut rate = TargetRate::new(rate_bps);
        if payload_size == 0 {
            rate.poison("payload size must be at least one byte");
        } else if payload_size > MAX_FRAME_SIZE {
            rate.poison(&format!("payload size {payload_size} exceeds {MAX_FRAME_SIZE} bytes"));
        }
        let mut generator = Self { payload_size, rate, record: FrameRecord::default() };
        if generator.is_valid() {
            generator.next_record();
        }
        generator
    }

    fn next_record(&mut self) {
        let interval = (self.payload_size as f64 * 8.0) / self.rate.bps();
        self.record = FrameRecord::filler(self.payload_size, interval);
        trace!("Constant-rate packet: {} bytes, next in {:.6}s", self.payload_size, interval);
    }
}

impl Generator for ConstantRateGenerator {
    fn current(&self) -> Option<&FrameRecord> {
        self.is_valid().then_some(&self.record)
    }

    fn advance(&mut self) {
        if self.is_valid() {
            self.next_record();
        }
    }

    fn is_valid(&self) -> bool {
        self.rate.is_ok()
    }

    fn target_rate(&self) -> f64 {
        self.rate.bps()
    }

    fn set_target_rate(&mut self, rate_bps: f64) -> f64 {
        if !self.rate.accepts(rate_bps) {
            return self.rate.bps();
        }
        debug!("Constant-rate target set to {} bps", rate_bps);
        self.rate.set(rate_bps)
    }
}

impl HasPayloadLimit for ConstantRateGenerator {
    fn max_payload_size(&self) -> usize {
        self.payload_size
    }
}
