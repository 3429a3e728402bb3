//! Constant-fps, rate-adaptive frame size codec

use tracing::{debug, trace};

use super::rate::{DEFAULT_TARGET_RATE_BPS, TargetRate};
use crate::generator::{Generator, HasFps};
use crate::types::FrameRecord;

/// Frames per second used when none is given
pub const DEFAULT_FPS: f64 = 25.0;

/// Emits one frame every `1/fps` seconds, sized to hit the target rate.
///
/// Frames can be arbitrarily large; wrap the generator in a
/// [`ShapedPacketizer`](crate::ShapedPacketizer) to get MTU-bounded packets.
#[derive(Debug, Clone)]
pub struct SimpleFpsGenerator {
    fps: f64,
    rate: TargetRate,
    record: FrameRecord,
}

impl SimpleFpsGenerator {
    /// Create a generator at `fps` frames per second and the default target rate
    pub fn new(fps: f64) -> Self {
        Self::with_rate(fps, DEFAULT_TARGET_RATE_BPS)
    }

    /// Create a generator with an explicit initial target rate (bps)
    pub fn with_rate(fps: f64, rate_bps: f64) -> Self {
        let mut rate = TargetRate::new(rate_bps);
        if !(fps.is_finite() && fps > 0.0) {
            rate.poison(&format!("fps {fps} is not a positive finite number"));
        }
        let mut generator = Self { fps, rate, record: FrameRecord::default() };
        if generator.is_valid() {
            generator.next_record();
        }
        generator
    }

    fn next_record(&mut self) {
        let Some(size) = self.rate.frame_bytes(self.rate.bps() / (self.fps * 8.0)) else {
            return;
        };
        self.record = FrameRecord::filler(size, 1.0 / self.fps);
        trace!("Simple fps frame: {} bytes", size);
    }
}

impl Default for SimpleFpsGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl Generator for SimpleFpsGenerator {
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
        debug!("Simple fps target set to {} bps", rate_bps);
        self.rate.set(rate_bps)
    }
}

impl HasFps for SimpleFpsGenerator {
    fn fps(&self) -> f64 {
        self.fps
    }
}
