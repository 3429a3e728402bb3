//! Target rate bookkeeping shared by the generators

use tracing::warn;

/// Target rate used when a constructor is not given one (150 kbps)
pub const DEFAULT_TARGET_RATE_BPS: f64 = 150_000.0;

/// Largest frame or packet a generator emits (64 MiB).
///
/// A target rate large enough to need bigger frames latches the generator invalid.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Target rate plus the configuration-error latch.
///
/// A rate that is not finite and strictly positive is never adopted; instead the
/// owning generator turns invalid for the rest of its lifetime.
#[derive(Debug, Clone)]
pub(crate) struct TargetRate {
    bps: f64,
    misconfigured: bool,
}

impl TargetRate {
    pub(crate) fn new(bps: f64) -> Self {
        let mut rate = Self { bps: DEFAULT_TARGET_RATE_BPS, misconfigured: false };
        if rate.accepts(bps) {
            rate.bps = bps;
        }
        rate
    }

    pub(crate) fn bps(&self) -> f64 {
        self.bps
    }

    pub(crate) fn is_ok(&self) -> bool {
        !self.misconfigured
    }

    /// Latch the generator invalid from outside (e.g. a bad fps or payload size)
    pub(crate) fn poison(&mut self, reason: &str) {
        warn!("Generator misconfigured: {}", reason);
        self.misconfigured = true;
    }

    /// Check a requested rate, latching the error when it is unusable
    pub(crate) fn accepts(&mut self, bps: f64) -> bool {
        if bps.is_finite() && bps > 0.0 {
            true
        } else {
            self.poison(&format!("target rate {bps} bps is not a positive finite number"));
            false
        }
    }

    /// Round a computed frame size to whole bytes.
    ///
    /// Sizes above [`MAX_FRAME_SIZE`] (or not a number) latch the error and yield `None`.
    pub(crate) fn frame_bytes(&mut self, size: f64) -> Option<usize> {
        let rounded = size.max(0.0).round();
        if !size.is_nan() && rounded <= MAX_FRAME_SIZE as f64 {
            Some(rounded as usize)
        } else {
            self.poison(&format!("frame size {size} bytes exceeds {MAX_FRAME_SIZE} bytes"));
            None
        }
    }

    /// Adopt `bps` unconditionally (caller already validated it)
    pub(crate) fn set(&mut self, bps: f64) -> f64 {
        self.bps = bps;
        self.bps
    }
}
