//! Bits-per-pixel resolution adaptation
//!
//! The trace codecs compute how many encoded bits are available per raw pixel and step
//! the resolution by one when the value leaves the `[low_bpp, high_bpp]` band:
//! below `low_bpp` the next larger resolution is used, above `high_bpp` the next smaller.
//!
//! Bits per pixel is only meaningful up to the reference resolution (480p). Above it,
//! Waggoner's power law is applied: `bpp(res) = bpp(ref) * (pixels(res) / pixels(ref))^0.75`,
//! where `bpp(ref)` is computed at the reference resolution's pixel count.

use serde::{Deserialize, Serialize};

use crate::types::Resolution;
use crate::{Result, SyncodecError};

/// Tunable constants of the resolution adaptation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct AdaptationConfig {
    /// Below this bpp the resolution steps up
    pub low_bpp: f64,
    /// Above this bpp the resolution steps down
    pub high_bpp: f64,
    /// Exponent of Waggoner's power law
    pub waggoner_exponent: f64,
    /// Largest resolution whose true pixel count is used
    pub reference: Resolution,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self { low_bpp: 0.7, high_bpp: 1.5, waggoner_exponent: 0.75, reference: Resolution::P480 }
    }
}

/// Outcome of comparing a bpp value against the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    Up,
    Down,
    Stay,
}

impl AdaptationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.low_bpp.is_finite() && self.high_bpp.is_finite() && self.low_bpp > 0.0) {
            return Err(SyncodecError::invalid_config("bpp thresholds must be positive"));
        }
        if self.low_bpp >= self.high_bpp {
            return Err(SyncodecError::invalid_config(format!(
                "low_bpp ({}) must be below high_bpp ({})",
                self.low_bpp, self.high_bpp
            )));
        }
        if !(self.waggoner_exponent.is_finite() && self.waggoner_exponent > 0.0) {
            return Err(SyncodecError::invalid_config("waggoner_exponent must be positive"));
        }
        Ok(())
    }

    /// Whether `resolution` is above the reference and uses the power law
    pub fn uses_power_law(&self, resolution: Resolution) -> bool {
        resolution.pixels() > self.reference.pixels()
    }

    /// Power-law factor for `resolution` (1 at or below the reference)
    pub fn scaling_factor(&self, resolution: Resolution) -> f64 {
        if self.uses_power_law(resolution) {
            let ratio = f64::from(resolution.pixels()) / f64::from(self.reference.pixels());
            ratio.powf(self.waggoner_exponent)
        } else {
            1.0
        }
    }

    /// Pixel count used in the bpp denominator: the true count, capped at the reference
    pub fn effective_pixels(&self, resolution: Resolution) -> f64 {
        f64::from(resolution.pixels().min(self.reference.pixels()))
    }

    /// Bits per pixel for `rate_bps` at `fps` on `resolution`.
    ///
    /// For resolutions above the reference, `rate_bps` is expected to be the rate that
    /// applies at the reference resolution.
    pub fn bits_per_pixel(&self, rate_bps: f64, fps: f64, resolution: Resolution) -> f64 {
        rate_bps / (fps * self.effective_pixels(resolution)) * self.scaling_factor(resolution)
    }

    /// Which way to step for a bpp value
    pub fn step_for(&self, bpp: f64) -> ResolutionStep {
        if bpp < self.low_bpp {
            ResolutionStep::Up
        } else if bpp > self.high_bpp {
            ResolutionStep::Down
        } else {
            ResolutionStep::Stay
        }
    }
}
