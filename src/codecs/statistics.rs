//! Statistical steady/transient codec
//!
//! The codec models a real encoder with two phases. In the **steady** phase every frame
//! is sized `target_rate / (fps * 8)`. A substantial target-rate change (one where
//! `|old/new - 1| > big_change_ratio`) starts a **transient** phase of `transient_length`
//! frames: the first is an I-frame `i_frame_ratio` times the steady size, and the rest
//! shrink to compensate so that the phase averages out to the target rate. Compensating
//! frames never drop below `0.2 ×` the steady size; when that floor is hit (a large
//! I-frame or a short phase) the phase overshoots the target rate.
//!
//! Rate updates are throttled: after a successful update further updates are refused for
//! `update_interval` seconds of generator time (the sum of emitted inter-arrival values),
//! and non-substantial updates are clamped so that `|old/new - 1| <= max_update_ratio`.
//! Every emitted size goes through a [`NoiseModel`] last.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::rate::{DEFAULT_TARGET_RATE_BPS, TargetRate};
use crate::generator::{Generator, HasFps};
use crate::noise::{DEFAULT_NOISE_MAX_RATIO, NoiseModel, UniformNoise};
use crate::types::FrameRecord;
use crate::{Result, SyncodecError};

/// Smallest size of a compensating transient frame relative to a steady frame
pub const TRANSIENT_FLOOR_RATIO: f64 = 0.2;

/// Parameters of the statistical codec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct StatisticsConfig {
    /// Frames per second
    pub fps: f64,
    /// Initial target rate (bps)
    pub initial_rate_bps: f64,
    /// Largest accepted `|old/new - 1|` for a non-substantial update; 0 disables clamping
    pub max_update_ratio: f64,
    /// Seconds after a successful update during which updates are refused
    pub update_interval: f64,
    /// `|old/new - 1|` above which an update starts a transient phase
    pub big_change_ratio: f64,
    /// Transient phase length in frames
    pub transient_length: u32,
    /// I-frame size relative to a steady frame
    pub i_frame_ratio: f64,
    /// Width of the default uniform noise
    pub noise_max_ratio: f64,
    /// Seed for the default noise; `None` seeds from the operating system
    pub seed: Option<u64>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            fps: 25.0,
            initial_rate_bps: DEFAULT_TARGET_RATE_BPS,
            max_update_ratio: 0.1,
            update_interval: 0.1,
            big_change_ratio: 0.5,
            transient_length: 10,
            i_frame_ratio: 4.0,
            noise_max_ratio: DEFAULT_NOISE_MAX_RATIO,
            seed: None,
        }
    }
}

impl StatisticsConfig {
    /// Default parameters at the given fps
    pub fn with_fps(fps: f64) -> Self {
        Self { fps, ..Self::default() }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SyncodecError::invalid_config(format!("{name} must be positive, got {value}")))
            }
        };
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SyncodecError::invalid_config(format!(
                    "{name} must be non-negative, got {value}"
                )))
            }
        };

        positive("fps", self.fps)?;
        positive("initial_rate_bps", self.initial_rate_bps)?;
        positive("i_frame_ratio", self.i_frame_ratio)?;
        non_negative("max_update_ratio", self.max_update_ratio)?;
        non_negative("update_interval", self.update_interval)?;
        non_negative("big_change_ratio", self.big_change_ratio)?;
        non_negative("noise_max_ratio", self.noise_max_ratio)?;
        if self.transient_length == 0 {
            return Err(SyncodecError::invalid_config("transient_length must be at least 1"));
        }
        Ok(())
    }

    fn default_noise(&self) -> UniformNoise {
        match self.seed {
            Some(seed) => UniformNoise::seeded(self.noise_max_ratio, seed),
            None => UniformNoise::from_entropy(self.noise_max_ratio),
        }
    }
}

/// Phase of the statistical model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Steady,
    /// Transient phase with `remaining` frames still to emit
    Transient { remaining: u32 },
}

/// Statistical steady/transient codec
pub struct StatisticalGenerator {
    config: StatisticsConfig,
    rate: TargetRate,
    noise: Box<dyn NoiseModel>,
    time_to_update: f64,
    remaining_transient_frames: u32,
    record: FrameRecord,
}

impl StatisticalGenerator {
    /// Create a codec with the default uniform noise
    pub fn new(config: StatisticsConfig) -> Self {
        let noise = config.default_noise();
        Self::with_noise(config, noise)
    }

    /// Create a codec with a custom noise model
    pub fn with_noise(config: StatisticsConfig, noise: impl NoiseModel + 'static) -> Self {
        let mut rate = TargetRate::new(config.initial_rate_bps);
        if let Err(e) = config.validate() {
            rate.poison(&e.to_string());
        }
        let mut generator = Self {
            config,
            rate,
            noise: Box::new(noise),
            time_to_update: 0.0,
            remaining_transient_frames: 0,
            record: FrameRecord::default(),
        };
        if generator.is_valid() {
            generator.next_record();
        }
        generator
    }

    /// Parameters the codec was built with
    pub fn config(&self) -> &StatisticsConfig {
        &self.config
    }

    /// Current phase of the model
    pub fn phase(&self) -> Phase {
        match self.remaining_transient_frames {
            0 => Phase::Steady,
            remaining => Phase::Transient { remaining },
        }
    }

    /// Seconds of generator time until a rate update is accepted again
    pub fn time_to_update(&self) -> f64 {
        self.time_to_update
    }

    fn is_big_change(&self, new_rate: f64) -> bool {
        (self.rate.bps() / new_rate - 1.0).abs() > self.config.big_change_ratio
    }

    fn clamp_update(&self, new_rate: f64) -> f64 {
        let max_ratio = self.config.max_update_ratio;
        if max_ratio <= 0.0 {
            return new_rate;
        }
        let old = self.rate.bps();
        let lowest = old / (1.0 + max_ratio);
        let highest = if max_ratio < 1.0 { old / (1.0 - max_ratio) } else { f64::INFINITY };
        new_rate.clamp(lowest, highest)
    }

    fn frame_size(&mut self) -> f64 {
        let steady = self.rate.bps() / (self.config.fps * 8.0);
        if self.remaining_transient_frames == 0 {
            return steady;
        }

        let length = self.config.transient_length;
        let size = if self.remaining_transient_frames == length {
            steady * self.config.i_frame_ratio
        } else {
            let compensated = steady * (f64::from(length) - self.config.i_frame_ratio)
                / f64::from(length - 1);
            compensated.max(TRANSIENT_FLOOR_RATIO * steady)
        };
        self.remaining_transient_frames -= 1;
        size
    }

    fn next_record(&mut self) {
        let size = self.frame_size();
        let Some(noisy) = self.rate.frame_bytes(self.noise.add_noise(size)) else {
            return;
        };
        let interval = 1.0 / self.config.fps;

        self.record = FrameRecord::filler(noisy, interval);
        self.time_to_update = (self.time_to_update - interval).max(0.0);
        trace!("Statistical frame: {} bytes ({:?})", noisy, self.phase());
    }
}

impl Generator for StatisticalGenerator {
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
        if self.time_to_update > 0.0 {
            debug!(
                "Rate update to {} bps refused for another {:.3}s",
                rate_bps, self.time_to_update
            );
            return self.rate.bps();
        }

        let adopted = if self.is_big_change(rate_bps) {
            self.remaining_transient_frames = self.config.transient_length;
            debug!("Big rate change {} -> {} bps, entering transient", self.rate.bps(), rate_bps);
            rate_bps
        } else {
            let clamped = self.clamp_update(rate_bps);
            if clamped != rate_bps {
                debug!("Rate update {} bps clamped to {} bps", rate_bps, clamped);
            }
            clamped
        };

        self.time_to_update = self.config.update_interval;
        self.rate.set(adopted)
    }
}

impl HasFps for StatisticalGenerator {
    fn fps(&self) -> f64 {
        self.config.fps
    }
}

impl std::fmt::Debug for StatisticalGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticalGenerator")
            .field("config", &self.config)
            .field("target_rate", &self.rate.bps())
            .field("phase", &self.phase())
            .field("time_to_update", &self.time_to_update)
            .finish_non_exhaustive()
    }
}
