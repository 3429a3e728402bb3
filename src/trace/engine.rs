//! State shared by the trace-based codecs: frame cursor, resolution and fixed mode

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::adaptation::{AdaptationConfig, ResolutionStep};
use super::set::{BitrateMap, TraceSet};
use crate::codecs::{DEFAULT_TARGET_RATE_BPS, TargetRate};
use crate::types::Resolution;

/// Frames skipped when a trace wraps around, so the leading I-frame is not replayed
pub const N_FRAMES_EXCLUDED: usize = 20;

/// Parameters of the trace-based codecs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct TraceCodecConfig {
    /// Frames per second
    pub fps: f64,
    /// Initial target rate (bps)
    pub initial_rate_bps: f64,
    /// Start in fixed-resolution mode
    pub fixed_mode: bool,
    /// Resolution used in fixed mode; the middle resolution when unset
    pub fixed_resolution: Option<Resolution>,
    /// Resolution adaptation thresholds
    pub adaptation: AdaptationConfig,
}

impl Default for TraceCodecConfig {
    fn default() -> Self {
        Self {
            fps: 25.0,
            initial_rate_bps: DEFAULT_TARGET_RATE_BPS,
            fixed_mode: false,
            fixed_resolution: None,
            adaptation: AdaptationConfig::default(),
        }
    }
}

/// Resolution control shared by the trace-based codecs
pub trait ResolutionControl {
    /// Switch between fixed and variable resolution.
    ///
    /// Turning fixed mode on moves to the configured fixed resolution (the middle one if
    /// none was set). Turning it off keeps the current resolution and resumes adaptation.
    fn set_fixed_mode(&mut self, fixed: bool);

    /// Whether the codec is in fixed-resolution mode
    fn fixed_mode(&self) -> bool;

    /// Use `resolution` in fixed mode; `false` (and no effect) when it has no traces
    fn set_resolution_for_fixed_mode(&mut self, resolution: Resolution) -> bool;

    /// Use the resolution at index `floor(n/2)` of the loaded resolutions in fixed mode
    fn set_middle_resolution_for_fixed_mode(&mut self);

    /// Resolution currently in use, `None` without trace data
    fn current_resolution(&self) -> Option<Resolution>;
}

#[derive(Debug, Clone)]
pub(crate) struct TraceEngine {
    traces: Arc<TraceSet>,
    resolutions: Vec<Resolution>,
    fps: f64,
    adaptation: AdaptationConfig,
    fixed_mode: bool,
    current: usize,
    fixed: Option<usize>,
    cursor: usize,
    pub(crate) rate: TargetRate,
}

impl TraceEngine {
    pub(crate) fn new(traces: Arc<TraceSet>, config: &TraceCodecConfig) -> Self {
        let resolutions = traces.resolutions();
        let mut rate = TargetRate::new(config.initial_rate_bps);
        if resolutions.is_empty() {
            rate.poison("trace set has no usable traces");
        }
        if !(config.fps.is_finite() && config.fps > 0.0) {
            rate.poison(&format!("fps {} is not a positive finite number", config.fps));
        }
        if let Err(e) = config.adaptation.validate() {
            rate.poison(&e.to_string());
        }

        let mut engine = Self {
            current: resolutions.len() / 2,
            resolutions,
            traces,
            fps: config.fps,
            adaptation: config.adaptation,
            fixed_mode: false,
            fixed: None,
            cursor: 0,
            rate,
        };

        if let Some(resolution) = config.fixed_resolution {
            if !engine.set_fixed_resolution(resolution) {
                warn!("No traces for fixed resolution {}, using the middle one", resolution);
            }
        }
        if config.fixed_mode {
            engine.set_fixed_mode(true);
        }
        engine
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.rate.is_ok() && !self.resolutions.is_empty()
    }

    pub(crate) fn fps(&self) -> f64 {
        self.fps
    }

    pub(crate) fn adaptation(&self) -> &AdaptationConfig {
        &self.adaptation
    }

    pub(crate) fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub(crate) fn resolution(&self) -> Option<Resolution> {
        self.resolutions.get(self.current).copied()
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn fixed_mode(&self) -> bool {
        self.fixed_mode
    }

    pub(crate) fn has_traces(&self, resolution: Resolution) -> bool {
        self.traces.bitrates(resolution).is_some()
    }

    fn bitrates(&self, resolution: Resolution) -> Option<&BitrateMap> {
        self.traces.bitrates(resolution)
    }

    /// Largest bitrate not above `rate_bps`, or the smallest one when all are above
    pub(crate) fn match_bitrate(&self, resolution: Resolution, rate_bps: f64) -> Option<u32> {
        let rates = self.bitrates(resolution)?;
        rates
            .keys()
            .rev()
            .find(|kbps| f64::from(**kbps) * 1000.0 <= rate_bps)
            .or_else(|| rates.keys().next())
            .copied()
    }

    /// Bitrates immediately below and above `rate_bps`.
    ///
    /// Below the smallest bitrate both bounds are the smallest; above the largest both
    /// are the largest.
    pub(crate) fn bitrate_bounds(&self, resolution: Resolution, rate_bps: f64) -> Option<(u32, u32)> {
        let rates = self.bitrates(resolution)?;
        let low = self.match_bitrate(resolution, rate_bps)?;
        let high = rates
            .keys()
            .find(|kbps| f64::from(**kbps) * 1000.0 >= rate_bps)
            .or_else(|| rates.keys().next_back())
            .copied()?;
        Some((low, high))
    }

    pub(crate) fn sequence_len(&self, resolution: Resolution, kbps: u32) -> usize {
        self.traces.sequence(resolution, kbps).map_or(0, <[_]>::len)
    }

    pub(crate) fn frame_size(&self, resolution: Resolution, kbps: u32, index: usize) -> usize {
        self.traces
            .sequence(resolution, kbps)
            .and_then(|seq| seq.get(index))
            .map_or(0, |record| record.frame_size)
    }

    fn wrap_index(len: usize) -> usize {
        if len > N_FRAMES_EXCLUDED { N_FRAMES_EXCLUDED } else { 0 }
    }

    /// Cursor position valid for a sequence of `len` frames
    pub(crate) fn frame_index(&self, len: usize) -> usize {
        if self.cursor < len { self.cursor } else { Self::wrap_index(len) }
    }

    /// Move past `index`, wrapping to [`N_FRAMES_EXCLUDED`] at the end of the sequence
    pub(crate) fn step_cursor(&mut self, index: usize, len: usize) {
        let next = index + 1;
        self.cursor = if next >= len { Self::wrap_index(len) } else { next };
    }

    /// Apply one adaptation step for `bpp`; returns whether the resolution changed
    pub(crate) fn adapt(&mut self, bpp: f64) -> bool {
        if self.fixed_mode || self.resolutions.is_empty() {
            return false;
        }
        let from = self.current;
        match self.adaptation.step_for(bpp) {
            ResolutionStep::Up if self.current + 1 < self.resolutions.len() => self.current += 1,
            ResolutionStep::Down if self.current > 0 => self.current -= 1,
            _ => return false,
        }
        debug!(
            "Resolution {} -> {} (bpp {:.3})",
            self.resolutions[from], self.resolutions[self.current], bpp
        );
        true
    }

    pub(crate) fn set_fixed_mode(&mut self, fixed: bool) {
        self.fixed_mode = fixed;
        if fixed && !self.resolutions.is_empty() {
            let index = *self.fixed.get_or_insert(self.resolutions.len() / 2);
            self.current = index;
        }
        debug!("Fixed resolution mode {}", if fixed { "on" } else { "off" });
    }

    pub(crate) fn set_fixed_resolution(&mut self, resolution: Resolution) -> bool {
        let Some(index) = self.resolutions.iter().position(|r| *r == resolution) else {
            return false;
        };
        self.fixed = Some(index);
        if self.fixed_mode {
            self.current = index;
        }
        true
    }

    pub(crate) fn set_middle_fixed_resolution(&mut self) {
        if self.resolutions.is_empty() {
            return;
        }
        let index = self.resolutions.len() / 2;
        self.fixed = Some(index);
        if self.fixed_mode {
            self.current = index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::uniform_trace_set;

    fn engine(resolutions: &[Resolution], kbps: &[u32], config: TraceCodecConfig) -> TraceEngine {
        TraceEngine::new(Arc::new(uniform_trace_set(resolutions, kbps, 40)), &config)
    }

    #[test]
    fn matching_picks_largest_not_above_target() {
        let engine = engine(&[Resolution::P360], &[200, 500, 1000], TraceCodecConfig::default());
        let res = Resolution::P360;
        assert_eq!(engine.match_bitrate(res, 600_000.0), Some(500));
        assert_eq!(engine.match_bitrate(res, 500_000.0), Some(500));
        assert_eq!(engine.match_bitrate(res, 5_000_000.0), Some(1000));
        assert_eq!(engine.match_bitrate(res, 50_000.0), Some(200));
        assert_eq!(engine.match_bitrate(Resolution::P720, 600_000.0), None);
    }

    #[test]
    fn bounds_bracket_the_target() {
        let engine = engine(&[Resolution::P360], &[200, 500, 1000], TraceCodecConfig::default());
        let res = Resolution::P360;
        assert_eq!(engine.bitrate_bounds(res, 600_000.0), Some((500, 1000)));
        assert_eq!(engine.bitrate_bounds(res, 500_000.0), Some((500, 500)));
        assert_eq!(engine.bitrate_bounds(res, 100_000.0), Some((200, 200)));
        assert_eq!(engine.bitrate_bounds(res, 2_000_000.0), Some((1000, 1000)));
    }

    #[test]
    fn cursor_wraps_past_the_excluded_frames() {
        let mut engine = engine(&[Resolution::P360], &[500], TraceCodecConfig::default());
        let len = 40;
        engine.step_cursor(38, len);
        assert_eq!(engine.cursor(), 39);
        engine.step_cursor(39, len);
        assert_eq!(engine.cursor(), N_FRAMES_EXCLUDED);

        // Short sequences wrap to the start
        engine.step_cursor(9, 10);
        assert_eq!(engine.cursor(), 0);
        // A cursor past a shorter sequence is normalised
        engine.step_cursor(30, len);
        assert_eq!(engine.frame_index(25), N_FRAMES_EXCLUDED);
    }

    #[test]
    fn fixed_mode_uses_middle_then_configured_resolution() {
        let all = [Resolution::P240, Resolution::P360, Resolution::P480, Resolution::P720];
        let mut engine = engine(&all, &[500], TraceCodecConfig::default());
        assert_eq!(engine.resolution(), Some(Resolution::P480));

        engine.adapt(0.1);
        assert_eq!(engine.resolution(), Some(Resolution::P720));
        engine.set_fixed_mode(true);
        assert_eq!(engine.resolution(), Some(Resolution::P480));
        assert!(!engine.adapt(0.1), "no adaptation in fixed mode");

        assert!(engine.set_fixed_resolution(Resolution::P240));
        assert_eq!(engine.resolution(), Some(Resolution::P240));
        assert!(!engine.set_fixed_resolution(Resolution::P1080));
        assert_eq!(engine.resolution(), Some(Resolution::P240));

        engine.set_fixed_mode(false);
        assert_eq!(engine.resolution(), Some(Resolution::P240));
        engine.set_fixed_mode(true);
        assert_eq!(engine.resolution(), Some(Resolution::P240));
    }

    #[test]
    fn adaptation_steps_once_and_stops_at_the_edges() {
        let mut engine =
            engine(&[Resolution::P360, Resolution::P480], &[500], TraceCodecConfig::default());
        assert_eq!(engine.resolution(), Some(Resolution::P480));
        assert!(!engine.adapt(0.1));
        assert!(engine.adapt(2.0));
        assert_eq!(engine.resolution(), Some(Resolution::P360));
        assert!(!engine.adapt(2.0));
        assert!(!engine.adapt(1.0));
    }

    #[test]
    fn configured_fixed_resolution_is_applied() {
        let config = TraceCodecConfig {
            fixed_mode: true,
            fixed_resolution: Some(Resolution::P240),
            ..Default::default()
        };
        let engine = engine(&[Resolution::P240, Resolution::P360, Resolution::P480], &[500], config);
        assert!(engine.fixed_mode());
        assert_eq!(engine.resolution(), Some(Resolution::P240));
    }

    #[test]
    fn empty_sets_are_invalid() {
        let engine = TraceEngine::new(Arc::new(TraceSet::default()), &TraceCodecConfig::default());
        assert!(!engine.is_valid());
        assert_eq!(engine.resolution(), None);
    }
}
