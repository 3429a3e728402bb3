//! Trace-matching codec: replays the recorded trace closest to the target rate

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::engine::{ResolutionControl, TraceCodecConfig, TraceEngine};
use super::reader::{LineTraceReader, TraceReader};
use super::set::TraceSet;
use crate::generator::{Generator, HasFps};
use crate::types::{FrameRecord, Resolution};

/// Replays pre-recorded encoder traces, switching track with the target rate.
///
/// For the current resolution the largest trace bitrate not above the target is
/// selected (the smallest one when the target is below every trace). Switching track
/// keeps the frame cursor, so playback continues from the same moment of the source
/// video. Unless fixed mode is on, the resolution follows the bits-per-pixel of the
/// matched bitrate one step per frame.
#[derive(Debug, Clone)]
pub struct TraceMatchingGenerator {
    engine: TraceEngine,
    matched_kbps: Option<u32>,
    record: FrameRecord,
}

impl TraceMatchingGenerator {
    /// Create a generator over an already loaded trace set
    pub fn new(traces: Arc<TraceSet>, config: TraceCodecConfig) -> Self {
        let mut generator = Self {
            engine: TraceEngine::new(traces, &config),
            matched_kbps: None,
            record: FrameRecord::default(),
        };
        generator.rematch();
        if generator.is_valid() {
            generator.next_record();
        }
        generator
    }

    /// Load `<prefix>_<resolution>_<kbps>.txt` traces from `dir`.
    ///
    /// A directory without usable traces yields an invalid generator.
    pub fn open<P: AsRef<Path>>(dir: P, prefix: &str, config: TraceCodecConfig) -> Self {
        Self::open_with(dir, prefix, &LineTraceReader::default(), config)
    }

    /// Like [`open`](Self::open) with a custom trace reader
    pub fn open_with<P: AsRef<Path>>(
        dir: P,
        prefix: &str,
        reader: &dyn TraceReader,
        config: TraceCodecConfig,
    ) -> Self {
        let traces = TraceSet::load_with(dir, prefix, reader).unwrap_or_else(|e| {
            warn!("Trace matching codec has no traces: {}", e);
            TraceSet::default()
        });
        Self::new(Arc::new(traces), config)
    }

    fn rematch(&mut self) {
        let matched = self
            .engine
            .resolution()
            .and_then(|res| self.engine.match_bitrate(res, self.engine.rate.bps()));
        if matched != self.matched_kbps {
            debug!("Matched trace bitrate {:?} kbps", matched);
        }
        self.matched_kbps = matched;
    }

    fn next_record(&mut self) {
        let (Some(resolution), Some(kbps)) = (self.engine.resolution(), self.matched_kbps) else {
            return;
        };
        let len = self.engine.sequence_len(resolution, kbps);
        let index = self.engine.frame_index(len);
        let size = self.engine.frame_size(resolution, kbps, index);
        self.record = FrameRecord::filler(size, 1.0 / self.engine.fps());
        trace!("Trace frame {} at {} {} kbps: {} bytes", index, resolution, kbps, size);
        self.engine.step_cursor(index, len);

        if let Some(bpp) = self.current_bpp() {
            if self.engine.adapt(bpp) {
                self.rematch();
            }
        }
    }

    /// Bitrate of the trace currently replayed (kbps)
    pub fn matched_bitrate_kbps(&self) -> Option<u32> {
        self.matched_kbps
    }

    /// Resolutions with trace data, smallest first
    pub fn resolutions(&self) -> &[Resolution] {
        self.engine.resolutions()
    }

    /// Index of the frame the next advance reads
    pub fn frame_index(&self) -> usize {
        self.engine.cursor()
    }

    /// Bits per pixel driving resolution adaptation.
    ///
    /// Above the reference resolution the bitrate matched at the reference for the
    /// current target is used, falling back to the current match when the reference
    /// resolution has no traces.
    pub fn current_bpp(&self) -> Option<f64> {
        let resolution = self.engine.resolution()?;
        let matched = self.matched_kbps?;
        let adaptation = self.engine.adaptation();
        let kbps = if adaptation.uses_power_law(resolution) {
            self.engine
                .match_bitrate(adaptation.reference, self.engine.rate.bps())
                .unwrap_or(matched)
        } else {
            matched
        };
        Some(adaptation.bits_per_pixel(f64::from(kbps) * 1000.0, self.engine.fps(), resolution))
    }
}

impl Generator for TraceMatchingGenerator {
    fn current(&self) -> Option<&FrameRecord> {
        self.is_valid().then_some(&self.record)
    }

    fn advance(&mut self) {
        if self.is_valid() {
            self.next_record();
        }
    }

    fn is_valid(&self) -> bool {
        self.engine.is_valid()
    }

    fn target_rate(&self) -> f64 {
        self.engine.rate.bps()
    }

    fn set_target_rate(&mut self, rate_bps: f64) -> f64 {
        if !self.engine.rate.accepts(rate_bps) {
            return self.engine.rate.bps();
        }
        self.engine.rate.set(rate_bps);
        self.rematch();
        rate_bps
    }
}

impl HasFps for TraceMatchingGenerator {
    fn fps(&self) -> f64 {
        self.engine.fps()
    }
}

impl ResolutionControl for TraceMatchingGenerator {
    fn set_fixed_mode(&mut self, fixed: bool) {
        self.engine.set_fixed_mode(fixed);
        self.rematch();
    }

    fn fixed_mode(&self) -> bool {
        self.engine.fixed_mode()
    }

    fn set_resolution_for_fixed_mode(&mut self, resolution: Resolution) -> bool {
        let accepted = self.engine.set_fixed_resolution(resolution);
        if accepted {
            self.rematch();
        } else {
            debug!("No traces for {}, fixed resolution unchanged", resolution);
        }
        accepted
    }

    fn set_middle_resolution_for_fixed_mode(&mut self) {
        self.engine.set_middle_fixed_resolution();
        self.rematch();
    }

    fn current_resolution(&self) -> Option<Resolution> {
        self.engine.resolution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorExt;
    use crate::test_utils::{TraceFixture, ramp_trace_set, uniform_trace_set};

    fn fixed(resolution: Resolution) -> TraceCodecConfig {
        TraceCodecConfig {
            fixed_mode: true,
            fixed_resolution: Some(resolution),
            ..Default::default()
        }
    }

    #[test]
    fn matched_bitrate_never_exceeds_target() {
        let set = Arc::new(uniform_trace_set(&[Resolution::P360], &[200, 500, 1000], 30));
        let mut generator = TraceMatchingGenerator::new(set, fixed(Resolution::P360));

        for (target, expected) in [(750_000.0, 500), (1_000_000.0, 1000), (199_999.0, 200)] {
            generator.set_target_rate(target);
            assert_eq!(generator.matched_bitrate_kbps(), Some(expected), "target {target}");
        }
        generator.set_target_rate(400_000.0);
        generator.advance();
        // uniform traces carry kbps*1000/(8*25) bytes per frame
        assert_eq!(generator.current().map(FrameRecord::size), Some(1000));
    }

    #[test]
    fn cursor_wraps_to_the_excluded_frame_count() {
        let set = Arc::new(ramp_trace_set(Resolution::P360, &[500], 25));
        let mut generator = TraceMatchingGenerator::new(set, fixed(Resolution::P360));
        generator.set_target_rate(500_000.0);

        let sizes: Vec<usize> = (&mut generator).records().take(30).map(|r| r.size()).collect();
        // ramp traces carry frame index + 1 as size
        let mut expected: Vec<usize> = (1..=25).collect();
        expected.extend(21..=25);
        assert_eq!(sizes, expected);
        assert!(!sizes[25..].contains(&1));
    }

    #[test]
    fn switching_track_keeps_the_cursor() {
        let set = Arc::new(uniform_trace_set(&[Resolution::P360], &[200, 400], 50));
        let mut generator = TraceMatchingGenerator::new(set, fixed(Resolution::P360));
        for _ in 0..5 {
            generator.advance();
        }
        let index = generator.frame_index();
        generator.set_target_rate(450_000.0);
        assert_eq!(generator.frame_index(), index);
        assert_eq!(generator.matched_bitrate_kbps(), Some(400));
    }

    #[test]
    fn low_bpp_steps_up_from_360p() {
        // 360p at 300 kbps and 25 fps: 300000 / (25 * 230400) = 0.052 bpp
        let set = Arc::new(uniform_trace_set(
            &[Resolution::P240, Resolution::P360, Resolution::P480],
            &[300],
            40,
        ));
        let config = TraceCodecConfig { initial_rate_bps: 300_000.0, ..Default::default() };
        let mut generator = TraceMatchingGenerator::new(set, config);
        generator.set_resolution_for_fixed_mode(Resolution::P360);
        generator.set_fixed_mode(true);
        generator.set_fixed_mode(false);
        assert_eq!(generator.current_resolution(), Some(Resolution::P360));
        assert!(generator.current_bpp().unwrap() < 0.7);

        generator.advance();
        assert_eq!(generator.current_resolution(), Some(Resolution::P480));
    }

    #[test]
    fn high_bpp_steps_down_from_720p() {
        // 480p at 6000 kbps and 5 fps: 6e6 / (5 * 307200) = 3.9 bpp, scaled up at 720p
        let set = Arc::new(uniform_trace_set(
            &[Resolution::P480, Resolution::P540, Resolution::P720],
            &[6000],
            40,
        ));
        let config = TraceCodecConfig {
            fps: 5.0,
            initial_rate_bps: 6_000_000.0,
            fixed_mode: true,
            fixed_resolution: Some(Resolution::P720),
            ..Default::default()
        };
        let mut generator = TraceMatchingGenerator::new(set, config);
        assert_eq!(generator.current_resolution(), Some(Resolution::P720));
        generator.set_fixed_mode(false);
        assert!(generator.current_bpp().unwrap() > 1.5);

        generator.advance();
        assert_eq!(generator.current_resolution(), Some(Resolution::P540));
    }

    #[test]
    fn fixed_mode_pins_the_resolution() {
        let set = Arc::new(uniform_trace_set(
            &[Resolution::P240, Resolution::P360, Resolution::P480],
            &[300],
            40,
        ));
        let mut generator = TraceMatchingGenerator::new(set, TraceCodecConfig::default());
        generator.set_fixed_mode(true);
        assert!(generator.fixed_mode());
        assert_eq!(generator.current_resolution(), Some(Resolution::P360));

        for _ in 0..10 {
            generator.advance();
        }
        assert_eq!(generator.current_resolution(), Some(Resolution::P360));

        assert!(!generator.set_resolution_for_fixed_mode(Resolution::P1080));
        assert_eq!(generator.current_resolution(), Some(Resolution::P360));
        assert!(generator.set_resolution_for_fixed_mode(Resolution::P240));
        assert_eq!(generator.current_resolution(), Some(Resolution::P240));
        generator.set_middle_resolution_for_fixed_mode();
        assert_eq!(generator.current_resolution(), Some(Resolution::P360));
    }

    #[test]
    fn missing_directory_gives_an_invalid_generator() {
        let mut generator =
            TraceMatchingGenerator::open("/nonexistent/traces", "clip", TraceCodecConfig::default());
        assert!(!generator.is_valid());
        assert!(generator.current().is_none());
        generator.advance();
        assert!(generator.current_resolution().is_none());
    }

    #[test]
    fn loads_from_a_directory() {
        let fixture = TraceFixture::new("clip")
            .with_trace(Resolution::P360, 200, &[900, 100, 110])
            .with_trace(Resolution::P360, 400, &[1800, 200, 220])
            .build()
            .unwrap();
        let config = TraceCodecConfig { initial_rate_bps: 300_000.0, ..fixed(Resolution::P360) };
        let generator = TraceMatchingGenerator::open(fixture.path(), "clip", config);

        assert!(generator.is_valid());
        assert_eq!(generator.matched_bitrate_kbps(), Some(200));
        assert_eq!(generator.current().map(FrameRecord::size), Some(900));
        assert_eq!(generator.current().map(|r| r.seconds_to_next), Some(0.04));
    }

    #[test]
    fn bad_rates_latch_invalid() {
        let set = Arc::new(uniform_trace_set(&[Resolution::P360], &[200], 30));
        let mut generator = TraceMatchingGenerator::new(set, TraceCodecConfig::default());
        assert_eq!(generator.set_target_rate(-1.0), 150_000.0);
        assert!(!generator.is_valid());
        generator.set_target_rate(200_000.0);
        assert!(!generator.is_valid());
    }
}
