//! Trace codec that interpolates between the two traces bracketing the target rate

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::engine::{ResolutionControl, TraceCodecConfig, TraceEngine};
use super::reader::{LineTraceReader, TraceReader};
use super::set::TraceSet;
use crate::generator::{Generator, HasFps};
use crate::types::{FrameRecord, Resolution};

/// Frame size for `rate_bps` given the sizes of the bracketing traces at the same frame.
///
/// Between the two bitrates the size is interpolated linearly. Below `low_kbps` the low
/// size is scaled by `rate/low`, above `high_kbps` the high size by `rate/high`.
pub fn interpolate_frame_size(
    rate_bps: f64,
    (low_kbps, low_size): (u32, usize),
    (high_kbps, high_size): (u32, usize),
) -> f64 {
    let low_bps = f64::from(low_kbps) * 1000.0;
    let high_bps = f64::from(high_kbps) * 1000.0;
    let (low_size, high_size) = (low_size as f64, high_size as f64);

    if rate_bps < low_bps {
        low_size * rate_bps / low_bps
    } else if rate_bps > high_bps {
        high_size * rate_bps / high_bps
    } else if high_kbps == low_kbps {
        low_size
    } else {
        low_size + (high_size - low_size) * (rate_bps - low_bps) / (high_bps - low_bps)
    }
}

/// Trace codec producing frame sizes for any target rate.
///
/// Behaves like [`TraceMatchingGenerator`](super::TraceMatchingGenerator) but derives
/// each frame size from the traces immediately below and above the target, and drives
/// resolution adaptation with the exact target rate.
#[derive(Debug, Clone)]
pub struct InterpolatingTraceGenerator {
    engine: TraceEngine,
    bounds: Option<(u32, u32)>,
    record: FrameRecord,
}

impl InterpolatingTraceGenerator {
    /// Create a generator over an already loaded trace set
    pub fn new(traces: Arc<TraceSet>, config: TraceCodecConfig) -> Self {
        let mut generator = Self {
            engine: TraceEngine::new(traces, &config),
            bounds: None,
            record: FrameRecord::default(),
        };
        generator.rebound();
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
            warn!("Interpolating trace codec has no traces: {}", e);
            TraceSet::default()
        });
        Self::new(Arc::new(traces), config)
    }

    fn rebound(&mut self) {
        let bounds = self
            .engine
            .resolution()
            .and_then(|res| self.engine.bitrate_bounds(res, self.engine.rate.bps()));
        if bounds != self.bounds {
            debug!("Trace bitrate bounds {:?} kbps", bounds);
        }
        self.bounds = bounds;
    }

    fn next_record(&mut self) {
        let (Some(resolution), Some((low, high))) = (self.engine.resolution(), self.bounds) else {
            return;
        };
        let len = self
            .engine
            .sequence_len(resolution, low)
            .min(self.engine.sequence_len(resolution, high));
        let index = self.engine.frame_index(len);
        let exact = interpolate_frame_size(
            self.engine.rate.bps(),
            (low, self.engine.frame_size(resolution, low, index)),
            (high, self.engine.frame_size(resolution, high, index)),
        );
        let Some(size) = self.engine.rate.frame_bytes(exact) else {
            return;
        };
        self.record = FrameRecord::filler(size, 1.0 / self.engine.fps());
        trace!(
            "Interpolated frame {} at {} ({}..{} kbps): {} bytes",
            index, resolution, low, high, size
        );
        self.engine.step_cursor(index, len);

        if let Some(bpp) = self.current_bpp() {
            if self.engine.adapt(bpp) {
                self.rebound();
            }
        }
    }

    /// Bitrates (kbps) of the traces bracketing the target
    pub fn bitrate_bounds_kbps(&self) -> Option<(u32, u32)> {
        self.bounds
    }

    /// Resolutions with trace data, smallest first
    pub fn resolutions(&self) -> &[Resolution] {
        self.engine.resolutions()
    }

    /// Index of the frame the next advance reads
    pub fn frame_index(&self) -> usize {
        self.engine.cursor()
    }

    /// Bits per pixel of the target rate at the current resolution
    pub fn current_bpp(&self) -> Option<f64> {
        let resolution = self.engine.resolution()?;
        let adaptation = self.engine.adaptation();
        Some(adaptation.bits_per_pixel(self.engine.rate.bps(), self.engine.fps(), resolution))
    }
}

impl Generator for InterpolatingTraceGenerator {
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
        self.rebound();
        rate_bps
    }
}

impl HasFps for InterpolatingTraceGenerator {
    fn fps(&self) -> f64 {
        self.engine.fps()
    }
}

impl ResolutionControl for InterpolatingTraceGenerator {
    fn set_fixed_mode(&mut self, fixed: bool) {
        self.engine.set_fixed_mode(fixed);
        self.rebound();
    }

    fn fixed_mode(&self) -> bool {
        self.engine.fixed_mode()
    }

    fn set_resolution_for_fixed_mode(&mut self, resolution: Resolution) -> bool {
        let accepted = self.engine.set_fixed_resolution(resolution);
        if accepted {
            self.rebound();
        } else {
            debug!("No traces for {}, fixed resolution unchanged", resolution);
        }
        accepted
    }

    fn set_middle_resolution_for_fixed_mode(&mut self) {
        self.engine.set_middle_fixed_resolution();
        self.rebound();
    }

    fn current_resolution(&self) -> Option<Resolution> {
        self.engine.resolution()
    }
}
