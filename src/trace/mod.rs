//! Trace-driven codecs
//!
//! Traces are per-frame size logs of a real encoder run over one source video at a
//! grid of resolutions and bitrates. A directory holds one file per pair:
//!
//! ```text
//! traces/
//! ├── clip_360p_400.txt
//! ├── clip_360p_800.txt
//! └── clip_720p_1200.txt
//! ```
//!
//! [`TraceSet`] loads such a directory once; [`TraceMatchingGenerator`] replays the
//! trace matching the target rate and [`InterpolatingTraceGenerator`] blends the two
//! traces around it. Both adapt the resolution to the bits available per pixel
//! (see [`AdaptationConfig`]) unless put in fixed mode through [`ResolutionControl`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use syncodecs::trace::{TraceCodecConfig, TraceMatchingGenerator, TraceSet};
//! use syncodecs::Generator;
//!
//! # fn main() -> syncodecs::Result<()> {
//! let traces = Arc::new(TraceSet::load("traces", "clip")?);
//! let mut codec = TraceMatchingGenerator::new(traces, TraceCodecConfig::default());
//! codec.set_target_rate(800_000.0);
//! codec.advance();
//! # Ok(())
//! # }
//! ```

mod adaptation;
mod engine;
mod filename;
mod matching;
mod reader;
mod scaling;
mod set;

pub use adaptation::{AdaptationConfig, ResolutionStep};
pub use engine::{N_FRAMES_EXCLUDED, ResolutionControl, TraceCodecConfig};
pub use filename::{
    TRACE_BITRATE_STEP_KBPS, TRACE_MAX_BITRATE_KBPS, TRACE_MIN_BITRATE_KBPS, TraceFileName,
    check_bitrate,
};
pub use matching::TraceMatchingGenerator;
pub use reader::{LineTraceReader, TraceReader, TraceRecord};
pub use scaling::{InterpolatingTraceGenerator, interpolate_frame_size};
pub use set::{BitrateMap, TraceSet};
