//! Synthetic video codecs for congestion-control evaluation.
//!
//! Syncodecs produces the frame-size and inter-arrival sequences a real-time video
//! encoder would emit under a changing target bitrate, without encoding any video. A
//! rate controller under test sets the target rate; a transport simulator pulls records
//! and sends their payloads.
//!
//! # Features
//!
//! - **Ideal codecs**: constant-size packets ([`ConstantRateGenerator`]) or constant-fps
//!   frames ([`SimpleFpsGenerator`])
//! - **Trace replay**: real encoder traces with resolution adaptation
//!   ([`TraceMatchingGenerator`], [`InterpolatingTraceGenerator`])
//! - **Statistical model**: steady/transient I-frame behaviour with noise
//!   ([`StatisticalGenerator`])
//! - **Packetization**: MTU-bounded, time-spread packets from any codec
//!   ([`ShapedPacketizer`])
//!
//! # Quick Start
//!
//! ```rust
//! use syncodecs::{Generator, ShapedPacketizer, SimpleFpsGenerator};
//!
//! let mut codec = ShapedPacketizer::new(SimpleFpsGenerator::new(25.0), 1000);
//! codec.set_target_rate(700_000.0);
//!
//! let mut elapsed = 0.0;
//! while elapsed < 1.0 {
//!     let Some(packet) = codec.current() else { break };
//!     // hand packet.payload to the transport
//!     elapsed += packet.seconds_to_next;
//!     codec.advance();
//! }
//! ```
//!
//! Generators are plain state machines: they never sleep, spawn or read a clock, so the
//! caller decides whether `seconds_to_next` is simulated or wall-clock time.

// Core types and error handling
mod error;
pub mod generator;
pub mod noise;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Codecs
pub mod codecs;
pub mod trace;

// Declarative construction
pub mod config;

// Core exports
pub use error::*;
pub use generator::{Generator, GeneratorExt, HasFps, HasPayloadLimit, Records, TimedRecord, Timeline};
pub use types::*;

// Codec exports
pub use codecs::{
    ConstantRateGenerator, DEFAULT_FPS, DEFAULT_TARGET_RATE_BPS, MAX_FRAME_SIZE, Phase, ShapedPacketizer,
    SimpleFpsGenerator, StatisticalGenerator, StatisticsConfig,
};
pub use noise::{NoNoise, NoiseModel, UniformNoise};
pub use trace::{
    AdaptationConfig, InterpolatingTraceGenerator, N_FRAMES_EXCLUDED, ResolutionControl,
    TraceCodecConfig, TraceMatchingGenerator, TraceReader, TraceSet,
};

pub use config::{GeneratorConfig, TraceGeneratorConfig};

use std::path::Path;
use std::sync::Arc;

/// Unified entry point for building synthetic codecs.
///
/// # Examples
///
/// ## From a YAML scenario
/// ```rust,no_run
/// use syncodecs::{Generator, Syncodecs};
///
/// # fn main() -> syncodecs::Result<()> {
/// let mut codec = Syncodecs::from_config_file("scenario.yaml")?;
/// codec.set_target_rate(1_000_000.0);
/// # Ok(())
/// # }
/// ```
///
/// ## From a trace directory
/// ```rust,no_run
/// use syncodecs::{Syncodecs, TraceCodecConfig, TraceMatchingGenerator};
///
/// # fn main() -> syncodecs::Result<()> {
/// let traces = Syncodecs::load_traces("traces", "clip")?;
/// let low = TraceMatchingGenerator::new(traces.clone(), TraceCodecConfig::default());
/// let high = TraceMatchingGenerator::new(traces, TraceCodecConfig::default());
/// # Ok(())
/// # }
/// ```
pub struct Syncodecs;

impl Syncodecs {
    /// Load, validate and build the generator tree described by a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML does not describe a generator
    /// - A parameter is out of range
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Box<dyn Generator>> {
        let config = GeneratorConfig::from_yaml_file(path)?;
        config.validate()?;
        Ok(config.build())
    }

    /// Load a trace directory once so several generators can share it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or holds no usable trace with
    /// the given prefix.
    pub fn load_traces<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Arc<TraceSet>> {
        TraceSet::load(dir, prefix).map(Arc::new)
    }
}
