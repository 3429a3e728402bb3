//! Declarative generator configuration
//!
//! A generator tree can be described in YAML and built at runtime, which is how
//! simulation scenarios usually pick their codec:
//!
//! ```yaml
//! kind: shaped
//! max_payload_size: 1200
//! per_packet_overhead: 40
//! inner:
//!   kind: trace
//!   directory: traces
//!   prefix: clip
//!   interpolate: true
//!   fps: 30
//! ```
//!
//! Unset fields take the same defaults as the programmatic constructors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::codecs::{
    ConstantRateGenerator, DEFAULT_FPS, DEFAULT_TARGET_RATE_BPS, ShapedPacketizer,
    SimpleFpsGenerator, StatisticalGenerator, StatisticsConfig,
};
use crate::generator::Generator;
use crate::trace::{
    InterpolatingTraceGenerator, LineTraceReader, TraceCodecConfig, TraceMatchingGenerator,
};
use crate::{Result, SyncodecError};

fn default_rate() -> f64 {
    DEFAULT_TARGET_RATE_BPS
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

/// Configuration of one generator, possibly wrapping another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// [`ConstantRateGenerator`]
    ConstantRate {
        max_payload_size: usize,
        #[serde(default = "default_rate")]
        initial_rate_bps: f64,
    },
    /// [`SimpleFpsGenerator`]
    SimpleFps {
        #[serde(default = "default_fps")]
        fps: f64,
        #[serde(default = "default_rate")]
        initial_rate_bps: f64,
    },
    /// [`TraceMatchingGenerator`] or [`InterpolatingTraceGenerator`]
    Trace(TraceGeneratorConfig),
    /// [`StatisticalGenerator`]
    Statistics(StatisticsConfig),
    /// [`ShapedPacketizer`] around `inner`
    Shaped {
        max_payload_size: usize,
        #[serde(default)]
        per_packet_overhead: usize,
        inner: Box<GeneratorConfig>,
    },
}

/// Trace directory and codec parameters of a trace-based generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceGeneratorConfig {
    /// Directory holding `<prefix>_<resolution>_<kbps>.txt` files
    pub directory: PathBuf,
    pub prefix: String,
    /// Interpolate between traces instead of replaying the matched one
    #[serde(default)]
    pub interpolate: bool,
    /// Column of the frame size in trace lines
    #[serde(default)]
    pub size_column: usize,
    #[serde(flatten)]
    pub codec: TraceCodecConfig,
}

impl TraceGeneratorConfig {
    fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(SyncodecError::invalid_config("trace prefix must not be empty"));
        }
        positive("fps", self.codec.fps)?;
        positive("initial_rate_bps", self.codec.initial_rate_bps)?;
        self.codec.adaptation.validate()
    }

    fn build(&self) -> Box<dyn Generator> {
        let reader = LineTraceReader::new(self.size_column);
        let config = self.codec.clone();
        if self.interpolate {
            Box::new(InterpolatingTraceGenerator::open_with(
                &self.directory,
                &self.prefix,
                &reader,
                config,
            ))
        } else {
            Box::new(TraceMatchingGenerator::open_with(&self.directory, &self.prefix, &reader, config))
        }
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SyncodecError::invalid_config(format!("{name} must be positive, got {value}")))
    }
}

impl GeneratorConfig {
    /// Parse a configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| {
            SyncodecError::parse("Generator configuration", format!("YAML parsing failed: {e}"))
        })
    }

    /// Read and parse a YAML configuration file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SyncodecError::file_error(path.to_path_buf(), e))?;
        let config = Self::from_yaml_str(&yaml)?;
        debug!("Loaded generator configuration from {}", path.display());
        Ok(config)
    }

    /// Serialize the configuration to YAML
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| {
            SyncodecError::parse("Generator configuration", format!("YAML encoding failed: {e}"))
        })
    }

    /// Check every parameter of the tree
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ConstantRate { max_payload_size, initial_rate_bps } => {
                if *max_payload_size == 0 {
                    return Err(SyncodecError::invalid_config("max_payload_size must be at least 1"));
                }
                positive("initial_rate_bps", *initial_rate_bps)
            }
            Self::SimpleFps { fps, initial_rate_bps } => {
                positive("fps", *fps)?;
                positive("initial_rate_bps", *initial_rate_bps)
            }
            Self::Trace(trace) => trace.validate(),
            Self::Statistics(stats) => stats.validate(),
            Self::Shaped { max_payload_size, inner, .. } => {
                if *max_payload_size == 0 {
                    return Err(SyncodecError::invalid_config("max_payload_size must be at least 1"));
                }
                inner.validate()
            }
        }
    }

    /// Construct the generator tree.
    ///
    /// Building never fails; a piece with bad parameters or without trace data yields a
    /// generator reporting `is_valid() == false`. Call [`validate`](Self::validate) first
    /// to get the reason as an error.
    pub fn build(&self) -> Box<dyn Generator> {
        match self {
            Self::ConstantRate { max_payload_size, initial_rate_bps } => {
                Box::new(ConstantRateGenerator::with_rate(*max_payload_size, *initial_rate_bps))
            }
            Self::SimpleFps { fps, initial_rate_bps } => {
                Box::new(SimpleFpsGenerator::with_rate(*fps, *initial_rate_bps))
            }
            Self::Trace(trace) => trace.build(),
            Self::Statistics(stats) => Box::new(StatisticalGenerator::new(stats.clone())),
            Self::Shaped { max_payload_size, per_packet_overhead, inner } => Box::new(
                ShapedPacketizer::with_overhead(inner.build(), *max_payload_size, *per_packet_overhead),
            ),
        }
    }
}
