//! Error types for synthetic codec construction.
//!
//! Generators themselves never fail: the pull contract reports configuration problems
//! through [`Generator::is_valid`](crate::Generator::is_valid) and rejected updates through
//! the value returned by `set_target_rate`. Everything that touches the outside world
//! (trace directories, trace files, YAML configuration) returns a [`SyncodecError`].
//!
//! ## Error Categories
//!
//! - **File Errors**: a trace or configuration file could not be read
//! - **Directory Errors**: the trace directory could not be listed
//! - **Parse Errors**: a trace line or a YAML document is malformed
//! - **Trace Data Errors**: no usable traces, bitrates outside the supported grid
//! - **Configuration Errors**: parameters outside their valid range
//!
//! ## Helper Constructors
//!
//! ```rust
//! use syncodecs::SyncodecError;
//! use std::path::PathBuf;
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
//! let file_error = SyncodecError::file_error(PathBuf::from("traces/clip_720p_1200.txt"), io_err);
//! assert!(file_error.to_string().contains("clip_720p_1200.txt"));
//!
//! let config_error = SyncodecError::invalid_config("fps must be positive");
//! assert!(!config_error.recovery_suggestions().is_empty());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for syncodecs operations.
pub type Result<T, E = SyncodecError> = std::result::Result<T, E>;

/// Main error type for loading traces and configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncodecError {
    #[error("Trace file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Trace directory error: {path}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("No usable trace files with prefix '{prefix}' in {path}")]
    NoTraceData { path: PathBuf, prefix: String },

    #[error("Bitrate {kbps} kbps is outside the trace grid (100..=6000 kbps in steps of 100)")]
    BitrateOutOfRange { kbps: u32 },

    #[error("Unknown resolution label '{label}'")]
    UnknownResolution { label: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SyncodecError {
    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SyncodecError::File { .. } => {
                vec!["Check the file exists and is readable", "Check file permissions"]
            }
            SyncodecError::Directory { .. } => vec![
                "Check the trace directory path",
                "Check directory permissions",
            ],
            SyncodecError::Parse { .. } => vec![
                "Check the trace line format (whitespace-separated fields)",
                "Check the configured frame-size column",
                "Validate the YAML document structure",
            ],
            SyncodecError::NoTraceData { .. } => vec![
                "Name trace files <prefix>_<resolution>_<kbps>.txt",
                "Check the prefix matches the trace files",
                "Use resolutions 90p, 180p, 240p, 360p, 480p, 540p, 720p or 1080p",
            ],
            SyncodecError::BitrateOutOfRange { .. } => vec![
                "Use bitrates between 100 and 6000 kbps",
                "Use bitrates that are a multiple of 100 kbps",
            ],
            SyncodecError::UnknownResolution { .. } => {
                vec!["Use one of 90p, 180p, 240p, 360p, 480p, 540p, 720p, 1080p"]
            }
            SyncodecError::InvalidConfig { .. } => vec![
                "Use strictly positive rates, fps and payload sizes",
                "Keep ratios within their documented ranges",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        SyncodecError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        SyncodecError::InvalidConfig { reason: reason.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        SyncodecError::Parse { context: context.into(), details: details.into() }
    }
}

impl From<std::io::Error> for SyncodecError {
    fn from(err: std::io::Error) -> Self {
        SyncodecError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
