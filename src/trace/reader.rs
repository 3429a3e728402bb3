//! Trace file reading
//!
//! A trace file holds one frame record per line, in display order. The
//! [`TraceReader`] trait is the seam for plugging in a reader for other trace formats;
//! [`LineTraceReader`] handles the plain whitespace-separated format:
//!
//! ```text
//! # frame size type psnr
//! 0 41234 I 38.2
//! 1 1873 P 37.9
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. One column holds the frame size
//! in bytes; the remaining columns are kept verbatim in [`TraceRecord::fields`].

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{Result, SyncodecError};

/// One line of a trace file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Encoded frame size in bytes
    pub frame_size: usize,
    /// Every other column of the line, unparsed
    pub fields: Vec<String>,
}

impl TraceRecord {
    /// Record carrying only a frame size
    pub fn from_size(frame_size: usize) -> Self {
        Self { frame_size, fields: Vec::new() }
    }
}

/// Source of frame records for one trace file
pub trait TraceReader {
    /// Read every record of the trace at `path`, in display order
    fn read_trace(&self, path: &Path) -> Result<Vec<TraceRecord>>;
}

/// Reader for whitespace-separated trace lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineTraceReader {
    /// Zero-based column holding the frame size
    pub size_column: usize,
}

impl LineTraceReader {
    pub fn new(size_column: usize) -> Self {
        Self { size_column }
    }

    /// Parse trace lines from any buffered source; `origin` names it in errors
    pub fn parse_lines<R: BufRead>(&self, reader: R, origin: &str) -> Result<Vec<TraceRecord>> {
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                SyncodecError::parse(format!("{origin} line {}", index + 1), e.to_string())
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            records.push(self.parse_line(trimmed, origin, index + 1)?);
        }
        Ok(records)
    }

    fn parse_line(&self, line: &str, origin: &str, line_no: usize) -> Result<TraceRecord> {
        let mut fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if self.size_column >= fields.len() {
            return Err(SyncodecError::parse(
                format!("{origin} line {line_no}"),
                format!("expected a frame size in column {}", self.size_column),
            ));
        }

        let raw = fields.remove(self.size_column);
        let frame_size = match raw.parse::<usize>() {
            Ok(size) => size,
            // Some encoders log sizes as floats
            Err(_) => match raw.parse::<f64>() {
                Ok(size) if size.is_finite() && size >= 0.0 => size.round() as usize,
                _ => {
                    return Err(SyncodecError::parse(
                        format!("{origin} line {line_no}"),
                        format!("invalid frame size '{raw}'"),
                    ));
                }
            },
        };

        Ok(TraceRecord { frame_size, fields })
    }
}

impl TraceReader for LineTraceReader {
    fn read_trace(&self, path: &Path) -> Result<Vec<TraceRecord>> {
        let file = File::open(path).map_err(|e| SyncodecError::file_error(path.to_path_buf(), e))?;
        self.parse_lines(BufReader::new(file), &path.display().to_string())
    }
}
