//! Test utilities for building trace sets and trace directories
//!
//! Trace recordings are large and not shipped with the crate, so tests and benches build
//! synthetic ones: in memory through [`uniform_trace_set`] and [`ramp_trace_set`], or on
//! disk through [`TraceFixture`].

#![cfg(any(test, feature = "benchmark"))]

use std::fs;
use std::io;
use tempfile::TempDir;

use crate::trace::{TraceFileName, TraceRecord, TraceSet};
use crate::types::Resolution;

/// Frames per second the synthetic traces are sized for
pub const FIXTURE_FPS: f64 = 25.0;

/// Frame size of a uniform trace at `kbps`: exactly `kbps` at [`FIXTURE_FPS`]
pub fn uniform_frame_size(kbps: u32) -> usize {
    (f64::from(kbps) * 1000.0 / (8.0 * FIXTURE_FPS)).round() as usize
}

/// Trace set where every frame of every trace has [`uniform_frame_size`] bytes
pub fn uniform_trace_set(resolutions: &[Resolution], bitrates: &[u32], frames: usize) -> TraceSet {
    let mut set = TraceSet::default();
    for resolution in resolutions {
        for kbps in bitrates {
            let records = vec![TraceRecord::from_size(uniform_frame_size(*kbps)); frames];
            set.insert(*resolution, *kbps, records);
        }
    }
    set
}

/// Trace set of one resolution whose frame `i` has `i + 1` bytes, to make the cursor visible
pub fn ramp_trace_set(resolution: Resolution, bitrates: &[u32], frames: usize) -> TraceSet {
    let mut set = TraceSet::default();
    for kbps in bitrates {
        let records = (1..=frames).map(TraceRecord::from_size).collect();
        set.insert(resolution, *kbps, records);
    }
    set
}

/// Frame sizes of a record slice
pub fn sizes(records: &[TraceRecord]) -> Vec<usize> {
    records.iter().map(|record| record.frame_size).collect()
}

/// Builder for a temporary trace directory.
///
/// ```rust,ignore
/// let dir = TraceFixture::new("clip")
///     .with_trace(Resolution::P360, 400, &[4000, 900, 950])
///     .build()?;
/// let set = TraceSet::load(dir.path(), "clip")?;
/// ```
#[derive(Debug, Clone)]
pub struct TraceFixture {
    prefix: String,
    files: Vec<(String, String)>,
}

impl TraceFixture {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_string(), files: Vec::new() }
    }

    /// Add a trace file with one frame size per line
    pub fn with_trace(mut self, resolution: Resolution, kbps: u32, frame_sizes: &[usize]) -> Self {
        let name = TraceFileName { resolution, bitrate_kbps: kbps }.to_file_name(&self.prefix);
        let contents: String = frame_sizes.iter().map(|size| format!("{size}\n")).collect();
        self.files.push((name, contents));
        self
    }

    /// Add a uniform trace of `frames` frames for every resolution/bitrate pair
    pub fn with_uniform_traces(
        mut self,
        resolutions: &[Resolution],
        bitrates: &[u32],
        frames: usize,
    ) -> Self {
        for resolution in resolutions {
            for kbps in bitrates {
                self = self.with_trace(*resolution, *kbps, &vec![uniform_frame_size(*kbps); frames]);
            }
        }
        self
    }

    /// Add an arbitrary file
    pub fn with_file(mut self, name: &str, contents: &str) -> Self {
        self.files.push((name.to_string(), contents.to_string()));
        self
    }

    /// Write the files into a fresh temporary directory, removed when dropped
    pub fn build(self) -> io::Result<TempDir> {
        let dir = tempfile::tempdir()?;
        for (name, contents) in &self.files {
            fs::write(dir.path().join(name), contents)?;
        }
        Ok(dir)
    }
}
