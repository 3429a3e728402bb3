//! In-memory trace sets
//!
//! A [`TraceSet`] maps each resolution to the bitrates it was encoded at, and each
//! `(resolution, bitrate)` pair to the ordered frame records of the same source video.
//! It is built once and read-only afterwards, so one set can back several generators
//! through an `Arc`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::filename::{TraceFileName, check_bitrate};
use super::reader::{LineTraceReader, TraceReader, TraceRecord};
use crate::types::Resolution;
use crate::{Result, SyncodecError};

/// Frame records of every bitrate for one resolution, keyed by kbps
pub type BitrateMap = BTreeMap<u32, Vec<TraceRecord>>;

/// Frame traces keyed by resolution and bitrate
#[derive(Debug, Clone, Default)]
pub struct TraceSet {
    traces: BTreeMap<Resolution, BitrateMap>,
}

impl TraceSet {
    /// Load every `<prefix>_<resolution>_<kbps>.txt` file in `dir` with the line reader
    pub fn load<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self> {
        Self::load_with(dir, prefix, &LineTraceReader::default())
    }

    /// Load a trace directory with a custom reader.
    ///
    /// Files that do not belong to the set are ignored. Trace files that cannot be named,
    /// read or parsed are skipped with a warning. Fails when the directory cannot be listed
    /// or when no usable trace remains.
    pub fn load_with<P: AsRef<Path>>(
        dir: P,
        prefix: &str,
        reader: &dyn TraceReader,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SyncodecError::Directory { path: dir.to_path_buf(), source: e })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut set = TraceSet::default();
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = match TraceFileName::parse(file_name, prefix) {
                Ok(Some(name)) => name,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping trace file {}: {}", path.display(), e);
                    continue;
                }
            };
            match reader.read_trace(&path) {
                Ok(records) if records.is_empty() => {
                    warn!("Skipping empty trace file {}", path.display());
                }
                Ok(records) => {
                    debug!(
                        "Loaded {} frames for {} at {} kbps",
                        records.len(),
                        name.resolution,
                        name.bitrate_kbps
                    );
                    set.insert(name.resolution, name.bitrate_kbps, records);
                }
                Err(e) => warn!("Skipping trace file {}: {}", path.display(), e),
            }
        }

        if set.is_empty() {
            return Err(SyncodecError::NoTraceData {
                path: dir.to_path_buf(),
                prefix: prefix.to_string(),
            });
        }

        set.warn_on_length_mismatch();
        info!(
            "Loaded trace set '{}' from {}: {} traces across {} resolutions",
            prefix,
            dir.display(),
            set.trace_count(),
            set.traces.len()
        );
        Ok(set)
    }

    /// Build a set from in-memory traces; bitrates must lie on the trace grid
    pub fn from_traces<I>(traces: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Resolution, u32, Vec<TraceRecord>)>,
    {
        let mut set = TraceSet::default();
        for (resolution, kbps, records) in traces {
            check_bitrate(kbps)?;
            if records.is_empty() {
                return Err(SyncodecError::invalid_config(format!(
                    "trace for {resolution} at {kbps} kbps has no frames"
                )));
            }
            set.insert(resolution, kbps, records);
        }
        set.warn_on_length_mismatch();
        Ok(set)
    }

    pub(crate) fn insert(&mut self, resolution: Resolution, kbps: u32, records: Vec<TraceRecord>) {
        self.traces.entry(resolution).or_default().insert(kbps, records);
    }

    /// Whether no trace was loaded
    pub fn is_empty(&self) -> bool {
        self.traces.values().all(BTreeMap::is_empty)
    }

    /// Number of `(resolution, bitrate)` traces
    pub fn trace_count(&self) -> usize {
        self.traces.values().map(BTreeMap::len).sum()
    }

    /// Resolutions with at least one trace, smallest first
    pub fn resolutions(&self) -> Vec<Resolution> {
        self.traces.iter().filter(|(_, rates)| !rates.is_empty()).map(|(res, _)| *res).collect()
    }

    /// Traces of one resolution
    pub fn bitrates(&self, resolution: Resolution) -> Option<&BitrateMap> {
        self.traces.get(&resolution).filter(|rates| !rates.is_empty())
    }

    /// Frame records of one trace
    pub fn sequence(&self, resolution: Resolution, kbps: u32) -> Option<&[TraceRecord]> {
        self.traces.get(&resolution)?.get(&kbps).map(Vec::as_slice)
    }

    /// Lengths of the shortest and longest trace
    pub fn length_range(&self) -> Option<(usize, usize)> {
        let lengths = self.traces.values().flat_map(|rates| rates.values().map(Vec::len));
        lengths.fold(None, |acc, len| match acc {
            None => Some((len, len)),
            Some((lo, hi)) => Some((lo.min(len), hi.max(len))),
        })
    }

    fn warn_on_length_mismatch(&self) {
        if let Some((shortest, longest)) = self.length_range() {
            if shortest != longest {
                warn!(
                    "Trace lengths differ ({} to {} frames); traces should come from one video",
                    shortest, longest
                );
            }
        }
    }
}
