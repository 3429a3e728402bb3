//! Trace file naming: `<prefix>_<resolution>_<kbps>.txt`

use crate::types::Resolution;
use crate::{Result, SyncodecError};

/// Lowest trace bitrate accepted (kbps)
pub const TRACE_MIN_BITRATE_KBPS: u32 = 100;
/// Highest trace bitrate accepted (kbps)
pub const TRACE_MAX_BITRATE_KBPS: u32 = 6000;
/// Trace bitrates must be a multiple of this step (kbps)
pub const TRACE_BITRATE_STEP_KBPS: u32 = 100;

/// Check that a bitrate lies on the trace grid
pub fn check_bitrate(kbps: u32) -> Result<u32> {
    let in_range = (TRACE_MIN_BITRATE_KBPS..=TRACE_MAX_BITRATE_KBPS).contains(&kbps);
    if in_range && kbps % TRACE_BITRATE_STEP_KBPS == 0 {
        Ok(kbps)
    } else {
        Err(SyncodecError::BitrateOutOfRange { kbps })
    }
}

/// Resolution and bitrate encoded in a trace file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceFileName {
    pub resolution: Resolution,
    pub bitrate_kbps: u32,
}

impl TraceFileName {
    /// Parse `file_name` if it belongs to the trace set `prefix`.
    ///
    /// Returns `Ok(None)` for files that are not trace files of this set, and an error
    /// for files that are but carry an unusable resolution or bitrate.
    pub fn parse(file_name: &str, prefix: &str) -> Result<Option<Self>> {
        let Some(rest) = file_name.strip_prefix(prefix).and_then(|r| r.strip_prefix('_')) else {
            return Ok(None);
        };
        let Some(stem) = rest.strip_suffix(".txt") else {
            return Ok(None);
        };
        // The prefix may itself contain underscores, so split from the right
        let Some((label, bitrate)) = stem.rsplit_once('_') else {
            return Ok(None);
        };
        if label.contains('_') {
            return Ok(None);
        }

        let resolution: Resolution = label.parse()?;
        let bitrate_kbps: u32 = bitrate.parse().map_err(|_| {
            SyncodecError::parse("Trace file name", format!("bad bitrate '{bitrate}' in {file_name}"))
        })?;
        check_bitrate(bitrate_kbps)?;

        Ok(Some(Self { resolution, bitrate_kbps }))
    }

    /// File name for this resolution/bitrate within the trace set `prefix`
    pub fn to_file_name(&self, prefix: &str) -> String {
        format!("{}_{}_{}.txt", prefix, self.resolution.label(), self.bitrate_kbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_names() {
        let parsed = TraceFileName::parse("clip_720p_1200.txt", "clip").unwrap().unwrap();
        assert_eq!(parsed.resolution, Resolution::P720);
        assert_eq!(parsed.bitrate_kbps, 1200);
        assert_eq!(parsed.to_file_name("clip"), "clip_720p_1200.txt");
    }

    #[test]
    fn prefixes_with_underscores_work() {
        let parsed = TraceFileName::parse("my_clip_90p_100.txt", "my_clip").unwrap().unwrap();
        assert_eq!(parsed.resolution, Resolution::P90);
    }

    #[test]
    fn foreign_files_are_ignored() {
        assert_eq!(TraceFileName::parse("other_720p_1200.txt", "clip").unwrap(), None);
        assert_eq!(TraceFileName::parse("clip_720p_1200.csv", "clip").unwrap(), None);
        assert_eq!(TraceFileName::parse("clipper_720p_1200.txt", "clip").unwrap(), None);
        assert_eq!(TraceFileName::parse("clip_x_720p_1200.txt", "clip").unwrap(), None);
        assert_eq!(TraceFileName::parse("README.md", "clip").unwrap(), None);
    }

    #[test]
    fn bad_fields_are_errors() {
        assert!(matches!(
            TraceFileName::parse("clip_4k_1200.txt", "clip"),
            Err(SyncodecError::UnknownResolution { .. })
        ));
        assert!(matches!(
            TraceFileName::parse("clip_720p_1250.txt", "clip"),
            Err(SyncodecError::BitrateOutOfRange { kbps: 1250 })
        ));
        assert!(matches!(
            TraceFileName::parse("clip_720p_7000.txt", "clip"),
            Err(SyncodecError::BitrateOutOfRange { .. })
        ));
        assert!(matches!(
            TraceFileName::parse("clip_720p_fast.txt", "clip"),
            Err(SyncodecError::Parse { .. })
        ));
    }

    #[test]
    fn bitrate_grid_bounds() {
        assert!(check_bitrate(100).is_ok());
        assert!(check_bitrate(6000).is_ok());
        assert!(check_bitrate(0).is_err());
        assert!(check_bitrate(6100).is_err());
        assert!(check_bitrate(150).is_err());
    }
}
