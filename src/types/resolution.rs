//! Video resolutions known to the trace-based codecs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SyncodecError;

/// Output resolution of a trace, ordered by pixel count.
///
/// The variant order matches the pixel-count order, so the derived `Ord` is the order
/// used when stepping resolutions up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Resolution {
    #[serde(rename = "90p")]
    P90,
    #[serde(rename = "180p")]
    P180,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "540p")]
    P540,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    /// Every resolution, smallest first
    pub const ALL: [Resolution; 8] = [
        Resolution::P90,
        Resolution::P180,
        Resolution::P240,
        Resolution::P360,
        Resolution::P480,
        Resolution::P540,
        Resolution::P720,
        Resolution::P1080,
    ];

    /// Label used in trace file names
    pub fn label(self) -> &'static str {
        match self {
            Resolution::P90 => "90p",
            Resolution::P180 => "180p",
            Resolution::P240 => "240p",
            Resolution::P360 => "360p",
            Resolution::P480 => "480p",
            Resolution::P540 => "540p",
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }

    /// Frame dimensions as `(height, width)`
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::P90 => (90, 160),
            Resolution::P180 => (180, 320),
            Resolution::P240 => (240, 352),
            Resolution::P360 => (360, 640),
            Resolution::P480 => (480, 640),
            Resolution::P540 => (540, 960),
            Resolution::P720 => (720, 1280),
            Resolution::P1080 => (1080, 1920),
        }
    }

    /// Pixels per frame
    pub fn pixels(self) -> u32 {
        let (height, width) = self.dimensions();
        height * width
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = SyncodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .into_iter()
            .find(|res| res.label() == s)
            .ok_or_else(|| SyncodecError::UnknownResolution { label: s.to_string() })
    }
}
