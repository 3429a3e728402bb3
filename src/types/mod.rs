//! Core data types shared by all generators.
//!
//! - [`FrameRecord`] is the elementary unit every generator produces: a payload whose
//!   length is the encoded frame (or packet) size, and the seconds to wait before the
//!   next record.
//! - [`Resolution`] is the fixed, totally ordered set of video resolutions that the
//!   trace-based codecs adapt between.
//!
//! ## Usage Example
//!
//! ```rust
//! use syncodecs::types::{FrameRecord, Resolution};
//!
//! let record = FrameRecord::filler(1200, 0.04);
//! assert_eq!(record.bits() / record.seconds_to_next, 240_000.0);
//!
//! let res: Resolution = "720p".parse().unwrap();
//! assert_eq!(res.pixels(), 1280 * 720);
//! assert!(res > Resolution::P480);
//! ```

mod frame;
mod resolution;

pub use frame::FrameRecord;
pub use resolution::Resolution;
