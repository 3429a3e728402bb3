//! Leaf codecs and the shaping wrapper.
//!
//! | Codec | Size | Interval |
//! |---|---|---|
//! | [`ConstantRateGenerator`] | fixed payload size | adapts to the target rate |
//! | [`SimpleFpsGenerator`] | adapts to the target rate | fixed `1/fps` |
//! | [`StatisticalGenerator`] | steady/transient model with noise | fixed `1/fps` |
//! | [`ShapedPacketizer`] | inner frames split at the payload limit | inner interval spread evenly |
//!
//! The trace-based codecs live in [`crate::trace`].

mod perfect;
mod rate;
mod shaped;
mod simple_fps;
mod statistics;

pub use perfect::ConstantRateGenerator;
pub use rate::{DEFAULT_TARGET_RATE_BPS, MAX_FRAME_SIZE};
pub use shaped::{MAX_OVERHEAD_FRACTION, ShapedPacketizer};
pub use simple_fps::{DEFAULT_FPS, SimpleFpsGenerator};
pub use statistics::{Phase, StatisticalGenerator, StatisticsConfig, TRANSIENT_FLOOR_RATIO};

pub(crate) use rate::TargetRate;
