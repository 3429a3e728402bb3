//! Generator trait and capability traits
//!
//! A [`Generator`] is a pull-based state machine: the consumer reads the current record,
//! waits `seconds_to_next` in its own notion of time, advances, and may change the target
//! rate at any point. Generators never block, spawn work or look at a clock.

use crate::types::FrameRecord;

/// Trait implemented by every synthetic codec.
///
/// Once constructed, a valid generator already points at its first record.
///
/// - `current()` returns `None` while the generator is invalid
/// - `advance()` on an invalid generator does nothing
/// - `set_target_rate()` returns the rate actually adopted, which can differ from the
///   requested one when the generator clamps, throttles or rejects the update
pub trait Generator {
    /// Current frame or packet record, or `None` when the generator is invalid
    fn current(&self) -> Option<&FrameRecord>;

    /// Produce the next record
    fn advance(&mut self);

    /// Whether the current record can be read
    fn is_valid(&self) -> bool;

    /// Target rate in bits per second
    fn target_rate(&self) -> f64;

    /// Request a new target rate (bps, must be `> 0`) and return the adopted rate
    fn set_target_rate(&mut self, rate_bps: f64) -> f64;
}

/// Generators that run at a frames-per-second cadence
pub trait HasFps {
    /// Frames per second
    fn fps(&self) -> f64;
}

/// Generators that never emit a payload larger than a configured ceiling
pub trait HasPayloadLimit {
    /// Maximum payload size in bytes
    fn max_payload_size(&self) -> usize;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn current(&self) -> Option<&FrameRecord> {
        (**self).current()
    }

    fn advance(&mut self) {
        (**self).advance()
    }

    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn target_rate(&self) -> f64 {
        (**self).target_rate()
    }

    fn set_target_rate(&mut self, rate_bps: f64) -> f64 {
        (**self).set_target_rate(rate_bps)
    }
}

impl<G: Generator + ?Sized> Generator for &mut G {
    fn current(&self) -> Option<&FrameRecord> {
        (**self).current()
    }

    fn advance(&mut self) {
        (**self).advance()
    }

    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn target_rate(&self) -> f64 {
        (**self).target_rate()
    }

    fn set_target_rate(&mut self, rate_bps: f64) -> f64 {
        (**self).set_target_rate(rate_bps)
    }
}

/// Extension trait turning any generator into an iterator
pub trait GeneratorExt: Generator {
    /// Yield the current record, then advance, until the generator turns invalid.
    ///
    /// Most generators never turn invalid, so bound the iterator with `take`.
    fn records(self) -> Records<Self>
    where
        Self: Sized,
    {
        Records { generator: self }
    }

    /// Like [`records`](GeneratorExt::records), but stamp each record with the
    /// cumulative time at which it is due, starting at zero.
    fn timeline(self) -> Timeline<Self>
    where
        Self: Sized,
    {
        Timeline { generator: self, now: 0.0 }
    }
}

impl<G: Generator> GeneratorExt for G {}

/// Iterator returned by [`GeneratorExt::records`]
pub struct Records<G> {
    generator: G,
}

impl<G> Records<G> {
    /// Recover the wrapped generator
    pub fn into_inner(self) -> G {
        self.generator
    }
}

impl<G: Generator> Iterator for Records<G> {
    type Item = FrameRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.generator.current()?.clone();
        self.generator.advance();
        Some(record)
    }
}

/// A record together with the time it is due
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRecord {
    /// Seconds since the first record
    pub at: f64,
    pub record: FrameRecord,
}

/// Iterator returned by [`GeneratorExt::timeline`]
pub struct Timeline<G> {
    generator: G,
    now: f64,
}

impl<G: Generator> Iterator for Timeline<G> {
    type Item = TimedRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.generator.current()?.clone();
        let at = self.now;
        self.now += record.seconds_to_next;
        self.generator.advance();
        Some(TimedRecord { at, record })
    }
}
