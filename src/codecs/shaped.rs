//! Fragmenting, time-spreading packetizer wrapper
//!
//! [`ShapedPacketizer`] owns an inner generator, splits each inner frame into packets of
//! at most `max_payload` bytes and spreads their delivery evenly over the inner frame's
//! interval instead of bursting them. Example: an inner frame of 3500 bytes due 40ms
//! before the next one, with a 1000-byte payload limit, becomes four packets of
//! 1000, 1000, 1000 and 500 bytes, each 10ms apart.
//!
//! A per-packet overhead (IP/UDP/RTP headers, ...) can be configured; the wrapper uses it
//! to adjust the rate it hands to the inner generator.

use tracing::{debug, trace};

use super::rate::TargetRate;
use crate::generator::{Generator, HasPayloadLimit};
use crate::types::FrameRecord;

/// Upper bound on the estimated overhead share of a frame
pub const MAX_OVERHEAD_FRACTION: f64 = 0.5;

/// Packetizer wrapping an inner generator.
///
/// The wrapper owns the inner generator for its whole lifetime and cannot be cloned.
/// It is valid exactly when the inner generator is valid.
#[derive(Debug)]
pub struct ShapedPacketizer<G> {
    inner: G,
    max_payload: usize,
    per_packet_overhead: usize,
    rate: TargetRate,

    /// Inner frame being fragmented
    frame: FrameRecord,
    loaded: bool,
    offset: usize,
    packets_in_frame: usize,
    packets_sent: usize,
    elapsed_in_frame: f64,

    record: FrameRecord,
}

impl<G: Generator> ShapedPacketizer<G> {
    /// Wrap `inner`, emitting packets of at most `max_payload` bytes
    pub fn new(inner: G, max_payload: usize) -> Self {
        Self::with_overhead(inner, max_payload, 0)
    }

    /// Wrap `inner`, accounting for `per_packet_overhead` bytes added to every packet
    pub fn with_overhead(inner: G, max_payload: usize, per_packet_overhead: usize) -> Self {
        let mut rate = TargetRate::new(inner.target_rate());
        if max_payload == 0 {
            rate.poison("maximum payload size must be at least one byte");
        }
        let mut packetizer = Self {
            inner,
            max_payload,
            per_packet_overhead,
            rate,
            frame: FrameRecord::default(),
            loaded: false,
            offset: 0,
            packets_in_frame: 0,
            packets_sent: 0,
            elapsed_in_frame: 0.0,
            record: FrameRecord::default(),
        };
        if packetizer.rate.is_ok() && packetizer.load_inner_frame() {
            let wire_rate = packetizer.inner.target_rate() * (1.0 - packetizer.overhead_fraction());
            packetizer.rate.set(wire_rate);
            packetizer.emit_packet();
        }
        packetizer
    }

    /// Wrapped generator
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Give the inner generator back, dropping the wrapper
    pub fn into_inner(self) -> G {
        self.inner
    }

    /// Header bytes assumed on top of every packet's payload
    pub fn per_packet_overhead(&self) -> usize {
        self.per_packet_overhead
    }

    fn packets_for(&self, frame_size: usize) -> usize {
        frame_size.div_ceil(self.max_payload).max(1)
    }

    /// Share of wire bytes spent on overhead for a frame of the last seen size
    fn overhead_fraction(&self) -> f64 {
        let frame_size = self.frame.size();
        let overhead = (self.packets_for(frame_size) * self.per_packet_overhead) as f64;
        let total = frame_size as f64 + overhead;
        if total <= 0.0 {
            return 0.0;
        }
        (overhead / total).clamp(0.0, MAX_OVERHEAD_FRACTION)
    }

    /// Copy the inner generator's current frame; `false` if the inner is invalid
    fn load_inner_frame(&mut self) -> bool {
        let Some(frame) = self.inner.current() else {
            self.loaded = false;
            return false;
        };
        self.frame = frame.clone();
        self.loaded = true;
        self.offset = 0;
        self.packets_in_frame = self.packets_for(self.frame.size());
        self.packets_sent = 0;
        self.elapsed_in_frame = 0.0;
        trace!(
            "Fragmenting {} byte frame into {} packets over {:.6}s",
            self.frame.size(),
            self.packets_in_frame,
            self.frame.seconds_to_next
        );
        true
    }

    fn emit_packet(&mut self) {
        let remaining = self.frame.size() - self.offset;
        let size = remaining.min(self.max_payload);
        let payload = self.frame.payload[self.offset..self.offset + size].to_vec();

        self.packets_sent += 1;
        let interval = self.frame.seconds_to_next;
        let wait = if self.packets_sent == self.packets_in_frame {
            // Last packet takes whatever is left so the waits add up to the interval
            interval - self.elapsed_in_frame
        } else {
            interval / self.packets_in_frame as f64
        };

        self.offset += size;
        self.elapsed_in_frame += wait;
        self.record = FrameRecord::new(payload, wait);
    }
}

impl<G: Generator> Generator for ShapedPacketizer<G> {
    fn current(&self) -> Option<&FrameRecord> {
        self.is_valid().then_some(&self.record)
    }

    fn advance(&mut self) {
        if !self.rate.is_ok() {
            return;
        }
        if !self.loaded || self.packets_sent >= self.packets_in_frame {
            if self.loaded {
                self.inner.advance();
            }
            if !self.load_inner_frame() {
                return;
            }
        }
        self.emit_packet();
    }

    fn is_valid(&self) -> bool {
        self.rate.is_ok() && self.loaded && self.inner.is_valid()
    }

    fn target_rate(&self) -> f64 {
        self.rate.bps()
    }

    fn set_target_rate(&mut self, rate_bps: f64) -> f64 {
        if !self.rate.accepts(rate_bps) {
            return self.rate.bps();
        }
        let fraction = self.overhead_fraction();
        let inner_rate = rate_bps / (1.0 - fraction);
        let adopted = self.inner.set_target_rate(inner_rate);
        debug!(
            "Shaped packetizer: requested {} bps, inner set to {} bps (overhead {:.4})",
            rate_bps, adopted, fraction
        );
        self.rate.set(adopted * (1.0 - fraction))
    }
}

impl<G: Generator> HasPayloadLimit for ShapedPacketizer<G> {
    fn max_payload_size(&self) -> usize {
        self.max_payload
    }
}
