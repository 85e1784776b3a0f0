use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pipemux_stream::{crc16, Event, CRC16_INIT};

use crate::header::PipeId;

/// One retransmittable slice of a pipe's logical stream.
///
/// Chunks are transient: constructed on demand from the pipe's pending
/// buffer, never stored.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub pipe_id: PipeId,
    /// Byte position of `data` within the pipe's logical stream.
    pub offset: u64,
    /// CRC16 continuation over all stream bytes before `offset`.
    pub crc_init: u16,
    pub data: Bytes,
    /// Whether a logical message boundary follows `data`.
    pub packet_break: bool,
}

/// Snapshot of an output pipe's `(offset, crc)` state, taken when a pipe
/// is paused so a later session can resume checksum continuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendedOutputPipe {
    pub offset: u64,
    pub crc: u16,
}

impl Default for SuspendedOutputPipe {
    fn default() -> Self {
        Self {
            offset: 0,
            crc: CRC16_INIT,
        }
    }
}

/// The sending side of one logical pipe.
///
/// Buffers bytes queued beyond the acknowledged position, exposes them
/// as retransmittable chunks gated by a pacing timer, and drops
/// acknowledged prefixes while advancing its CRC continuation.
///
/// Invariants: `position` only increases, and `crc` is always the
/// checksum of exactly the first `position` bytes of the logical stream.
pub struct OutputPipe {
    pipe_id: PipeId,
    /// Offset of the first byte not yet acknowledged.
    position: u64,
    /// Checksum state as of `position`.
    crc: u16,
    /// Bytes occupying `[position, position + pending.len())`.
    pending: BytesMut,
    next_due_time: Option<Instant>,
    packet_break: bool,
    fully_flushed: Event,
    send_ready: Event,
}

impl OutputPipe {
    /// A fresh pipe starting at offset zero.
    pub fn new(pipe_id: PipeId) -> Self {
        Self::resume(pipe_id, SuspendedOutputPipe::default())
    }

    /// Resume a pipe from a suspended snapshot, preserving offset and
    /// checksum continuity across sessions.
    pub fn resume(pipe_id: PipeId, suspended: SuspendedOutputPipe) -> Self {
        Self {
            pipe_id,
            position: suspended.offset,
            crc: suspended.crc,
            pending: BytesMut::new(),
            next_due_time: None,
            packet_break: false,
            fully_flushed: Event::new_set(),
            send_ready: Event::new(),
        }
    }

    pub fn pipe_id(&self) -> PipeId {
        self.pipe_id
    }

    /// Offset of the first unacknowledged byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Checksum of all acknowledged bytes.
    pub fn crc(&self) -> u16 {
        self.crc
    }

    /// Number of queued, unacknowledged bytes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Queue bytes for transmission and mark the pipe send-ready.
    pub fn send_bytes(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.fully_flushed.clear();
        }
        self.pending.extend_from_slice(data);
        self.send_ready.set();
    }

    /// Mark a logical message boundary without queueing new bytes.
    pub fn send_packet_break(&mut self) {
        self.packet_break = true;
        self.send_ready.set();
    }

    /// The pending data as one chunk — but only if there is data or a
    /// pending break and the pacing timer has elapsed.
    ///
    /// This is the pacing gate: a recently sent pipe is not re-chunked
    /// until its resend interval passes, giving timer-based
    /// retransmission instead of NACK-driven retransmission.
    pub fn pending_chunk(&self, now: Instant) -> Option<Chunk> {
        let have_data = !self.pending.is_empty() || self.packet_break;
        if !have_data || !self.is_due(now) {
            return None;
        }
        Some(Chunk {
            pipe_id: self.pipe_id,
            offset: self.position,
            crc_init: self.crc,
            data: Bytes::copy_from_slice(&self.pending),
            packet_break: self.packet_break,
        })
    }

    /// Acknowledge delivery of `length` bytes starting at `offset`.
    ///
    /// The acknowledged range is clipped to the unacknowledged window
    /// `[position, position + pending.len())`: ranges ending at or before
    /// `position` were already dropped, ranges starting past the buffer
    /// end have nothing to drop, and a range reaching before `position`
    /// loses its already-acknowledged prefix. `position` never moves
    /// backward, so duplicate and overlapping acknowledgments are
    /// idempotent.
    pub fn drop_chunk(&mut self, offset: u64, length: usize) {
        let end = offset.saturating_add(length as u64);
        let window_end = self.position + self.pending.len() as u64;

        if end <= self.position || offset >= window_end {
            return;
        }

        let drop_len = (end.min(window_end) - self.position) as usize;

        self.crc = crc16(self.crc, &self.pending[..drop_len]);
        let _ = self.pending.split_to(drop_len);
        self.position += drop_len as u64;
        debug!(
            pipe = self.pipe_id.raw(),
            dropped = drop_len,
            position = self.position,
            "acknowledged chunk bytes"
        );

        if self.pending.is_empty() {
            self.packet_break = false;
            self.fully_flushed.set();
        }
    }

    /// Earliest time the pending data may be (re)sent, if a send has
    /// happened before.
    pub fn due_time(&self) -> Option<Instant> {
        self.next_due_time
    }

    /// Update the pacing timer; invoked by the sender after actually
    /// transmitting a chunk.
    pub fn set_due_time(&mut self, due: Instant) {
        self.next_due_time = Some(due);
        self.send_ready.clear();
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.next_due_time {
            None => true,
            Some(due) => now >= due,
        }
    }

    /// Whether every queued byte has been acknowledged.
    pub fn is_fully_flushed(&self) -> bool {
        self.fully_flushed.is_set()
    }

    /// Handle signaled whenever the pending buffer drains.
    pub fn flushed_signal(&self) -> Event {
        self.fully_flushed.clone()
    }

    /// Handle signaled whenever new data or a break is queued; the
    /// session layer waits on this to know a pipe wants chunking.
    pub fn ready_signal(&self) -> Event {
        self.send_ready.clone()
    }

    /// Snapshot the pipe without waiting for outstanding bytes.
    pub fn suspend(&self) -> SuspendedOutputPipe {
        SuspendedOutputPipe {
            offset: self.position,
            crc: self.crc,
        }
    }

    /// Block until every pending byte is acknowledged, then snapshot the
    /// pipe for later resumption.
    ///
    /// Takes the shared wrapper rather than `&mut self` so the
    /// acknowledgment path can keep dropping chunks while this waits.
    pub fn close(pipe: &Mutex<OutputPipe>) -> SuspendedOutputPipe {
        let signal = {
            let guard = pipe.lock().unwrap_or_else(PoisonError::into_inner);
            guard.flushed_signal()
        };
        signal.wait();
        pipe.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .suspend()
    }
}
