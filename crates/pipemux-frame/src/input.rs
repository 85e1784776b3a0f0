use tracing::{debug, trace};

use pipemux_stream::{crc16, StreamSink, CRC16_INIT};

/// The receiving side of one logical pipe.
///
/// Reassembles the pipe's byte stream from offset-addressed chunks. The
/// sender retransmits on a timer, so duplicates and overlaps are
/// expected: a chunk is clipped to the suffix that has not been seen
/// yet, and chunks past the expected offset (gaps) are ignored until
/// retransmission fills them in.
///
/// Only bytes the installed handler actually consumes advance the
/// acknowledged offset — unconsumed bytes are delivered again on the
/// next retransmission.
pub struct InputPipe {
    /// Offset of the next byte expected from the stream.
    offset: u64,
    /// CRC16 continuation over all bytes before `offset`.
    crc: u16,
    handler: Option<Box<dyn StreamSink + Send>>,
}

impl InputPipe {
    pub fn new() -> Self {
        Self {
            offset: 0,
            crc: CRC16_INIT,
            handler: None,
        }
    }

    /// Install the sink that consumes this pipe's reassembled bytes.
    pub fn set_input_handler(&mut self, handler: Box<dyn StreamSink + Send>) {
        self.handler = Some(handler);
    }

    /// The `(offset, crc)` the session layer reports back to the sender
    /// as its acknowledgment state.
    pub fn acknowledged(&self) -> (u64, u16) {
        (self.offset, self.crc)
    }

    /// Deliver one chunk slice arriving at `offset` with CRC
    /// continuation `crc`.
    ///
    /// The header-declared CRC is a continuation token; a mismatch
    /// against the running checksum is traced but does not reject the
    /// payload.
    pub fn process_chunk(&mut self, data: &[u8], offset: u64, crc: u16) {
        if offset == self.offset && crc != self.crc {
            debug!(declared = crc, running = self.crc, "checksum continuation mismatch");
        }
        let end = offset + data.len() as u64;

        if end <= self.offset {
            trace!(offset, end, expected = self.offset, "duplicate chunk ignored");
            return;
        }
        if offset > self.offset {
            debug!(offset, expected = self.offset, "chunk past expected offset ignored");
            return;
        }

        // Clip the already-seen prefix of an overlapping chunk.
        let fresh = &data[(self.offset - offset) as usize..];

        let Some(handler) = self.handler.as_mut() else {
            trace!(offset, len = fresh.len(), "no input handler; awaiting retransmission");
            return;
        };

        let mut delivered = 0;
        while delivered < fresh.len() {
            let (_, consumed) = handler.process_bytes(&fresh[delivered..]);
            if consumed == 0 {
                break;
            }
            delivered += consumed;
        }

        self.crc = crc16(self.crc, &fresh[..delivered]);
        self.offset += delivered as u64;
    }
}

impl Default for InputPipe {
    fn default() -> Self {
        Self::new()
    }
}
