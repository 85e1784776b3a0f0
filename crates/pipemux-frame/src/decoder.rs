use tracing::debug;

use pipemux_stream::crc16;

use crate::error::{ChunkError, Result};
use crate::header::{ChunkHeader, HEADER_SIZE};
use crate::input::InputPipe;

/// Resolves pipe ids to input pipes. Owned by the node/session layer;
/// the demultiplexer only borrows it per call.
pub trait PipeTable {
    /// The input side of the client-originated pipe with this index.
    fn client_input(&mut self, index: u16) -> Option<&mut InputPipe>;

    /// The input side of the server-originated pipe with this index.
    fn server_input(&mut self, index: u16) -> Option<&mut InputPipe>;
}

/// Demultiplexes one physical byte stream into per-pipe chunks.
///
/// A two-mode state machine: in header mode it accumulates the 8-byte
/// chunk header, then streams exactly `length` payload bytes into the
/// resolved pipe's reassembler, advancing the running offset and CRC
/// continuation as slices arrive. Payload bytes need not arrive in one
/// buffer — progress is possible one byte at a time.
///
/// The header-declared CRC is not verified against the payload here; it
/// is a continuation token for the pipe layer's reassembly, which owns
/// all ordering and acceptance decisions.
pub struct InputChannelDecoder {
    header_buf: [u8; HEADER_SIZE],
    header_len: usize,
    in_header: bool,
    // Remaining extent of the chunk currently being streamed.
    header: ChunkHeader,
    chunk_offset: u64,
    chunk_crc: u16,
    chunk_remaining: usize,
}

impl InputChannelDecoder {
    pub fn new() -> Self {
        Self {
            header_buf: [0; HEADER_SIZE],
            header_len: 0,
            in_header: true,
            header: ChunkHeader {
                pipe_id: crate::header::PipeId::from_raw(0),
                offset: 0,
                crc: 0,
                length: 0,
            },
            chunk_offset: 0,
            chunk_crc: 0,
            chunk_remaining: 0,
        }
    }

    /// Consume an entire incoming buffer, routing chunk payloads to the
    /// pipes resolved through `pipes`.
    ///
    /// Fails with [`ChunkError::UnknownPipe`] when a header names a pipe
    /// the table cannot resolve; the decoder state is left at that
    /// header, so the caller should treat the session as broken.
    pub fn process_bytes(&mut self, mut buf: &[u8], pipes: &mut dyn PipeTable) -> Result<()> {
        debug!(len = buf.len(), "input channel decoder processing bytes");

        while !buf.is_empty() {
            if self.in_header {
                let take = (HEADER_SIZE - self.header_len).min(buf.len());
                self.header_buf[self.header_len..self.header_len + take]
                    .copy_from_slice(&buf[..take]);
                self.header_len += take;
                buf = &buf[take..];

                if self.header_len == HEADER_SIZE {
                    self.begin_chunk(ChunkHeader::decode(&self.header_buf), pipes)?;
                }
            } else {
                let take = self.chunk_remaining.min(buf.len());
                let slice = &buf[..take];

                let pipe = self.resolve_pipe(pipes)?;
                pipe.process_chunk(slice, self.chunk_offset, self.chunk_crc);

                self.chunk_crc = crc16(self.chunk_crc, slice);
                self.chunk_offset += take as u64;
                self.chunk_remaining -= take;
                buf = &buf[take..];

                if self.chunk_remaining == 0 {
                    self.in_header = true;
                    self.header_len = 0;
                }
            }
        }

        Ok(())
    }

    /// Smallest buffer size guaranteed to make progress: the rest of the
    /// header in header mode, otherwise a single payload byte.
    pub fn min_useful_bytes(&self) -> usize {
        if self.in_header {
            HEADER_SIZE - self.header_len
        } else {
            1
        }
    }

    /// Validate the header's pipe id and set up payload streaming state.
    ///
    /// The pipe is resolved here, not lazily per payload slice, so a
    /// zero-length chunk naming an unknown pipe still fails.
    fn begin_chunk(&mut self, header: ChunkHeader, pipes: &mut dyn PipeTable) -> Result<()> {
        self.header = header;
        let expected = self.resolve_pipe(pipes)?.acknowledged().0;
        let offset = widen_offset(header.offset, expected);

        debug!(
            pipe = header.pipe_id.raw(),
            offset,
            len = header.length,
            crc = format_args!("{:04X}", header.crc),
            "received chunk header"
        );

        self.chunk_offset = offset;
        self.chunk_crc = header.crc;
        self.chunk_remaining = header.length as usize;

        // Zero-length chunks carry no payload; stay in header mode.
        if self.chunk_remaining == 0 {
            self.header_len = 0;
        } else {
            self.in_header = false;
        }
        Ok(())
    }

    fn resolve_pipe<'a>(&self, pipes: &'a mut dyn PipeTable) -> Result<&'a mut InputPipe> {
        let id = self.header.pipe_id;
        let (pipe, direction) = if id.is_client_originated() {
            (pipes.client_input(id.index()), "client")
        } else {
            (pipes.server_input(id.index()), "server")
        };
        pipe.ok_or(ChunkError::UnknownPipe {
            direction,
            index: id.index(),
        })
    }
}

impl Default for InputChannelDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a 16-bit wire offset back onto the pipe's full stream offset.
///
/// The header's offset field carries only the low 16 bits of the
/// logical position; the pipe's acknowledged position selects the
/// congruent value nearest to it, so streams keep flowing past 64 KiB
/// of per-pipe traffic. Candidates more than half a window away in
/// either direction land behind or ahead of the pipe and are handled
/// by its duplicate/gap rules.
fn widen_offset(wire: u16, expected: u64) -> u64 {
    const SPAN: u64 = 1 << 16;
    let candidate = (expected & !(SPAN - 1)) + wire as u64;
    if candidate + SPAN / 2 < expected {
        candidate + SPAN
    } else if candidate >= expected + SPAN / 2 && candidate >= SPAN {
        candidate - SPAN
    } else {
        candidate
    }
}
