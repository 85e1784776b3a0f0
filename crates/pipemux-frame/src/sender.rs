use std::io::{ErrorKind, Write};
use std::time::Instant;

use bytes::BytesMut;
use tracing::debug;

use crate::config::PipeConfig;
use crate::error::{ChunkError, Result};
use crate::header::{ChunkHeader, HEADER_SIZE};
use crate::output::{Chunk, OutputPipe};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Frames pending pipe chunks and writes them to the physical transport.
///
/// This is the pacing loop: pipes are visited in due-time order, each
/// due pipe contributes at most one chunk (truncated to the configured
/// payload cap), and every transmission pushes that pipe's due time out
/// by the resend interval. Unacknowledged data is therefore re-emitted
/// automatically on the next pass once its interval elapses.
pub struct ChunkSender<W> {
    transport: W,
    config: PipeConfig,
    buf: BytesMut,
}

impl<W: Write> ChunkSender<W> {
    /// Create a sender with default configuration.
    pub fn new(transport: W) -> Self {
        Self::with_config(transport, PipeConfig::default())
    }

    /// Create a sender with explicit configuration.
    pub fn with_config(transport: W, config: PipeConfig) -> Self {
        Self {
            transport,
            config,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Emit at most one chunk per due pipe, in due-time order.
    ///
    /// Returns the number of chunks written.
    pub fn send_ready<'a, I>(&mut self, pipes: I, now: Instant) -> Result<usize>
    where
        I: IntoIterator<Item = &'a mut OutputPipe>,
    {
        let mut due: Vec<&'a mut OutputPipe> = pipes.into_iter().collect();
        // Pipes that were never sent (no due time) go first.
        due.sort_by_key(|pipe| pipe.due_time());

        let mut written = 0;
        for pipe in due {
            let Some(chunk) = pipe.pending_chunk(now) else {
                continue;
            };
            self.write_chunk(&chunk)?;
            pipe.set_due_time(now + self.config.resend_interval);
            written += 1;
        }
        Ok(written)
    }

    /// Frame and write a single chunk, truncating the payload to the
    /// configured cap.
    pub fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        let cap = self.config.max_chunk_payload.min(u16::MAX as usize);
        let payload = &chunk.data[..chunk.data.len().min(cap)];

        self.buf.clear();
        self.buf.reserve(HEADER_SIZE + payload.len());
        ChunkHeader {
            pipe_id: chunk.pipe_id,
            // Low 16 bits only; the receiver widens against its
            // acknowledged position.
            offset: (chunk.offset & 0xFFFF) as u16,
            crc: chunk.crc_init,
            length: payload.len() as u16,
        }
        .encode(&mut self.buf);
        self.buf.extend_from_slice(payload);

        debug!(
            pipe = chunk.pipe_id.raw(),
            offset = chunk.offset,
            len = payload.len(),
            "sending chunk"
        );

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.transport.write(&self.buf[offset..]) {
                Ok(0) => return Err(ChunkError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying transport.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.transport.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            }
        }
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &W {
        &self.transport
    }

    /// Consume the sender and return the transport.
    pub fn into_inner(self) -> W {
        self.transport
    }

    /// Current sender configuration.
    pub fn config(&self) -> &PipeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pipemux_stream::CRC16_INIT;

    use super::*;
    use crate::header::PipeId;

    fn parse_chunks(mut wire: &[u8]) -> Vec<(ChunkHeader, Vec<u8>)> {
        let mut chunks = Vec::new();
        while !wire.is_empty() {
            let header = ChunkHeader::decode(wire[..HEADER_SIZE].try_into().unwrap());
            wire = &wire[HEADER_SIZE..];
            let (payload, rest) = wire.split_at(header.length as usize);
            chunks.push((header, payload.to_vec()));
            wire = rest;
        }
        chunks
    }

    #[test]
    fn frames_pending_data_on_the_wire() {
        let mut pipe = OutputPipe::new(PipeId::client(0));
        pipe.send_bytes(b"hello");

        let mut sender = ChunkSender::new(Vec::new());
        let written = sender.send_ready([&mut pipe], Instant::now()).unwrap();
        assert_eq!(written, 1);

        let chunks = parse_chunks(&sender.into_inner());
        assert_eq!(chunks.len(), 1);
        let (header, payload) = &chunks[0];
        assert_eq!(header.pipe_id, PipeId::client(0));
        assert_eq!(header.offset, 0);
        assert_eq!(header.crc, CRC16_INIT);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn transmission_pushes_due_time_out() {
        let mut pipe = OutputPipe::new(PipeId::client(0));
        pipe.send_bytes(b"data");

        let mut sender = ChunkSender::new(Vec::new());
        let now = Instant::now();

        assert_eq!(sender.send_ready([&mut pipe], now).unwrap(), 1);
        // Same instant: the pipe is no longer due.
        assert_eq!(sender.send_ready([&mut pipe], now).unwrap(), 0);

        // After the resend interval the unacknowledged data goes again.
        let later = now + sender.config().resend_interval;
        assert_eq!(sender.send_ready([&mut pipe], later).unwrap(), 1);

        let chunks = parse_chunks(&sender.into_inner());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].1, chunks[1].1);
    }

    #[test]
    fn acknowledged_pipe_stops_retransmitting() {
        let mut pipe = OutputPipe::new(PipeId::client(0));
        pipe.send_bytes(b"done");

        let mut sender = ChunkSender::new(Vec::new());
        let now = Instant::now();
        sender.send_ready([&mut pipe], now).unwrap();

        pipe.drop_chunk(0, 4);
        let later = now + Duration::from_secs(1);
        assert_eq!(sender.send_ready([&mut pipe], later).unwrap(), 0);
    }

    #[test]
    fn payload_is_truncated_to_configured_cap() {
        let mut pipe = OutputPipe::new(PipeId::client(0));
        pipe.send_bytes(&[0xAA; 100]);

        let config = PipeConfig {
            max_chunk_payload: 16,
            ..PipeConfig::default()
        };
        let mut sender = ChunkSender::with_config(Vec::new(), config);
        sender.send_ready([&mut pipe], Instant::now()).unwrap();

        let chunks = parse_chunks(&sender.into_inner());
        assert_eq!(chunks[0].0.length, 16);
        assert_eq!(chunks[0].1.len(), 16);
    }

    #[test]
    fn unsent_pipes_go_before_recently_sent_ones() {
        let mut first = OutputPipe::new(PipeId::client(0));
        let mut second = OutputPipe::new(PipeId::client(1));
        first.send_bytes(b"1st");
        second.send_bytes(b"2nd");

        let now = Instant::now();
        let mut sender = ChunkSender::new(Vec::new());
        // `first` was sent a moment ago; `second` never was.
        first.set_due_time(now);
        sender.send_ready([&mut first, &mut second], now).unwrap();

        let chunks = parse_chunks(&sender.into_inner());
        assert_eq!(chunks[0].0.pipe_id, PipeId::client(1));
        assert_eq!(chunks[1].0.pipe_id, PipeId::client(0));
    }

    #[test]
    fn write_zero_is_connection_closed() {
        struct ZeroWriter;
        impl Write for ZeroWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut pipe = OutputPipe::new(PipeId::client(0));
        pipe.send_bytes(b"x");

        let mut sender = ChunkSender::new(ZeroWriter);
        let err = sender.send_ready([&mut pipe], Instant::now()).unwrap_err();
        assert!(matches!(err, ChunkError::ConnectionClosed));
    }

    #[test]
    fn interrupted_write_retries() {
        struct InterruptedOnce {
            interrupted: bool,
            data: Vec<u8>,
        }
        impl Write for InterruptedOnce {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut pipe = OutputPipe::new(PipeId::client(0));
        pipe.send_bytes(b"retry");

        let mut sender = ChunkSender::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        sender.send_ready([&mut pipe], Instant::now()).unwrap();
        assert!(!sender.get_ref().data.is_empty());
    }
}
