//! Reliable multiplexed byte pipes with typed value codecs.
//!
//! pipemux carries typed values between a host and a peer (typically an
//! embedded device) over an unreliable, ordered byte channel such as a
//! serial port or a USB bulk endpoint. It provides:
//!
//! - Multiplexing of many logical byte streams ("pipes") over one
//!   physical channel ([`pipemux_frame`])
//! - Reliable delivery per pipe via offset-addressed, CRC-continued
//!   chunks with timer-based retransmission
//! - A typed codec layer converting scalar and string values to and
//!   from pipe byte streams ([`pipemux_codec`])
//!
//! The physical transport and the remote-object layer above the pipes
//! are external collaborators: the transport supplies and consumes raw
//! bytes, the object layer supplies pipe pairs through
//! [`PipePairProvider`] and consumes decoded values through
//! [`ValueSlot`]s.

pub mod connection;

pub use connection::{OutgoingConnection, PipePairProvider};

pub use pipemux_codec::{
    CodecEntry, CodecError, CodecRegistry, ScalarDecoder, ScalarFormat, StringDecoder, Value,
    ValueClass, ValueKind,
};
pub use pipemux_frame::{
    Chunk, ChunkError, ChunkHeader, ChunkSender, InputChannelDecoder, InputPipe, OutputPipe,
    PipeConfig, PipeId, PipeTable, SuspendedOutputPipe, HEADER_SIZE,
};
pub use pipemux_stream::{
    crc16, Event, StreamChain, StreamSink, StreamStatus, ValueSlot, CRC16_INIT,
};
