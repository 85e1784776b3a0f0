//! Chunk multiplexing/demultiplexing for the pipemux transport.
//!
//! Many independent logical byte streams ("pipes") share one physical
//! channel. Each transmission unit is a chunk: an offset-addressed slice
//! of a pipe's logical stream framed with an 8-byte header carrying the
//! pipe id, the offset, a CRC continuation value and the payload length.
//!
//! The sending side buffers bytes per pipe and re-emits unacknowledged
//! chunks on a pacing timer; the receiving side splits the raw stream
//! back into per-pipe chunks and reassembles them in offset order,
//! tolerating the duplicates and overlaps that timer-based
//! retransmission produces.

pub mod config;
pub mod decoder;
pub mod error;
pub mod header;
pub mod input;
pub mod output;
pub mod sender;

pub use config::PipeConfig;
pub use decoder::{InputChannelDecoder, PipeTable};
pub use error::{ChunkError, Result};
pub use header::{ChunkHeader, PipeId, HEADER_SIZE};
pub use input::InputPipe;
pub use output::{Chunk, OutputPipe, SuspendedOutputPipe};
pub use sender::ChunkSender;
