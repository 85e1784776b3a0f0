//! Byte-stream consumption primitives for the pipemux transport.
//!
//! This is the lowest layer of pipemux. It provides:
//! - An incremental, seedable CRC16 used to frame and continue chunk
//!   checksums across retransmissions
//! - The [`StreamSink`] trait: a consumer that accepts prefixes of a byte
//!   buffer and eventually reports completion
//! - [`StreamChain`]: an ordered sequence of sinks fed in turn
//! - [`ValueSlot`]: a single-assignment result holder with cooperative
//!   blocking waits
//! - [`Event`]: a manual-reset wait handle

pub mod crc;
pub mod sink;
pub mod slot;

pub use crc::{crc16, CRC16_INIT, CRC16_POLYNOMIAL};
pub use sink::{StreamChain, StreamSink, StreamStatus};
pub use slot::{Event, ValueSlot};
