use std::sync::{Arc, Mutex, PoisonError};

/// What a sink reports after consuming a prefix of the offered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// The sink may consume more bytes.
    Open,
    /// The sink will not consume further bytes.
    Closed,
}

/// A consumer of an incoming byte sequence.
///
/// Consumption is prefix-only: a sink either consumes some non-negative
/// prefix of the offered buffer or nothing. Partial input is never an
/// error — a sink that needs more bytes stays [`StreamStatus::Open`].
pub trait StreamSink {
    /// Offer `buf` to the sink. Returns the status after the call and the
    /// number of bytes consumed from the front of `buf`; the caller keeps
    /// ownership of the remainder.
    fn process_bytes(&mut self, buf: &[u8]) -> (StreamStatus, usize);

    /// Smallest buffer size guaranteed to make progress.
    ///
    /// Lets callers avoid issuing zero-progress calls.
    fn min_useful_bytes(&self) -> usize {
        1
    }
}

/// An ordered sequence of sinks fed in turn.
///
/// When the current sink reports [`StreamStatus::Closed`], the remainder
/// of the buffer flows into the next one. An exhausted chain stays `Open`
/// and consumes nothing, waiting for a new sink to be appended — this is
/// what lets a connection attach the chain as a pipe's input handler and
/// keep appending decoders while bytes are already flowing.
///
/// Cloning yields a handle to the same chain, so one clone can serve as
/// the input handler while another is used to append sinks.
#[derive(Clone, Default)]
pub struct StreamChain {
    inner: Arc<Mutex<ChainInner>>,
}

#[derive(Default)]
struct ChainInner {
    sinks: Vec<Box<dyn StreamSink + Send>>,
    cursor: usize,
}

impl StreamChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink to the end of the chain.
    pub fn append(&self, sink: Box<dyn StreamSink + Send>) {
        self.lock().sinks.push(sink);
    }

    /// Number of sinks that have not yet closed.
    pub fn remaining(&self) -> usize {
        let inner = self.lock();
        inner.sinks.len() - inner.cursor
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StreamSink for StreamChain {
    fn process_bytes(&mut self, buf: &[u8]) -> (StreamStatus, usize) {
        let mut inner = self.lock();
        let mut consumed = 0;

        while consumed < buf.len() {
            let cursor = inner.cursor;
            let Some(sink) = inner.sinks.get_mut(cursor) else {
                return (StreamStatus::Open, consumed);
            };

            let (status, taken) = sink.process_bytes(&buf[consumed..]);
            consumed += taken;

            match status {
                StreamStatus::Closed => inner.cursor += 1,
                // An open sink that made no progress is stalled; stop here
                // rather than spin.
                StreamStatus::Open if taken == 0 => break,
                StreamStatus::Open => {}
            }
        }

        (StreamStatus::Open, consumed)
    }

    fn min_useful_bytes(&self) -> usize {
        let inner = self.lock();
        match inner.sinks.get(inner.cursor) {
            Some(sink) => sink.min_useful_bytes(),
            None => 1,
        }
    }
}
