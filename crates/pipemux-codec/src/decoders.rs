use bytes::BytesMut;

use pipemux_stream::{StreamSink, StreamStatus, ValueSlot};

use crate::scalar::ScalarFormat;
use crate::value::Value;

/// Streaming decoder for one fixed-width scalar.
///
/// Buffers partial input across calls; once exactly
/// [`ScalarFormat::width`] bytes have arrived it sets its [`ValueSlot`]
/// and reports [`StreamStatus::Closed`].
pub struct ScalarDecoder {
    format: ScalarFormat,
    buf: BytesMut,
    slot: ValueSlot<Value>,
}

impl ScalarDecoder {
    pub fn new(format: ScalarFormat) -> Self {
        Self {
            format,
            buf: BytesMut::with_capacity(format.width()),
            slot: ValueSlot::new(),
        }
    }

    /// Handle to the slot that receives the decoded value.
    pub fn slot(&self) -> ValueSlot<Value> {
        self.slot.clone()
    }
}

impl StreamSink for ScalarDecoder {
    fn process_bytes(&mut self, buf: &[u8]) -> (StreamStatus, usize) {
        if self.slot.has_value() {
            return (StreamStatus::Closed, 0);
        }

        let take = (self.format.width() - self.buf.len()).min(buf.len());
        self.buf.extend_from_slice(&buf[..take]);

        if self.buf.len() < self.format.width() {
            (StreamStatus::Open, take)
        } else {
            self.slot.try_set(self.format.decode(&self.buf));
            (StreamStatus::Closed, take)
        }
    }

    fn min_useful_bytes(&self) -> usize {
        (self.format.width() - self.buf.len()).max(1)
    }
}

/// Streaming decoder for a length-prefixed string.
///
/// A 4-byte little-endian unsigned length (decoded by a nested
/// [`ScalarDecoder`]) is followed by exactly that many payload bytes,
/// decoded as text. There is no matching encoder: strings are
/// inbound-only in this version of the protocol.
pub struct StringDecoder {
    length: ScalarDecoder,
    raw: BytesMut,
    slot: ValueSlot<Value>,
}

impl StringDecoder {
    pub fn new() -> Self {
        Self {
            length: ScalarDecoder::new(ScalarFormat::U32),
            raw: BytesMut::new(),
            slot: ValueSlot::new(),
        }
    }

    /// Handle to the slot that receives the decoded text.
    pub fn slot(&self) -> ValueSlot<Value> {
        self.slot.clone()
    }

    fn expected_len(&self) -> Option<usize> {
        match self.length.slot.get() {
            Some(Value::UInt(n)) => Some(n as usize),
            _ => None,
        }
    }
}

impl Default for StringDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink for StringDecoder {
    fn process_bytes(&mut self, buf: &[u8]) -> (StreamStatus, usize) {
        if self.slot.has_value() {
            return (StreamStatus::Closed, 0);
        }

        let mut consumed = 0;
        let expected = match self.expected_len() {
            Some(n) => n,
            None => {
                let (status, taken) = self.length.process_bytes(buf);
                consumed += taken;
                if status != StreamStatus::Closed {
                    return (StreamStatus::Open, consumed);
                }
                // Length is now known; fall through to the payload.
                self.expected_len().unwrap_or(0)
            }
        };

        let take = (expected - self.raw.len()).min(buf.len() - consumed);
        self.raw.extend_from_slice(&buf[consumed..consumed + take]);
        consumed += take;

        if self.raw.len() < expected {
            (StreamStatus::Open, consumed)
        } else {
            let text = String::from_utf8_lossy(&self.raw).into_owned();
            self.slot.try_set(Value::Text(text));
            (StreamStatus::Closed, consumed)
        }
    }

    fn min_useful_bytes(&self) -> usize {
        match self.expected_len() {
            Some(n) => (n - self.raw.len()).max(1),
            None => self.length.min_useful_bytes(),
        }
    }
}
