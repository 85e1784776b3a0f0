use std::sync::{Arc, Mutex, PoisonError};

use bytes::BytesMut;
use tracing::debug;

use pipemux_codec::{CodecError, CodecRegistry, Value, ValueClass};
use pipemux_frame::{InputPipe, OutputPipe, PipeId};
use pipemux_stream::{StreamChain, ValueSlot};

/// Supplies pipe pairs keyed by direction. Owned by the node/session
/// layer; connections borrow it for their lifetime.
pub trait PipePairProvider {
    /// Acquire a fresh client-originated pipe pair.
    fn get_client_pipe_pair(&mut self) -> (Arc<Mutex<InputPipe>>, Arc<Mutex<OutputPipe>>);

    /// Release a previously acquired client pipe pair.
    fn release_client_pipe_pair(&mut self, pipe_id: PipeId);
}

/// A short-lived value-level adapter over one client pipe pair.
///
/// On construction it acquires the pair and installs a [`StreamChain`]
/// as the input pipe's handler; decoders appended by
/// [`receive_value`](OutgoingConnection::receive_value) consume the
/// reassembled byte stream in order. Dropping the connection releases
/// the pair back to the provider.
pub struct OutgoingConnection<'a, P: PipePairProvider> {
    provider: &'a mut P,
    registry: &'a CodecRegistry,
    output: Arc<Mutex<OutputPipe>>,
    chain: StreamChain,
    pipe_id: PipeId,
}

impl<'a, P: PipePairProvider> OutgoingConnection<'a, P> {
    pub fn open(provider: &'a mut P, registry: &'a CodecRegistry) -> Self {
        let (input, output) = provider.get_client_pipe_pair();
        let chain = StreamChain::new();
        input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_input_handler(Box::new(chain.clone()));
        let pipe_id = output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pipe_id();
        debug!(pipe = pipe_id.raw(), "opened outgoing connection");
        Self {
            provider,
            registry,
            output,
            chain,
            pipe_id,
        }
    }

    /// Serialize `value` with the canonical codec for `class` and queue
    /// the bytes on the output pipe. Returns the byte count written.
    pub fn emit_value(&mut self, class: ValueClass, value: &Value) -> Result<usize, CodecError> {
        let format = self.registry.canonical_format(class);
        let entry = self.registry.get_codec(format, Some(value.kind()))?;
        let scalar = entry
            .encoder()
            .ok_or_else(|| CodecError::DecodeOnly(format.to_string()))?;

        let mut buf = BytesMut::with_capacity(scalar.width());
        scalar.encode(value, &mut buf)?;
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send_bytes(&buf);
        Ok(buf.len())
    }

    /// Append a fresh canonical decoder for `class` to the input chain
    /// and return the slot the caller awaits for the decoded value.
    pub fn receive_value(&mut self, class: ValueClass) -> Result<ValueSlot<Value>, CodecError> {
        let format = self.registry.canonical_format(class);
        let entry = self.registry.get_codec(format, None)?;
        let (decoder, slot) = entry.new_decoder();
        self.chain.append(decoder);
        Ok(slot)
    }

    /// Boundary marker for future fire-and-forget semantics. Performs no
    /// blocking wait in the current design.
    pub fn flush(&mut self) {}

    /// The client pipe id this connection is bound to.
    pub fn pipe_id(&self) -> PipeId {
        self.pipe_id
    }
}

impl<P: PipePairProvider> Drop for OutgoingConnection<'_, P> {
    fn drop(&mut self) {
        debug!(pipe = self.pipe_id.raw(), "releasing outgoing connection");
        self.provider.release_client_pipe_pair(self.pipe_id);
    }
}
