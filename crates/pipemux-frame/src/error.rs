/// Errors that can occur while multiplexing or emitting chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// A chunk header named a pipe the table does not know.
    #[error("no {direction} pipe with index {index}")]
    UnknownPipe {
        direction: &'static str,
        index: u16,
    },

    /// An I/O error occurred while writing chunks to the transport.
    #[error("chunk I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport closed before a complete chunk was written.
    #[error("transport closed (incomplete chunk)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, ChunkError>;
