use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval before an unacknowledged chunk is re-emitted.
pub const DEFAULT_RESEND_INTERVAL: Duration = Duration::from_millis(50);

/// Default maximum payload bytes per emitted chunk.
pub const DEFAULT_MAX_CHUNK_PAYLOAD: usize = 1024;

/// Configuration for chunk emission and retransmission pacing.
///
/// Serializable so a session layer can persist its transport settings
/// alongside suspended pipe state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeConfig {
    /// How long to wait before re-emitting an unacknowledged chunk.
    pub resend_interval: Duration,
    /// Maximum payload bytes per emitted chunk. Never exceeds the wire
    /// header's 16-bit length field.
    pub max_chunk_payload: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            resend_interval: DEFAULT_RESEND_INTERVAL,
            max_chunk_payload: DEFAULT_MAX_CHUNK_PAYLOAD,
        }
    }
}
