use crate::value::ValueKind;

/// Errors raised by codec lookup and value encoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The format name is not registered.
    #[error("unknown codec format \"{0}\"")]
    UnknownFormat(String),

    /// The format is known but has no codec for the requested value kind.
    #[error("no codec for {kind} values under format \"{format}\"")]
    UnknownTypeForFormat { format: String, kind: ValueKind },

    /// The value cannot be coerced to the target wire format.
    #[error("cannot encode {got} value as {format}")]
    TypeMismatch { format: &'static str, got: ValueKind },

    /// The format has a decoder but no encoder.
    #[error("format \"{0}\" is decode-only")]
    DecodeOnly(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
