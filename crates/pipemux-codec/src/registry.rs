use std::collections::HashMap;

use pipemux_stream::{StreamSink, ValueSlot};

use crate::decoders::{ScalarDecoder, StringDecoder};
use crate::error::{CodecError, Result};
use crate::scalar::ScalarFormat;
use crate::value::{Value, ValueClass, ValueKind};

/// How a registered format constructs its streaming decoder.
#[derive(Debug, Clone, Copy)]
enum DecoderKind {
    Scalar(ScalarFormat),
    Text,
}

/// One registered `(format, value kind)` codec pairing.
#[derive(Debug)]
pub struct CodecEntry {
    kind: ValueKind,
    decoder: DecoderKind,
    encoder: Option<ScalarFormat>,
}

impl CodecEntry {
    /// The value kind this entry decodes to / encodes from.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Instantiate a fresh streaming decoder along with the slot that
    /// will receive its value.
    pub fn new_decoder(&self) -> (Box<dyn StreamSink + Send>, ValueSlot<Value>) {
        match self.decoder {
            DecoderKind::Scalar(format) => {
                let decoder = ScalarDecoder::new(format);
                let slot = decoder.slot();
                (Box::new(decoder), slot)
            }
            DecoderKind::Text => {
                let decoder = StringDecoder::new();
                let slot = decoder.slot();
                (Box::new(decoder), slot)
            }
        }
    }

    /// The encode side, or `None` for decode-only formats.
    pub fn encoder(&self) -> Option<ScalarFormat> {
        self.encoder
    }
}

/// Immutable table mapping `(format name, value kind)` pairs to codecs.
///
/// Constructed once at startup and passed by reference to everything
/// that needs codec lookup; there is no global mutable table.
pub struct CodecRegistry {
    formats: HashMap<&'static str, Vec<CodecEntry>>,
}

impl CodecRegistry {
    /// The standard registry: all fixed-width scalar formats plus the
    /// decode-only `ascii_string` format.
    pub fn standard() -> Self {
        const SCALARS: [ScalarFormat; 10] = [
            ScalarFormat::I8,
            ScalarFormat::U8,
            ScalarFormat::I16,
            ScalarFormat::U16,
            ScalarFormat::I32,
            ScalarFormat::U32,
            ScalarFormat::I64,
            ScalarFormat::U64,
            ScalarFormat::Bool,
            ScalarFormat::F32,
        ];

        let mut formats: HashMap<&'static str, Vec<CodecEntry>> = HashMap::new();
        for format in SCALARS {
            formats.insert(
                format.name(),
                vec![CodecEntry {
                    kind: format.kind(),
                    decoder: DecoderKind::Scalar(format),
                    encoder: Some(format),
                }],
            );
        }
        formats.insert(
            "ascii_string",
            vec![CodecEntry {
                kind: ValueKind::Text,
                decoder: DecoderKind::Text,
                encoder: None,
            }],
        );

        Self { formats }
    }

    /// Look up the codec for a `(format name, value kind)` pair.
    ///
    /// With `kind = None` the first registered pairing for the format is
    /// returned and acts as the default.
    pub fn get_codec(&self, format_name: &str, kind: Option<ValueKind>) -> Result<&CodecEntry> {
        let entries = self
            .formats
            .get(format_name)
            .ok_or_else(|| CodecError::UnknownFormat(format_name.to_string()))?;

        match kind {
            None => entries
                .first()
                .ok_or_else(|| CodecError::UnknownFormat(format_name.to_string())),
            Some(kind) => entries
                .iter()
                .find(|entry| entry.accepts(kind))
                .ok_or_else(|| CodecError::UnknownTypeForFormat {
                    format: format_name.to_string(),
                    kind,
                }),
        }
    }

    /// The wire format assumed for an abstract value class when nothing
    /// else has been negotiated.
    pub fn canonical_format(&self, class: ValueClass) -> &'static str {
        match class {
            ValueClass::Number => "i32le",
            ValueClass::Json => "ascii_string",
        }
    }

    /// Registered format names, sorted.
    pub fn format_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.formats.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl CodecEntry {
    /// Integer formats accept both integer kinds; the encoder range-checks.
    fn accepts(&self, kind: ValueKind) -> bool {
        if self.kind == kind {
            return true;
        }
        matches!(
            (self.kind, kind),
            (ValueKind::Int, ValueKind::UInt) | (ValueKind::UInt, ValueKind::Int)
        )
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
