use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CodecError, Result};
use crate::value::{Value, ValueKind};

/// A fixed-width little-endian wire format.
///
/// Each format covers exactly one [`ValueKind`]; `encode` additionally
/// accepts cross-kind integer coercions when the value fits the target
/// range, and rejects everything else with
/// [`CodecError::TypeMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFormat {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Bool,
    F32,
}

impl ScalarFormat {
    /// Exact byte width on the wire.
    pub fn width(self) -> usize {
        match self {
            ScalarFormat::I8 | ScalarFormat::U8 | ScalarFormat::Bool => 1,
            ScalarFormat::I16 | ScalarFormat::U16 => 2,
            ScalarFormat::I32 | ScalarFormat::U32 | ScalarFormat::F32 => 4,
            ScalarFormat::I64 | ScalarFormat::U64 => 8,
        }
    }

    /// Registered format name.
    pub fn name(self) -> &'static str {
        match self {
            ScalarFormat::I8 => "i8le",
            ScalarFormat::U8 => "u8le",
            ScalarFormat::I16 => "i16le",
            ScalarFormat::U16 => "u16le",
            ScalarFormat::I32 => "i32le",
            ScalarFormat::U32 => "u32le",
            ScalarFormat::I64 => "i64le",
            ScalarFormat::U64 => "u64le",
            ScalarFormat::Bool => "bool",
            ScalarFormat::F32 => "float",
        }
    }

    /// The kind this format decodes to.
    pub fn kind(self) -> ValueKind {
        match self {
            ScalarFormat::I8 | ScalarFormat::I16 | ScalarFormat::I32 | ScalarFormat::I64 => {
                ValueKind::Int
            }
            ScalarFormat::U8 | ScalarFormat::U16 | ScalarFormat::U32 | ScalarFormat::U64 => {
                ValueKind::UInt
            }
            ScalarFormat::Bool => ValueKind::Bool,
            ScalarFormat::F32 => ValueKind::Float,
        }
    }

    /// Serialize `value` into exactly [`ScalarFormat::width`] bytes.
    pub fn encode(self, value: &Value, dst: &mut BytesMut) -> Result<()> {
        match self {
            ScalarFormat::I8 => dst.put_i8(self.to_signed(value)? as i8),
            ScalarFormat::I16 => dst.put_i16_le(self.to_signed(value)? as i16),
            ScalarFormat::I32 => dst.put_i32_le(self.to_signed(value)? as i32),
            ScalarFormat::I64 => dst.put_i64_le(self.to_signed(value)?),
            ScalarFormat::U8 => dst.put_u8(self.to_unsigned(value)? as u8),
            ScalarFormat::U16 => dst.put_u16_le(self.to_unsigned(value)? as u16),
            ScalarFormat::U32 => dst.put_u32_le(self.to_unsigned(value)? as u32),
            ScalarFormat::U64 => dst.put_u64_le(self.to_unsigned(value)?),
            ScalarFormat::Bool => match value {
                Value::Bool(b) => dst.put_u8(*b as u8),
                other => return Err(self.mismatch(other)),
            },
            ScalarFormat::F32 => match value {
                Value::Float(f) => dst.put_f32_le(*f),
                Value::Int(i) => dst.put_f32_le(*i as f32),
                Value::UInt(u) => dst.put_f32_le(*u as f32),
                other => return Err(self.mismatch(other)),
            },
        }
        Ok(())
    }

    /// Deserialize exactly [`ScalarFormat::width`] bytes.
    ///
    /// Callers guarantee `buf.len() == self.width()`; the streaming
    /// decoder buffers partial input before calling this.
    pub fn decode(self, buf: &[u8]) -> Value {
        debug_assert_eq!(buf.len(), self.width());
        let mut buf = buf;
        match self {
            ScalarFormat::I8 => Value::Int(buf.get_i8() as i64),
            ScalarFormat::I16 => Value::Int(buf.get_i16_le() as i64),
            ScalarFormat::I32 => Value::Int(buf.get_i32_le() as i64),
            ScalarFormat::I64 => Value::Int(buf.get_i64_le()),
            ScalarFormat::U8 => Value::UInt(buf.get_u8() as u64),
            ScalarFormat::U16 => Value::UInt(buf.get_u16_le() as u64),
            ScalarFormat::U32 => Value::UInt(buf.get_u32_le() as u64),
            ScalarFormat::U64 => Value::UInt(buf.get_u64_le()),
            ScalarFormat::Bool => Value::Bool(buf.get_u8() != 0),
            ScalarFormat::F32 => Value::Float(buf.get_f32_le()),
        }
    }

    /// Coerce to a signed integer within this format's range.
    fn to_signed(self, value: &Value) -> Result<i64> {
        let wide = match value {
            Value::Int(i) => *i,
            Value::UInt(u) => i64::try_from(*u).map_err(|_| self.mismatch(value))?,
            other => return Err(self.mismatch(other)),
        };
        let fits = match self {
            ScalarFormat::I8 => i8::try_from(wide).is_ok(),
            ScalarFormat::I16 => i16::try_from(wide).is_ok(),
            ScalarFormat::I32 => i32::try_from(wide).is_ok(),
            _ => true,
        };
        if fits {
            Ok(wide)
        } else {
            Err(self.mismatch(value))
        }
    }

    /// Coerce to an unsigned integer within this format's range.
    fn to_unsigned(self, value: &Value) -> Result<u64> {
        let wide = match value {
            Value::UInt(u) => *u,
            Value::Int(i) => u64::try_from(*i).map_err(|_| self.mismatch(value))?,
            other => return Err(self.mismatch(other)),
        };
        let fits = match self {
            ScalarFormat::U8 => u8::try_from(wide).is_ok(),
            ScalarFormat::U16 => u16::try_from(wide).is_ok(),
            ScalarFormat::U32 => u32::try_from(wide).is_ok(),
            _ => true,
        };
        if fits {
            Ok(wide)
        } else {
            Err(self.mismatch(value))
        }
    }

    fn mismatch(self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            format: self.name(),
            got: value.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(format: ScalarFormat, value: Value) {
        let mut buf = BytesMut::new();
        format.encode(&value, &mut buf).unwrap();
        assert_eq!(buf.len(), format.width(), "{format:?} width");
        assert_eq!(format.decode(&buf), value, "{format:?} roundtrip");
    }

    #[test]
    fn signed_roundtrips() {
        roundtrip(ScalarFormat::I8, Value::Int(-128));
        roundtrip(ScalarFormat::I16, Value::Int(-30000));
        roundtrip(ScalarFormat::I32, Value::Int(-2_000_000_000));
        roundtrip(ScalarFormat::I64, Value::Int(i64::MIN));
    }

    #[test]
    fn unsigned_roundtrips() {
        roundtrip(ScalarFormat::U8, Value::UInt(255));
        roundtrip(ScalarFormat::U16, Value::UInt(65535));
        roundtrip(ScalarFormat::U32, Value::UInt(4_000_000_000));
        roundtrip(ScalarFormat::U64, Value::UInt(u64::MAX));
    }

    #[test]
    fn bool_and_float_roundtrips() {
        roundtrip(ScalarFormat::Bool, Value::Bool(true));
        roundtrip(ScalarFormat::Bool, Value::Bool(false));
        roundtrip(ScalarFormat::F32, Value::Float(3.5));
        roundtrip(ScalarFormat::F32, Value::Float(-0.0));
    }

    #[test]
    fn little_endian_layout() {
        let mut buf = BytesMut::new();
        ScalarFormat::I32.encode(&Value::Int(0x01020304), &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x04, 0x03, 0x02, 0x01]);

        let mut buf = BytesMut::new();
        ScalarFormat::U16.encode(&Value::UInt(0xBEEF), &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0xEF, 0xBE]);
    }

    #[test]
    fn cross_kind_integer_coercion() {
        let mut buf = BytesMut::new();
        ScalarFormat::I32.encode(&Value::UInt(7), &mut buf).unwrap();
        assert_eq!(ScalarFormat::I32.decode(&buf), Value::Int(7));

        let mut buf = BytesMut::new();
        ScalarFormat::U16.encode(&Value::Int(9), &mut buf).unwrap();
        assert_eq!(ScalarFormat::U16.decode(&buf), Value::UInt(9));
    }

    #[test]
    fn out_of_range_is_type_mismatch() {
        let mut buf = BytesMut::new();
        let err = ScalarFormat::I8.encode(&Value::Int(200), &mut buf).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { format: "i8le", .. }));

        let err = ScalarFormat::U8.encode(&Value::Int(-1), &mut buf).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { format: "u8le", .. }));

        let err = ScalarFormat::U64
            .encode(&Value::Int(-5), &mut buf)
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn wrong_kind_is_type_mismatch() {
        let mut buf = BytesMut::new();
        let err = ScalarFormat::Bool
            .encode(&Value::Int(1), &mut buf)
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { format: "bool", .. }));

        let err = ScalarFormat::I32
            .encode(&Value::Text("5".into()), &mut buf)
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn integers_coerce_to_float() {
        let mut buf = BytesMut::new();
        ScalarFormat::F32.encode(&Value::Int(2), &mut buf).unwrap();
        assert_eq!(ScalarFormat::F32.decode(&buf), Value::Float(2.0));
    }

    #[test]
    fn nonzero_byte_decodes_as_true() {
        assert_eq!(ScalarFormat::Bool.decode(&[0x02]), Value::Bool(true));
        assert_eq!(ScalarFormat::Bool.decode(&[0x00]), Value::Bool(false));
    }
}
