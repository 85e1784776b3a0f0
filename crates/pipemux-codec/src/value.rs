use std::fmt;

/// A decoded or to-be-encoded semantic value.
///
/// Codec selection is a match over [`ValueKind`] tags rather than a
/// runtime type-identity scan; every wire format maps to exactly one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer (all signed fixed-width formats decode to this).
    Int(i64),
    /// Unsigned integer (all unsigned fixed-width formats decode to this).
    UInt(u64),
    Bool(bool),
    /// IEEE-754 single precision.
    Float(f32),
    /// Decoded text (length-prefixed string format).
    Text(String),
}

impl Value {
    /// The kind tag for this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Bool(_) => ValueKind::Bool,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
        }
    }
}

/// Kind tag used for codec lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    UInt,
    Bool,
    Float,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Bool => "bool",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Abstract value class used when the peer has not negotiated a concrete
/// wire format. The registry resolves each class to a canonical format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    /// Generic numeric value.
    Number,
    /// JSON-ish text payload.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Value::Int(-1).kind(), ValueKind::Int);
        assert_eq!(Value::UInt(1).kind(), ValueKind::UInt);
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Float(0.5).kind(), ValueKind::Float);
        assert_eq!(Value::Text("x".into()).kind(), ValueKind::Text);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ValueKind::Int.to_string(), "int");
        assert_eq!(ValueKind::Text.to_string(), "text");
    }
}
