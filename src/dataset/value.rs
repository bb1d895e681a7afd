//! Single 4-byte payload word

use super::schema::FieldType;

/// One float32 or int32 payload word
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f32),
    Int(i32),
}

impl Value {
    /// Zero of the given type
    pub fn zero(ty: FieldType) -> Self {
        match ty {
            FieldType::Float => Self::Float(0.0),
            FieldType::Int => Self::Int(0),
        }
    }

    /// Reinterpret raw wire bits as the given type
    pub fn from_bits(ty: FieldType, bits: u32) -> Self {
        match ty {
            FieldType::Float => Self::Float(f32::from_bits(bits)),
            FieldType::Int => Self::Int(bits as i32),
        }
    }

    /// Raw wire bits
    pub fn to_bits(self) -> u32 {
        match self {
            Self::Float(v) => v.to_bits(),
            Self::Int(v) => v as u32,
        }
    }

    /// Convert numerically to the given type
    pub fn coerce(self, ty: FieldType) -> Self {
        match (self, ty) {
            (Self::Float(v), FieldType::Int) => Self::Int(v as i32),
            (Self::Int(v), FieldType::Float) => Self::Float(v as f32),
            (v, _) => v,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Self::Float(v) => v,
            Self::Int(v) => v as f32,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Float(v) => v as i32,
            Self::Int(v) => v,
        }
    }

    /// Value as a JSON number (NaN and infinities become null)
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Self::Float(v) => serde_json::Number::from_f64(v as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Int(v) => serde_json::Value::from(v),
        }
    }

    /// Parse a JSON number into the given type (null becomes NaN / 0)
    pub fn from_json(ty: FieldType, value: &serde_json::Value) -> Option<Self> {
        match (ty, value) {
            (FieldType::Float, serde_json::Value::Null) => Some(Self::Float(f32::NAN)),
            (FieldType::Int, serde_json::Value::Null) => Some(Self::Int(0)),
            (FieldType::Float, v) => v.as_f64().map(|f| Self::Float(f as f32)),
            (FieldType::Int, v) => v
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Self::Int),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_round_trip() {
        let v = Value::from_bits(FieldType::Float, 12.5f32.to_bits());
        assert_eq!(v, Value::Float(12.5));
        assert_eq!(v.to_bits(), 12.5f32.to_bits());
        let i = Value::from_bits(FieldType::Int, (-3i32) as u32);
        assert_eq!(i, Value::Int(-3));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Float(4.0).coerce(FieldType::Int), Value::Int(4));
        assert_eq!(Value::Int(4).coerce(FieldType::Float), Value::Float(4.0));
        assert_eq!(Value::Int(4).coerce(FieldType::Int), Value::Int(4));
    }

    #[test]
    fn test_json_float_exact() {
        let v = Value::Float(10.3);
        let json = v.to_json();
        assert_eq!(Value::from_json(FieldType::Float, &json), Some(v));
    }

    #[test]
    fn test_json_nan_is_null() {
        let json = Value::Float(f32::NAN).to_json();
        assert!(json.is_null());
        let back = Value::from_json(FieldType::Float, &json).unwrap();
        assert!(back.as_f32().is_nan());
    }

    #[test]
    fn test_json_int_range() {
        let big = serde_json::json!(1i64 << 40);
        assert_eq!(Value::from_json(FieldType::Int, &big), None);
        assert_eq!(
            Value::from_json(FieldType::Int, &serde_json::json!(-7)),
            Some(Value::Int(-7))
        );
    }
}
