//! Parameter payloads and the semantic type tags attached to them.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parameter payload as it travels through capture, standardization and
/// recreation. Stays JSON-native so captured graphs round-trip losslessly.
///
/// `None` is the payload of pure output sockets, which have no stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Tuple(Vec<f64>),
}

impl Value {
    /// Single-element tuples collapse to their scalar.
    pub fn normalized(self) -> Value {
        match self {
            Value::Tuple(v) if v.len() == 1 => Value::Float(v[0]),
            other => other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(x) => Some(*x as f64),
            _ => None,
        }
    }

    /// Truthiness the way host toggle parameters behave: unset/zero/empty is
    /// off, everything else is on.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(x) => *x != 0,
            Value::Float(x) => *x != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Tuple(v) => !v.is_empty(),
        }
    }
}

/// Semantic type tag for a parameter: scalars, arity-qualified vectors, or a
/// channel-semantic tag when the source type system labels the value so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    FloatVec(u8),
    IntVec(u8),
    Rgb,
    Rgba,
    Xyzw,
}

impl ValueType {
    pub fn as_str(&self) -> String {
        match self {
            ValueType::Bool => "bool".to_string(),
            ValueType::Int => "int".to_string(),
            ValueType::Float => "float".to_string(),
            ValueType::String => "string".to_string(),
            ValueType::FloatVec(n) => format!("float{n}"),
            ValueType::IntVec(n) => format!("int{n}"),
            ValueType::Rgb => "rgb".to_string(),
            ValueType::Rgba => "rgba".to_string(),
            ValueType::Xyzw => "xyzw".to_string(),
        }
    }

    /// Component count for vector-shaped tags, `None` for scalars.
    pub fn arity(&self) -> Option<usize> {
        match self {
            ValueType::FloatVec(n) | ValueType::IntVec(n) => Some(*n as usize),
            ValueType::Rgb => Some(3),
            ValueType::Rgba | ValueType::Xyzw => Some(4),
            _ => None,
        }
    }

    /// Best-effort tag for a bare payload with no host metadata.
    pub fn infer(value: &Value) -> ValueType {
        match value {
            Value::None => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Tuple(v) => ValueType::FloatVec(v.len().clamp(2, 4) as u8),
        }
    }
}

impl FromStr for ValueType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "bool" => ValueType::Bool,
            "int" => ValueType::Int,
            "float" => ValueType::Float,
            "string" => ValueType::String,
            "rgb" => ValueType::Rgb,
            "rgba" => ValueType::Rgba,
            "xyzw" => ValueType::Xyzw,
            "float2" => ValueType::FloatVec(2),
            "float3" => ValueType::FloatVec(3),
            "float4" => ValueType::FloatVec(4),
            "int2" => ValueType::IntVec(2),
            "int3" => ValueType::IntVec(3),
            "int4" => ValueType::IntVec(4),
            other => bail!("unknown value type tag: {other}"),
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether `value` already has the shape `want` demands. Ints are accepted
/// where floats are declared, matching host behavior.
pub fn shape_matches(value: &Value, want: ValueType) -> bool {
    match (value, want) {
        (Value::Bool(_), ValueType::Bool) => true,
        (Value::Int(_), ValueType::Int | ValueType::Float | ValueType::Bool) => true,
        (Value::Float(_), ValueType::Float) => true,
        (Value::String(_), ValueType::String) => true,
        (Value::Tuple(v), t) => t.arity() == Some(v.len()),
        _ => false,
    }
}

/// Coerce `value` to the shape `want` demands.
///
/// The only reshaping performed is the scalar-to-vector broadcast a host
/// applies when a single float is written to a color/vector slot. Anything
/// else that does not already fit is an error the caller downgrades to a
/// logged skip.
pub fn coerce(value: Value, want: ValueType) -> Result<Value> {
    let value = value.normalized();
    if shape_matches(&value, want) {
        return Ok(value);
    }
    if let (Some(n), Some(x)) = (want.arity(), value.as_f64()) {
        return Ok(Value::Tuple(vec![x; n]));
    }
    bail!(
        "cannot coerce {value:?} to {want} (scalar broadcast is the only supported reshape)"
    );
}
