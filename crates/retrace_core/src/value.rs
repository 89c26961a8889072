//! Scene Values
//!
//! [`Value`] is the closed set of data types that can appear in attribute
//! and option dictionaries. [`AttributeValue`] additionally admits shader
//! networks, which is what `ai:surface`, `ai:light` and friends carry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};

use crate::hash::{ContentHasher, HashContent};
use crate::shader::ShaderNetwork;

/// Plain data value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    V2i(IVec2),
    V2f(Vec2),
    V3f(Vec3),
    Color3(Vec3),
    Color4(Vec4),
    M44f(Mat4),
    IntVec(Vec<i32>),
    FloatVec(Vec<f32>),
    StringVec(Vec<String>),
}

impl Value {
    /// Name of the variant, used in type-mismatch diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "BoolData",
            Value::Int(_) => "IntData",
            Value::Float(_) => "FloatData",
            Value::String(_) => "StringData",
            Value::V2i(_) => "V2iData",
            Value::V2f(_) => "V2fData",
            Value::V3f(_) => "V3fData",
            Value::Color3(_) => "Color3fData",
            Value::Color4(_) => "Color4fData",
            Value::M44f(_) => "M44fData",
            Value::IntVec(_) => "IntVectorData",
            Value::FloatVec(_) => "FloatVectorData",
            Value::StringVec(_) => "StringVectorData",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_v2f(&self) -> Option<Vec2> {
        match self {
            Value::V2f(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_string_vec(&self) -> Option<&[String]> {
        match self {
            Value::StringVec(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Space-separated components, the format used for image header metadata.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Value::Bool(v) => write!(f, "{}", u8::from(*v)),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::V2i(v) => join(f, &v.to_array()),
            Value::V2f(v) => join(f, &v.to_array()),
            Value::V3f(v) | Value::Color3(v) => join(f, &v.to_array()),
            Value::Color4(v) => join(f, &v.to_array()),
            Value::M44f(m) => join(f, &m.to_cols_array()),
            Value::IntVec(v) => join(f, v),
            Value::FloatVec(v) => join(f, v),
            Value::StringVec(v) => join(f, v),
        }
    }
}

impl HashContent for Value {
    fn hash_content(&self, h: &mut ContentHasher) {
        match self {
            Value::Bool(v) => {
                h.write_u8(0);
                h.write_bool(*v);
            }
            Value::Int(v) => {
                h.write_u8(1);
                h.write_i32(*v);
            }
            Value::Float(v) => {
                h.write_u8(2);
                h.write_f32(*v);
            }
            Value::String(v) => {
                h.write_u8(3);
                h.write_str(v);
            }
            Value::V2i(v) => {
                h.write_u8(4);
                h.write_i32(v.x);
                h.write_i32(v.y);
            }
            Value::V2f(v) => {
                h.write_u8(5);
                h.write_f32s(&v.to_array());
            }
            Value::V3f(v) => {
                h.write_u8(6);
                h.write_f32s(&v.to_array());
            }
            Value::Color3(v) => {
                h.write_u8(7);
                h.write_f32s(&v.to_array());
            }
            Value::Color4(v) => {
                h.write_u8(8);
                h.write_f32s(&v.to_array());
            }
            Value::M44f(m) => {
                h.write_u8(9);
                h.write_f32s(&m.to_cols_array());
            }
            Value::IntVec(v) => {
                h.write_u8(10);
                h.write_u64(v.len() as u64);
                for i in v {
                    h.write_i32(*i);
                }
            }
            Value::FloatVec(v) => {
                h.write_u8(11);
                h.write_f32s(v);
            }
            Value::StringVec(v) => {
                h.write_u8(12);
                v.hash_content(h);
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringVec(v)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::V2f(v)
    }
}

/// An attribute or option value: plain data or a shader network.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Data(Value),
    Shader(Arc<ShaderNetwork>),
}

impl AttributeValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Data(v) => v.type_name(),
            AttributeValue::Shader(_) => "ShaderNetwork",
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            AttributeValue::Data(v) => Some(v),
            AttributeValue::Shader(_) => None,
        }
    }

    #[must_use]
    pub fn shader(&self) -> Option<&Arc<ShaderNetwork>> {
        match self {
            AttributeValue::Shader(s) => Some(s),
            AttributeValue::Data(_) => None,
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(v: Value) -> Self {
        AttributeValue::Data(v)
    }
}

macro_rules! impl_attribute_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(v: $ty) -> Self {
                    AttributeValue::Data(v.into())
                }
            }
        )*
    };
}

impl_attribute_from!(bool, i32, f32, &str, String, Vec<String>, Vec2);

impl From<ShaderNetwork> for AttributeValue {
    fn from(network: ShaderNetwork) -> Self {
        AttributeValue::Shader(Arc::new(network))
    }
}

impl HashContent for AttributeValue {
    fn hash_content(&self, h: &mut ContentHasher) {
        match self {
            AttributeValue::Data(v) => v.hash_content(h),
            AttributeValue::Shader(s) => s.hash_content(h),
        }
    }
}

/// Ordered name → value dictionary carried by `attributes()` calls.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ContentHash;

    #[test]
    fn variant_tag_participates_in_hash() {
        let color = Value::Color3(Vec3::ONE);
        let vector = Value::V3f(Vec3::ONE);
        assert_ne!(ContentHash::of(&color), ContentHash::of(&vector));
    }

    #[test]
    fn display_joins_components() {
        assert_eq!(Value::V2i(IVec2::new(3, 4)).to_string(), "3 4");
        assert_eq!(Value::Bool(true).to_string(), "1");
    }
}
