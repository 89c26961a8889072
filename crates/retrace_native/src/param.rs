//! Native Parameter Values
//!
//! Values stored on native nodes. Node references come in two forms:
//! a direct [`NodeId`] and an [`AliasId`], a stable logical name that the
//! universe resolves to whichever node currently carries it. Light groups and
//! light filter arrays store aliases so that rebuilding a light's shader does
//! not leave dangling references behind.

use glam::{Mat4, Vec2, Vec3, Vec4};
use retrace_core::Value;

use crate::universe::{AliasId, NodeId};

/// A reference from one node parameter to another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeId),
    Alias(AliasId),
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef::Node(id)
    }
}

impl From<AliasId> for NodeRef {
    fn from(id: AliasId) -> Self {
        NodeRef::Alias(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Float(f32),
    Str(String),
    Vector2(Vec2),
    Vector(Vec3),
    Rgb(Vec3),
    Rgba(Vec4),
    Matrix(Mat4),
    Node(NodeRef),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            ParamValue::Byte(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_matrix(&self) -> Option<Mat4> {
        match self {
            ParamValue::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<NodeRef> {
        match self {
            ParamValue::Node(r) => Some(*r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Builds a string array parameter.
    #[must_use]
    pub fn strings<S: AsRef<str>>(items: &[S]) -> Self {
        ParamValue::Array(
            items
                .iter()
                .map(|s| ParamValue::Str(s.as_ref().to_string()))
                .collect(),
        )
    }

    /// Builds a node array parameter.
    #[must_use]
    pub fn nodes(items: impl IntoIterator<Item = NodeRef>) -> Self {
        ParamValue::Array(items.into_iter().map(ParamValue::Node).collect())
    }
}

impl From<&Value> for ParamValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(v) => ParamValue::Bool(*v),
            Value::Int(v) => ParamValue::Int(*v),
            Value::Float(v) => ParamValue::Float(*v),
            Value::String(v) => ParamValue::Str(v.clone()),
            Value::V2i(v) => ParamValue::Array(vec![ParamValue::Int(v.x), ParamValue::Int(v.y)]),
            Value::V2f(v) => ParamValue::Vector2(*v),
            Value::V3f(v) => ParamValue::Vector(*v),
            Value::Color3(v) => ParamValue::Rgb(*v),
            Value::Color4(v) => ParamValue::Rgba(*v),
            Value::M44f(m) => ParamValue::Matrix(*m),
            Value::IntVec(v) => ParamValue::Array(v.iter().copied().map(ParamValue::Int).collect()),
            Value::FloatVec(v) => {
                ParamValue::Array(v.iter().copied().map(ParamValue::Float).collect())
            }
            Value::StringVec(v) => ParamValue::strings(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Mat4> for ParamValue {
    fn from(m: Mat4) -> Self {
        ParamValue::Matrix(m)
    }
}

impl From<NodeId> for ParamValue {
    fn from(id: NodeId) -> Self {
        ParamValue::Node(NodeRef::Node(id))
    }
}
