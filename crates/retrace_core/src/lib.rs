//! Core types shared by every retrace crate: scene values, shader networks,
//! content hashing and the error taxonomy.

pub mod errors;
pub mod hash;
pub mod render_type;
pub mod shader;
pub mod value;

pub use errors::{Result, RetraceError};
pub use hash::{ContentHash, ContentHasher, HashContent};
pub use render_type::RenderType;
pub use shader::{Connection, Plug, Shader, ShaderNetwork};
pub use value::{AttributeMap, AttributeValue, Value};

pub use glam;
