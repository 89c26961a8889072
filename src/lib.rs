#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! # retrace
//!
//! Adapts an edit-oriented scene-description interface onto a retained
//! node-graph renderer.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use retrace::prelude::*;
//!
//! let renderer = Renderer::new(
//!     RendererSettings::new(RenderType::Batch),
//!     engine,
//!     Converters::new(object_converter, shader_converter),
//! );
//! let attributes = renderer.attributes(&AttributeMap::new());
//! let _plane = renderer.object("/plane", &SceneObject::Mesh(MeshPrimitive::plane()), &attributes);
//! renderer.render()?;
//! ```

pub use {retrace_core, retrace_native, retrace_render, retrace_scene};

pub use retrace_core::{AttributeMap, AttributeValue, RenderType, Result, RetraceError, Value};
pub use retrace_render::{Converters, Renderer, RendererSettings};
pub use retrace_scene::SceneRenderer;

pub mod prelude {
    pub use retrace_core::{
        AttributeMap, AttributeValue, RenderType, Result, RetraceError, Shader, ShaderNetwork,
        Value,
    };
    pub use retrace_native::{NativeVersion, NodeId, RenderEngine, RenderMode, RenderStatus, Universe};
    pub use retrace_render::{
        Converters, ObjectConverter, ProgressiveSettings, Renderer, RendererSettings,
        ShaderConverter,
    };
    pub use retrace_scene::{
        AttributesHandle, Camera, MeshPrimitive, ObjectHandle, ObjectInterface, Output,
        Procedural, SceneObject, SceneRenderer,
    };
}
