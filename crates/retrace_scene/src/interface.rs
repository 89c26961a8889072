//! Scene Edit Interface
//!
//! The edit-oriented API through which a host describes a scene:
//!
//! ```text
//!  host ──► SceneRenderer::attributes(map) ──► AttributesHandle ─┐
//!       ──► SceneRenderer::object(name, obj, &attrs) ──► ObjectHandle
//!       ──► ObjectHandle::transform(..) / set_attributes(..)      │
//!       ──► SceneRenderer::render()                       (shared)┘
//! ```
//!
//! Object handles represent one scene location each. Dropping a handle
//! removes the location from the scene. Edits to different locations may be
//! issued from different threads concurrently; `option`, `output`, `render`
//! and `pause` are issued from one thread while no other edit is running.

use std::any::Any;
use std::sync::Arc;

use glam::Mat4;
use retrace_core::{AttributeMap, AttributeValue, Result};

use crate::camera::Camera;
use crate::object::SceneObject;
use crate::output::Output;

/// A backend-specific, immutable snapshot of an attribute dictionary.
pub trait AttributesInterface: Any + Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

pub type AttributesHandle = Arc<dyn AttributesInterface>;

/// One scene location.
pub trait ObjectInterface: Send {
    fn transform(&mut self, transform: Mat4);

    /// Motion-blurred transform. `times` must be uniformly spaced.
    fn transform_samples(&mut self, samples: &[Mat4], times: &[f32]);

    /// Applies new attributes. Returns `false` when the edit cannot be made
    /// in place; the host must then recreate the location.
    fn set_attributes(&mut self, attributes: &AttributesHandle) -> bool;
}

pub type ObjectHandle = Box<dyn ObjectInterface>;

pub trait SceneRenderer: Send + Sync {
    fn name(&self) -> &str;

    /// Sets a global option, or resets it when `value` is `None`.
    fn option(&self, name: &str, value: Option<&AttributeValue>);

    /// Adds or replaces an output, or removes it when `output` is `None`.
    fn output(&self, name: &str, output: Option<&Output>);

    fn attributes(&self, attributes: &AttributeMap) -> AttributesHandle;

    fn camera(&self, name: &str, camera: &Camera, attributes: &AttributesHandle) -> Option<ObjectHandle>;

    fn light(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle>;

    fn light_filter(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle>;

    fn object(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle>;

    /// Deformation-blurred object. `times` must be uniformly spaced.
    fn object_samples(
        &self,
        name: &str,
        samples: &[SceneObject],
        times: &[f32],
        attributes: &AttributesHandle,
    ) -> Option<ObjectHandle>;

    fn render(&self) -> Result<()>;

    fn pause(&self);
}
