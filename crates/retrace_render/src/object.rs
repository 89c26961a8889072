//! Object Façades
//!
//! One façade per scene location. A façade holds the location's
//! [`Instance`] and the bundle last applied to it, and forwards transform
//! and attribute edits to the instance node.

use std::sync::Arc;

use glam::Mat4;
use log::warn;
use retrace_native::{NodeId, Universe};
use retrace_scene::{AttributesHandle, ObjectInterface};

use crate::attributes::AttributeBundle;
use crate::instance::Instance;
use crate::motion::TransformSamples;

/// Recovers the bundle behind an attributes handle created by this crate.
pub(crate) fn downcast_attributes(handle: &AttributesHandle) -> Option<Arc<AttributeBundle>> {
    let bundle = handle.clone().into_any().downcast::<AttributeBundle>().ok();
    if bundle.is_none() {
        warn!("Attributes were not created by this renderer");
    }
    bundle
}

/// State shared by every kind of façade.
pub(crate) struct ObjectBase {
    universe: Arc<Universe>,
    instance: Instance,
    attributes: Option<Arc<AttributeBundle>>,
    link_lights: bool,
}

impl ObjectBase {
    pub fn new(universe: Arc<Universe>, instance: Instance, link_lights: bool) -> Self {
        Self {
            universe,
            instance,
            attributes: None,
            link_lights,
        }
    }

    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        self.instance.node()
    }

    #[inline]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    #[inline]
    pub fn attributes(&self) -> Option<&Arc<AttributeBundle>> {
        self.attributes.as_ref()
    }

    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    pub fn transform(&self, transform: &TransformSamples) {
        if let Some(node) = self.node() {
            transform.apply(&self.universe, node, "matrix");
        }
    }

    /// Applies `bundle` to the instance node, remembering it on success.
    pub fn set_attributes(&mut self, bundle: Arc<AttributeBundle>) -> bool {
        if let Some(node) = self.node()
            && !bundle.apply(&self.universe, node, self.attributes.as_deref(), self.link_lights)
        {
            return false;
        }
        self.attributes = Some(bundle);
        true
    }
}

pub(crate) fn transform_samples(samples: &[Mat4], times: &[f32]) -> Option<TransformSamples> {
    match TransformSamples::animated(samples, times) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("Ignoring transform: {e}");
            None
        }
    }
}

// ─── RenderObject ────────────────────────────────────────────────────────────

/// A geometry or camera location.
pub struct RenderObject {
    base: ObjectBase,
}

impl RenderObject {
    pub(crate) fn new(base: ObjectBase) -> Self {
        Self { base }
    }

    /// The node carrying this location's transform, if conversion succeeded.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.base.node()
    }

    #[must_use]
    pub fn is_instanced(&self) -> bool {
        self.base.instance().is_instanced()
    }

    pub(crate) fn nodes_created(&self, out: &mut Vec<NodeId>) {
        self.base.instance().nodes_created(out);
    }
}

impl ObjectInterface for RenderObject {
    fn transform(&mut self, transform: Mat4) {
        self.base.transform(&TransformSamples::Static(transform));
    }

    fn transform_samples(&mut self, samples: &[Mat4], times: &[f32]) {
        if let Some(t) = transform_samples(samples, times) {
            self.base.transform(&t);
        }
    }

    fn set_attributes(&mut self, attributes: &AttributesHandle) -> bool {
        match downcast_attributes(attributes) {
            Some(bundle) => self.base.set_attributes(bundle),
            None => false,
        }
    }
}
