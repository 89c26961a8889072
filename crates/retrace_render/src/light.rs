//! Lights
//!
//! A light location owns a private copy of its light shader network, with
//! the root renamed to `light:<name>` and bound to the alias of the same
//! name. Objects link to lights through that alias, so rebuilding the shader
//! never invalidates their `light_group` arrays.
//!
//! The `filters` array is owned by the [`LinkGraph`]: every time the shader
//! is rebuilt the light re-registers, and the next update pushes the current
//! filter list.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Mat4;
use retrace_native::{AliasId, NodeDeleter, NodeId, NodeRef, ParamValue};
use retrace_scene::{AttributesHandle, ObjectInterface};

use crate::attributes::AttributeBundle;
use crate::light_filter::LightFilterCore;
use crate::links::LinkGraph;
use crate::motion::TransformSamples;
use crate::object::{ObjectBase, downcast_attributes, transform_samples};
use crate::session::NodeContext;
use crate::shader::ShaderNodes;

struct LightState {
    base: ObjectBase,
    shader: Option<ShaderNodes>,
    transform: Option<TransformSamples>,
}

pub(crate) struct LightCore {
    name: String,
    alias: AliasId,
    context: NodeContext,
    links: Weak<LinkGraph>,
    registered: AtomicBool,
    state: parking_lot::Mutex<LightState>,
}

impl LightCore {
    fn new(name: &str, base: ObjectBase, context: NodeContext, links: &Arc<LinkGraph>) -> Self {
        Self {
            name: name.to_string(),
            alias: context.universe.alias(&format!("light:{name}")),
            context,
            links: Arc::downgrade(links),
            registered: AtomicBool::new(false),
            state: parking_lot::Mutex::new(LightState {
                base,
                shader: None,
                transform: None,
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> Option<NodeId> {
        self.state.lock().shader.as_ref().and_then(ShaderNodes::root)
    }

    fn transform(&self, transform: TransformSamples) {
        let mut state = self.state.lock();
        state.base.transform(&transform);
        if let Some(root) = state.shader.as_ref().and_then(ShaderNodes::root) {
            transform.apply(&self.context.universe, root, "matrix");
        }
        state.transform = Some(transform);
    }

    fn set_attributes(self: &Arc<Self>, bundle: Arc<AttributeBundle>) -> bool {
        let mut state = self.state.lock();
        if !state.base.set_attributes(bundle.clone()) {
            return false;
        }

        state.shader = None;
        self.context.universe.bind_alias(self.alias, None);
        state.shader = self.build_shader(&state, &bundle);
        drop(state);

        // Lights without a shader still register so that filters naming them
        // are not reported missing.
        self.registered.store(true, Ordering::Release);
        if let Some(links) = self.links.upgrade() {
            links.register_light(&self.name, self);
        }
        true
    }

    fn build_shader(&self, state: &LightState, bundle: &AttributeBundle) -> Option<ShaderNodes> {
        let universe = &self.context.universe;
        let network = bundle.light_shader()?;
        let mesh = state.base.node();
        // Without geometry a mesh light has nothing to emit from.
        if mesh.is_none() && network.output_shader().is_some_and(|s| s.name == "mesh_light") {
            return None;
        }
        let shader = ShaderNodes::compile(&self.context, network, &format!("light:{}:", self.name));
        let root = shader.root()?;
        universe.rename(root, &format!("light:{}", self.name));

        if universe.is(root, "mesh_light") {
            universe.set(root, "mesh", mesh?);
        }

        universe.bind_alias(self.alias, Some(root));
        if let Some(transform) = &state.transform {
            transform.apply(universe, root, "matrix");
        }
        Some(shader)
    }

    /// Rewrites the `filters` array from `filters` plus the filters assigned
    /// directly through attributes. Returns the names of filters whose
    /// shader no longer exists.
    pub(crate) fn update_filters(&self, filters: &[Arc<LightFilterCore>]) -> Vec<String> {
        let universe = &self.context.universe;
        let state = self.state.lock();
        let Some(root) = state.shader.as_ref().and_then(ShaderNodes::root) else {
            return Vec::new();
        };

        let mut missing = Vec::new();
        let mut refs: Vec<NodeRef> = Vec::with_capacity(filters.len());
        for filter in filters {
            let reference = NodeRef::Alias(filter.alias());
            if universe.resolve(reference).is_some() {
                refs.push(reference);
            } else {
                missing.push(filter.name().to_string());
            }
        }
        if let Some(bundle) = state.base.attributes() {
            refs.extend(
                bundle
                    .assigned_light_filters()
                    .iter()
                    .filter_map(|shader| shader.root())
                    .map(NodeRef::Node),
            );
        }

        universe.set(root, "filters", ParamValue::nodes(refs));
        missing
    }
}

impl Drop for LightCore {
    fn drop(&mut self) {
        // The graph may already be gone when the renderer drops first.
        if self.registered.load(Ordering::Acquire) {
            if let Some(links) = self.links.upgrade() {
                links.deregister_light(&self.name, self as *const Self);
            }
        }
        // Retained nodes outlive the handle and keep their alias. Otherwise a
        // replacement light may already own it.
        if self.context.deleter != NodeDeleter::Destroy {
            return;
        }
        let universe = &self.context.universe;
        let root = self.state.get_mut().shader.as_ref().and_then(ShaderNodes::root);
        if root.is_some() && universe.resolve(NodeRef::Alias(self.alias)) == root {
            universe.bind_alias(self.alias, None);
        }
    }
}

// ─── RenderLight ─────────────────────────────────────────────────────────────

/// A light location.
pub struct RenderLight(Arc<LightCore>);

impl RenderLight {
    pub(crate) fn create(
        name: &str,
        base: ObjectBase,
        context: NodeContext,
        links: &Arc<LinkGraph>,
        attributes: Arc<AttributeBundle>,
    ) -> Self {
        let core = Arc::new(LightCore::new(name, base, context, links));
        core.set_attributes(attributes);
        Self(core)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// The root of the light's shader, if one was built.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.0.root()
    }

    pub(crate) fn nodes_created(&self, out: &mut Vec<NodeId>) {
        let state = self.0.state.lock();
        state.base.instance().nodes_created(out);
        if let Some(shader) = &state.shader {
            shader.nodes_created(out);
        }
    }
}

impl ObjectInterface for RenderLight {
    fn transform(&mut self, transform: Mat4) {
        self.0.transform(TransformSamples::Static(transform));
    }

    fn transform_samples(&mut self, samples: &[Mat4], times: &[f32]) {
        if let Some(t) = transform_samples(samples, times) {
            self.0.transform(t);
        }
    }

    fn set_attributes(&mut self, attributes: &AttributesHandle) -> bool {
        match downcast_attributes(attributes) {
            Some(bundle) => self.0.set_attributes(bundle),
            None => false,
        }
    }
}
