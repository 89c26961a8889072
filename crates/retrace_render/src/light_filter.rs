//! Light Filters
//!
//! A light-filter location compiles its `ai:lightFilter:filter` network into
//! a private set of nodes whose root is named and aliased
//! `lightFilter:<name>`, then registers with the [`LinkGraph`] under the
//! light set named by its `filteredLights` attribute.

use std::sync::{Arc, Weak};

use glam::Mat4;
use retrace_native::{AliasId, NodeDeleter, NodeId, NodeRef};
use retrace_scene::{AttributesHandle, ObjectInterface};

use crate::attributes::AttributeBundle;
use crate::links::{LinkGraph, light_set};
use crate::motion::TransformSamples;
use crate::object::{ObjectBase, downcast_attributes, transform_samples};
use crate::session::NodeContext;
use crate::shader::ShaderNodes;

struct FilterState {
    base: ObjectBase,
    shader: Option<ShaderNodes>,
    transform: Option<TransformSamples>,
    /// The light set currently registered under.
    registered: Option<Arc<[String]>>,
}

pub(crate) struct LightFilterCore {
    id: u64,
    name: String,
    alias: AliasId,
    context: NodeContext,
    links: Weak<LinkGraph>,
    state: parking_lot::Mutex<FilterState>,
}

impl LightFilterCore {
    fn new(name: &str, base: ObjectBase, context: NodeContext, links: &Arc<LinkGraph>) -> Self {
        Self {
            id: links.next_filter_id(),
            name: name.to_string(),
            alias: context.universe.alias(&format!("lightFilter:{name}")),
            context,
            links: Arc::downgrade(links),
            state: parking_lot::Mutex::new(FilterState {
                base,
                shader: None,
                transform: None,
                registered: None,
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn alias(&self) -> AliasId {
        self.alias
    }

    fn transform(&self, transform: TransformSamples) {
        let mut state = self.state.lock();
        state.base.transform(&transform);
        if let Some(root) = state.shader.as_ref().and_then(ShaderNodes::root) {
            transform.apply(&self.context.universe, root, "geometry_matrix");
        }
        state.transform = Some(transform);
    }

    fn set_attributes(self: &Arc<Self>, bundle: Arc<AttributeBundle>) -> bool {
        let universe = &self.context.universe;
        let mut state = self.state.lock();
        if !state.base.set_attributes(bundle.clone()) {
            return false;
        }

        let links = self.links.upgrade();
        if let (Some(lights), Some(links)) = (state.registered.take(), &links) {
            links.deregister_light_filter(&lights, self.id);
        }
        state.shader = None;
        universe.bind_alias(self.alias, None);

        let (Some(lights), Some(network)) = (bundle.filtered_lights(), bundle.light_filter_shader())
        else {
            return true;
        };
        let shader = ShaderNodes::compile(
            &self.context,
            network,
            &format!("lightFilter:{}:", self.name),
        );
        let Some(root) = shader.root() else {
            return true;
        };
        universe.rename(root, &format!("lightFilter:{}", self.name));
        universe.bind_alias(self.alias, Some(root));
        if let Some(transform) = &state.transform {
            transform.apply(universe, root, "geometry_matrix");
        }
        state.shader = Some(shader);

        let lights = light_set(lights);
        state.registered = Some(lights.clone());
        drop(state);

        if let Some(links) = links {
            links.register_light_filter(&lights, self);
        }
        true
    }
}

impl Drop for LightFilterCore {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let (Some(lights), Some(links)) = (state.registered.take(), self.links.upgrade()) {
            links.deregister_light_filter(&lights, self.id);
        }
        if self.context.deleter != NodeDeleter::Destroy {
            return;
        }
        let universe = &self.context.universe;
        let root = state.shader.as_ref().and_then(ShaderNodes::root);
        if root.is_some() && universe.resolve(NodeRef::Alias(self.alias)) == root {
            universe.bind_alias(self.alias, None);
        }
    }
}

// ─── RenderLightFilter ───────────────────────────────────────────────────────

/// A light-filter location.
pub struct RenderLightFilter(Arc<LightFilterCore>);

impl RenderLightFilter {
    pub(crate) fn create(
        name: &str,
        base: ObjectBase,
        context: NodeContext,
        links: &Arc<LinkGraph>,
        attributes: Arc<AttributeBundle>,
    ) -> Self {
        let core = Arc::new(LightFilterCore::new(name, base, context, links));
        core.set_attributes(attributes);
        Self(core)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// The root of the filter's shader, if one was built.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.0.state.lock().shader.as_ref().and_then(ShaderNodes::root)
    }

    pub(crate) fn nodes_created(&self, out: &mut Vec<NodeId>) {
        let state = self.0.state.lock();
        state.base.instance().nodes_created(out);
        if let Some(shader) = &state.shader {
            shader.nodes_created(out);
        }
    }
}

impl ObjectInterface for RenderLightFilter {
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
