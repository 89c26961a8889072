//! Procedural Expansion
//!
//! A [`Procedural`] describes its contents by calling back into a
//! [`SceneRenderer`]. We hand it a [`ProceduralRenderer`] that builds nodes
//! under a `procedural` node, then store everything it made in the
//! procedural's `nodes` array:
//!
//! ```text
//!   procedural "/set" ── nodes = [ ... ]
//!      ├── objects, lights, light filters   (created through the callbacks)
//!      ├── instance masters                 (sub-graph instance cache)
//!      └── shader nodes                     (sub-graph shader cache)
//! ```
//!
//! Nodes inside a procedural are never destroyed individually; destroying
//! the procedural node destroys its children.

use log::warn;
use parking_lot::Mutex;
use retrace_core::{AttributeMap, AttributeValue, Result};
use retrace_native::{NodeDeleter, NodeId, NodeRef, ParamValue};
use retrace_scene::{
    AttributesHandle, Camera, ObjectHandle, Output, Procedural, SceneObject, SceneRenderer,
};

use crate::links::LinkGraph;
use crate::renderer::RendererBase;
use crate::session::NodeContext;

/// Expands `procedural` into a new `procedural` node named `name`.
pub(crate) fn convert_procedural(
    context: &NodeContext,
    procedural: &dyn Procedural,
    name: &str,
) -> Option<NodeId> {
    let universe = &context.universe;
    let node = universe.create_node("procedural", name, context.parent)?;

    let renderer = ProceduralRenderer::new(NodeContext {
        universe: universe.clone(),
        deleter: NodeDeleter::Retain,
        parent: Some(node),
        converters: context.converters.clone(),
    });
    procedural.render(&renderer);

    // The sub-graph is complete once `render` returns, so its links can be
    // resolved straight away.
    let report = renderer.base.links().update();
    if !report.is_empty() {
        warn!("Procedural \"{name}\" has unresolved light filter links: {report:?}");
    }

    let nodes = renderer.nodes_created();
    universe.set(node, "nodes", ParamValue::nodes(nodes.into_iter().map(NodeRef::Node)));
    Some(node)
}

/// The renderer a procedural sees while it expands.
pub struct ProceduralRenderer {
    base: RendererBase,
    nodes_created: Mutex<Vec<NodeId>>,
}

impl ProceduralRenderer {
    pub(crate) fn new(context: NodeContext) -> Self {
        Self {
            base: RendererBase::new(context, LinkGraph::new(true)),
            nodes_created: Mutex::new(Vec::new()),
        }
    }

    /// The procedural node everything is parented to.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.base.context().parent
    }

    /// Every node made so far: those created for locations, followed by
    /// instance masters and cached shaders.
    #[must_use]
    pub fn nodes_created(&self) -> Vec<NodeId> {
        let mut nodes = self.nodes_created.lock().clone();
        self.base.instances().nodes_created(&mut nodes);
        self.base.shaders().nodes_created(&mut nodes);
        nodes
    }
}

impl SceneRenderer for ProceduralRenderer {
    fn name(&self) -> &str {
        "retrace"
    }

    fn option(&self, _name: &str, _value: Option<&AttributeValue>) {
        warn!("Procedurals can not call option()");
    }

    fn output(&self, _name: &str, _output: Option<&Output>) {
        warn!("Procedurals can not call output()");
    }

    fn attributes(&self, attributes: &AttributeMap) -> AttributesHandle {
        self.base.attributes(attributes)
    }

    fn camera(&self, _name: &str, _camera: &Camera, _attributes: &AttributesHandle) -> Option<ObjectHandle> {
        warn!("Procedurals can not call camera()");
        None
    }

    fn light(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        let light = self.base.light(name, object, attributes)?;
        light.nodes_created(&mut self.nodes_created.lock());
        Some(Box::new(light))
    }

    fn light_filter(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        let filter = self.base.light_filter(name, object, attributes)?;
        filter.nodes_created(&mut self.nodes_created.lock());
        Some(Box::new(filter))
    }

    fn object(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        let object = self.base.object(name, object, attributes)?;
        object.nodes_created(&mut self.nodes_created.lock());
        Some(Box::new(object))
    }

    fn object_samples(
        &self,
        name: &str,
        samples: &[SceneObject],
        times: &[f32],
        attributes: &AttributesHandle,
    ) -> Option<ObjectHandle> {
        let object = self.base.object_samples(name, samples, times, attributes)?;
        object.nodes_created(&mut self.nodes_created.lock());
        Some(Box::new(object))
    }

    fn render(&self) -> Result<()> {
        warn!("Procedurals can not call render()");
        Ok(())
    }

    fn pause(&self) {
        warn!("Procedurals can not call pause()");
    }
}

