//! Renderer Façade
//!
//! [`Renderer`] is the entry point hosts talk to. It composes the caches,
//! the link graph and the session globals:
//!
//! ```text
//!  Renderer
//!  ├── RendererBase            (also used by procedural sub-graphs)
//!  │   ├── ShaderCache         content hash → compiled network
//!  │   ├── InstanceCache       content hash → master node
//!  │   ├── LightListCache      light names → alias array
//!  │   └── LinkGraph           lights ⇄ light filters
//!  ├── Globals                 options, outputs, cameras, render dispatch
//!  └── Session                 owns the universe; dropped last
//! ```
//!
//! Before each render the caches are swept and the link graph is brought up
//! to date. The host must not issue edits while `render` runs.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;
use retrace_core::{AttributeMap, AttributeValue, RenderType, Result, ShaderNetwork};
use retrace_native::{NodeDeleter, RenderEngine, Universe};
use retrace_scene::{
    AttributesHandle, Camera, ObjectHandle, Output, SceneObject, SceneRenderer,
};

use crate::attributes::AttributeBundle;
use crate::globals::Globals;
use crate::instance::InstanceCache;
use crate::light::RenderLight;
use crate::light_filter::RenderLightFilter;
use crate::light_list::LightListCache;
use crate::links::{LinkGraph, LinkReport};
use crate::object::{ObjectBase, RenderObject, downcast_attributes};
use crate::session::{Converters, NodeContext, Session};
use crate::settings::RendererSettings;
use crate::shader::{CompiledShader, ShaderCache};

/// The parts shared by the top-level renderer and procedural sub-graphs.
pub(crate) struct RendererBase {
    context: NodeContext,
    shaders: Arc<ShaderCache>,
    instances: InstanceCache,
    light_lists: Arc<LightListCache>,
    links: Arc<LinkGraph>,
}

impl RendererBase {
    pub fn new(context: NodeContext, links: LinkGraph) -> Self {
        Self {
            shaders: Arc::new(ShaderCache::new(context.clone())),
            instances: InstanceCache::new(context.clone()),
            light_lists: Arc::new(LightListCache::new(context.universe.clone())),
            links: Arc::new(links),
            context,
        }
    }

    #[inline]
    pub fn context(&self) -> &NodeContext {
        &self.context
    }

    #[inline]
    pub fn shaders(&self) -> &Arc<ShaderCache> {
        &self.shaders
    }

    #[inline]
    pub fn instances(&self) -> &InstanceCache {
        &self.instances
    }

    #[inline]
    pub fn links(&self) -> &LinkGraph {
        &self.links
    }

    pub fn attributes(&self, attributes: &AttributeMap) -> AttributesHandle {
        Arc::new(AttributeBundle::new(
            attributes,
            &self.shaders,
            self.light_lists.clone(),
        ))
    }

    fn object_base(&self, object: &SceneObject, bundle: &AttributeBundle, name: &str, link_lights: bool) -> ObjectBase {
        let instance = self.instances.get(object, bundle, name);
        ObjectBase::new(self.context.universe.clone(), instance, link_lights)
    }

    pub fn camera(&self, name: &str, camera: &Camera, attributes: &AttributesHandle) -> Option<RenderObject> {
        self.object(name, &SceneObject::Camera(camera.clone()), attributes)
    }

    pub fn light(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<RenderLight> {
        let bundle = downcast_attributes(attributes)?;
        let base = self.object_base(object, &bundle, name, false);
        Some(RenderLight::create(
            name,
            base,
            self.context.clone(),
            &self.links,
            bundle,
        ))
    }

    pub fn light_filter(
        &self,
        name: &str,
        object: &SceneObject,
        attributes: &AttributesHandle,
    ) -> Option<RenderLightFilter> {
        let bundle = downcast_attributes(attributes)?;
        let base = self.object_base(object, &bundle, name, false);
        Some(RenderLightFilter::create(
            name,
            base,
            self.context.clone(),
            &self.links,
            bundle,
        ))
    }

    pub fn object(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<RenderObject> {
        let bundle = downcast_attributes(attributes)?;
        let mut base = self.object_base(object, &bundle, name, true);
        base.set_attributes(bundle);
        Some(RenderObject::new(base))
    }

    pub fn object_samples(
        &self,
        name: &str,
        samples: &[SceneObject],
        times: &[f32],
        attributes: &AttributesHandle,
    ) -> Option<RenderObject> {
        let bundle = downcast_attributes(attributes)?;
        let instance = self.instances.get_samples(samples, times, &bundle, name);
        let mut base = ObjectBase::new(self.context.universe.clone(), instance, true);
        base.set_attributes(bundle);
        Some(RenderObject::new(base))
    }

    /// Sweeps the caches and pushes pending light-filter links.
    pub fn prepare(&self) -> LinkReport {
        self.shaders.clear_unused();
        self.instances.clear_unused();
        self.light_lists.clear();
        self.links.update()
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// A complete renderer session.
pub struct Renderer {
    base: RendererBase,
    globals: Mutex<Globals>,
    session: Session,
}

impl Renderer {
    #[must_use]
    pub fn new(
        settings: RendererSettings,
        engine: Arc<dyn RenderEngine>,
        converters: Converters,
    ) -> Self {
        let render_type = settings.render_type;
        let session = Session::begin(settings, engine, converters);
        let context = NodeContext {
            universe: session.universe().clone(),
            deleter: NodeDeleter::for_render_type(render_type),
            parent: None,
            converters: session.converters().clone(),
        };

        // Batch hosts drop handles straight after creating them, so the
        // graph keeps lights and filters alive until it has linked them.
        let links = LinkGraph::new(!render_type.is_interactive());
        let base = RendererBase::new(context.clone(), links);
        let globals = Globals::new(
            session.settings(),
            context,
            session.engine().clone(),
            base.shaders().clone(),
        );

        Self {
            base,
            globals: Mutex::new(globals),
            session,
        }
    }

    #[inline]
    #[must_use]
    pub fn universe(&self) -> &Arc<Universe> {
        self.session.universe()
    }

    #[inline]
    #[must_use]
    pub fn render_type(&self) -> RenderType {
        self.session.render_type()
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        self.session.settings()
    }

    #[must_use]
    pub fn shader_cache(&self) -> &ShaderCache {
        self.base.shaders()
    }

    #[must_use]
    pub fn instance_cache(&self) -> &InstanceCache {
        self.base.instances()
    }

    #[must_use]
    pub fn link_graph(&self) -> &LinkGraph {
        self.base.links()
    }

    /// Compiles a network through the session's shader cache.
    pub fn shader(&self, network: &ShaderNetwork) -> CompiledShader {
        self.base.shaders().get(network)
    }

    /// Whether an interactive refinement is in progress.
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.globals.lock().is_rendering()
    }
}

impl SceneRenderer for Renderer {
    fn name(&self) -> &str {
        "retrace"
    }

    fn option(&self, name: &str, value: Option<&AttributeValue>) {
        self.globals.lock().option(name, value);
    }

    fn output(&self, name: &str, output: Option<&Output>) {
        self.globals.lock().output(name, output);
    }

    fn attributes(&self, attributes: &AttributeMap) -> AttributesHandle {
        self.base.attributes(attributes)
    }

    fn camera(&self, name: &str, camera: &Camera, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        self.globals.lock().camera(name, camera);
        self.base
            .camera(name, camera, attributes)
            .map(|o| Box::new(o) as ObjectHandle)
    }

    fn light(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        self.base
            .light(name, object, attributes)
            .map(|o| Box::new(o) as ObjectHandle)
    }

    fn light_filter(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        self.base
            .light_filter(name, object, attributes)
            .map(|o| Box::new(o) as ObjectHandle)
    }

    fn object(&self, name: &str, object: &SceneObject, attributes: &AttributesHandle) -> Option<ObjectHandle> {
        self.base
            .object(name, object, attributes)
            .map(|o| Box::new(o) as ObjectHandle)
    }

    fn object_samples(
        &self,
        name: &str,
        samples: &[SceneObject],
        times: &[f32],
        attributes: &AttributesHandle,
    ) -> Option<ObjectHandle> {
        self.base
            .object_samples(name, samples, times, attributes)
            .map(|o| Box::new(o) as ObjectHandle)
    }

    fn render(&self) -> Result<()> {
        let report = self.base.prepare();
        if !report.is_empty() {
            if self.render_type().is_interactive() {
                warn!("Light filter links are incomplete: {report:?}");
            } else {
                report.into_result()?;
            }
        }
        self.globals.lock().render()
    }

    fn pause(&self) {
        self.globals.lock().pause();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.globals.get_mut().pause();
        info!("Renderer shut down");
    }
}
