//! Session
//!
//! One renderer session owns one [`Universe`]. The session begins when the
//! renderer is created and ends when it is dropped; ending a session clears
//! the universe, which is what finally releases nodes held under the
//! `Retain` deletion policy.

use std::sync::Arc;

use log::info;
use retrace_core::RenderType;
use retrace_native::{NodeDeleter, NodeHandle, NodeId, RenderEngine, Universe};

use crate::convert::{ObjectConverter, ShaderConverter};
use crate::settings::RendererSettings;

/// The external converters a session translates scene data with.
#[derive(Clone)]
pub struct Converters {
    pub objects: Arc<dyn ObjectConverter>,
    pub shaders: Arc<dyn ShaderConverter>,
}

impl Converters {
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectConverter>, shaders: Arc<dyn ShaderConverter>) -> Self {
        Self { objects, shaders }
    }
}

pub struct Session {
    settings: RendererSettings,
    universe: Arc<Universe>,
    engine: Arc<dyn RenderEngine>,
    converters: Converters,
}

impl Session {
    #[must_use]
    pub fn begin(
        settings: RendererSettings,
        engine: Arc<dyn RenderEngine>,
        converters: Converters,
    ) -> Self {
        info!(
            "Beginning {:?} session (native {})",
            settings.render_type, settings.native_version
        );
        let universe = Arc::new(Universe::new(settings.native_version));
        Self {
            settings,
            universe,
            engine,
            converters,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn render_type(&self) -> RenderType {
        self.settings.render_type
    }

    #[inline]
    #[must_use]
    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn RenderEngine> {
        &self.engine
    }

    #[inline]
    #[must_use]
    pub fn converters(&self) -> &Converters {
        &self.converters
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.universe.clear();
        info!("Ended {:?} session", self.settings.render_type);
    }
}

/// Everything needed to create nodes for one renderer: where they go, how
/// they are released, and how scene data is converted.
#[derive(Clone)]
pub(crate) struct NodeContext {
    pub universe: Arc<Universe>,
    pub deleter: NodeDeleter,
    pub parent: Option<NodeId>,
    pub converters: Converters,
}

impl NodeContext {
    pub fn handle(&self, id: NodeId) -> NodeHandle {
        NodeHandle::new(self.universe.clone(), id, self.deleter)
    }
}
