//! Test doubles shared by the integration tests: converters that build
//! plain nodes, and an engine that records what it was asked to render.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use retrace::prelude::*;
use retrace::retrace_core::glam::Mat4;
use retrace::retrace_core::{AttributeMap, AttributeValue, Shader};
use retrace::retrace_native::{NodeId, ParamValue};
use retrace::retrace_scene::{ExternalProcedural, SpherePrimitive};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Converters
// ============================================================================

/// Creates one node per object, counting conversions.
#[derive(Default)]
pub struct MockObjectConverter {
    pub conversions: AtomicUsize,
}

impl MockObjectConverter {
    pub fn count(&self) -> usize {
        self.conversions.load(Ordering::SeqCst)
    }

    fn node_type(object: &SceneObject) -> Option<&'static str> {
        let node_type = match object {
            SceneObject::Mesh(_) => "polymesh",
            SceneObject::Curves(_) => "curves",
            SceneObject::Points(_) => "points",
            SceneObject::Sphere(_) => "sphere",
            SceneObject::Vdb(_) => "volume",
            SceneObject::ExternalProcedural(p) if p.is_volume() => "volume",
            SceneObject::ExternalProcedural(_) => "procedural",
            SceneObject::Camera(camera) if camera.projection == "orthographic" => "ortho_camera",
            SceneObject::Camera(camera) if camera.parameters.contains_key("mesh") => "uv_camera",
            SceneObject::Camera(_) => "persp_camera",
            SceneObject::Null | SceneObject::Procedural(_) => return None,
        };
        Some(node_type)
    }
}

impl ObjectConverter for MockObjectConverter {
    fn convert(
        &self,
        universe: &Universe,
        object: &SceneObject,
        name: &str,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let node_type = Self::node_type(object)?;
        self.conversions.fetch_add(1, Ordering::SeqCst);
        let node = universe.create_node(node_type, name, parent)?;
        match object {
            SceneObject::Mesh(mesh) if !mesh.is_linear() => {
                universe.set(node, "subdiv_type", "catclark");
            }
            SceneObject::Vdb(vdb) => universe.set(node, "filename", vdb.file_name.as_str()),
            SceneObject::ExternalProcedural(p) if !p.is_volume() => {
                universe.set(node, "filename", p.file_name.as_str());
            }
            _ => {}
        }
        Some(node)
    }

    fn convert_samples(
        &self,
        universe: &Universe,
        samples: &[&SceneObject],
        motion_start: f32,
        motion_end: f32,
        name: &str,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let node = self.convert(universe, samples.first()?, name, parent)?;
        universe.set(node, "motion_start", motion_start);
        universe.set(node, "motion_end", motion_end);
        Some(node)
    }
}

/// Creates one node per shader, named `<prefix><handle>`, output last.
#[derive(Default)]
pub struct MockShaderConverter {
    pub conversions: AtomicUsize,
}

impl MockShaderConverter {
    pub fn count(&self) -> usize {
        self.conversions.load(Ordering::SeqCst)
    }
}

impl ShaderConverter for MockShaderConverter {
    fn convert(
        &self,
        universe: &Universe,
        network: &ShaderNetwork,
        name_prefix: &str,
        parent: Option<NodeId>,
    ) -> Vec<NodeId> {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        let Some(output) = network.output() else {
            return Vec::new();
        };

        let mut nodes = Vec::new();
        let mut root = None;
        for (handle, shader) in network.shaders() {
            let Some(node) = universe.create_node(&shader.name, &format!("{name_prefix}{handle}"), parent)
            else {
                continue;
            };
            for (parameter, value) in &shader.parameters {
                universe.set(node, parameter, ParamValue::from(value));
            }
            if handle == output {
                root = Some(node);
            } else {
                nodes.push(node);
            }
        }
        match root {
            Some(root) => {
                nodes.push(root);
                nodes
            }
            None => {
                for node in nodes {
                    universe.destroy_node(node);
                }
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Records every pass; returns scripted statuses, then `Success`.
#[derive(Default)]
pub struct MockEngine {
    pub aa_samples: Mutex<Vec<i32>>,
    pub cameras: Mutex<Vec<Option<String>>>,
    pub outputs: Mutex<Vec<Vec<String>>>,
    pub statuses: Mutex<Vec<RenderStatus>>,
    pub written: Mutex<Vec<PathBuf>>,
    pub interrupts: AtomicUsize,
    pub rendering: AtomicBool,
    /// Blocks each pass until interrupted.
    pub block: AtomicBool,
}

impl MockEngine {
    pub fn blocking() -> Self {
        let engine = Self::default();
        engine.block.store(true, Ordering::SeqCst);
        engine
    }

    pub fn with_statuses(statuses: Vec<RenderStatus>) -> Self {
        let engine = Self::default();
        *engine.statuses.lock() = statuses;
        engine
    }

    pub fn passes(&self) -> usize {
        self.aa_samples.lock().len()
    }
}

impl RenderEngine for MockEngine {
    fn render(&self, universe: &Universe, _mode: RenderMode) -> RenderStatus {
        let options = universe.options();
        self.aa_samples.lock().push(universe.get_int(options, "AA_samples"));
        self.cameras
            .lock()
            .push(universe.get_node(options, "camera").and_then(|c| universe.name(c)));
        let outputs = match universe.get(options, "outputs") {
            Some(ParamValue::Array(items)) => items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        self.outputs.lock().push(outputs);

        if self.block.load(Ordering::SeqCst) {
            self.rendering.store(true, Ordering::SeqCst);
            while self.rendering.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }
            return RenderStatus::Interrupted;
        }

        let mut statuses = self.statuses.lock();
        if statuses.is_empty() {
            RenderStatus::Success
        } else {
            statuses.remove(0)
        }
    }

    fn interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        self.rendering.store(false, Ordering::SeqCst);
    }

    fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    fn write_scene(&self, _universe: &Universe, path: &Path) -> retrace::Result<()> {
        self.written.lock().push(path.to_path_buf());
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub struct Fixture {
    pub objects: Arc<MockObjectConverter>,
    pub shaders: Arc<MockShaderConverter>,
    pub engine: Arc<MockEngine>,
    pub renderer: Renderer,
}

impl Fixture {
    pub fn new(render_type: RenderType) -> Self {
        Self::with_engine(RendererSettings::new(render_type), MockEngine::default())
    }

    pub fn with_engine(settings: RendererSettings, engine: MockEngine) -> Self {
        init_logging();
        let objects = Arc::new(MockObjectConverter::default());
        let shaders = Arc::new(MockShaderConverter::default());
        let engine = Arc::new(engine);
        let renderer = Renderer::new(
            settings,
            engine.clone(),
            Converters::new(objects.clone(), shaders.clone()),
        );
        Self {
            objects,
            shaders,
            engine,
            renderer,
        }
    }

    pub fn universe(&self) -> &Arc<Universe> {
        self.renderer.universe()
    }

    pub fn attributes(&self, entries: &[(&str, AttributeValue)]) -> AttributesHandle {
        self.renderer.attributes(&attribute_map(entries))
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.universe().lookup(name)
    }
}

pub fn attribute_map(entries: &[(&str, AttributeValue)]) -> AttributeMap {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

pub fn surface(shader_type: &str) -> AttributeValue {
    AttributeValue::from(ShaderNetwork::single(
        "surface",
        Shader::new(shader_type, "ai:surface"),
    ))
}

pub fn light_shader(light_type: &str) -> AttributeValue {
    AttributeValue::from(ShaderNetwork::single("light", Shader::new(light_type, "ai:light")))
}

pub fn filter_shader(filter_type: &str) -> AttributeValue {
    AttributeValue::from(ShaderNetwork::single(
        "filter",
        Shader::new(filter_type, "ai:lightFilter"),
    ))
}

pub fn strings(items: &[&str]) -> AttributeValue {
    AttributeValue::from(items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
}

pub fn mesh() -> SceneObject {
    SceneObject::Mesh(MeshPrimitive::plane())
}

pub fn subdiv_mesh() -> SceneObject {
    SceneObject::Mesh(MeshPrimitive::new(
        vec![4],
        vec![0, 1, 2, 3],
        MeshPrimitive::CATMULL_CLARK,
    ))
}

pub fn sphere(radius: f32) -> SceneObject {
    SceneObject::Sphere(SpherePrimitive {
        radius,
        ..SpherePrimitive::default()
    })
}

pub fn volume_procedural() -> SceneObject {
    SceneObject::ExternalProcedural(ExternalProcedural::new(ExternalProcedural::VOLUME))
}

/// Node ids held in an array parameter, resolving aliases.
pub fn node_array(universe: &Universe, node: NodeId, parameter: &str) -> Vec<NodeId> {
    match universe.get(node, parameter) {
        Some(ParamValue::Array(items)) => items
            .iter()
            .filter_map(ParamValue::as_node)
            .filter_map(|r| universe.resolve(r))
            .collect(),
        _ => Vec::new(),
    }
}

/// String items of an array parameter.
pub fn string_array(universe: &Universe, node: NodeId, parameter: &str) -> Vec<String> {
    match universe.get(node, parameter) {
        Some(ParamValue::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn translate(x: f32) -> Mat4 {
    Mat4::from_translation(retrace::retrace_core::glam::Vec3::new(x, 0.0, 0.0))
}
