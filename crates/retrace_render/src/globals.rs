//! Session Globals
//!
//! Everything the renderer holds once per session rather than per location:
//! options, outputs, the camera descriptions needed at render time, and the
//! render dispatch itself.
//!
//! ```text
//!   render()
//!     ├── bind camera meshes          (uv cameras → polymesh / ginstance)
//!     ├── AA_seed                     (ai:AA_seed, else frame, else 1)
//!     └── per render type
//!          ├── Batch             one blocking pass per distinct output camera
//!          ├── SceneDescription  write_scene(file_name)
//!          └── Interactive       progressive refinement in the background
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Mat4;
use log::{debug, error, warn};
use retrace_core::{AttributeValue, RenderType, Result, RetraceError, Value};
use retrace_native::{
    LogFlags, MessageSettings, NodeHandle, NodeId, NodeKind, NodeRef, ParamValue, RenderEngine,
    RenderMode, Universe,
};
use retrace_scene::{Camera, Output, SceneObject};

use crate::output::OutputNodes;
use crate::progressive::ProgressiveRender;
use crate::session::NodeContext;
use crate::settings::RendererSettings;
use crate::shader::{CompiledShader, ShaderCache};

pub(crate) const DEFAULT_CAMERA: &str = "retrace:defaultCamera";

const LOG_PREFIX: &str = "ai:log:";
const CONSOLE_PREFIX: &str = "ai:console:";
const AOV_SHADER_PREFIX: &str = "ai:aov_shader:";
const DECLARE_PREFIX: &str = "ai:declare:";

/// Casts an option value, warning when it has the wrong type.
fn reported<'a, T>(
    name: &str,
    value: &'a AttributeValue,
    expected: &str,
    cast: impl FnOnce(&'a Value) -> Option<T>,
) -> Option<T> {
    let result = value.data().and_then(cast);
    if result.is_none() {
        warn!(
            "Expected {expected} but got {} for option \"{name}\"",
            value.type_name()
        );
    }
    result
}

fn create_parent_directories(file: &str) {
    if file.is_empty() {
        return;
    }
    if let Some(parent) = Path::new(file).parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        error!("Unable to create directory \"{}\": {e}", parent.display());
    }
}

pub(crate) struct Globals {
    render_type: RenderType,
    file_name: PathBuf,
    context: NodeContext,
    engine: Arc<dyn RenderEngine>,
    shaders: Arc<ShaderCache>,

    outputs: BTreeMap<String, OutputNodes>,
    aov_shaders: BTreeMap<String, CompiledShader>,
    atmosphere: Option<CompiledShader>,
    background: Option<CompiledShader>,

    cameras: BTreeMap<String, Camera>,
    camera_name: String,
    default_camera: Option<NodeHandle>,

    frame: Option<i32>,
    aa_seed: Option<i32>,
    sample_motion: Option<bool>,

    progressive: ProgressiveRender,
}

impl Globals {
    pub fn new(
        settings: &RendererSettings,
        context: NodeContext,
        engine: Arc<dyn RenderEngine>,
        shaders: Arc<ShaderCache>,
    ) -> Self {
        let progressive = ProgressiveRender::new(
            context.universe.clone(),
            engine.clone(),
            settings.progressive.start_aa_samples,
        );
        Self {
            render_type: settings.render_type,
            file_name: settings.file_name.clone(),
            context,
            engine,
            shaders,
            outputs: BTreeMap::new(),
            aov_shaders: BTreeMap::new(),
            atmosphere: None,
            background: None,
            cameras: BTreeMap::new(),
            camera_name: String::new(),
            default_camera: None,
            frame: None,
            aa_seed: None,
            sample_motion: None,
            progressive,
        }
    }

    // ─── Options ─────────────────────────────────────────────────────────────

    pub fn option(&mut self, name: &str, value: Option<&AttributeValue>) {
        let universe = self.context.universe.clone();
        let options = universe.options();

        match name {
            "frame" => {
                self.frame = value.and_then(|v| reported(name, v, "IntData", Value::as_int));
                return;
            }
            "camera" => {
                self.camera_name = value
                    .and_then(|v| reported(name, v, "StringData", Value::as_str))
                    .map(str::to_string)
                    .unwrap_or_default();
                return;
            }
            "ai:log:filename" => {
                let file = value
                    .and_then(|v| reported(name, v, "StringData", Value::as_str))
                    .unwrap_or_default()
                    .to_string();
                create_parent_directories(&file);
                universe.update_messages(|m| m.log_file = file);
                return;
            }
            "ai:statisticsFileName" => {
                let file = value
                    .and_then(|v| reported(name, v, "StringData", Value::as_str))
                    .unwrap_or_default()
                    .to_string();
                create_parent_directories(&file);
                universe.update_messages(|m| m.statistics_file = file);
                return;
            }
            "ai:log:max_warnings" => {
                let max = value
                    .and_then(|v| reported(name, v, "IntData", Value::as_int))
                    .unwrap_or(MessageSettings::DEFAULT_MAX_WARNINGS);
                universe.update_messages(|m| m.max_warnings = max);
                return;
            }
            "ai:AA_seed" => {
                self.aa_seed = value.and_then(|v| reported(name, v, "IntData", Value::as_int));
                return;
            }
            "sampleMotion" => {
                self.sample_motion = value.and_then(|v| reported(name, v, "BoolData", Value::as_bool));
                return;
            }
            "ai:plugin_searchpath" => {
                let mut search_path = std::env::var("OSL_SHADER_PATHS").unwrap_or_default();
                if let Some(path) = value.and_then(|v| reported(name, v, "StringData", Value::as_str)) {
                    search_path = format!("{path}:{search_path}");
                }
                universe.set(options, "plugin_searchpath", search_path);
                return;
            }
            "ai:atmosphere" => {
                self.atmosphere = self.option_shader(name, value);
                let root = self.atmosphere.as_ref().and_then(|s| s.root());
                Self::set_node_option(&universe, "atmosphere", root);
                return;
            }
            "ai:background" => {
                self.background = self.option_shader(name, value);
                let root = self.background.as_ref().and_then(|s| s.root());
                Self::set_node_option(&universe, "background", root);
                return;
            }
            _ => {}
        }

        if let Some(flag) = name.strip_prefix(LOG_PREFIX)
            && self.update_log_flags(flag, value, false)
        {
            return;
        }
        if let Some(flag) = name.strip_prefix(CONSOLE_PREFIX)
            && self.update_log_flags(flag, value, true)
        {
            return;
        }

        if name.starts_with(AOV_SHADER_PREFIX) {
            self.aov_shaders.remove(name);
            if let Some(shader) = self.option_shader(name, value) {
                self.aov_shaders.insert(name.to_string(), shader);
            }
            let roots: Vec<NodeRef> = self
                .aov_shaders
                .values()
                .filter_map(|s| s.root())
                .map(NodeRef::Node)
                .collect();
            universe.set(options, "aov_shaders", ParamValue::nodes(roots));
            return;
        }

        if let Some(parameter) = name.strip_prefix(DECLARE_PREFIX) {
            if universe.has_parameter(options, parameter) {
                warn!("Unable to declare existing option \"{parameter}\"");
                return;
            }
            universe.reset(options, parameter);
            if let Some(data) = value.and_then(AttributeValue::data) {
                universe.set(options, parameter, ParamValue::from(data));
            }
            return;
        }

        if let Some(parameter) = name.strip_prefix("ai:")
            && universe.has_parameter(options, parameter)
        {
            match value.and_then(AttributeValue::data) {
                Some(data) => universe.set(options, parameter, ParamValue::from(data)),
                None => universe.reset(options, parameter),
            }
            return;
        }

        if name.starts_with("user:") {
            match value.and_then(AttributeValue::data) {
                Some(data) => universe.set(options, name, ParamValue::from(data)),
                None => universe.reset(options, name),
            }
            return;
        }

        if name.starts_with("ai:") {
            warn!("Unknown option \"{name}\"");
            return;
        }

        // Options prefixed for other renderers.
        if name.contains(':') {
            return;
        }

        warn!("Unknown option \"{name}\"");
    }

    fn option_shader(&self, name: &str, value: Option<&AttributeValue>) -> Option<CompiledShader> {
        let value = value?;
        match value.shader() {
            Some(network) => Some(self.shaders.get(network)),
            None => {
                warn!(
                    "Expected ShaderNetwork but got {} for option \"{name}\"",
                    value.type_name()
                );
                None
            }
        }
    }

    fn set_node_option(universe: &Universe, parameter: &str, node: Option<NodeId>) {
        let options = universe.options();
        match node {
            Some(node) => universe.set(options, parameter, node),
            None => universe.reset(options, parameter),
        }
    }

    /// Returns `false` when `name` is not a message category.
    fn update_log_flags(&self, name: &str, value: Option<&AttributeValue>, console: bool) -> bool {
        let Some(flag) = LogFlags::from_option_name(name) else {
            return false;
        };

        let turn_on = match value {
            None => {
                let defaults = if console {
                    LogFlags::CONSOLE_DEFAULT
                } else {
                    LogFlags::LOG_DEFAULT
                };
                defaults.contains(flag)
            }
            Some(v) => match reported(name, v, "BoolData", Value::as_bool) {
                Some(on) => on,
                None => return true,
            },
        };

        self.context.universe.update_messages(|m| {
            let flags = if console {
                &mut m.console_flags
            } else {
                &mut m.log_flags
            };
            flags.set(flag, turn_on);
        });
        true
    }

    // ─── Outputs & Cameras ───────────────────────────────────────────────────

    pub fn output(&mut self, name: &str, output: Option<&Output>) {
        self.outputs.remove(name);
        let Some(output) = output else {
            return;
        };
        match OutputNodes::new(&self.context, name, output) {
            Ok(nodes) => {
                self.outputs.insert(name.to_string(), nodes);
            }
            Err(e) => warn!("{e}"),
        }
    }

    /// Records a camera for render-time setup.
    pub fn camera(&mut self, name: &str, camera: &Camera) {
        self.cameras.insert(name.to_string(), camera.clone());
    }

    // ─── Render ──────────────────────────────────────────────────────────────

    pub fn render(&mut self) -> Result<()> {
        self.update_camera_meshes()?;

        let universe = &self.context.universe;
        let seed = self.aa_seed.or(self.frame).unwrap_or(1);
        universe.set(universe.options(), "AA_seed", seed);

        match self.render_type {
            RenderType::Batch => {
                let overrides: BTreeSet<String> = self
                    .outputs
                    .values()
                    .map(|o| o.camera_override().unwrap_or_default().to_string())
                    .collect();
                for camera_override in overrides {
                    let camera = if camera_override.is_empty() {
                        self.camera_name.clone()
                    } else {
                        camera_override
                    };
                    self.update_camera(&camera);
                    debug!("Rendering camera \"{camera}\"");
                    self.engine
                        .render(&self.context.universe, RenderMode::Camera)
                        .into_result()?;
                }
            }
            RenderType::SceneDescription => {
                // A scene file holds a single render camera.
                let camera = self.camera_name.clone();
                self.update_camera(&camera);
                self.engine
                    .write_scene(&self.context.universe, &self.file_name)?;
            }
            RenderType::Interactive => {
                let camera = self.camera_name.clone();
                self.update_camera(&camera);
                self.progressive.set_rendering(true);
            }
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.progressive.set_rendering(false);
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.progressive.is_rendering()
    }

    fn update_camera(&mut self, camera_name: &str) {
        let universe = self.context.universe.clone();
        let options = universe.options();

        let mut outputs = Vec::new();
        let mut light_path_expressions = Vec::new();
        for output in self.outputs.values() {
            let output_camera = output.camera_override().unwrap_or(self.camera_name.as_str());
            if output_camera == camera_name {
                output.append(&mut outputs, &mut light_path_expressions);
            }
        }
        universe.set(options, "outputs", ParamValue::strings(&outputs));
        universe.set(
            options,
            "light_path_expressions",
            ParamValue::strings(&light_path_expressions),
        );

        let found = universe
            .lookup(camera_name)
            .filter(|id| universe.kind(*id) == Some(NodeKind::Camera));
        let (node, camera) = match found {
            Some(node) => {
                self.default_camera = None;
                (
                    Some(node),
                    self.cameras.get(camera_name).cloned().unwrap_or_default(),
                )
            }
            None => {
                if self.default_camera.is_none() {
                    self.default_camera = self.create_default_camera();
                }
                let camera = self.cameras.get(DEFAULT_CAMERA).cloned().unwrap_or_default();
                (self.default_camera.as_ref().map(NodeHandle::id), camera)
            }
        };
        match node {
            Some(node) => universe.set(options, "camera", node),
            None => universe.reset(options, "camera"),
        }

        let resolution = camera.resolution;
        universe.set(options, "xres", resolution.x);
        universe.set(options, "yres", resolution.y);
        universe.set(options, "pixel_aspect_ratio", camera.pixel_aspect_ratio);

        let [mut min, mut max] = camera.render_region();
        if min.x >= max.x || min.y >= max.y {
            // Empty regions are not permitted; render one corner pixel.
            min = glam::IVec2::ZERO;
            max = glam::IVec2::ONE;
        }
        // Regions are +Y up with an exclusive max; options want +Y down and
        // inclusive bounds.
        universe.set(options, "region_min_x", min.x);
        universe.set(options, "region_min_y", resolution.y - max.y);
        universe.set(options, "region_max_x", max.x - 1);
        universe.set(options, "region_max_y", resolution.y - min.y - 1);

        if let Some(node) = node {
            let shutter = camera.shutter;
            let shutter_end = if self.sample_motion.unwrap_or(true) {
                shutter.y
            } else {
                shutter.x
            };
            universe.set(node, "shutter_start", shutter.x);
            universe.set(node, "shutter_end", shutter_end);
        }
    }

    fn create_default_camera(&mut self) -> Option<NodeHandle> {
        let camera = Camera::default();
        self.cameras.insert(DEFAULT_CAMERA.to_string(), camera.clone());
        let context = &self.context;
        context
            .converters
            .objects
            .convert(
                &context.universe,
                &SceneObject::Camera(camera),
                DEFAULT_CAMERA,
                context.parent,
            )
            .map(|id| context.handle(id))
    }

    fn update_camera_meshes(&self) -> Result<()> {
        let universe = &self.context.universe;
        for (name, camera) in &self.cameras {
            let Some(mesh_path) = camera.string_parameter("mesh").filter(|m| !m.is_empty()) else {
                continue;
            };
            let Some(camera_node) = universe.lookup(name) else {
                continue;
            };

            let mesh_node = universe.lookup(mesh_path);
            if let Some(mesh_node) = mesh_node {
                if universe.is(mesh_node, "ginstance") {
                    if let Some(master) = universe.get_node(mesh_node, "node") {
                        universe.set(camera_node, "mesh", master);
                    }
                    match universe.get(mesh_node, "matrix") {
                        Some(matrix) => universe.set(camera_node, "matrix", matrix),
                        None => universe.set(camera_node, "matrix", Mat4::IDENTITY),
                    }
                    continue;
                }
                if universe.is(mesh_node, "polymesh") {
                    universe.set(camera_node, "mesh", mesh_node);
                    universe.set(camera_node, "matrix", Mat4::IDENTITY);
                    continue;
                }
            }

            return Err(RetraceError::MissingCameraMesh {
                camera: name.clone(),
                mesh: mesh_path.to_string(),
            });
        }
        Ok(())
    }
}
