//! Attribute Bundles
//!
//! An [`AttributeBundle`] is the immutable, decoded form of one
//! `attributes()` dictionary. It splits attributes into two groups:
//!
//! - **Instance attributes** (visibility, shading flags, surface shader,
//!   trace sets, light linking, user data). These live on the cheap
//!   per-location proxy node and can always be edited in place.
//! - **Geometry attributes** (subdivision, displacement, curve width, volume
//!   stepping). These are baked into the compiled master, so they are part of
//!   the instance cache key. An edit that changes them cannot be applied to
//!   an existing location; [`AttributeBundle::apply`] reports it and the host
//!   rebuilds the location.
//!
//! ```text
//!   AttributeMap ──► classify(name) ──► Slot ──► decode ──► AttributeBundle
//!                                                             │
//!            hash_geometry(object) ◄── geometry sub-bundles ──┤
//!            apply(node, previous) ◄── instance attributes  ──┘
//! ```

pub mod geometry;
pub mod names;

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use bitflags::bitflags;
use log::warn;
use retrace_core::{AttributeMap, AttributeValue, ContentHash, ContentHasher, ShaderNetwork, Value};
use retrace_native::{NodeId, NodeKind, ParamValue, Universe};
use retrace_scene::{AttributesInterface, SceneObject};

use crate::light_list::LightListCache;
use crate::shader::{CompiledShader, ShaderCache};

pub use geometry::{CurvesSettings, DisplacementSettings, GeometryClass, PolyMeshSettings, VolumeSettings};
use names::{CurvesField, DisplacementField, MeshField, Slot, VolumeField};

bitflags! {
    /// Ray types, as used for visibility and sidedness masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RayTypes: u8 {
        const CAMERA            = 0x01;
        const SHADOW            = 0x02;
        const DIFFUSE_TRANSMIT  = 0x04;
        const SPECULAR_TRANSMIT = 0x08;
        const VOLUME            = 0x10;
        const DIFFUSE_REFLECT   = 0x20;
        const SPECULAR_REFLECT  = 0x40;
        const SUBSURFACE        = 0x80;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShadingFlags: u8 {
        const RECEIVE_SHADOWS = 1;
        const SELF_SHADOWS    = 2;
        const OPAQUE          = 4;
        const MATTE           = 8;
    }
}

impl ShadingFlags {
    pub const DEFAULT: ShadingFlags = ShadingFlags::RECEIVE_SHADOWS
        .union(ShadingFlags::SELF_SHADOWS)
        .union(ShadingFlags::OPAQUE);
}

/// Trace-set value written when a location belongs to no set. An empty
/// array would otherwise place it in every set.
pub const NO_TRACE_SETS: &str = "__none__";

// ─── Decoding helpers ────────────────────────────────────────────────────────

fn mismatch(name: &str, expected: &str, got: &AttributeValue) {
    warn!(
        "Expected {expected} but got {} for attribute \"{name}\"",
        got.type_name()
    );
}

fn decode<'a, T>(
    name: &str,
    value: &'a AttributeValue,
    expected: &str,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> Option<T> {
    let decoded = value.data().and_then(extract);
    if decoded.is_none() {
        mismatch(name, expected, value);
    }
    decoded
}

fn decode_bool(name: &str, value: &AttributeValue) -> Option<bool> {
    decode(name, value, "BoolData", Value::as_bool)
}

fn decode_int(name: &str, value: &AttributeValue) -> Option<i32> {
    decode(name, value, "IntData", Value::as_int)
}

fn decode_float(name: &str, value: &AttributeValue) -> Option<f32> {
    decode(name, value, "FloatData", Value::as_float)
}

fn decode_string(name: &str, value: &AttributeValue) -> Option<String> {
    decode(name, value, "StringData", Value::as_str).map(str::to_string)
}

fn decode_strings(name: &str, value: &AttributeValue) -> Option<Arc<[String]>> {
    decode(name, value, "StringVectorData", Value::as_string_vec).map(Arc::from)
}

/// Trace sets arrive as a comma separated string or a string vector.
fn decode_sets(name: &str, value: &AttributeValue) -> Option<Vec<String>> {
    match value.data() {
        Some(Value::StringVec(v)) => Some(v.clone()),
        Some(Value::String(s)) => Some(
            s.split([',', ' '])
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => {
            mismatch(name, "StringVectorData", value);
            None
        }
    }
}

fn decode_shader<'a>(name: &str, value: &'a AttributeValue) -> Option<&'a Arc<ShaderNetwork>> {
    let shader = value.shader();
    if shader.is_none() {
        mismatch(name, "ShaderNetwork", value);
    }
    shader
}

// ─── AttributeBundle ─────────────────────────────────────────────────────────

pub struct AttributeBundle {
    visibility: RayTypes,
    sidedness: RayTypes,
    shading: ShadingFlags,

    surface: Option<CompiledShader>,
    filter_map: Option<CompiledShader>,
    uv_remap: Option<CompiledShader>,
    light_shader: Option<Arc<ShaderNetwork>>,
    light_filter_shader: Option<Arc<ShaderNetwork>>,
    assigned_light_filters: Vec<CompiledShader>,

    trace_sets: Option<Vec<String>>,
    transform_type: Option<String>,
    step_size: f32,
    step_scale: f32,
    volume_padding: f32,

    poly_mesh: PolyMeshSettings,
    displacement: DisplacementSettings,
    curves: CurvesSettings,
    volume: VolumeSettings,

    linked_lights: Option<Arc<[String]>>,
    shadow_group: Option<Arc<[String]>>,
    filtered_lights: Option<Arc<[String]>>,
    sss_set_name: Option<String>,

    user: BTreeMap<String, Value>,

    light_lists: Arc<LightListCache>,
}

impl AttributeBundle {
    /// Decodes `attributes` in a single pass. Shader networks are compiled
    /// through `shaders`; unrecognised names are ignored.
    #[must_use]
    pub fn new(attributes: &AttributeMap, shaders: &ShaderCache, light_lists: Arc<LightListCache>) -> Self {
        let mut bundle = Self {
            visibility: RayTypes::all(),
            sidedness: RayTypes::all(),
            shading: ShadingFlags::DEFAULT,
            surface: None,
            filter_map: None,
            uv_remap: None,
            light_shader: None,
            light_filter_shader: None,
            assigned_light_filters: Vec::new(),
            trace_sets: None,
            transform_type: None,
            step_size: 0.0,
            step_scale: 1.0,
            volume_padding: 0.0,
            poly_mesh: PolyMeshSettings::default(),
            displacement: DisplacementSettings::default(),
            curves: CurvesSettings::default(),
            volume: VolumeSettings::default(),
            linked_lights: None,
            shadow_group: None,
            filtered_lights: None,
            sss_set_name: None,
            user: BTreeMap::new(),
            light_lists,
        };

        let mut surface: Option<(usize, &Arc<ShaderNetwork>)> = None;
        let mut light: Option<(usize, &Arc<ShaderNetwork>)> = None;

        for (name, value) in attributes {
            let Some(slot) = names::classify(name) else {
                continue;
            };
            match slot {
                Slot::Visibility(ray) => {
                    if let Some(visible) = decode_bool(name, value) {
                        bundle.visibility.set(ray, visible);
                    }
                }
                Slot::DoubleSided => {
                    if let Some(double_sided) = decode_bool(name, value) {
                        bundle.sidedness = if double_sided {
                            RayTypes::all()
                        } else {
                            RayTypes::empty()
                        };
                    }
                }
                Slot::Shading(flag) => {
                    if let Some(on) = decode_bool(name, value) {
                        bundle.shading.set(flag, on);
                    }
                }
                Slot::Surface(priority) => {
                    if let Some(network) = decode_shader(name, value)
                        && surface.is_none_or(|(p, _)| priority < p)
                    {
                        surface = Some((priority, network));
                    }
                }
                Slot::Light(priority) => {
                    if let Some(network) = decode_shader(name, value)
                        && light.is_none_or(|(p, _)| priority < p)
                    {
                        light = Some((priority, network));
                    }
                }
                Slot::LightFilter => {
                    bundle.light_filter_shader = decode_shader(name, value).cloned();
                }
                Slot::AssignedLightFilter => {
                    if let Some(network) = decode_shader(name, value) {
                        bundle.assigned_light_filters.push(shaders.get(network));
                    }
                }
                Slot::FilterMap => {
                    bundle.filter_map = decode_shader(name, value).map(|n| shaders.get(n));
                }
                Slot::UvRemap => {
                    bundle.uv_remap = decode_shader(name, value).map(|n| shaders.get(n));
                }
                Slot::TraceSets => bundle.trace_sets = decode_sets(name, value),
                Slot::TransformType => bundle.transform_type = decode_string(name, value),
                Slot::StepSize => {
                    bundle.step_size = decode_float(name, value).unwrap_or(bundle.step_size);
                }
                Slot::StepScale => {
                    bundle.step_scale = decode_float(name, value).unwrap_or(bundle.step_scale);
                }
                Slot::VolumePadding => {
                    bundle.volume_padding =
                        decode_float(name, value).unwrap_or(bundle.volume_padding);
                }
                Slot::Mesh(field) => bundle.decode_mesh(field, name, value),
                Slot::Displacement(field) => bundle.decode_displacement(field, name, value, shaders),
                Slot::Curves(field) => match field {
                    CurvesField::MinPixelWidth => {
                        if let Some(v) = decode_float(name, value) {
                            bundle.curves.min_pixel_width = v;
                        }
                    }
                    CurvesField::Mode => {
                        if let Some(mode) = decode_string(name, value) {
                            bundle.curves.thick = mode == "thick";
                        }
                    }
                },
                Slot::Volume(field) => bundle.decode_volume(field, name, value),
                Slot::LinkedLights => bundle.linked_lights = decode_strings(name, value),
                Slot::ShadowGroup => bundle.shadow_group = decode_strings(name, value),
                Slot::FilteredLights => bundle.filtered_lights = decode_strings(name, value),
                Slot::SssSetName => bundle.sss_set_name = decode_string(name, value),
                Slot::User => {
                    if let Some(data) = value.data() {
                        bundle.user.insert(name.clone(), data.clone());
                    }
                }
            }
        }

        bundle.surface = surface.map(|(_, network)| shaders.get(network));
        bundle.light_shader = light.map(|(_, network)| network.clone());
        bundle
    }

    fn decode_mesh(&mut self, field: MeshField, name: &str, value: &AttributeValue) {
        let mesh = &mut self.poly_mesh;
        match field {
            MeshField::Iterations => {
                if let Some(v) = decode_int(name, value) {
                    mesh.subdiv_iterations = v;
                }
            }
            MeshField::AdaptiveError => {
                if let Some(v) = decode_float(name, value) {
                    mesh.subdiv_adaptive_error = v;
                }
            }
            MeshField::AdaptiveMetric => {
                if let Some(v) = decode_string(name, value) {
                    mesh.subdiv_adaptive_metric = v;
                }
            }
            MeshField::AdaptiveSpace => {
                if let Some(v) = decode_string(name, value) {
                    mesh.subdiv_adaptive_space = v;
                }
            }
            MeshField::UvSmoothing => {
                if let Some(v) = decode_string(name, value) {
                    mesh.subdiv_uv_smoothing = v;
                }
            }
            MeshField::SmoothDerivs => {
                if let Some(v) = decode_bool(name, value) {
                    mesh.subdiv_smooth_derivs = v;
                }
            }
            MeshField::SubdividePolygons => {
                if let Some(v) = decode_bool(name, value) {
                    mesh.subdivide_polygons = v;
                }
            }
        }
    }

    fn decode_displacement(
        &mut self,
        field: DisplacementField,
        name: &str,
        value: &AttributeValue,
        shaders: &ShaderCache,
    ) {
        let displacement = &mut self.displacement;
        match field {
            DisplacementField::Map => {
                if let Some(network) = decode_shader(name, value) {
                    displacement.map_hash = Some(ContentHash::of(network.as_ref()));
                    displacement.map = Some(shaders.get(network));
                }
            }
            DisplacementField::Height => {
                if let Some(v) = decode_float(name, value) {
                    displacement.height = v;
                }
            }
            DisplacementField::Padding => {
                if let Some(v) = decode_float(name, value) {
                    displacement.padding = v;
                }
            }
            DisplacementField::ZeroValue => {
                if let Some(v) = decode_float(name, value) {
                    displacement.zero_value = v;
                }
            }
            DisplacementField::Autobump => {
                if let Some(v) = decode_bool(name, value) {
                    displacement.autobump = v;
                }
            }
        }
    }

    fn decode_volume(&mut self, field: VolumeField, name: &str, value: &AttributeValue) {
        let volume = &mut self.volume;
        match field {
            VolumeField::Grids => volume.grids = decode_strings(name, value),
            VolumeField::VelocityGrids => volume.velocity_grids = decode_strings(name, value),
            VolumeField::VelocityScale => volume.velocity_scale = decode_float(name, value),
            VolumeField::VelocityFps => volume.velocity_fps = decode_float(name, value),
            VolumeField::VelocityOutlierThreshold => {
                volume.velocity_outlier_threshold = decode_float(name, value);
            }
            VolumeField::StepSize => volume.step_size = decode_float(name, value),
            VolumeField::StepScale => volume.step_scale = decode_float(name, value),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn visibility(&self) -> RayTypes {
        self.visibility
    }

    #[inline]
    #[must_use]
    pub fn shading_flags(&self) -> ShadingFlags {
        self.shading
    }

    #[must_use]
    pub fn surface_shader(&self) -> Option<&CompiledShader> {
        self.surface.as_ref()
    }

    #[must_use]
    pub fn light_shader(&self) -> Option<&Arc<ShaderNetwork>> {
        self.light_shader.as_ref()
    }

    #[must_use]
    pub fn light_filter_shader(&self) -> Option<&Arc<ShaderNetwork>> {
        self.light_filter_shader.as_ref()
    }

    /// Filters assigned directly to a light through `ai:lightFilter:<name>`,
    /// in name order.
    #[must_use]
    pub fn assigned_light_filters(&self) -> &[CompiledShader] {
        &self.assigned_light_filters
    }

    #[must_use]
    pub fn filtered_lights(&self) -> Option<&Arc<[String]>> {
        self.filtered_lights.as_ref()
    }

    #[must_use]
    pub fn poly_mesh(&self) -> &PolyMeshSettings {
        &self.poly_mesh
    }

    // ─── Geometry attributes ─────────────────────────────────────────────────

    /// Appends the geometry attributes relevant to `object` to `h`.
    pub fn hash_geometry(&self, object: &SceneObject, h: &mut ContentHasher) {
        self.hash_geometry_class(GeometryClass::of_object(object), h);
    }

    fn hash_geometry_class(&self, class: GeometryClass, h: &mut ContentHasher) {
        match class {
            GeometryClass::Mesh { linear } => {
                self.poly_mesh.hash(linear, h);
                self.displacement.hash(h);
                h.write_f32s(&[self.step_size, self.step_scale, self.volume_padding]);
            }
            GeometryClass::Curves => self.curves.hash(h),
            GeometryClass::Sphere => {
                h.write_f32s(&[self.step_size, self.step_scale, self.volume_padding]);
            }
            GeometryClass::VolumeProcedural => {
                h.write_f32s(&[self.step_size, self.step_scale, self.volume_padding]);
                self.volume.hash(h);
            }
            GeometryClass::Vdb => {
                h.write_f32(self.volume_padding);
                self.volume.hash(h);
            }
            GeometryClass::Other => {}
        }
    }

    fn geometry_hash(&self, class: GeometryClass) -> ContentHash {
        let mut h = ContentHasher::new();
        self.hash_geometry_class(class, &mut h);
        h.finish()
    }

    /// Whether `object` may share a compiled master with other locations
    /// under these attributes.
    #[must_use]
    pub fn can_instance_geometry(&self, object: &SceneObject) -> bool {
        if !object.is_visible_renderable() {
            return false;
        }
        match object {
            SceneObject::Mesh(mesh) => {
                // Adaptive subdivision in raster space depends on where the
                // instance is seen from.
                mesh.is_linear()
                    || self.poly_mesh.subdiv_adaptive_error == 0.0
                    || self.poly_mesh.subdiv_adaptive_space == "object"
            }
            SceneObject::ExternalProcedural(procedural) => !procedural.is_scene_archive(),
            _ => true,
        }
    }

    /// Bakes the geometry attributes into a freshly converted node.
    pub fn apply_geometry(&self, object: &SceneObject, universe: &Universe, node: NodeId) {
        match object {
            SceneObject::Mesh(mesh) => {
                self.poly_mesh.apply(mesh.is_linear(), universe, node);
                self.displacement.apply(universe, node);
            }
            SceneObject::Curves(_) => self.curves.apply(universe, node),
            SceneObject::Vdb(_) => self.volume.apply(universe, node),
            SceneObject::ExternalProcedural(procedural) if procedural.is_volume() => {
                self.volume.apply(universe, node);
            }
            _ => {}
        }

        // Only override step size when the converter hasn't already chosen
        // one from the object itself.
        let step_size = self.step_size * self.step_scale;
        if step_size != 0.0
            && universe.has_parameter(node, "step_size")
            && universe.get_float(node, "step_size") == 0.0
        {
            universe.set(node, "step_size", step_size);
        }
        if self.volume_padding != 0.0 && universe.has_parameter(node, "volume_padding") {
            universe.set(node, "volume_padding", self.volume_padding);
        }
    }

    // ─── Instance attributes ─────────────────────────────────────────────────

    /// Applies the instance attributes to `node`.
    ///
    /// With `previous` set, this is an edit of an existing location: if the
    /// geometry attributes baked into the node's master differ between the
    /// two bundles the edit is rejected and nothing is changed.
    #[must_use]
    pub fn apply(
        &self,
        universe: &Universe,
        node: NodeId,
        previous: Option<&AttributeBundle>,
        link_lights: bool,
    ) -> bool {
        if let Some(previous) = previous {
            let class = GeometryClass::of_node(universe, node);
            if previous.geometry_hash(class) != self.geometry_hash(class) {
                return false;
            }
        }

        for name in universe.param_names(node) {
            if name.starts_with(names::USER_PREFIX) && !self.user.contains_key(&name) {
                universe.reset(node, &name);
            }
        }
        for (name, value) in &self.user {
            universe.set(node, name, ParamValue::from(value));
        }

        match universe.kind(node) {
            Some(NodeKind::Shape) => self.apply_shape(universe, node, link_lights),
            Some(NodeKind::Camera) => self.apply_camera(universe, node),
            _ => {}
        }
        true
    }

    fn apply_shape(&self, universe: &Universe, node: NodeId, link_lights: bool) {
        universe.set(node, "visibility", ParamValue::Byte(self.visibility.bits()));
        universe.set(node, "sidedness", ParamValue::Byte(self.sidedness.bits()));

        match &self.transform_type {
            Some(t) => universe.set(node, "transform_type", t.as_str()),
            None => universe.reset(node, "transform_type"),
        }

        universe.set(node, "receive_shadows", self.shading.contains(ShadingFlags::RECEIVE_SHADOWS));
        universe.set(node, "self_shadows", self.shading.contains(ShadingFlags::SELF_SHADOWS));
        universe.set(node, "opaque", self.shading.contains(ShadingFlags::OPAQUE));
        universe.set(node, "matte", self.shading.contains(ShadingFlags::MATTE));

        match self.surface.as_ref().and_then(|s| s.root()) {
            Some(root) => universe.set(node, "shader", root),
            None => universe.reset(node, "shader"),
        }

        let trace_sets = match &self.trace_sets {
            Some(sets) if !sets.is_empty() => ParamValue::strings(sets),
            _ => ParamValue::strings(&[NO_TRACE_SETS]),
        };
        universe.set(node, "trace_sets", trace_sets);

        match &self.sss_set_name {
            Some(set) => universe.set(node, "sss_setname", set.as_str()),
            None => universe.reset(node, "sss_setname"),
        }

        let groups = [
            ("light_group", "use_light_group", &self.linked_lights),
            ("shadow_group", "use_shadow_group", &self.shadow_group),
        ];
        for (group, use_group, lights) in groups {
            match lights.as_ref().filter(|_| link_lights) {
                Some(lights) => {
                    let refs = self.light_lists.get(lights);
                    universe.set(node, group, ParamValue::nodes(refs.iter().copied()));
                    universe.set(node, use_group, true);
                }
                None => {
                    universe.reset(node, group);
                    universe.reset(node, use_group);
                }
            }
        }
    }

    fn apply_camera(&self, universe: &Universe, node: NodeId) {
        for (parameter, shader) in [("filtermap", &self.filter_map), ("uv_remap", &self.uv_remap)] {
            if !universe.has_parameter(node, parameter) {
                continue;
            }
            match shader.as_ref().and_then(|s| s.root()) {
                Some(root) => universe.set(node, parameter, root),
                None => universe.reset(node, parameter),
            }
        }
    }
}

impl AttributesInterface for AttributeBundle {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
