//! Geometry sub-bundles: settings that are baked into compiled masters and
//! therefore participate in instance cache keys.

use std::sync::Arc;

use retrace_core::{ContentHash, ContentHasher, HashContent};
use retrace_native::{NodeId, ParamValue, Universe};
use retrace_scene::SceneObject;

use crate::shader::CompiledShader;

/// The class of a geometry, as far as attribute hashing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryClass {
    Mesh { linear: bool },
    Curves,
    Sphere,
    /// An external procedural of the native `volume` type.
    VolumeProcedural,
    Vdb,
    Other,
}

impl GeometryClass {
    #[must_use]
    pub fn of_object(object: &SceneObject) -> Self {
        match object {
            SceneObject::Mesh(mesh) => GeometryClass::Mesh {
                linear: mesh.is_linear(),
            },
            SceneObject::Curves(_) => GeometryClass::Curves,
            SceneObject::Sphere(_) => GeometryClass::Sphere,
            SceneObject::ExternalProcedural(p) if p.is_volume() => GeometryClass::VolumeProcedural,
            SceneObject::Vdb(_) => GeometryClass::Vdb,
            _ => GeometryClass::Other,
        }
    }

    /// Recovers the class from a compiled node, following instances to
    /// their master.
    #[must_use]
    pub fn of_node(universe: &Universe, node: NodeId) -> Self {
        let node = if universe.is(node, "ginstance") {
            match universe.get_node(node, "node") {
                Some(master) => master,
                None => return GeometryClass::Other,
            }
        } else {
            node
        };

        let Some(entry) = universe.node_entry(node) else {
            return GeometryClass::Other;
        };
        match entry.name() {
            "polymesh" => GeometryClass::Mesh {
                linear: universe.get_str(node, "subdiv_type") != "catclark",
            },
            "box" => GeometryClass::Mesh { linear: false },
            "curves" => GeometryClass::Curves,
            "volume" => GeometryClass::VolumeProcedural,
            "sphere" => GeometryClass::Sphere,
            _ => GeometryClass::Other,
        }
    }
}

// ─── Meshes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PolyMeshSettings {
    pub subdiv_iterations: i32,
    pub subdiv_adaptive_error: f32,
    pub subdiv_adaptive_metric: String,
    pub subdiv_adaptive_space: String,
    pub subdiv_uv_smoothing: String,
    pub subdiv_smooth_derivs: bool,
    pub subdivide_polygons: bool,
}

impl Default for PolyMeshSettings {
    fn default() -> Self {
        Self {
            subdiv_iterations: 1,
            subdiv_adaptive_error: 0.0,
            subdiv_adaptive_metric: "auto".to_string(),
            subdiv_adaptive_space: "raster".to_string(),
            subdiv_uv_smoothing: "pin_corners".to_string(),
            subdiv_smooth_derivs: false,
            subdivide_polygons: false,
        }
    }
}

impl PolyMeshSettings {
    fn subdivides(&self, linear: bool) -> bool {
        !linear || self.subdivide_polygons
    }

    pub fn hash(&self, linear: bool, h: &mut ContentHasher) {
        if !self.subdivides(linear) {
            return;
        }
        h.write_i32(self.subdiv_iterations);
        h.write_f32(self.subdiv_adaptive_error);
        h.write_str(&self.subdiv_adaptive_metric);
        h.write_str(&self.subdiv_adaptive_space);
        h.write_str(&self.subdiv_uv_smoothing);
        h.write_bool(self.subdiv_smooth_derivs);
        h.write_bool(self.subdivide_polygons);
    }

    pub fn apply(&self, linear: bool, universe: &Universe, node: NodeId) {
        if self.subdivides(linear) {
            universe.set(node, "subdiv_iterations", ParamValue::Byte(self.subdiv_iterations.clamp(0, 255) as u8));
            universe.set(node, "subdiv_adaptive_error", self.subdiv_adaptive_error);
            universe.set(node, "subdiv_adaptive_metric", self.subdiv_adaptive_metric.as_str());
            universe.set(node, "subdiv_adaptive_space", self.subdiv_adaptive_space.as_str());
            universe.set(node, "subdiv_uv_smoothing", self.subdiv_uv_smoothing.as_str());
            universe.set(node, "subdiv_smooth_derivs", self.subdiv_smooth_derivs);
            if linear {
                universe.set(node, "subdiv_type", "linear");
            }
        }
    }
}

#[derive(Clone)]
pub struct DisplacementSettings {
    pub map: Option<CompiledShader>,
    pub map_hash: Option<ContentHash>,
    pub height: f32,
    pub padding: f32,
    pub zero_value: f32,
    pub autobump: bool,
}

impl Default for DisplacementSettings {
    fn default() -> Self {
        Self {
            map: None,
            map_hash: None,
            height: 1.0,
            padding: 0.0,
            zero_value: 0.0,
            autobump: false,
        }
    }
}

impl DisplacementSettings {
    pub fn hash(&self, h: &mut ContentHasher) {
        h.write_hash(self.map_hash.unwrap_or_default());
        h.write_f32(self.height);
        h.write_f32(self.padding);
        h.write_f32(self.zero_value);
        h.write_bool(self.autobump);
    }

    pub fn apply(&self, universe: &Universe, node: NodeId) {
        match self.map.as_ref().and_then(|m| m.root()) {
            Some(root) => universe.set(node, "disp_map", root),
            None => universe.reset(node, "disp_map"),
        }
        universe.set(node, "disp_height", self.height);
        universe.set(node, "disp_padding", self.padding);
        universe.set(node, "disp_zero_value", self.zero_value);
        universe.set(node, "disp_autobump", self.autobump);
    }
}

// ─── Curves ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurvesSettings {
    pub min_pixel_width: f32,
    /// Render as round tubes rather than camera-facing ribbons.
    pub thick: bool,
}

impl CurvesSettings {
    pub fn hash(&self, h: &mut ContentHasher) {
        h.write_f32(self.min_pixel_width);
        h.write_bool(self.thick);
    }

    pub fn apply(&self, universe: &Universe, node: NodeId) {
        universe.set(node, "min_pixel_width", self.min_pixel_width);
        if self.thick {
            universe.set(node, "mode", "thick");
        }
    }
}

// ─── Volumes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeSettings {
    pub grids: Option<Arc<[String]>>,
    pub velocity_grids: Option<Arc<[String]>>,
    pub velocity_scale: Option<f32>,
    pub velocity_fps: Option<f32>,
    pub velocity_outlier_threshold: Option<f32>,
    pub step_size: Option<f32>,
    pub step_scale: Option<f32>,
}

impl VolumeSettings {
    pub fn hash(&self, h: &mut ContentHasher) {
        for list in [&self.grids, &self.velocity_grids] {
            match list {
                Some(names) => names.hash_content(h),
                None => h.write_u64(0),
            }
        }
        h.write_f32(self.velocity_scale.unwrap_or(1.0));
        h.write_f32(self.velocity_fps.unwrap_or(24.0));
        h.write_f32(self.velocity_outlier_threshold.unwrap_or(0.001));
        h.write_f32(self.step_size.unwrap_or(0.0));
        h.write_f32(self.step_scale.unwrap_or(1.0));
    }

    /// Motion range is borrowed from the render camera's shutter. This
    /// assumes one shutter for the whole scene.
    pub fn apply(&self, universe: &Universe, node: NodeId) {
        if let Some(grids) = &self.grids {
            universe.set(node, "grids", ParamValue::strings(&grids[..]));
        }
        if let Some(grids) = &self.velocity_grids {
            universe.set(node, "velocity_grids", ParamValue::strings(&grids[..]));
        }

        if self.velocity_scale.is_none_or(|scale| scale > 0.0)
            && let Some(camera) = universe.get_node(universe.options(), "camera")
        {
            universe.set(node, "motion_start", universe.get_float(camera, "shutter_start"));
            universe.set(node, "motion_end", universe.get_float(camera, "shutter_end"));
        }

        if let Some(scale) = self.velocity_scale {
            universe.set(node, "velocity_scale", scale);
        }
        if let Some(fps) = self.velocity_fps {
            universe.set(node, "velocity_fps", fps);
        }
        if let Some(threshold) = self.velocity_outlier_threshold {
            universe.set(node, "velocity_outlier_threshold", threshold);
        }

        if let Some(size) = self.step_size {
            universe.set(node, "step_size", size * self.step_scale.unwrap_or(1.0));
        } else if let Some(scale) = self.step_scale {
            universe.set(node, "step_scale", scale);
        }
    }
}
