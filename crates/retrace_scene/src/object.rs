//! Scene Objects
//!
//! The geometry, camera and procedural payloads that can be attached to a
//! scene location. Every object hashes its full content; the hash is what
//! decides whether two locations can share one compiled master.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use retrace_core::{ContentHasher, HashContent, Value};

use crate::camera::Camera;
use crate::interface::SceneRenderer;

pub type PrimitiveVariables = BTreeMap<String, Value>;

fn hash_primitive_variables(variables: &PrimitiveVariables, h: &mut ContentHasher) {
    h.write_u64(variables.len() as u64);
    for (name, value) in variables {
        h.write_str(name);
        value.hash_content(h);
    }
}

// ─── Mesh ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshPrimitive {
    pub vertices_per_face: Vec<i32>,
    pub vertex_ids: Vec<i32>,
    /// `"linear"` for polygons, anything else for subdivision surfaces.
    pub interpolation: String,
    pub variables: PrimitiveVariables,
}

impl MeshPrimitive {
    pub const LINEAR: &'static str = "linear";
    pub const CATMULL_CLARK: &'static str = "catmullClark";

    #[must_use]
    pub fn new(vertices_per_face: Vec<i32>, vertex_ids: Vec<i32>, interpolation: &str) -> Self {
        Self {
            vertices_per_face,
            vertex_ids,
            interpolation: interpolation.to_string(),
            variables: PrimitiveVariables::new(),
        }
    }

    /// A single quad, handy for lights and cameras that need a mesh.
    #[must_use]
    pub fn plane() -> Self {
        Self::new(vec![4], vec![0, 1, 2, 3], Self::LINEAR)
    }

    #[must_use]
    pub fn is_linear(&self) -> bool {
        self.interpolation == Self::LINEAR
    }
}

// ─── Curves ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurvesPrimitive {
    pub vertices_per_curve: Vec<i32>,
    pub basis: String,
    pub periodic: bool,
    pub variables: PrimitiveVariables,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointsPrimitive {
    pub count: usize,
    pub variables: PrimitiveVariables,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpherePrimitive {
    pub radius: f32,
    pub z_min: f32,
    pub z_max: f32,
    pub theta_max: f32,
}

impl Default for SpherePrimitive {
    fn default() -> Self {
        Self {
            radius: 1.0,
            z_min: -1.0,
            z_max: 1.0,
            theta_max: 360.0,
        }
    }
}

/// A volume read from an OpenVDB file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VdbObject {
    pub file_name: String,
    pub grids: Vec<String>,
}

/// A procedural implemented by a native plugin and referenced by file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalProcedural {
    pub file_name: String,
    pub parameters: BTreeMap<String, Value>,
}

impl ExternalProcedural {
    /// The file name native volume procedurals are registered under.
    pub const VOLUME: &'static str = "volume";

    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_volume(&self) -> bool {
        self.file_name == Self::VOLUME
    }

    /// Archives are expanded by the native loader and cannot be instanced.
    #[must_use]
    pub fn is_scene_archive(&self) -> bool {
        self.file_name.ends_with(".ass") || self.file_name.ends_with(".ass.gz")
    }
}

// ─── Procedurals ─────────────────────────────────────────────────────────────

/// A procedural expanded by retrace itself: it describes its contents by
/// issuing edits against a sub-renderer.
pub trait Procedural: Send + Sync {
    fn render(&self, renderer: &dyn SceneRenderer);

    /// Content hash of everything that influences `render`.
    fn hash_content(&self, hasher: &mut ContentHasher);
}

// ─── SceneObject ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum SceneObject {
    /// No geometry. Lights and light filters are usually attached to this.
    Null,
    Mesh(MeshPrimitive),
    Curves(CurvesPrimitive),
    Points(PointsPrimitive),
    Sphere(SpherePrimitive),
    Vdb(VdbObject),
    ExternalProcedural(ExternalProcedural),
    Procedural(Arc<dyn Procedural>),
    Camera(Camera),
}

impl SceneObject {
    /// Whether the object produces visible geometry. Only these objects are
    /// candidates for instancing.
    #[must_use]
    pub fn is_visible_renderable(&self) -> bool {
        !matches!(self, SceneObject::Null | SceneObject::Camera(_))
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SceneObject::Null => "NullObject",
            SceneObject::Mesh(_) => "MeshPrimitive",
            SceneObject::Curves(_) => "CurvesPrimitive",
            SceneObject::Points(_) => "PointsPrimitive",
            SceneObject::Sphere(_) => "SpherePrimitive",
            SceneObject::Vdb(_) => "VDBObject",
            SceneObject::ExternalProcedural(_) => "ExternalProcedural",
            SceneObject::Procedural(_) => "Procedural",
            SceneObject::Camera(_) => "Camera",
        }
    }
}

impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl HashContent for SceneObject {
    fn hash_content(&self, h: &mut ContentHasher) {
        h.write_str(self.type_name());
        match self {
            SceneObject::Null => {}
            SceneObject::Mesh(mesh) => {
                h.write_u64(mesh.vertices_per_face.len() as u64);
                mesh.vertices_per_face.iter().for_each(|v| h.write_i32(*v));
                h.write_u64(mesh.vertex_ids.len() as u64);
                mesh.vertex_ids.iter().for_each(|v| h.write_i32(*v));
                h.write_str(&mesh.interpolation);
                hash_primitive_variables(&mesh.variables, h);
            }
            SceneObject::Curves(curves) => {
                h.write_u64(curves.vertices_per_curve.len() as u64);
                curves.vertices_per_curve.iter().for_each(|v| h.write_i32(*v));
                h.write_str(&curves.basis);
                h.write_bool(curves.periodic);
                hash_primitive_variables(&curves.variables, h);
            }
            SceneObject::Points(points) => {
                h.write_u64(points.count as u64);
                hash_primitive_variables(&points.variables, h);
            }
            SceneObject::Sphere(sphere) => {
                h.write_f32s(&[sphere.radius, sphere.z_min, sphere.z_max, sphere.theta_max]);
            }
            SceneObject::Vdb(vdb) => {
                h.write_str(&vdb.file_name);
                vdb.grids.hash_content(h);
            }
            SceneObject::ExternalProcedural(procedural) => {
                h.write_str(&procedural.file_name);
                hash_primitive_variables(&procedural.parameters, h);
            }
            SceneObject::Procedural(procedural) => procedural.hash_content(h),
            SceneObject::Camera(camera) => camera.hash_content(h),
        }
    }
}
