//! Node Entries
//!
//! A [`NodeEntry`] describes a node type: its name, its broad kind, and the
//! parameters it declares. Parameters outside the declared set may still be
//! stored on a node (user data), but `has_parameter` only reports declared
//! ones, which is what the adapter layer uses to decide whether a setting
//! applies to a node.

use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Options,
    Camera,
    Light,
    Shape,
    Shader,
    Driver,
    Filter,
}

#[derive(Debug, Clone)]
pub struct NodeEntry {
    name: String,
    kind: NodeKind,
    parameters: FxHashSet<String>,
}

impl NodeEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind, parameters: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: parameters.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains(name)
    }

    /// Declared parameters, unordered.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(String::as_str)
    }
}

// ─── Built-in Types ──────────────────────────────────────────────────────────

const SHAPE: &[&str] = &[
    "matrix",
    "motion_start",
    "motion_end",
    "visibility",
    "sidedness",
    "shader",
    "opaque",
    "matte",
    "receive_shadows",
    "self_shadows",
    "trace_sets",
    "light_group",
    "use_light_group",
    "shadow_group",
    "use_shadow_group",
    "transform_type",
    "sss_setname",
    "id",
];

const VOLUMETRIC: &[&str] = &["step_size", "volume_padding"];

const POLYMESH: &[&str] = &[
    "nsides",
    "vidxlist",
    "vlist",
    "subdiv_type",
    "subdiv_iterations",
    "subdiv_adaptive_error",
    "subdiv_adaptive_metric",
    "subdiv_adaptive_space",
    "subdiv_uv_smoothing",
    "subdiv_smooth_derivs",
    "disp_map",
    "disp_height",
    "disp_padding",
    "disp_zero_value",
    "disp_autobump",
];

const CURVES: &[&str] = &["num_points", "points", "radius", "basis", "mode", "min_pixel_width"];

const POINTS: &[&str] = &["points", "radius", "mode", "min_pixel_width"];

const SPHERE: &[&str] = &["center", "radius"];

const BOX: &[&str] = &["min", "max"];

const GINSTANCE: &[&str] = &["node", "inherit_xform"];

const PROCEDURAL: &[&str] = &["nodes", "filename", "data"];

const VOLUME: &[&str] = &[
    "filename",
    "grids",
    "velocity_grids",
    "velocity_scale",
    "velocity_fps",
    "velocity_outlier_threshold",
    "step_scale",
];

const CAMERA: &[&str] = &[
    "matrix",
    "motion_start",
    "motion_end",
    "near_clip",
    "far_clip",
    "shutter_start",
    "shutter_end",
    "screen_window_min",
    "screen_window_max",
    "filtermap",
    "uv_remap",
];

const LIGHT: &[&str] = &[
    "matrix",
    "motion_start",
    "motion_end",
    "color",
    "intensity",
    "exposure",
    "filters",
];

const LIGHT_FILTER: &[&str] = &["geometry_matrix", "geometry_type", "density", "shader"];

const OPTIONS: &[&str] = &[
    "AA_samples",
    "AA_seed",
    "camera",
    "outputs",
    "light_path_expressions",
    "xres",
    "yres",
    "pixel_aspect_ratio",
    "region_min_x",
    "region_min_y",
    "region_max_x",
    "region_max_y",
    "plugin_searchpath",
    "procedural_searchpath",
    "texture_searchpath",
    "atmosphere",
    "background",
    "aov_shaders",
    "threads",
    "GI_diffuse_depth",
    "GI_specular_depth",
    "GI_transmission_depth",
];

fn joined(parts: &[&[&'static str]]) -> Vec<&'static str> {
    parts.iter().flat_map(|p| p.iter().copied()).collect()
}

/// Node types known to every universe.
pub(crate) fn builtin_entries() -> Vec<NodeEntry> {
    let shape = |name: &str, extra: &[&[&'static str]]| {
        let mut parts: Vec<&[&'static str]> = vec![SHAPE];
        parts.extend_from_slice(extra);
        NodeEntry::new(name, NodeKind::Shape, &joined(&parts))
    };
    let light = |name: &str, extra: &[&'static str]| {
        NodeEntry::new(name, NodeKind::Light, &joined(&[LIGHT, extra]))
    };
    let camera = |name: &str, extra: &[&'static str]| {
        NodeEntry::new(name, NodeKind::Camera, &joined(&[CAMERA, extra]))
    };

    let mut entries = vec![
        NodeEntry::new("options", NodeKind::Options, OPTIONS),
        shape("polymesh", &[POLYMESH, VOLUMETRIC]),
        shape("curves", &[CURVES]),
        shape("points", &[POINTS, VOLUMETRIC]),
        shape("sphere", &[SPHERE, VOLUMETRIC]),
        shape("box", &[BOX, VOLUMETRIC]),
        shape("ginstance", &[GINSTANCE]),
        shape("procedural", &[PROCEDURAL]),
        shape("volume", &[VOLUME, VOLUMETRIC]),
        camera("persp_camera", &["fov"]),
        camera("ortho_camera", &[]),
        camera("uv_camera", &["mesh", "uv_set"]),
        light("point_light", &["radius"]),
        light("distant_light", &["angle"]),
        light("spot_light", &["radius", "cone_angle", "penumbra_angle"]),
        light("quad_light", &["vertices"]),
        light("skydome_light", &["resolution"]),
        light("mesh_light", &["mesh"]),
        light("photometric_light", &["filename"]),
    ];

    for filter in ["light_blocker", "gobo", "barndoor", "light_decay"] {
        entries.push(NodeEntry::new(filter, NodeKind::Shader, LIGHT_FILTER));
    }
    for shader in [
        "standard_surface",
        "standard_volume",
        "flat",
        "lambert",
        "utility",
        "image",
        "noise",
        "atmosphere_volume",
        "physical_sky",
        "aov_write_rgb",
        "aov_write_float",
    ] {
        entries.push(NodeEntry::new(shader, NodeKind::Shader, &[]));
    }
    for driver in ["driver_exr", "driver_deepexr"] {
        entries.push(NodeEntry::new(
            driver,
            NodeKind::Driver,
            &["filename", "compression", "half_precision", "custom_attributes"],
        ));
    }
    for driver in ["driver_tiff", "driver_png", "driver_jpeg"] {
        entries.push(NodeEntry::new(driver, NodeKind::Driver, &["filename"]));
    }
    for filter in [
        "gaussian_filter",
        "box_filter",
        "blackman_harris_filter",
        "triangle_filter",
        "closest_filter",
    ] {
        entries.push(NodeEntry::new(filter, NodeKind::Filter, &["width"]));
    }
    entries
}
