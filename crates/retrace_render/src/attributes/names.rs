//! Attribute Name Table
//!
//! Every attribute name the bundle understands, and the slot it decodes
//! into. Defaults are owned by the sub-bundles in [`super::geometry`] and by
//! [`super::AttributeBundle`] itself.
//!
//! | Name                                   | Slot                         |
//! |----------------------------------------|------------------------------|
//! | `ai:visibility:<ray>`                  | visibility bit               |
//! | `doubleSided`                          | sidedness                    |
//! | `ai:receive_shadows` … `ai:matte`      | shading flag                 |
//! | `ai:surface` `osl:surface` `osl:shader` `surface` | surface (in priority order) |
//! | `ai:light` `light`                     | light shader (in priority order) |
//! | `ai:lightFilter:filter`                | light filter shader          |
//! | `ai:lightFilter:<name>`                | filter assigned to the light |
//! | `ai:polymesh:*` `ai:disp_*`            | mesh settings                |
//! | `ai:curves:*`                          | curves settings              |
//! | `ai:volume:*` `ai:shape:*`             | volume settings              |
//! | `user:<name>`                          | user parameter               |

use super::{RayTypes, ShadingFlags};

pub const VISIBILITY_PREFIX: &str = "ai:visibility:";
pub const SHADOW_GROUP: &str = "ai:visibility:shadow_group";
pub const DOUBLE_SIDED: &str = "doubleSided";

pub const RECEIVE_SHADOWS: &str = "ai:receive_shadows";
pub const SELF_SHADOWS: &str = "ai:self_shadows";
pub const OPAQUE: &str = "ai:opaque";
pub const MATTE: &str = "ai:matte";

pub const SURFACE_SHADERS: [&str; 4] = ["ai:surface", "osl:surface", "osl:shader", "surface"];
pub const LIGHT_SHADERS: [&str; 2] = ["ai:light", "light"];
pub const LIGHT_FILTER_PREFIX: &str = "ai:lightFilter:";
pub const LIGHT_FILTER_SHADER: &str = "ai:lightFilter:filter";
pub const FILTER_MAP: &str = "ai:filtermap";
pub const UV_REMAP: &str = "ai:uv_remap";

pub const SETS: &str = "sets";
pub const TRANSFORM_TYPE: &str = "ai:transform_type";
pub const STEP_SIZE: &str = "ai:shape:step_size";
pub const STEP_SCALE: &str = "ai:shape:step_scale";
pub const VOLUME_PADDING: &str = "ai:shape:volume_padding";

pub const SUBDIV_ITERATIONS: &str = "ai:polymesh:subdiv_iterations";
pub const SUBDIV_ADAPTIVE_ERROR: &str = "ai:polymesh:subdiv_adaptive_error";
pub const SUBDIV_ADAPTIVE_METRIC: &str = "ai:polymesh:subdiv_adaptive_metric";
pub const SUBDIV_ADAPTIVE_SPACE: &str = "ai:polymesh:subdiv_adaptive_space";
pub const SUBDIV_UV_SMOOTHING: &str = "ai:polymesh:subdiv_uv_smoothing";
pub const SUBDIV_SMOOTH_DERIVS: &str = "ai:polymesh:subdiv_smooth_derivs";
pub const SUBDIVIDE_POLYGONS: &str = "ai:polymesh:subdivide_polygons";

pub const DISP_MAP: &str = "ai:disp_map";
pub const DISP_HEIGHT: &str = "ai:disp_height";
pub const DISP_PADDING: &str = "ai:disp_padding";
pub const DISP_ZERO_VALUE: &str = "ai:disp_zero_value";
pub const DISP_AUTOBUMP: &str = "ai:disp_autobump";

pub const CURVES_MIN_PIXEL_WIDTH: &str = "ai:curves:min_pixel_width";
pub const CURVES_MODE: &str = "ai:curves:mode";

pub const VOLUME_GRIDS: &str = "ai:volume:grids";
pub const VELOCITY_GRIDS: &str = "ai:volume:velocity_grids";
pub const VELOCITY_SCALE: &str = "ai:volume:velocity_scale";
pub const VELOCITY_FPS: &str = "ai:volume:velocity_fps";
pub const VELOCITY_OUTLIER_THRESHOLD: &str = "ai:volume:velocity_outlier_threshold";
pub const VOLUME_STEP_SIZE: &str = "ai:volume:step_size";
pub const VOLUME_STEP_SCALE: &str = "ai:volume:step_scale";

pub const LINKED_LIGHTS: &str = "linkedLights";
pub const FILTERED_LIGHTS: &str = "filteredLights";
pub const SSS_SET_NAME: &str = "ai:sss_setname";

pub const USER_PREFIX: &str = "user:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MeshField {
    Iterations,
    AdaptiveError,
    AdaptiveMetric,
    AdaptiveSpace,
    UvSmoothing,
    SmoothDerivs,
    SubdividePolygons,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisplacementField {
    Map,
    Height,
    Padding,
    ZeroValue,
    Autobump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CurvesField {
    MinPixelWidth,
    Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VolumeField {
    Grids,
    VelocityGrids,
    VelocityScale,
    VelocityFps,
    VelocityOutlierThreshold,
    StepSize,
    StepScale,
}

/// Where a decoded attribute goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Visibility(RayTypes),
    DoubleSided,
    Shading(ShadingFlags),
    /// Index into [`SURFACE_SHADERS`]; lower wins.
    Surface(usize),
    /// Index into [`LIGHT_SHADERS`]; lower wins.
    Light(usize),
    LightFilter,
    AssignedLightFilter,
    FilterMap,
    UvRemap,
    TraceSets,
    TransformType,
    StepSize,
    StepScale,
    VolumePadding,
    Mesh(MeshField),
    Displacement(DisplacementField),
    Curves(CurvesField),
    Volume(VolumeField),
    LinkedLights,
    ShadowGroup,
    FilteredLights,
    SssSetName,
    User,
}

fn visibility_ray(name: &str) -> Option<RayTypes> {
    let ray = match name {
        "camera" => RayTypes::CAMERA,
        "shadow" => RayTypes::SHADOW,
        "diffuse_reflect" => RayTypes::DIFFUSE_REFLECT,
        "specular_reflect" => RayTypes::SPECULAR_REFLECT,
        "diffuse_transmit" => RayTypes::DIFFUSE_TRANSMIT,
        "specular_transmit" => RayTypes::SPECULAR_TRANSMIT,
        "volume" => RayTypes::VOLUME,
        "subsurface" => RayTypes::SUBSURFACE,
        _ => return None,
    };
    Some(ray)
}

/// Looks up the slot for an attribute name. Unknown names return `None`
/// and are ignored.
pub(crate) fn classify(name: &str) -> Option<Slot> {
    let slot = match name {
        DOUBLE_SIDED => Slot::DoubleSided,
        RECEIVE_SHADOWS => Slot::Shading(ShadingFlags::RECEIVE_SHADOWS),
        SELF_SHADOWS => Slot::Shading(ShadingFlags::SELF_SHADOWS),
        OPAQUE => Slot::Shading(ShadingFlags::OPAQUE),
        MATTE => Slot::Shading(ShadingFlags::MATTE),
        LIGHT_FILTER_SHADER => Slot::LightFilter,
        FILTER_MAP => Slot::FilterMap,
        UV_REMAP => Slot::UvRemap,
        SETS => Slot::TraceSets,
        TRANSFORM_TYPE => Slot::TransformType,
        STEP_SIZE => Slot::StepSize,
        STEP_SCALE => Slot::StepScale,
        VOLUME_PADDING => Slot::VolumePadding,
        SUBDIV_ITERATIONS => Slot::Mesh(MeshField::Iterations),
        SUBDIV_ADAPTIVE_ERROR => Slot::Mesh(MeshField::AdaptiveError),
        SUBDIV_ADAPTIVE_METRIC => Slot::Mesh(MeshField::AdaptiveMetric),
        SUBDIV_ADAPTIVE_SPACE => Slot::Mesh(MeshField::AdaptiveSpace),
        SUBDIV_UV_SMOOTHING => Slot::Mesh(MeshField::UvSmoothing),
        SUBDIV_SMOOTH_DERIVS => Slot::Mesh(MeshField::SmoothDerivs),
        SUBDIVIDE_POLYGONS => Slot::Mesh(MeshField::SubdividePolygons),
        DISP_MAP => Slot::Displacement(DisplacementField::Map),
        DISP_HEIGHT => Slot::Displacement(DisplacementField::Height),
        DISP_PADDING => Slot::Displacement(DisplacementField::Padding),
        DISP_ZERO_VALUE => Slot::Displacement(DisplacementField::ZeroValue),
        DISP_AUTOBUMP => Slot::Displacement(DisplacementField::Autobump),
        CURVES_MIN_PIXEL_WIDTH => Slot::Curves(CurvesField::MinPixelWidth),
        CURVES_MODE => Slot::Curves(CurvesField::Mode),
        VOLUME_GRIDS => Slot::Volume(VolumeField::Grids),
        VELOCITY_GRIDS => Slot::Volume(VolumeField::VelocityGrids),
        VELOCITY_SCALE => Slot::Volume(VolumeField::VelocityScale),
        VELOCITY_FPS => Slot::Volume(VolumeField::VelocityFps),
        VELOCITY_OUTLIER_THRESHOLD => Slot::Volume(VolumeField::VelocityOutlierThreshold),
        VOLUME_STEP_SIZE => Slot::Volume(VolumeField::StepSize),
        VOLUME_STEP_SCALE => Slot::Volume(VolumeField::StepScale),
        LINKED_LIGHTS => Slot::LinkedLights,
        SHADOW_GROUP => Slot::ShadowGroup,
        FILTERED_LIGHTS => Slot::FilteredLights,
        SSS_SET_NAME => Slot::SssSetName,
        _ => {
            if let Some(i) = SURFACE_SHADERS.iter().position(|n| *n == name) {
                Slot::Surface(i)
            } else if let Some(i) = LIGHT_SHADERS.iter().position(|n| *n == name) {
                Slot::Light(i)
            } else if let Some(ray) = name.strip_prefix(VISIBILITY_PREFIX) {
                Slot::Visibility(visibility_ray(ray)?)
            } else if name.starts_with(LIGHT_FILTER_PREFIX) {
                Slot::AssignedLightFilter
            } else if name.starts_with(USER_PREFIX) {
                Slot::User
            } else {
                return None;
            }
        }
    };
    Some(slot)
}
