//! Conversion Seams
//!
//! Translating geometry, cameras and shader networks into native nodes is
//! delegated to external converters. The adapter only decides *when* to
//! convert and how to share and edit the results.

use retrace_core::ShaderNetwork;
use retrace_native::{NodeId, Universe};
use retrace_scene::SceneObject;

/// Converts scene objects into native nodes.
pub trait ObjectConverter: Send + Sync {
    /// Creates a node named `name` under `parent`. Returns `None` when the
    /// object type is not supported or the conversion fails.
    fn convert(
        &self,
        universe: &Universe,
        object: &SceneObject,
        name: &str,
        parent: Option<NodeId>,
    ) -> Option<NodeId>;

    /// Deformation-blurred variant. Samples are uniformly spaced between
    /// `motion_start` and `motion_end`.
    fn convert_samples(
        &self,
        universe: &Universe,
        samples: &[&SceneObject],
        motion_start: f32,
        motion_end: f32,
        name: &str,
        parent: Option<NodeId>,
    ) -> Option<NodeId>;
}

/// Compiles shader networks into native shader nodes.
pub trait ShaderConverter: Send + Sync {
    /// Returns every node created, prefixing their names with `name_prefix`.
    /// The last node is the network's output. An empty list means failure.
    fn convert(
        &self,
        universe: &Universe,
        network: &ShaderNetwork,
        name_prefix: &str,
        parent: Option<NodeId>,
    ) -> Vec<NodeId>;
}
