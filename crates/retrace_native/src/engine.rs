//! Render Engine
//!
//! The tracing engine itself is an external collaborator. [`RenderEngine`]
//! is the seam: a blocking `render` call, a thread-safe `interrupt`, and a
//! scene-file writer.

use std::path::Path;

use retrace_core::{Result, RetraceError};

use crate::universe::Universe;

/// How the engine should run a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Render the camera view to the outputs.
    Camera,
    /// Render without outputs, only to warm caches.
    Free,
}

/// Status codes returned from a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Success,
    Abort,
    NoCamera,
    BadCamera,
    ValidationFailed,
    BadRenderRegion,
    Interrupted,
    NoOutputs,
    Error,
}

impl RenderStatus {
    /// Maps the status onto the error taxonomy.
    pub fn into_result(self) -> Result<()> {
        match self {
            RenderStatus::Success => Ok(()),
            RenderStatus::Abort => Err(RetraceError::RenderAborted),
            RenderStatus::NoCamera => Err(RetraceError::NoCamera),
            RenderStatus::BadCamera => Err(RetraceError::BadCamera),
            RenderStatus::ValidationFailed => Err(RetraceError::ValidationFailed),
            RenderStatus::BadRenderRegion => Err(RetraceError::InvalidRenderRegion),
            RenderStatus::Interrupted => Err(RetraceError::Interrupted),
            RenderStatus::NoOutputs => Err(RetraceError::NoOutputs),
            RenderStatus::Error => Err(RetraceError::Native),
        }
    }
}

pub trait RenderEngine: Send + Sync {
    /// Runs one pass and blocks until it finishes or is interrupted.
    fn render(&self, universe: &Universe, mode: RenderMode) -> RenderStatus;

    /// Asks an in-flight pass to stop. Callable from any thread.
    fn interrupt(&self);

    fn is_rendering(&self) -> bool;

    /// Writes the universe to a scene description file.
    fn write_scene(&self, universe: &Universe, path: &Path) -> Result<()>;
}
