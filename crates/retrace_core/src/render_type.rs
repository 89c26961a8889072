//! Session Render Type
//!
//! The render type is fixed for the lifetime of a session and decides how
//! native nodes are released and how `render()` dispatches:
//!
//! | Type               | Node release       | `render()`                         |
//! |--------------------|--------------------|------------------------------------|
//! | `Batch`            | at session end     | one blocking pass per camera        |
//! | `Interactive`      | when last user drops | progressive background refinement |
//! | `SceneDescription` | at session end     | scene file export                   |

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderType {
    /// Render once, to completion, then exit.
    #[default]
    Batch,
    /// Edits arrive continuously while the image refines in the background.
    Interactive,
    /// Write the scene to a file instead of rendering it.
    SceneDescription,
}

impl RenderType {
    /// Whether edits may be resubmitted after the first render.
    #[inline]
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}
