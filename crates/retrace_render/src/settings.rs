//! Renderer Settings
//!
//! Session configuration, fixed when the renderer is created.
//!
//! ```rust,ignore
//! use retrace_render::{RendererSettings, ProgressiveSettings};
//! use retrace_core::RenderType;
//!
//! // Interactive session that starts refining at 1/16th sampling.
//! let settings = RendererSettings {
//!     render_type: RenderType::Interactive,
//!     progressive: ProgressiveSettings { start_aa_samples: -4 },
//!     ..Default::default()
//! };
//! ```

use std::path::PathBuf;

use retrace_core::RenderType;
use retrace_native::NativeVersion;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProgressiveSettings
// ---------------------------------------------------------------------------

/// Controls the coarse-to-fine refinement of interactive renders.
///
/// Refinement steps through `AA_samples` values from
/// `min(start_aa_samples, final)` up to the final value. Negative values
/// render at reduced resolution (`-n` meaning one sample per `n + 1`-pixel
/// block), so the first images arrive quickly. Zero and every value above one
/// except the final value are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveSettings {
    pub start_aa_samples: i32,
}

impl Default for ProgressiveSettings {
    #[inline]
    fn default() -> Self {
        Self {
            start_aa_samples: -5,
        }
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Batch, interactive or scene-description export.
    pub render_type: RenderType,

    /// Target file for [`RenderType::SceneDescription`] sessions.
    pub file_name: PathBuf,

    pub progressive: ProgressiveSettings,

    /// Version reported by the native library. Some behaviours, such as
    /// instancing of procedurals, are gated on it.
    pub native_version: NativeVersion,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            render_type: RenderType::Batch,
            file_name: PathBuf::new(),
            progressive: ProgressiveSettings::default(),
            native_version: NativeVersion::default(),
        }
    }
}

impl RendererSettings {
    #[must_use]
    pub fn new(render_type: RenderType) -> Self {
        Self {
            render_type,
            ..Default::default()
        }
    }
}
