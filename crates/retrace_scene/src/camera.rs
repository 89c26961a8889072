use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use retrace_core::{ContentHasher, HashContent, Value};

/// A camera description. The converter turns it into a native camera node;
/// the renderer additionally reads resolution, region and shutter from it
/// when it becomes the render camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// `"perspective"` or `"orthographic"`.
    pub projection: String,
    pub resolution: IVec2,
    pub pixel_aspect_ratio: f32,
    /// Pixel-space region to render, `[min, max)` with +Y up. `None` renders
    /// the full frame.
    pub render_region: Option<[IVec2; 2]>,
    /// Shutter open and close, in frames relative to the current frame.
    pub shutter: Vec2,
    pub parameters: BTreeMap<String, Value>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: "perspective".to_string(),
            resolution: IVec2::new(640, 480),
            pixel_aspect_ratio: 1.0,
            render_region: None,
            shutter: Vec2::ZERO,
            parameters: BTreeMap::new(),
        }
    }
}

impl Camera {
    #[must_use]
    pub fn render_region(&self) -> [IVec2; 2] {
        self.render_region
            .unwrap_or([IVec2::ZERO, self.resolution])
    }

    /// Reads a string parameter, e.g. the `mesh` bound to a UV camera.
    #[must_use]
    pub fn string_parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }
}

impl HashContent for Camera {
    fn hash_content(&self, h: &mut ContentHasher) {
        h.write_str(&self.projection);
        h.write_i32(self.resolution.x);
        h.write_i32(self.resolution.y);
        h.write_f32(self.pixel_aspect_ratio);
        match self.render_region {
            Some([min, max]) => {
                h.write_bool(true);
                for v in [min.x, min.y, max.x, max.y] {
                    h.write_i32(v);
                }
            }
            None => h.write_bool(false),
        }
        h.write_f32s(&self.shutter.to_array());
        h.write_u64(self.parameters.len() as u64);
        for (name, value) in &self.parameters {
            h.write_str(name);
            value.hash_content(h);
        }
    }
}
