use std::sync::Arc;

use retrace_core::ContentHash;
use retrace_native::{NodeRef, Universe};

use crate::cache::ContentCache;

/// Maps light-name lists (as used by `linkedLights` and shadow groups) to
/// node reference arrays. Many locations share the same list, so each
/// distinct list is resolved once per render.
///
/// References point at the `light:<name>` aliases, so they stay valid when
/// a light's shader is rebuilt.
pub struct LightListCache {
    universe: Arc<Universe>,
    cache: ContentCache<Arc<[NodeRef]>>,
}

impl LightListCache {
    #[must_use]
    pub fn new(universe: Arc<Universe>) -> Self {
        Self {
            universe,
            cache: ContentCache::new(),
        }
    }

    pub fn get(&self, lights: &[String]) -> Arc<[NodeRef]> {
        self.cache.get_or_insert_with(ContentHash::of(lights), || {
            lights
                .iter()
                .map(|name| NodeRef::Alias(self.universe.alias(&format!("light:{name}"))))
                .collect()
        })
    }

    /// Forgets all lists. Called before each render.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
