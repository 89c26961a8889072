//! Instance Cache
//!
//! Geometry is the most expensive thing to translate, and scenes often
//! contain many locations with identical geometry. Eligible objects are
//! compiled once into a hidden *master* keyed by content, and each location
//! gets a lightweight `ginstance` proxy pointing at it:
//!
//! ```text
//!  location "/a" ──► ginstance "/a" ─┐
//!  location "/b" ──► ginstance "/b" ─┼──► master "instance:<hash>" (visibility 0)
//!  location "/c" ──► ginstance "/c" ─┘
//! ```
//!
//! The key combines the object's content hash with the geometry-affecting
//! attributes (and sample times, for deformation blur). Objects that cannot
//! be shared are converted directly under the location name.

use log::warn;
use retrace_core::{ContentHash, ContentHasher};
use retrace_native::{NativeVersion, NodeDeleter, NodeHandle, NodeId, ParamValue};
use retrace_scene::SceneObject;

use crate::attributes::AttributeBundle;
use crate::cache::ContentCache;
use crate::motion::ensure_uniform_time_samples;
use crate::procedural::convert_procedural;
use crate::session::NodeContext;

/// The nodes representing one location's geometry.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    master: Option<NodeHandle>,
    ginstance: Option<NodeHandle>,
}

impl Instance {
    fn direct(node: Option<NodeHandle>) -> Self {
        Self {
            master: node,
            ginstance: None,
        }
    }

    fn instanced(context: &NodeContext, master: NodeHandle, name: &str) -> Self {
        let universe = &context.universe;
        universe.set(master.id(), "visibility", ParamValue::Byte(0));
        let ginstance = universe
            .create_node("ginstance", name, context.parent)
            .map(|id| {
                universe.set(id, "node", master.id());
                context.handle(id)
            });
        Self {
            master: Some(master),
            ginstance,
        }
    }

    /// The node carrying this location's transform and instance attributes.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.ginstance
            .as_ref()
            .or(self.master.as_ref())
            .map(NodeHandle::id)
    }

    #[must_use]
    pub fn master(&self) -> Option<NodeId> {
        self.master.as_ref().map(NodeHandle::id)
    }

    #[must_use]
    pub fn is_instanced(&self) -> bool {
        self.ginstance.is_some()
    }

    /// Nodes owned by this instance alone. Shared masters are reported by
    /// the cache.
    pub fn nodes_created(&self, out: &mut Vec<NodeId>) {
        match (&self.ginstance, &self.master) {
            (Some(ginstance), _) => out.push(ginstance.id()),
            (None, Some(master)) => out.push(master.id()),
            (None, None) => {}
        }
    }
}

pub struct InstanceCache {
    context: NodeContext,
    cache: ContentCache<Option<NodeHandle>>,
}

impl InstanceCache {
    pub(crate) fn new(context: NodeContext) -> Self {
        Self {
            context,
            cache: ContentCache::new(),
        }
    }

    pub fn get(&self, object: &SceneObject, attributes: &AttributeBundle, name: &str) -> Instance {
        if !self.can_instance(object, attributes) {
            return Instance::direct(self.convert(object, attributes, name));
        }

        let mut h = ContentHasher::new();
        h.append(object);
        attributes.hash_geometry(object, &mut h);
        let hash = h.finish();

        let master = self.cache.get_or_insert_with(hash, || {
            self.convert(object, attributes, &Self::master_name(hash))
        });
        self.instance(master, name)
    }

    /// Deformation-blurred variant of [`get`](Self::get).
    pub fn get_samples(
        &self,
        samples: &[SceneObject],
        times: &[f32],
        attributes: &AttributeBundle,
        name: &str,
    ) -> Instance {
        let Some(first) = samples.first() else {
            return Instance::default();
        };
        if let Err(e) = ensure_uniform_time_samples(times) {
            warn!("Unable to convert \"{name}\": {e}");
            return Instance::default();
        }

        if !self.can_instance(first, attributes) {
            return Instance::direct(self.convert_samples(samples, times, attributes, name));
        }

        let mut h = ContentHasher::new();
        for sample in samples {
            h.append(sample);
        }
        attributes.hash_geometry(first, &mut h);
        h.append_f32s(times);
        let hash = h.finish();

        let master = self.cache.get_or_insert_with(hash, || {
            self.convert_samples(samples, times, attributes, &Self::master_name(hash))
        });
        self.instance(master, name)
    }

    /// Drops masters that no location uses any more, along with failed
    /// conversions so that they are retried on the next edit.
    pub fn clear_unused(&self) {
        self.cache
            .retain(|master| master.as_ref().is_some_and(|m| !m.is_unique()));
    }

    /// Every cached master, for procedural node lists.
    pub fn nodes_created(&self, out: &mut Vec<NodeId>) {
        self.cache.for_each(|master| {
            if let Some(m) = master {
                out.push(m.id());
            }
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn master_name(hash: ContentHash) -> String {
        format!("instance:{hash}")
    }

    fn instance(&self, master: Option<NodeHandle>, name: &str) -> Instance {
        match master {
            Some(master) => Instance::instanced(&self.context, master, name),
            None => Instance::default(),
        }
    }

    fn can_instance(&self, object: &SceneObject, attributes: &AttributeBundle) -> bool {
        // Older native libraries crash when a destroyed procedural is still
        // referenced by an instance.
        if matches!(object, SceneObject::Procedural(_))
            && self.context.deleter == NodeDeleter::Destroy
            && self.context.universe.version() < NativeVersion::INSTANCEABLE_PROCEDURALS
        {
            return false;
        }
        attributes.can_instance_geometry(object)
    }

    fn convert(&self, object: &SceneObject, attributes: &AttributeBundle, name: &str) -> Option<NodeHandle> {
        let context = &self.context;
        let node = match object {
            SceneObject::Procedural(procedural) => {
                convert_procedural(context, procedural.as_ref(), name)
            }
            _ => context
                .converters
                .objects
                .convert(&context.universe, object, name, context.parent),
        }?;
        attributes.apply_geometry(object, &context.universe, node);
        Some(context.handle(node))
    }

    fn convert_samples(
        &self,
        samples: &[SceneObject],
        times: &[f32],
        attributes: &AttributeBundle,
        name: &str,
    ) -> Option<NodeHandle> {
        let first = samples.first()?;
        if let SceneObject::Procedural(_) = first {
            // Procedurals describe their own motion.
            return self.convert(first, attributes, name);
        }
        let context = &self.context;
        let refs: Vec<&SceneObject> = samples.iter().collect();
        let node = context.converters.objects.convert_samples(
            &context.universe,
            &refs,
            times.first().copied().unwrap_or_default(),
            times.last().copied().unwrap_or_default(),
            name,
            context.parent,
        )?;
        attributes.apply_geometry(first, &context.universe, node);
        Some(context.handle(node))
    }
}
