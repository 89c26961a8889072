//! Shader Cache
//!
//! Compiles each distinct shader network once per session. Networks are
//! keyed by content hash, so two locations assigning identical networks share
//! one set of native nodes, named `shader:<hash>:<handle>`.
//!
//! Lights and light filters compile their own private copies through
//! [`ShaderNodes::compile`] instead, since their roots are renamed and
//! carry per-light parameters.

use std::sync::Arc;

use log::warn;
use retrace_core::{ContentHash, ShaderNetwork};
use retrace_native::{NodeDeleter, NodeId, Universe};

use crate::cache::ContentCache;
use crate::session::NodeContext;

/// The native nodes of one compiled network. The last node is the root.
pub struct ShaderNodes {
    universe: Arc<Universe>,
    deleter: NodeDeleter,
    nodes: Vec<NodeId>,
}

impl ShaderNodes {
    /// Compiles `network`. An empty result (no root) signals failure.
    pub(crate) fn compile(context: &NodeContext, network: &ShaderNetwork, name_prefix: &str) -> Self {
        let nodes = context.converters.shaders.convert(
            &context.universe,
            network,
            name_prefix,
            context.parent,
        );
        if nodes.is_empty() {
            warn!("Shader network \"{name_prefix}\" produced no nodes");
        }
        Self {
            universe: context.universe.clone(),
            deleter: context.deleter,
            nodes,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn nodes_created(&self, out: &mut Vec<NodeId>) {
        out.extend_from_slice(&self.nodes);
    }
}

impl Drop for ShaderNodes {
    fn drop(&mut self) {
        for node in &self.nodes {
            self.deleter.release(&self.universe, *node);
        }
    }
}

pub type CompiledShader = Arc<ShaderNodes>;

pub struct ShaderCache {
    context: NodeContext,
    cache: ContentCache<CompiledShader>,
}

impl ShaderCache {
    pub(crate) fn new(context: NodeContext) -> Self {
        Self {
            context,
            cache: ContentCache::new(),
        }
    }

    /// Returns the compiled form of `network`, compiling it on first use.
    pub fn get(&self, network: &ShaderNetwork) -> CompiledShader {
        let hash = ContentHash::of(network);
        self.cache.get_or_insert_with(hash, || {
            Arc::new(ShaderNodes::compile(
                &self.context,
                network,
                &format!("shader:{hash}:"),
            ))
        })
    }

    /// Drops compiled networks no longer referenced outside the cache.
    pub fn clear_unused(&self) {
        self.cache.retain(|shader| Arc::strong_count(shader) > 1);
    }

    /// Every node held by the cache, for procedural node lists.
    pub fn nodes_created(&self, out: &mut Vec<NodeId>) {
        self.cache.for_each(|shader| shader.nodes_created(out));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
