//! Node Handles
//!
//! A [`NodeHandle`] is shared ownership of one native node. When the last
//! clone drops, the node is released according to its [`NodeDeleter`]:
//!
//! - `Destroy` removes it from the universe immediately (interactive
//!   sessions, where the scene is edited for a long time).
//! - `Retain` leaves it alone. Batch and export sessions never destroy
//!   individual nodes; the whole universe is cleared at session end. Nodes
//!   created for procedurals are retained too, since they belong to the
//!   procedural's own sub-graph.

use std::fmt;
use std::sync::Arc;

use retrace_core::RenderType;

use crate::universe::{NodeId, Universe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeDeleter {
    Destroy,
    Retain,
}

impl NodeDeleter {
    #[must_use]
    pub fn for_render_type(render_type: RenderType) -> Self {
        match render_type {
            RenderType::Interactive => NodeDeleter::Destroy,
            RenderType::Batch | RenderType::SceneDescription => NodeDeleter::Retain,
        }
    }

    /// Releases a node according to the policy.
    pub fn release(self, universe: &Universe, id: NodeId) {
        if self == NodeDeleter::Destroy {
            universe.destroy_node(id);
        }
    }
}

struct NodeOwner {
    id: NodeId,
    universe: Arc<Universe>,
    deleter: NodeDeleter,
}

impl Drop for NodeOwner {
    fn drop(&mut self) {
        self.deleter.release(&self.universe, self.id);
    }
}

#[derive(Clone)]
pub struct NodeHandle {
    owner: Arc<NodeOwner>,
}

impl NodeHandle {
    #[must_use]
    pub fn new(universe: Arc<Universe>, id: NodeId, deleter: NodeDeleter) -> Self {
        Self {
            owner: Arc::new(NodeOwner {
                id,
                universe,
                deleter,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.owner.id
    }

    #[inline]
    #[must_use]
    pub fn deleter(&self) -> NodeDeleter {
        self.owner.deleter
    }

    /// Whether this is the only remaining owner of the node.
    #[inline]
    #[must_use]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.owner) == 1
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.owner.id)
            .field("deleter", &self.owner.deleter)
            .finish()
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.owner, &other.owner)
    }
}
