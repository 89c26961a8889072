//! Native layer: the retained node graph the renderer traces, shared node
//! ownership with per-session deletion policy, and the engine seam.

pub mod engine;
pub mod entry;
pub mod handle;
pub mod messages;
pub mod param;
pub mod universe;
pub mod version;

pub use engine::{RenderEngine, RenderMode, RenderStatus};
pub use entry::{NodeEntry, NodeKind};
pub use handle::{NodeDeleter, NodeHandle};
pub use messages::{LogFlags, MessageSettings};
pub use param::{NodeRef, ParamValue};
pub use universe::{AliasId, NodeId, Universe};
pub use version::NativeVersion;
