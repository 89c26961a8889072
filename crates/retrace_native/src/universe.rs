//! Universe
//!
//! The retained node graph that the native renderer traces. Every scene
//! element ends up here as a named, typed node carrying parameters:
//!
//! ```text
//!  Universe
//!  ├── entries   type name → NodeEntry (declared parameters, kind)
//!  ├── graph     NodeId → NodeData { entry, name, parent, children, params }
//!  │             name → NodeId
//!  └── aliases   AliasId → current NodeId   (stable logical references)
//! ```
//!
//! The universe is shared by every thread of a session. Node creation and
//! parameter edits take a short write lock on the graph; lookups take a
//! read lock. Destroying a node destroys its children as well.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::entry::{NodeEntry, NodeKind, builtin_entries};
use crate::messages::MessageSettings;
use crate::param::{NodeRef, ParamValue};
use crate::version::NativeVersion;

new_key_type! {
    /// Identifies a live node. Stale ids never alias new nodes.
    pub struct NodeId;

    /// Identifies a stable logical node reference.
    pub struct AliasId;
}

struct NodeData {
    entry: Arc<NodeEntry>,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    params: FxHashMap<String, ParamValue>,
}

#[derive(Default)]
struct NodeGraph {
    nodes: SlotMap<NodeId, NodeData>,
    names: FxHashMap<String, NodeId>,
}

impl NodeGraph {
    fn index_name(&mut self, name: &str, id: NodeId) {
        if !name.is_empty() {
            self.names.insert(name.to_string(), id);
        }
    }

    fn unindex_name(&mut self, name: &str, id: NodeId) {
        if self.names.get(name) == Some(&id) {
            self.names.remove(name);
        }
    }
}

struct AliasSlot {
    name: String,
    target: Option<NodeId>,
}

#[derive(Default)]
struct AliasTable {
    slots: SlotMap<AliasId, AliasSlot>,
    by_name: FxHashMap<String, AliasId>,
}

pub struct Universe {
    entries: RwLock<FxHashMap<String, Arc<NodeEntry>>>,
    graph: RwLock<NodeGraph>,
    aliases: RwLock<AliasTable>,
    options: NodeId,
    version: NativeVersion,
    messages: Mutex<MessageSettings>,
}

impl Universe {
    #[must_use]
    pub fn new(version: NativeVersion) -> Self {
        let entries: FxHashMap<String, Arc<NodeEntry>> = builtin_entries()
            .into_iter()
            .map(|e| (e.name().to_string(), Arc::new(e)))
            .collect();

        let mut graph = NodeGraph::default();
        let options_entry = entries
            .get("options")
            .cloned()
            .unwrap_or_else(|| Arc::new(NodeEntry::new("options", NodeKind::Options, &[])));
        let mut params = FxHashMap::default();
        params.insert("AA_samples".to_string(), ParamValue::Int(1));
        let options = graph.nodes.insert(NodeData {
            entry: options_entry,
            name: "options".to_string(),
            parent: None,
            children: Vec::new(),
            params,
        });
        graph.index_name("options", options);

        Self {
            entries: RwLock::new(entries),
            graph: RwLock::new(graph),
            aliases: RwLock::new(AliasTable::default()),
            options,
            version,
            messages: Mutex::new(MessageSettings::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> NativeVersion {
        self.version
    }

    /// The options node. It lives as long as the universe.
    #[inline]
    #[must_use]
    pub fn options(&self) -> NodeId {
        self.options
    }

    // ─── Node Types ──────────────────────────────────────────────────────────

    /// Registers (or replaces) a node type, as plugin loading would.
    pub fn register_entry(&self, entry: NodeEntry) {
        self.entries
            .write()
            .insert(entry.name().to_string(), Arc::new(entry));
    }

    #[must_use]
    pub fn entry(&self, type_name: &str) -> Option<Arc<NodeEntry>> {
        self.entries.read().get(type_name).cloned()
    }

    // ─── Node Lifetime ───────────────────────────────────────────────────────

    /// Creates a node of a registered type. Returns `None` for unknown types.
    pub fn create_node(&self, type_name: &str, name: &str, parent: Option<NodeId>) -> Option<NodeId> {
        let Some(entry) = self.entry(type_name) else {
            warn!("Unable to create node of unknown type \"{type_name}\"");
            return None;
        };

        let mut graph = self.graph.write();
        let parent = parent.filter(|p| graph.nodes.contains_key(*p));
        let id = graph.nodes.insert(NodeData {
            entry,
            name: name.to_string(),
            parent,
            children: Vec::new(),
            params: FxHashMap::default(),
        });
        graph.index_name(name, id);
        if let Some(p) = parent
            && let Some(parent_data) = graph.nodes.get_mut(p)
        {
            parent_data.children.push(id);
        }
        Some(id)
    }

    /// Destroys a node and all of its children. Returns `false` if the node
    /// was already gone. The options node cannot be destroyed.
    pub fn destroy_node(&self, id: NodeId) -> bool {
        if id == self.options {
            return false;
        }
        let mut graph = self.graph.write();
        let Some(parent) = graph.nodes.get(id).map(|n| n.parent) else {
            return false;
        };
        if let Some(p) = parent
            && let Some(parent_data) = graph.nodes.get_mut(p)
        {
            parent_data.children.retain(|c| *c != id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(data) = graph.nodes.remove(next) {
                graph.unindex_name(&data.name, next);
                pending.extend(data.children);
            }
        }
        true
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.graph.read().nodes.contains_key(id)
    }

    /// Number of live nodes, including the options node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.read().nodes.len()
    }

    /// Live nodes of the given type, in no particular order.
    #[must_use]
    pub fn nodes_of_type(&self, type_name: &str) -> Vec<NodeId> {
        self.graph
            .read()
            .nodes
            .iter()
            .filter(|(_, n)| n.entry.name() == type_name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Destroys every node except the options node and forgets all aliases.
    pub fn clear(&self) {
        let mut graph = self.graph.write();
        let options = self.options;
        graph.nodes.retain(|id, _| id == options);
        graph.names.retain(|_, id| *id == options);
        if let Some(data) = graph.nodes.get_mut(options) {
            data.children.clear();
        }
        drop(graph);

        let mut aliases = self.aliases.write();
        aliases.slots.clear();
        aliases.by_name.clear();
        debug!("Universe cleared");
    }

    // ─── Node Queries ────────────────────────────────────────────────────────

    #[must_use]
    pub fn node_entry(&self, id: NodeId) -> Option<Arc<NodeEntry>> {
        self.graph.read().nodes.get(id).map(|n| n.entry.clone())
    }

    /// Whether the node is of the given type.
    #[must_use]
    pub fn is(&self, id: NodeId, type_name: &str) -> bool {
        self.graph
            .read()
            .nodes
            .get(id)
            .is_some_and(|n| n.entry.name() == type_name)
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.graph.read().nodes.get(id).map(|n| n.entry.kind())
    }

    /// Whether the node's type declares the parameter.
    #[must_use]
    pub fn has_parameter(&self, id: NodeId, name: &str) -> bool {
        self.graph
            .read()
            .nodes
            .get(id)
            .is_some_and(|n| n.entry.has_parameter(name))
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<String> {
        self.graph.read().nodes.get(id).map(|n| n.name.clone())
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.graph.read().nodes.get(id).and_then(|n| n.parent)
    }

    pub fn rename(&self, id: NodeId, name: &str) {
        let mut graph = self.graph.write();
        let Some(old) = graph.nodes.get(id).map(|n| n.name.clone()) else {
            return;
        };
        graph.unindex_name(&old, id);
        if let Some(data) = graph.nodes.get_mut(id) {
            data.name = name.to_string();
        }
        graph.index_name(name, id);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.graph.read().names.get(name).copied()
    }

    // ─── Parameters ──────────────────────────────────────────────────────────

    pub fn set(&self, id: NodeId, name: &str, value: impl Into<ParamValue>) {
        if let Some(node) = self.graph.write().nodes.get_mut(id) {
            node.params.insert(name.to_string(), value.into());
        }
    }

    /// Returns the parameter to its default (unset) state.
    pub fn reset(&self, id: NodeId, name: &str) {
        if let Some(node) = self.graph.write().nodes.get_mut(id) {
            node.params.remove(name);
        }
    }

    #[must_use]
    pub fn get(&self, id: NodeId, name: &str) -> Option<ParamValue> {
        self.graph
            .read()
            .nodes
            .get(id)
            .and_then(|n| n.params.get(name).cloned())
    }

    #[must_use]
    pub fn get_float(&self, id: NodeId, name: &str) -> f32 {
        self.get(id, name)
            .and_then(|v| v.as_float())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get_int(&self, id: NodeId, name: &str) -> i32 {
        self.get(id, name).and_then(|v| v.as_int()).unwrap_or_default()
    }

    #[must_use]
    pub fn get_bool(&self, id: NodeId, name: &str) -> bool {
        self.get(id, name)
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get_str(&self, id: NodeId, name: &str) -> String {
        match self.get(id, name) {
            Some(ParamValue::Str(s)) => s,
            _ => String::new(),
        }
    }

    /// Resolves a node-valued parameter.
    #[must_use]
    pub fn get_node(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.get(id, name)
            .and_then(|v| v.as_node())
            .and_then(|r| self.resolve(r))
    }

    /// Names of all parameters currently set on the node, sorted.
    #[must_use]
    pub fn param_names(&self, id: NodeId) -> Vec<String> {
        let mut names: Vec<String> = self
            .graph
            .read()
            .nodes
            .get(id)
            .map(|n| n.params.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    // ─── Aliases ─────────────────────────────────────────────────────────────

    /// Returns the alias with the given logical name, creating it unbound.
    pub fn alias(&self, name: &str) -> AliasId {
        if let Some(id) = self.aliases.read().by_name.get(name) {
            return *id;
        }
        let mut aliases = self.aliases.write();
        if let Some(id) = aliases.by_name.get(name) {
            return *id;
        }
        let id = aliases.slots.insert(AliasSlot {
            name: name.to_string(),
            target: None,
        });
        aliases.by_name.insert(name.to_string(), id);
        id
    }

    /// Points the alias at a node, or unbinds it.
    pub fn bind_alias(&self, alias: AliasId, target: Option<NodeId>) {
        if let Some(slot) = self.aliases.write().slots.get_mut(alias) {
            slot.target = target;
        }
    }

    #[must_use]
    pub fn alias_name(&self, alias: AliasId) -> Option<String> {
        self.aliases.read().slots.get(alias).map(|s| s.name.clone())
    }

    /// Resolves a reference to a live node.
    #[must_use]
    pub fn resolve(&self, reference: NodeRef) -> Option<NodeId> {
        let id = match reference {
            NodeRef::Node(id) => id,
            NodeRef::Alias(alias) => self.aliases.read().slots.get(alias)?.target?,
        };
        self.contains(id).then_some(id)
    }

    // ─── Messages ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn messages(&self) -> MessageSettings {
        self.messages.lock().clone()
    }

    pub fn update_messages(&self, f: impl FnOnce(&mut MessageSettings)) {
        f(&mut self.messages.lock());
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new(NativeVersion::default())
    }
}
