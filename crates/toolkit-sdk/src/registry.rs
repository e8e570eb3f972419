//! Node registry for dynamic node resolution
//!
//! Maps node names to declared `ToolkitNode`s and callback ids to the node
//! that owns them. Built-in nodes register themselves at link time:
//!
//! ```ignore
//! fn replace_node() -> toolkit_sdk::Result<ToolkitNode> { ... }
//!
//! inventory::submit!(toolkit_sdk::NodeFactory(replace_node));
//!
//! let registry = NodeRegistry::with_builtins()?;
//! let node = registry.get_handler("replace")?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SdkError};
use crate::metadata::MetaDataBase;
use crate::node::{CallbackFn, ToolkitNode};
use crate::validation::ensure_valid;

/// Link-time registration of a node constructor
pub struct NodeFactory(pub fn() -> Result<ToolkitNode>);

inventory::collect!(NodeFactory);

/// Registry of declared nodes
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = NodeRegistry::with_builtins()?;
/// registry.merge(plugin_registry);
/// ```
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<ToolkitNode>>,
    /// callback id -> owning node name
    callbacks: HashMap<String, String>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }

    /// Build every node submitted through `NodeFactory`.
    ///
    /// Each node passes the port gate before it is registered; the first
    /// failing declaration aborts.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for factory in inventory::iter::<NodeFactory> {
            let node = (factory.0)()?;
            ensure_valid(&node)?;
            registry.register(node);
        }
        log::info!("Registered {} built-in node(s)", registry.len());
        Ok(registry)
    }

    /// Register a node, replacing any node with the same name
    pub fn register(&mut self, node: ToolkitNode) -> Arc<ToolkitNode> {
        let name = node.name().to_string();
        if self.nodes.contains_key(&name) {
            log::warn!("Node '{}' registered twice; keeping the latest", name);
        }

        self.callbacks.retain(|_, owner| owner != &name);
        for id in node.callback_ids() {
            if let Some(previous) = self.callbacks.insert(id.to_string(), name.clone()) {
                log::warn!(
                    "Callback '{}' moved from node '{}' to '{}'",
                    id,
                    previous,
                    name
                );
            }
        }

        let node = Arc::new(node);
        self.nodes.insert(name, node.clone());
        node
    }

    /// Get the node registered under `name`
    pub fn get_handler(&self, name: &str) -> Result<Arc<ToolkitNode>> {
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| SdkError::UnknownNode(name.to_string()))
    }

    /// Check if a node is registered
    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Get metadata for a node
    pub fn get_metadata(&self, name: &str) -> Option<MetaDataBase> {
        self.nodes.get(name).map(|node| node.get_metadata())
    }

    /// All registered metadata, sorted by node name
    pub fn all_metadata(&self) -> Vec<MetaDataBase> {
        let mut all: Vec<MetaDataBase> = self.nodes.values().map(|n| n.get_metadata()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// List all registered node names, sorted
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Find a callback and the node it belongs to
    pub fn get_callback(&self, id: &str) -> Result<(Arc<ToolkitNode>, Arc<CallbackFn>)> {
        let owner = self
            .callbacks
            .get(id)
            .ok_or_else(|| SdkError::UnknownCallback(id.to_string()))?;
        let node = self.get_handler(owner)?;
        let callback = node
            .get_callback(id)
            .ok_or_else(|| SdkError::UnknownCallback(id.to_string()))?;
        Ok((node, callback))
    }

    /// Run a callback against its node's current metadata
    pub async fn run_callback(&self, id: &str) -> Result<MetaDataBase> {
        let (node, callback) = self.get_callback(id)?;
        log::debug!("Running callback '{}' of node '{}'", id, node.name());
        callback(node.get_metadata()).await
    }

    /// Merge another registry into this one
    ///
    /// Nodes from `other` override nodes in `self` if they share the same name.
    pub fn merge(&mut self, other: NodeRegistry) {
        for (name, node) in other.nodes {
            self.callbacks.retain(|_, owner| owner != &name);
            self.nodes.insert(name, node);
        }
        self.callbacks.extend(other.callbacks);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
