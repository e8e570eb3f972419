//! Toolkit Nodes
//!
//! Built-in node implementations. Each node module declares its port
//! models, builds a `ToolkitNode`, and registers the constructor through
//! `inventory`, so `NodeRegistry::with_builtins()` picks it up.
//!
//! # Categories
//!
//! - **Text**: string utilities (replace, word count)
//! - **Search**: retrieval over documents
//! - **Writers**: nodes that persist results to blob storage

pub mod search;
pub mod text;
pub mod writers;

use toolkit_sdk::{NodeRegistry, Result};

/// Registry holding every built-in node
pub fn registry() -> Result<NodeRegistry> {
    NodeRegistry::with_builtins()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_collects_all_builtins() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 4, "Expected 4 built-in nodes");

        assert!(registry.has_node(text::replace::NODE_NAME));
        assert!(registry.has_node(text::word_counter::NODE_NAME));
        assert!(registry.has_node(search::keyword_search::NODE_NAME));
        assert!(registry.has_node(writers::csv_writer::NODE_NAME));
    }

    #[test]
    fn test_builtins_serialize_without_nulls() {
        for metadata in registry().unwrap().all_metadata() {
            let json = metadata.to_json().unwrap();
            assert!(!json.contains("null"), "{} has null fields", metadata.name);
        }
    }
}
