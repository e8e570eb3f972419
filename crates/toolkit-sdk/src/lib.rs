//! Toolkit SDK - declare nodes and derive their editor metadata
//!
//! A toolkit node is described by three typed models (inputs, params,
//! outputs). This crate turns those models into the metadata the node editor
//! renders:
//!
//! - `schema`: normalizes a model's JSON Schema (`$ref`, `allOf`, `anyOf`)
//! - `resolve`: resolves references and attaches UI components
//! - `metadata`: `FieldMetadata` / `MetaDataBase` records
//! - `node`: `ToolkitNode`, with request validation, one-time startup and
//!   parameter callbacks
//! - `registry`: name -> node lookup, populated at link time via `inventory`
//! - `validation`: the port gate every node passes before registration
//!
//! Storage-backed values (`Image`, `Audio`, `Video`, `Pdf`, `Csv`) and the
//! storage client live in `io` and `storage`.
//!
//! # Example
//!
//! ```ignore
//! use toolkit_sdk::{PortModel, ToolkitNode, Tag};
//!
//! #[derive(Serialize, Deserialize, JsonSchema)]
//! struct Inputs { text: String }
//! impl PortModel for Inputs {}
//!
//! let mut node = ToolkitNode::new("echo", "Echo text").with_tag(Tag::Utilities);
//! node.set_input::<Inputs>()?.set_output::<Inputs>()?;
//! node.on_call(|inputs: Inputs, _: serde_json::Value| async move { Ok(inputs) });
//! ```

pub mod components;
pub mod error;
pub mod ext;
pub mod io;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod node;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export key types
pub use components::{default_component, ChoiceValue, Component, ComponentKind, SelectChoice, SubField};
pub use error::{Result, SdkError};
pub use ext::Ext;
pub use io::{Audio, Csv, Image, Pdf, StorageObject, Video};
pub use metadata::{FieldMetadata, MetaDataBase};
pub use model::{model_schema, PortModel};
pub use node::ToolkitNode;
pub use registry::{NodeFactory, NodeRegistry};
pub use storage::{StorageClient, StorageConfig};
pub use types::{PortType, Slot, SupportedProviders, Tag};
pub use validation::{ensure_valid, validate_node, DisallowedReason, PortViolation};
