//! Replace node
//!
//! Replaces occurrences of a substring in a text, either all of them or
//! only the first one.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolkit_sdk::{NodeFactory, PortModel, Result, Tag, ToolkitNode};

/// Node name in the registry
pub const NODE_NAME: &str = "replace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ReplaceMode {
    ReplaceAll,
    ReplaceFirst,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Inputs {
    /// Input text
    pub text: String,
}

impl PortModel for Inputs {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Params {
    /// Substring to replace
    pub old_substring: String,
    /// Replacement string
    pub new_substring: String,
    /// Replace mode: replaceAll or replaceFirst
    pub replace_mode: ReplaceMode,
}

impl PortModel for Params {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Outputs {
    /// Text with replaced occurrences
    pub replaced: String,
}

impl PortModel for Outputs {}

pub fn replace(text: &str, params: &Params) -> String {
    match params.replace_mode {
        ReplaceMode::ReplaceAll => text.replace(&params.old_substring, &params.new_substring),
        ReplaceMode::ReplaceFirst => text.replacen(&params.old_substring, &params.new_substring, 1),
    }
}

pub fn node() -> Result<ToolkitNode> {
    let mut node = ToolkitNode::new(NODE_NAME, "Replace occurrences of a substring in a string")
        .with_tag(Tag::Utilities)
        .with_icon("text");
    node.set_input::<Inputs>()?
        .set_param::<Params>()?
        .set_output::<Outputs>()?;
    node.on_call(|inputs: Inputs, params: Params| async move {
        Ok(Outputs {
            replaced: replace(&inputs.text, &params),
        })
    });
    Ok(node)
}

inventory::submit!(NodeFactory(node));
