//! Word Counter node

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolkit_sdk::{NodeFactory, PortModel, Result, Tag, ToolkitNode};

pub const NODE_NAME: &str = "word_counter";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Inputs {
    /// Text to count the words of
    pub text: String,
}

impl PortModel for Inputs {
    fn components() -> Vec<(&'static str, toolkit_sdk::Component)> {
        vec![(
            "text",
            toolkit_sdk::Component::from(toolkit_sdk::ComponentKind::TextField {
                placeholder: "Enter text".to_string(),
                multiline: true,
                secret: false,
            }),
        )]
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Outputs {
    /// Number of words
    pub count: usize,
}

impl PortModel for Outputs {}

/// Words are runs of non-whitespace
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn node() -> Result<ToolkitNode> {
    let mut node = ToolkitNode::new(NODE_NAME, "Count the words in a text")
        .with_tag(Tag::Utilities);
    node.set_input::<Inputs>()?.set_output::<Outputs>()?;
    node.on_call(|inputs: Inputs, _params: serde_json::Value| async move {
        Ok(Outputs {
            count: count_words(&inputs.text),
        })
    });
    Ok(node)
}

inventory::submit!(NodeFactory(node));
