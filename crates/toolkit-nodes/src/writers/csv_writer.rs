//! CSV Writer node
//!
//! Encodes rows of text as CSV and uploads the result to blob storage. The
//! storage client is built once, by the startup hook, from the
//! `TOOLKIT_STORAGE_*` environment.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use toolkit_sdk::{
    Csv, Ext, NodeFactory, PortModel, Result, SdkError, StorageClient, StorageConfig,
    StorageObject, Tag, ToolkitNode,
};

pub const NODE_NAME: &str = "csv_writer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Inputs {
    /// Table rows, one list of cells per row
    pub rows: Vec<Vec<String>>,
}

impl PortModel for Inputs {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Params {
    /// Cell separator
    pub delimiter: Delimiter,
}

impl PortModel for Params {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Outputs {
    /// The stored table
    pub csv: Csv,
}

impl PortModel for Outputs {}

/// Encode rows, quoting cells that contain the delimiter, a quote or a line break
pub fn encode_rows(rows: &[Vec<String>], delimiter: Delimiter) -> String {
    let separator = delimiter.as_char();
    let mut out = String::new();
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| {
                if cell.contains(separator) || cell.contains(['"', '\n', '\r']) {
                    format!("\"{}\"", cell.replace('"', "\"\""))
                } else {
                    cell.clone()
                }
            })
            .collect();
        out.push_str(&cells.join(&separator.to_string()));
        out.push_str("\r\n");
    }
    out
}

pub fn node() -> Result<ToolkitNode> {
    let mut node = ToolkitNode::new(NODE_NAME, "Write rows of text to a CSV file in storage")
        .with_tag(Tag::Writers)
        .with_icon("csv")
        .is_output(true);
    node.set_input::<Inputs>()?
        .set_param::<Params>()?
        .set_output::<Outputs>()?;

    let client: Arc<OnceCell<StorageClient>> = Arc::new(OnceCell::new());

    let startup_client = client.clone();
    node.on_startup(move |_: Params| {
        let client = startup_client.clone();
        async move {
            let config = StorageConfig::from_env()?;
            log::info!("CSV writer using storage at {}", config.base_url());
            client
                .set(StorageClient::new(&config)?)
                .map_err(|_| SdkError::startup("storage client already initialized"))
        }
    });

    node.on_call(move |inputs: Inputs, params: Params| {
        let client = client.clone();
        async move {
            let client = client
                .get()
                .ok_or_else(|| SdkError::execution("storage client is not initialized"))?;
            let body = encode_rows(&inputs.rows, params.delimiter);
            let mut csv = Csv::new(Ext::Csv)?;
            csv.save(client, body.into_bytes()).await?;
            Ok(Outputs { csv })
        }
    });
    Ok(node)
}

inventory::submit!(NodeFactory(node));

#[cfg(test)]
mod tests {
    use toolkit_sdk::{PortType, ToolkitNode};

    use super::*;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_encode_plain_rows() {
        let table = rows(&[&["name", "age"], &["ada", "36"]]);
        assert_eq!(encode_rows(&table, Delimiter::Comma), "name,age\r\nada,36\r\n");
        assert_eq!(encode_rows(&table, Delimiter::Tab), "name\tage\r\nada\t36\r\n");
    }

    #[test]
    fn test_encode_quotes_when_needed() {
        let table = rows(&[&["a,b", "say \"hi\"", "x;y"]]);
        assert_eq!(
            encode_rows(&table, Delimiter::Comma),
            "\"a,b\",\"say \"\"hi\"\"\",x;y\r\n"
        );
        assert_eq!(
            encode_rows(&table, Delimiter::Semicolon),
            "a,b;\"say \"\"hi\"\"\";\"x;y\"\r\n"
        );
    }

    #[test]
    fn test_metadata() {
        let node: ToolkitNode = node().unwrap();
        let metadata = node.get_metadata();

        assert_eq!(metadata.is_output, Some(true));
        assert_eq!(metadata.icon.as_deref(), Some("csv"));
        assert_eq!(metadata.outputs["csv"].port_type, PortType::Csv);
        assert_eq!(metadata.params["delimiter"].component.as_ref().unwrap().name(), "Select");
        assert_eq!(metadata.inputs["rows"].port_type, PortType::Array);
        assert!(toolkit_sdk::validate_node(&node).is_empty());
    }

    #[tokio::test]
    async fn test_missing_storage_host_fails_startup() {
        if std::env::var("TOOLKIT_STORAGE_HOST").is_ok() {
            return;
        }
        let node = node().unwrap();
        let err = node
            .call(
                serde_json::json!({"rows": [["a"]]}),
                serde_json::json!({"delimiter": "comma"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Startup(_)));
        assert!(!node.is_started().await);
    }
}
