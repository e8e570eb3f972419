//! Port models: the typed structs a node declares for its inputs, params
//! and outputs.
//!
//! A port model derives `JsonSchema` for its shape and may attach UI hints
//! per field. `model_schema` renders the schema and folds those hints in as
//! `component` and `show` keys, which the normalizer reads back.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::components::Component;
use crate::error::{Result, SdkError};

/// A struct usable as a node's inputs, params or outputs
pub trait PortModel: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Explicit widgets keyed by field name
    fn components() -> Vec<(&'static str, Component)> {
        Vec::new()
    }

    /// Fields rendered hidden in the node editor
    fn hidden_fields() -> &'static [&'static str] {
        &[]
    }
}

/// Render the raw JSON Schema for a port model, UI hints included
pub fn model_schema<T: PortModel>() -> Result<Value> {
    let root = schemars::schema_for!(T);
    let mut schema = serde_json::to_value(root)?;
    apply_overrides(&mut schema, T::components(), T::hidden_fields())?;
    Ok(schema)
}

fn apply_overrides(
    schema: &mut Value,
    components: Vec<(&'static str, Component)>,
    hidden: &[&str],
) -> Result<()> {
    if components.is_empty() && hidden.is_empty() {
        return Ok(());
    }

    let properties = schema
        .get_mut("properties")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| SdkError::schema("UI hints given for a model without fields"))?;

    for (field, component) in components {
        let property = properties
            .get_mut(field)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| SdkError::schema(format!("component given for unknown field '{}'", field)))?;
        property.insert("component".to_string(), serde_json::to_value(component)?);
    }

    for field in hidden {
        let property = properties
            .get_mut(*field)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| SdkError::schema(format!("unknown hidden field '{}'", field)))?;
        property.insert("show".to_string(), Value::Bool(false));
    }

    Ok(())
}
