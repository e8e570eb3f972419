//! Field and node metadata
//!
//! `FieldMetadata` is the per-port record the node editor consumes;
//! `MetaDataBase` is the full descriptor of a node with its three field maps.
//! Both serialize without null-valued optional keys.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::components::Component;
use crate::error::{Result, SdkError};
use crate::naming::to_display_name;
use crate::schema::{CustomJsonSchema, Items, Property};
use crate::types::{PortType, Slot, SupportedProviders, Tag};

/// Metadata for a single port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(rename = "type")]
    pub port_type: PortType,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    /// Set when a parameter change should trigger a registered callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        let name = name.into();
        Self {
            port_type,
            display_name: to_display_name(&name),
            name,
            description: String::new(),
            default: None,
            value: None,
            items: None,
            hidden: None,
            component: None,
            callback_id: None,
        }
    }

    /// Build the record for a resolved property
    pub fn from_property(name: &str, property: Property) -> Result<Self> {
        let field = Self {
            port_type: property.port_type,
            name: name.to_string(),
            display_name: to_display_name(name),
            description: property.description.unwrap_or_default(),
            default: property.default,
            value: None,
            items: property.items,
            hidden: (!property.show).then_some(true),
            component: property.component,
            callback_id: None,
        };
        field.validate()?;
        Ok(field)
    }

    /// Array ports must say what they hold
    pub fn validate(&self) -> Result<()> {
        if self.port_type == PortType::Array && self.items.is_none() {
            return Err(SdkError::FieldConstraint {
                field: self.name.clone(),
                reason: "array fields must declare an item type".to_string(),
            });
        }
        Ok(())
    }
}

/// Build the ordered field map for a resolved schema
pub fn fields_from_schema(schema: &CustomJsonSchema) -> Result<IndexMap<String, FieldMetadata>> {
    schema
        .properties
        .iter()
        .map(|(name, property)| {
            FieldMetadata::from_property(name, property.clone()).map(|field| (name.clone(), field))
        })
        .collect()
}

/// Full descriptor of a node, as published to the node editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaDataBase {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<SupportedProviders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_worker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_input: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group_node: Option<bool>,
    #[serde(default)]
    pub inputs: IndexMap<String, FieldMetadata>,
    #[serde(default)]
    pub params: IndexMap<String, FieldMetadata>,
    #[serde(default)]
    pub outputs: IndexMap<String, FieldMetadata>,
}

impl MetaDataBase {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cost: 0,
            tag: None,
            icon: None,
            auth: None,
            require_worker: None,
            is_input: None,
            is_output: None,
            is_group_node: None,
            inputs: IndexMap::new(),
            params: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn fields(&self, slot: Slot) -> &IndexMap<String, FieldMetadata> {
        match slot {
            Slot::Inputs => &self.inputs,
            Slot::Params => &self.params,
            Slot::Outputs => &self.outputs,
        }
    }

    pub fn fields_mut(&mut self, slot: Slot) -> &mut IndexMap<String, FieldMetadata> {
        match slot {
            Slot::Inputs => &mut self.inputs,
            Slot::Params => &mut self.params,
            Slot::Outputs => &mut self.outputs,
        }
    }

    /// Add or replace an input port
    pub fn add_input(&mut self, field: FieldMetadata) -> Result<()> {
        self.add_field(Slot::Inputs, field)
    }

    /// Add or replace a parameter
    pub fn add_param(&mut self, field: FieldMetadata) -> Result<()> {
        self.add_field(Slot::Params, field)
    }

    /// Add or replace an output port
    pub fn add_output(&mut self, field: FieldMetadata) -> Result<()> {
        self.add_field(Slot::Outputs, field)
    }

    fn add_field(&mut self, slot: Slot, field: FieldMetadata) -> Result<()> {
        field.validate()?;
        self.fields_mut(slot).insert(field.name.clone(), field);
        Ok(())
    }

    /// Look up a field, reporting which slot was searched when it is absent
    pub fn field(&self, slot: Slot, name: &str) -> Result<&FieldMetadata> {
        self.fields(slot).get(name).ok_or_else(|| SdkError::UnknownField {
            slot,
            field: name.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let metadata: Self = serde_json::from_str(json)?;
        for slot in Slot::ALL {
            for field in metadata.fields(slot).values() {
                field.validate()?;
            }
        }
        Ok(metadata)
    }
}
