//! Port gate for node declarations
//!
//! Checks that a node's resolved ports can be rendered and wired by the
//! editor: port names are unique across slots, objects are backed by a model,
//! outputs are concrete, and array items have a known type.

use std::collections::HashMap;

use crate::node::ToolkitNode;
use crate::schema::{CustomJsonSchema, DeclaredShape, Definition, Items, Property};
use crate::types::{PortType, Slot};

/// Why a port is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisallowedReason {
    /// An object port with no model behind it, or any object output
    BareObject,
    /// A port that only accepts `null`
    Null,
    /// More than one alternative type in params or outputs
    Union,
    /// An enumerated output
    Enum,
    /// An array whose items (at any depth) have no concrete type
    UnknownArrayItems,
}

impl std::fmt::Display for DisallowedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BareObject => write!(f, "object ports must be backed by a model"),
            Self::Null => write!(f, "null-only ports carry no data"),
            Self::Union => write!(f, "union types are only allowed on inputs"),
            Self::Enum => write!(f, "outputs cannot be enumerations"),
            Self::UnknownArrayItems => write!(f, "array items must have a concrete type"),
        }
    }
}

/// A port declaration the gate refuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortViolation {
    /// The same name appears in two slots
    Collision {
        field: String,
        first: Slot,
        second: Slot,
    },
    /// A port whose type is not allowed in its slot
    Disallowed {
        slot: Slot,
        field: String,
        reason: DisallowedReason,
    },
}

impl std::fmt::Display for PortViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collision {
                field,
                first,
                second,
            } => write!(
                f,
                "Port name '{}' is declared in both {} and {}",
                field, first, second
            ),
            Self::Disallowed {
                slot,
                field,
                reason,
            } => write!(f, "Port '{}' in {} is not allowed: {}", field, slot, reason),
        }
    }
}

impl std::error::Error for PortViolation {}

/// Run every check and collect all violations, in slot then field order
pub fn validate_node(node: &ToolkitNode) -> Vec<PortViolation> {
    let mut errors = Vec::new();
    detect_collisions(node, &mut errors);
    for slot in Slot::ALL {
        if let Some(schema) = node.resolved_schema(slot) {
            check_slot(slot, schema, &mut errors);
        }
    }
    errors
}

/// Fail with the first violation, if any
pub fn ensure_valid(node: &ToolkitNode) -> crate::error::Result<()> {
    match validate_node(node).into_iter().next() {
        Some(violation) => {
            log::error!("Node '{}' rejected: {}", node.name(), violation);
            Err(violation.into())
        }
        None => Ok(()),
    }
}

fn detect_collisions(node: &ToolkitNode, errors: &mut Vec<PortViolation>) {
    let metadata = node.metadata();
    let mut seen: HashMap<&str, Slot> = HashMap::new();
    for slot in Slot::ALL {
        for name in metadata.fields(slot).keys() {
            if let Some(first) = seen.get(name.as_str()) {
                errors.push(PortViolation::Collision {
                    field: name.clone(),
                    first: *first,
                    second: slot,
                });
            } else {
                seen.insert(name, slot);
            }
        }
    }
}

fn check_slot(slot: Slot, schema: &CustomJsonSchema, errors: &mut Vec<PortViolation>) {
    for (name, property) in &schema.properties {
        if let Some(reason) = check_property(slot, property, schema) {
            errors.push(PortViolation::Disallowed {
                slot,
                field: name.clone(),
                reason,
            });
        }
    }
}

fn check_property(slot: Slot, property: &Property, schema: &CustomJsonSchema) -> Option<DisallowedReason> {
    match property.shape {
        DeclaredShape::Null => return Some(DisallowedReason::Null),
        DeclaredShape::Union if slot != Slot::Inputs => return Some(DisallowedReason::Union),
        _ => {}
    }

    let target = property.target().and_then(|name| schema.defs.get(name));
    match target {
        Some(Definition::Enum(_)) if slot == Slot::Outputs => return Some(DisallowedReason::Enum),
        Some(Definition::Model(_)) if slot == Slot::Outputs => {
            return Some(DisallowedReason::BareObject)
        }
        _ => {}
    }

    match property.port_type {
        PortType::Object if target.is_none() || slot == Slot::Outputs => {
            Some(DisallowedReason::BareObject)
        }
        PortType::Array => match &property.items {
            Some(items) => check_items(slot, items, schema),
            None => Some(DisallowedReason::UnknownArrayItems),
        },
        _ => None,
    }
}

fn check_items(slot: Slot, items: &Items, schema: &CustomJsonSchema) -> Option<DisallowedReason> {
    match items {
        Items::Ref(reference) => match schema.defs.get(&reference.name) {
            Some(Definition::Enum(_)) if slot == Slot::Outputs => Some(DisallowedReason::Enum),
            Some(Definition::Model(_)) if slot == Slot::Outputs => Some(DisallowedReason::BareObject),
            _ => None,
        },
        Items::Item(item) => match item.port_type {
            PortType::Any => Some(DisallowedReason::UnknownArrayItems),
            PortType::Array => match item.items.as_deref() {
                Some(nested) => check_items(slot, nested, schema),
                None => Some(DisallowedReason::UnknownArrayItems),
            },
            PortType::Object if slot == Slot::Outputs || item.properties.is_none() => {
                Some(DisallowedReason::BareObject)
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::SdkError;

    fn node_with(inputs: serde_json::Value, params: serde_json::Value, outputs: serde_json::Value) -> ToolkitNode {
        let mut node = ToolkitNode::new("probe", "Gate probe");
        node.set_schema(Slot::Inputs, &inputs).unwrap();
        node.set_schema(Slot::Params, &params).unwrap();
        node.set_schema(Slot::Outputs, &outputs).unwrap();
        node
    }

    fn empty() -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    #[test]
    fn test_valid_node() {
        let node = node_with(
            json!({"properties": {"text": {"type": "string"}}}),
            json!({
                "properties": {"mode": {"allOf": [{"$ref": "#/definitions/Mode"}]}},
                "definitions": {"Mode": {"type": "string", "enum": ["a", "b"]}}
            }),
            json!({"properties": {"result": {"type": "string"}}}),
        );
        assert!(validate_node(&node).is_empty());
        assert!(ensure_valid(&node).is_ok());
    }

    #[test]
    fn test_name_collision_across_slots() {
        let node = node_with(
            json!({"properties": {"text": {"type": "string"}}}),
            empty(),
            json!({"properties": {"text": {"type": "string"}}}),
        );
        assert_eq!(
            validate_node(&node),
            vec![PortViolation::Collision {
                field: "text".to_string(),
                first: Slot::Inputs,
                second: Slot::Outputs,
            }]
        );
    }

    #[test]
    fn test_bare_object_and_object_output() {
        let node = node_with(
            json!({"properties": {"blob": {"type": "object"}}}),
            empty(),
            json!({
                "properties": {"owner": {"$ref": "#/definitions/Person"}},
                "definitions": {"Person": {"type": "object", "properties": {"n": {"type": "string"}}}}
            }),
        );
        let errors = validate_node(&node);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            PortViolation::Disallowed { reason: DisallowedReason::BareObject, .. }
        )));
    }

    #[test]
    fn test_union_allowed_only_on_inputs() {
        let union = json!({"properties": {"either": {"anyOf": [{"type": "string"}, {"type": "integer"}]}}});
        let ok = node_with(union.clone(), empty(), empty());
        assert!(validate_node(&ok).is_empty());

        let bad = node_with(empty(), union, empty());
        assert!(matches!(
            validate_node(&bad).as_slice(),
            [PortViolation::Disallowed { slot: Slot::Params, reason: DisallowedReason::Union, .. }]
        ));
    }

    #[test]
    fn test_enum_output_and_null_port() {
        let node = node_with(
            json!({"properties": {"nothing": {"type": "null"}}}),
            empty(),
            json!({
                "properties": {"mode": {"allOf": [{"$ref": "Mode"}]}},
                "$defs": {"Mode": {"enum": ["a"]}}
            }),
        );
        let reasons: Vec<DisallowedReason> = validate_node(&node)
            .into_iter()
            .filter_map(|e| match e {
                PortViolation::Disallowed { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(reasons, vec![DisallowedReason::Null, DisallowedReason::Enum]);
    }

    #[test]
    fn test_untyped_array_items_at_depth() {
        let node = node_with(
            json!({"properties": {"grid": {"type": "array", "items": {"type": "array", "items": {}}}}}),
            empty(),
            empty(),
        );
        assert!(matches!(
            validate_node(&node).as_slice(),
            [PortViolation::Disallowed { reason: DisallowedReason::UnknownArrayItems, .. }]
        ));
    }

    #[test]
    fn test_ensure_valid_reports_first() {
        let node = node_with(
            json!({"properties": {"a": {"type": "object"}, "b": {"type": "null"}}}),
            empty(),
            empty(),
        );
        let err = ensure_valid(&node).unwrap_err();
        assert!(err.is_registration_error());
        assert!(matches!(
            err,
            SdkError::Port(PortViolation::Disallowed { ref field, .. }) if field == "a"
        ));
    }
}
