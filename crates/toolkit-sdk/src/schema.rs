//! Schema normalization
//!
//! Converts a model's raw JSON Schema into the canonical representation the
//! resolver works on: `Property`, `Item`, `Ref`, `EnumDef` and `ModelDef`.
//!
//! Both pydantic-style documents (`$defs`, bare ref names) and schemars-style
//! documents (`definitions`, `#/definitions/Name`) are accepted. Property
//! order follows the source document, which drives the field order shown in
//! the node editor.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::components::Component;
use crate::error::{Result, SdkError};
use crate::types::PortType;

/// A pointer to a named definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "ref", alias = "$ref")]
    pub name: String,
}

impl Ref {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An inline array element type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type", default = "any_port")]
    pub port_type: PortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Items>>,
    /// Fields of an inline object element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Property>>,
}

fn any_port() -> PortType {
    PortType::Any
}

impl Item {
    pub fn new(port_type: PortType) -> Self {
        Self {
            port_type,
            items: None,
            properties: None,
        }
    }
}

/// Element type of an array: inline, or a reference into the definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Ref(Ref),
    Item(Item),
}

/// How a property was declared, as far as the port gate cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaredShape {
    #[default]
    Plain,
    /// More than one non-null alternative
    Union,
    /// Only `null` is allowed
    Null,
}

/// One field of a schema before final resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Ref>>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub show: bool,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(skip)]
    pub shape: DeclaredShape,
}

impl Property {
    pub fn new(port_type: PortType) -> Self {
        Self {
            port_type,
            description: None,
            default: None,
            items: None,
            all_of: None,
            reference: None,
            show: true,
            required: true,
            component: None,
            shape: DeclaredShape::Plain,
        }
    }

    /// The definition this property points at, through `allOf` or `$ref`
    pub fn target(&self) -> Option<&str> {
        self.all_of
            .as_ref()
            .and_then(|refs| refs.first())
            .map(|r| r.name.as_str())
            .or(self.reference.as_deref())
    }
}

/// An enumerated field's declared type and allowed literals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(rename = "enum")]
    pub values: Vec<Value>,
}

/// A nested object's own fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub properties: IndexMap<String, Property>,
}

/// A named sub-schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Enum(EnumDef),
    Model(ModelDef),
}

/// Top-level container fed to the resolver
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomJsonSchema {
    pub properties: IndexMap<String, Property>,
    #[serde(rename = "$defs", default, skip_serializing_if = "IndexMap::is_empty")]
    pub defs: IndexMap<String, Definition>,
}

/// Normalize a raw JSON Schema document
pub fn normalize(raw: &Value) -> Result<CustomJsonSchema> {
    let root = raw
        .as_object()
        .ok_or_else(|| SdkError::schema("schema root must be an object"))?;

    let properties = normalize_properties(root, "schema root")?;

    let mut defs = IndexMap::new();
    for key in ["$defs", "definitions"] {
        let Some(section) = root.get(key) else {
            continue;
        };
        let section = section
            .as_object()
            .ok_or_else(|| SdkError::schema(format!("'{}' must be an object", key)))?;
        for (name, def) in section {
            defs.insert(name.clone(), normalize_definition(name, def)?);
        }
    }

    Ok(CustomJsonSchema { properties, defs })
}

fn normalize_properties(
    object: &Map<String, Value>,
    context: &str,
) -> Result<IndexMap<String, Property>> {
    let Some(properties) = object.get("properties") else {
        return Ok(IndexMap::new());
    };
    let properties = properties.as_object().ok_or_else(|| {
        SdkError::schema(format!("'properties' of {} must be an object", context))
    })?;

    let required: HashSet<&str> = match object.get("required") {
        None => HashSet::new(),
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        Some(_) => {
            return Err(SdkError::schema(format!(
                "'required' of {} must be an array",
                context
            )))
        }
    };

    let mut out = IndexMap::with_capacity(properties.len());
    for (name, value) in properties {
        let mut property = normalize_property(name, value)?;
        property.required = property.required && required.contains(name.as_str());
        out.insert(name.clone(), property);
    }
    Ok(out)
}

fn normalize_property(name: &str, value: &Value) -> Result<Property> {
    let object = value
        .as_object()
        .ok_or_else(|| SdkError::schema(format!("property '{}' must be a schema object", name)))?;

    let mut property = Property::new(PortType::Any);
    property.description = optional_str(object, "description", name)?;
    property.default = object.get("default").filter(|v| !v.is_null()).cloned();

    match object.get("show") {
        None => {}
        Some(Value::Bool(show)) => property.show = *show,
        Some(_) => {
            return Err(SdkError::schema(format!(
                "'show' of property '{}' must be a boolean",
                name
            )))
        }
    }

    if let Some(component) = object.get("component").filter(|v| !v.is_null()) {
        let component: Component = serde_json::from_value(component.clone()).map_err(|e| {
            SdkError::schema(format!("component of property '{}' is invalid: {}", name, e))
        })?;
        property.component = Some(component);
    }

    // `Option<T>` arrives as `anyOf: [T, null]`; the non-null branch carries the shape.
    let mut core = object;
    if let Some(any_of) = object.get("anyOf") {
        let branches = any_of.as_array().ok_or_else(|| {
            SdkError::schema(format!("'anyOf' of property '{}' must be an array", name))
        })?;
        let non_null: Vec<&Map<String, Value>> = branches
            .iter()
            .filter_map(Value::as_object)
            .filter(|branch| !is_null_schema(branch))
            .collect();
        if non_null.len() < branches.len() {
            property.required = false;
        }
        match non_null.as_slice() {
            [] => property.shape = DeclaredShape::Null,
            [single] => core = *single,
            _ => property.shape = DeclaredShape::Union,
        }
        if property.description.is_none() {
            property.description = optional_str(core, "description", name)?;
        }
    }

    if property.shape == DeclaredShape::Plain {
        let (port_type, nullable, shape) = classify_type(core, name)?;
        property.port_type = port_type;
        property.shape = shape;
        if nullable {
            property.required = false;
        }

        property.reference = match core.get("$ref") {
            None => None,
            Some(Value::String(target)) => Some(ref_name(target).to_string()),
            Some(_) => {
                return Err(SdkError::schema(format!(
                    "'$ref' of property '{}' must be a string",
                    name
                )))
            }
        };

        if let Some(all_of) = core.get("allOf") {
            if property.reference.is_some() {
                return Err(SdkError::schema(format!(
                    "property '{}' declares both '$ref' and 'allOf'",
                    name
                )));
            }
            property.all_of = Some(normalize_all_of(all_of, name)?);
        }

        property.items = match (core.get("items"), core.get("prefixItems")) {
            (Some(Value::Object(items)), _) => Some(normalize_items(items, name)?),
            (Some(Value::Array(_)), _) | (None, Some(_)) => {
                return Err(SdkError::resolution(format!(
                    "array field '{}' declares positional items; a single item type is required",
                    name
                )))
            }
            (Some(_), _) => {
                return Err(SdkError::schema(format!(
                    "'items' of property '{}' must be a schema object",
                    name
                )))
            }
            (None, None) => None,
        };
    }

    Ok(property)
}

fn normalize_all_of(all_of: &Value, name: &str) -> Result<Vec<Ref>> {
    let entries = all_of
        .as_array()
        .ok_or_else(|| SdkError::schema(format!("'allOf' of property '{}' must be an array", name)))?;
    if entries.len() != 1 {
        return Err(SdkError::schema(format!(
            "'allOf' of property '{}' must hold exactly one reference, found {}",
            name,
            entries.len()
        )));
    }
    entries
        .iter()
        .map(|entry| {
            entry
                .get("$ref")
                .and_then(Value::as_str)
                .map(|target| Ref::new(ref_name(target)))
                .ok_or_else(|| {
                    SdkError::schema(format!(
                        "'allOf' of property '{}' may only contain references",
                        name
                    ))
                })
        })
        .collect()
}

fn normalize_items(items: &Map<String, Value>, name: &str) -> Result<Items> {
    if let Some(target) = items.get("$ref") {
        let target = target.as_str().ok_or_else(|| {
            SdkError::schema(format!("item '$ref' of property '{}' must be a string", name))
        })?;
        return Ok(Items::Ref(Ref::new(ref_name(target))));
    }

    // `Vec<Option<T>>`: look through the nullable wrapper
    if let Some(Value::Array(branches)) = items.get("anyOf") {
        let non_null: Vec<&Map<String, Value>> = branches
            .iter()
            .filter_map(Value::as_object)
            .filter(|branch| !is_null_schema(branch))
            .collect();
        if let [single] = non_null.as_slice() {
            return normalize_items(single, name);
        }
        return Ok(Items::Item(Item::new(PortType::Any)));
    }

    let (port_type, _, _) = classify_type(items, name)?;
    let mut item = Item::new(port_type);
    item.items = match items.get("items") {
        Some(Value::Object(nested)) => Some(Box::new(normalize_items(nested, name)?)),
        Some(Value::Array(_)) => {
            return Err(SdkError::resolution(format!(
                "nested array in field '{}' declares positional items",
                name
            )))
        }
        Some(_) => {
            return Err(SdkError::schema(format!(
                "nested 'items' of property '{}' must be a schema object",
                name
            )))
        }
        None => None,
    };
    if items.contains_key("properties") {
        item.properties = Some(normalize_properties(items, name)?);
    }
    Ok(Items::Item(item))
}

fn normalize_definition(name: &str, value: &Value) -> Result<Definition> {
    let object = value
        .as_object()
        .ok_or_else(|| SdkError::schema(format!("definition '{}' must be an object", name)))?;

    if let Some(values) = enum_values(object) {
        let values = values?;
        for value in &values {
            if !(value.is_string() || value.is_number()) {
                return Err(SdkError::schema(format!(
                    "enum '{}' may only hold strings and numbers, found {}",
                    name, value
                )));
            }
        }
        let declared = match object.get("type") {
            Some(_) => classify_type(object, name)?.0,
            None => PortType::Any,
        };
        let port_type = match declared {
            PortType::Any => infer_literal_type(&values),
            declared => declared,
        };
        return Ok(Definition::Enum(EnumDef { port_type, values }));
    }

    if object.contains_key("properties") || object.get("type").and_then(Value::as_str) == Some("object") {
        return Ok(Definition::Model(ModelDef {
            properties: normalize_properties(object, name)?,
        }));
    }

    Err(SdkError::schema(format!(
        "definition '{}' is neither an enum nor an object model",
        name
    )))
}

/// Literal values of an enum definition.
///
/// Plain `enum` lists are the common case; documented variants arrive as a
/// `oneOf` whose branches each pin a single value.
fn enum_values(object: &Map<String, Value>) -> Option<Result<Vec<Value>>> {
    if let Some(values) = object.get("enum") {
        return Some(
            values
                .as_array()
                .cloned()
                .ok_or_else(|| SdkError::schema("'enum' must be an array")),
        );
    }

    let branches = object.get("oneOf")?.as_array()?;
    let mut values = Vec::with_capacity(branches.len());
    for branch in branches {
        let literal = branch
            .get("const")
            .or_else(|| match branch.get("enum").and_then(Value::as_array) {
                Some(single) if single.len() == 1 => single.first(),
                _ => None,
            })?;
        values.push(literal.clone());
    }
    Some(Ok(values))
}

fn infer_literal_type(values: &[Value]) -> PortType {
    if values.iter().all(Value::is_string) {
        PortType::String
    } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        PortType::Integer
    } else if values.iter().all(Value::is_number) {
        PortType::Number
    } else {
        PortType::Any
    }
}

/// Classify the `type` keyword, which may be a string or a list of strings.
///
/// Returns the port type, whether `null` was among the alternatives, and the
/// declared shape.
fn classify_type(object: &Map<String, Value>, name: &str) -> Result<(PortType, bool, DeclaredShape)> {
    match object.get("type") {
        None => Ok((PortType::Any, false, DeclaredShape::Plain)),
        Some(Value::String(keyword)) if keyword == "null" => {
            Ok((PortType::Any, true, DeclaredShape::Null))
        }
        Some(Value::String(keyword)) => Ok((
            PortType::classify(Some(keyword)),
            false,
            DeclaredShape::Plain,
        )),
        Some(Value::Array(keywords)) => {
            let mut nullable = false;
            let mut rest = Vec::with_capacity(keywords.len());
            for keyword in keywords {
                match keyword.as_str() {
                    Some("null") => nullable = true,
                    Some(other) => rest.push(other),
                    None => {
                        return Err(SdkError::schema(format!(
                            "'type' of property '{}' must hold strings",
                            name
                        )))
                    }
                }
            }
            Ok(match rest.as_slice() {
                [] => (PortType::Any, nullable, DeclaredShape::Null),
                [single] => (PortType::classify(Some(*single)), nullable, DeclaredShape::Plain),
                _ => (PortType::Any, nullable, DeclaredShape::Union),
            })
        }
        Some(_) => Err(SdkError::schema(format!(
            "'type' of property '{}' must be a string or a list of strings",
            name
        ))),
    }
}

fn is_null_schema(schema: &Map<String, Value>) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn optional_str(object: &Map<String, Value>, key: &str, name: &str) -> Result<Option<String>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SdkError::schema(format!(
            "'{}' of property '{}' must be a string",
            key, name
        ))),
    }
}

/// `#/definitions/Mode`, `#/$defs/Mode` and `Mode` all name `Mode`
fn ref_name(target: &str) -> &str {
    target.rsplit('/').next().unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::components::ComponentKind;

    #[test]
    fn test_scalar_properties_keep_declaration_order() {
        let raw = json!({
            "type": "object",
            "required": ["zeta", "alpha"],
            "properties": {
                "zeta": {"type": "integer", "description": "Last letter"},
                "alpha": {"type": "string"},
                "middle": {"type": "boolean", "default": true}
            }
        });

        let schema = normalize(&raw).unwrap();
        let names: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "middle"]);

        let zeta = &schema.properties["zeta"];
        assert_eq!(zeta.port_type, PortType::Integer);
        assert_eq!(zeta.description.as_deref(), Some("Last letter"));
        assert!(zeta.required);

        let middle = &schema.properties["middle"];
        assert!(!middle.required);
        assert_eq!(middle.default, Some(json!(true)));
    }

    #[test]
    fn test_schemars_style_refs_and_definitions() {
        let raw = json!({
            "properties": {
                "mode": {"description": "How to replace", "allOf": [{"$ref": "#/definitions/Mode"}]},
                "owner": {"$ref": "#/definitions/Person"}
            },
            "definitions": {
                "Mode": {"type": "string", "enum": ["replaceAll", "replaceFirst"]},
                "Person": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}, "age": {"type": ["integer", "null"]}}
                }
            }
        });

        let schema = normalize(&raw).unwrap();
        assert_eq!(schema.properties["mode"].target(), Some("Mode"));
        assert_eq!(schema.properties["owner"].reference.as_deref(), Some("Person"));

        match &schema.defs["Mode"] {
            Definition::Enum(def) => {
                assert_eq!(def.port_type, PortType::String);
                assert_eq!(def.values, vec![json!("replaceAll"), json!("replaceFirst")]);
            }
            other => panic!("expected enum, got {:?}", other),
        }
        match &schema.defs["Person"] {
            Definition::Model(def) => {
                assert!(def.properties["name"].required);
                assert!(!def.properties["age"].required);
                assert_eq!(def.properties["age"].port_type, PortType::Integer);
            }
            other => panic!("expected model, got {:?}", other),
        }
    }

    #[test]
    fn test_pydantic_style_defs_with_bare_names() {
        let raw = json!({
            "properties": {"choice": {"allOf": [{"$ref": "Choice"}]}},
            "$defs": {"Choice": {"enum": [1, 2, 3]}}
        });

        let schema = normalize(&raw).unwrap();
        assert_eq!(schema.properties["choice"].target(), Some("Choice"));
        match &schema.defs["Choice"] {
            Definition::Enum(def) => assert_eq!(def.port_type, PortType::Integer),
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_documented_enum_variants_via_one_of() {
        let raw = json!({
            "properties": {},
            "definitions": {
                "Speed": {"oneOf": [
                    {"description": "Slow", "type": "string", "enum": ["slow"]},
                    {"description": "Fast", "type": "string", "const": "fast"}
                ]}
            }
        });

        let schema = normalize(&raw).unwrap();
        match &schema.defs["Speed"] {
            Definition::Enum(def) => {
                assert_eq!(def.port_type, PortType::String);
                assert_eq!(def.values, vec![json!("slow"), json!("fast")]);
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_via_any_of_null() {
        let raw = json!({
            "required": ["owner"],
            "properties": {
                "owner": {
                    "description": "Optional owner",
                    "anyOf": [{"$ref": "#/definitions/Person"}, {"type": "null"}]
                }
            },
            "definitions": {"Person": {"type": "object", "properties": {}}}
        });

        let schema = normalize(&raw).unwrap();
        let owner = &schema.properties["owner"];
        assert!(!owner.required);
        assert_eq!(owner.reference.as_deref(), Some("Person"));
        assert_eq!(owner.shape, DeclaredShape::Plain);
    }

    #[test]
    fn test_union_and_null_shapes() {
        let raw = json!({
            "properties": {
                "either": {"anyOf": [{"type": "string"}, {"type": "integer"}]},
                "nothing": {"type": "null"},
                "mixed": {"type": ["string", "number"]}
            }
        });

        let schema = normalize(&raw).unwrap();
        assert_eq!(schema.properties["either"].shape, DeclaredShape::Union);
        assert_eq!(schema.properties["either"].port_type, PortType::Any);
        assert_eq!(schema.properties["nothing"].shape, DeclaredShape::Null);
        assert_eq!(schema.properties["mixed"].shape, DeclaredShape::Union);
    }

    #[test]
    fn test_array_items() {
        let raw = json!({
            "properties": {
                "matrix": {"type": "array", "items": {"type": "array", "items": {"type": "number"}}},
                "people": {"type": "array", "items": {"$ref": "#/definitions/Person"}},
                "points": {"type": "array", "items": {
                    "type": "object",
                    "properties": {"x": {"type": "number"}}
                }}
            }
        });

        let schema = normalize(&raw).unwrap();
        match &schema.properties["matrix"].items {
            Some(Items::Item(outer)) => {
                assert_eq!(outer.port_type, PortType::Array);
                assert_eq!(
                    outer.items.as_deref(),
                    Some(&Items::Item(Item::new(PortType::Number)))
                );
            }
            other => panic!("unexpected items {:?}", other),
        }
        assert_eq!(
            schema.properties["people"].items,
            Some(Items::Ref(Ref::new("Person")))
        );
        match &schema.properties["points"].items {
            Some(Items::Item(item)) => {
                let fields = item.properties.as_ref().unwrap();
                assert_eq!(fields["x"].port_type, PortType::Number);
            }
            other => panic!("unexpected items {:?}", other),
        }
    }

    #[test]
    fn test_explicit_component_and_hidden_flag() {
        let raw = json!({
            "properties": {
                "volume": {
                    "type": "integer",
                    "show": false,
                    "component": {"name": "Slider", "leq": 10, "geq": 0}
                }
            }
        });

        let schema = normalize(&raw).unwrap();
        let volume = &schema.properties["volume"];
        assert!(!volume.show);
        assert_eq!(
            volume.component.as_ref().map(|c| &c.kind),
            Some(&ComponentKind::Slider {
                leq: 10,
                geq: 0,
                step: 1.0
            })
        );
    }

    #[test]
    fn test_conflicting_keywords_are_rejected() {
        let both = json!({"properties": {"x": {
            "$ref": "#/definitions/A",
            "allOf": [{"$ref": "#/definitions/A"}]
        }}});
        assert!(matches!(normalize(&both), Err(SdkError::SchemaValidation(_))));

        let two = json!({"properties": {"x": {"allOf": [{"$ref": "A"}, {"$ref": "B"}]}}});
        assert!(matches!(normalize(&two), Err(SdkError::SchemaValidation(_))));

        let inline = json!({"properties": {"x": {"allOf": [{"type": "string"}]}}});
        assert!(matches!(normalize(&inline), Err(SdkError::SchemaValidation(_))));

        let bad_component = json!({"properties": {"x": {"type": "string", "component": {"name": "Nope"}}}});
        assert!(matches!(normalize(&bad_component), Err(SdkError::SchemaValidation(_))));

        assert!(matches!(normalize(&json!([])), Err(SdkError::SchemaValidation(_))));
    }

    #[test]
    fn test_positional_items_are_unresolvable() {
        let tuple = json!({"properties": {"pair": {
            "type": "array",
            "items": [{"type": "string"}, {"type": "integer"}]
        }}});
        assert!(matches!(normalize(&tuple), Err(SdkError::SchemaResolution(_))));

        let prefix = json!({"properties": {"pair": {
            "type": "array",
            "prefixItems": [{"type": "string"}]
        }}});
        assert!(matches!(normalize(&prefix), Err(SdkError::SchemaResolution(_))));
    }

    #[test]
    fn test_storage_types_classify() {
        let raw = json!({"properties": {
            "photo": {"type": "image"},
            "maybe_clip": {"anyOf": [{"type": "video"}, {"type": "null"}]}
        }});
        let schema = normalize(&raw).unwrap();
        assert_eq!(schema.properties["photo"].port_type, PortType::Image);
        assert_eq!(schema.properties["maybe_clip"].port_type, PortType::Video);
        assert!(!schema.properties["maybe_clip"].required);
    }
}
