//! Schema-to-metadata resolution
//!
//! Walks a normalized schema and fills in what the normalizer could not know
//! locally: the concrete type of every `$ref`/`allOf` property and, when
//! requested, the UI component of every field.
//!
//! Resolution rules, in order:
//! 1. An enum target makes the field a `Select` of its literals.
//! 2. A model target makes the field an object with a `ComplexComponent`
//!    built from the model's fields, recursively.
//! 3. An array field gets a `ListComponent` wrapping the component of its
//!    item type; nested arrays and object items recurse depth-first.
//! 4. Explicit components are never replaced; anything left without one
//!    gets the default for its type.

use indexmap::IndexMap;

use crate::components::{default_component, ChoiceValue, Component, SelectChoice, SubField};
use crate::error::{Result, SdkError};
use crate::schema::{CustomJsonSchema, Definition, EnumDef, Items, ModelDef, Property};
use crate::types::PortType;

/// Resolve every property of `schema`.
///
/// With `with_components` unset the types are still finalized and every
/// reference is still checked, but no component is attached.
pub fn resolve(schema: CustomJsonSchema, with_components: bool) -> Result<CustomJsonSchema> {
    let CustomJsonSchema {
        mut properties,
        defs,
    } = schema;

    let resolver = Resolver {
        defs: &defs,
        with_components,
    };
    let mut stack = Vec::new();
    for (name, property) in properties.iter_mut() {
        resolver.resolve_property(name, property, &mut stack)?;
    }

    Ok(CustomJsonSchema { properties, defs })
}

#[derive(Clone, Copy)]
struct Resolver<'a> {
    defs: &'a IndexMap<String, Definition>,
    with_components: bool,
}

impl<'a> Resolver<'a> {
    fn lookup(&self, target: &str, field: &str) -> Result<&'a Definition> {
        self.defs.get(target).ok_or_else(|| {
            SdkError::resolution(format!(
                "field '{}' refers to '{}', which is not defined",
                field, target
            ))
        })
    }

    /// `stack` holds the model definitions currently being expanded.
    fn resolve_property(
        &self,
        name: &str,
        property: &mut Property,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        let mut synthesized = None;

        if let Some(target) = property.target().map(str::to_string) {
            match self.lookup(&target, name)? {
                Definition::Enum(def) => {
                    property.port_type = def.port_type;
                    synthesized = Some(select_for(def));
                }
                Definition::Model(def) => {
                    property.port_type = PortType::Object;
                    synthesized = Some(self.complex_for(&target, def, stack)?);
                }
            }
        }

        if property.port_type == PortType::Array {
            let items = property.items.as_ref().ok_or_else(|| SdkError::FieldConstraint {
                field: name.to_string(),
                reason: "array fields must declare an item type".to_string(),
            })?;
            synthesized = Some(Component::list(self.item_component(name, items, stack)?));
        }

        if self.with_components && property.component.is_none() {
            property.component =
                Some(synthesized.unwrap_or_else(|| default_component(property.port_type)));
        }
        Ok(())
    }

    fn item_component(&self, field: &str, items: &Items, stack: &mut Vec<String>) -> Result<Component> {
        match items {
            Items::Ref(reference) => match self.lookup(&reference.name, field)? {
                Definition::Enum(def) => Ok(select_for(def)),
                Definition::Model(def) => self.complex_for(&reference.name, def, stack),
            },
            Items::Item(item) => match item.port_type {
                PortType::Array => {
                    let nested = item.items.as_deref().ok_or_else(|| {
                        SdkError::resolution(format!(
                            "nested array in field '{}' has no item type",
                            field
                        ))
                    })?;
                    Ok(Component::list(self.item_component(field, nested, stack)?))
                }
                PortType::Object => match &item.properties {
                    Some(properties) => self.complex_from(properties, stack),
                    None => Ok(default_component(PortType::Object)),
                },
                scalar => Ok(default_component(scalar)),
            },
        }
    }

    fn complex_for(&self, target: &str, def: &ModelDef, stack: &mut Vec<String>) -> Result<Component> {
        if stack.iter().any(|open| open == target) {
            return Err(SdkError::resolution(format!(
                "definition '{}' contains itself",
                target
            )));
        }
        stack.push(target.to_string());
        let component = self.complex_from(&def.properties, stack);
        stack.pop();
        component
    }

    fn complex_from(
        &self,
        properties: &IndexMap<String, Property>,
        stack: &mut Vec<String>,
    ) -> Result<Component> {
        // Sub-fields always carry a component, whatever the outer mode.
        let nested = Resolver {
            with_components: true,
            ..*self
        };

        let mut fields = Vec::with_capacity(properties.len());
        for (name, property) in properties {
            let mut property = property.clone();
            nested.resolve_property(name, &mut property, stack)?;
            fields.push(SubField::new(
                name.as_str(),
                property.port_type,
                property.description.unwrap_or_default(),
                property.component,
            ));
        }
        Ok(Component::complex(fields))
    }
}

fn select_for(def: &EnumDef) -> Component {
    Component::select(
        def.values
            .iter()
            .filter_map(ChoiceValue::from_json)
            .map(SelectChoice::literal)
            .collect(),
    )
}
