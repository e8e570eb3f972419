//! UI component descriptors attached to ports
//!
//! A `Component` tells the node editor which widget to render for a port.
//! Components serialize as a flat JSON object whose `name` field is the
//! variant tag (`"Toggle"`, `"Slider"`, ...); decoding dispatches on that
//! tag and rejects unknown or missing tags.
//!
//! Composite widgets (`ComplexComponent`, `ListComponent`) embed further
//! components, so the type is recursive through `SubField` and `Box`.

use serde::{Deserialize, Serialize};

use crate::ext::{Ext, AUDIO_PICKER_EXTS, IMAGE_PICKER_EXTS, PDF_PICKER_EXTS, VIDEO_PICKER_EXTS};
use crate::naming::to_display_name;
use crate::types::PortType;

/// A UI widget descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(flatten)]
    pub kind: ComponentKind,
    /// When set the UI renders the widget read-only
    #[serde(default)]
    pub freezed: bool,
}

/// The closed set of widget variants, tagged by `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum ComponentKind {
    Blank,
    Toggle,
    Slider {
        leq: i64,
        geq: i64,
        #[serde(default = "default_slider_step")]
        step: f64,
    },
    Select {
        choices: Vec<SelectChoice>,
    },
    /// A select whose choices are refreshed through a registered callback
    RefreshableSelect {
        choices: Vec<SelectChoice>,
        callback_id: String,
    },
    Search {
        placeholder: String,
        #[serde(default)]
        results: Vec<String>,
    },
    TextField {
        placeholder: String,
        #[serde(default)]
        multiline: bool,
        #[serde(default)]
        secret: bool,
    },
    NumberField {
        placeholder: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        leq: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        geq: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    StorageSelect {
        supported_ext: Vec<Ext>,
    },
    ImagePreview,
    VideoPreview,
    TextPreview,
    #[serde(rename = "PDFPreview")]
    PdfPreview,
    AudioPreview,
    ButtonComponent {
        text: String,
    },
    ComplexComponent {
        fields: Vec<SubField>,
    },
    ListComponent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_component: Option<Box<Component>>,
    },
}

fn default_slider_step() -> f64 {
    1.0
}

impl ComponentKind {
    /// The discriminator written to the `name` field
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Blank => "Blank",
            ComponentKind::Toggle => "Toggle",
            ComponentKind::Slider { .. } => "Slider",
            ComponentKind::Select { .. } => "Select",
            ComponentKind::RefreshableSelect { .. } => "RefreshableSelect",
            ComponentKind::Search { .. } => "Search",
            ComponentKind::TextField { .. } => "TextField",
            ComponentKind::NumberField { .. } => "NumberField",
            ComponentKind::StorageSelect { .. } => "StorageSelect",
            ComponentKind::ImagePreview => "ImagePreview",
            ComponentKind::VideoPreview => "VideoPreview",
            ComponentKind::TextPreview => "TextPreview",
            ComponentKind::PdfPreview => "PDFPreview",
            ComponentKind::AudioPreview => "AudioPreview",
            ComponentKind::ButtonComponent { .. } => "ButtonComponent",
            ComponentKind::ComplexComponent { .. } => "ComplexComponent",
            ComponentKind::ListComponent { .. } => "ListComponent",
        }
    }
}

impl From<ComponentKind> for Component {
    fn from(kind: ComponentKind) -> Self {
        Self {
            kind,
            freezed: false,
        }
    }
}

impl Component {
    /// The variant tag, e.g. `"NumberField"`
    pub fn name(&self) -> &'static str {
        self.kind.tag()
    }

    /// Render this widget read-only
    pub fn freezed(mut self) -> Self {
        self.freezed = true;
        self
    }

    pub fn blank() -> Self {
        ComponentKind::Blank.into()
    }

    pub fn toggle() -> Self {
        ComponentKind::Toggle.into()
    }

    pub fn slider(geq: i64, leq: i64, step: f64) -> Self {
        ComponentKind::Slider { leq, geq, step }.into()
    }

    pub fn select(choices: Vec<SelectChoice>) -> Self {
        ComponentKind::Select { choices }.into()
    }

    pub fn text_field(placeholder: impl Into<String>) -> Self {
        ComponentKind::TextField {
            placeholder: placeholder.into(),
            multiline: false,
            secret: false,
        }
        .into()
    }

    pub fn number_field(placeholder: impl Into<String>) -> Self {
        ComponentKind::NumberField {
            placeholder: placeholder.into(),
            leq: None,
            geq: None,
            step: None,
        }
        .into()
    }

    pub fn storage_select(supported_ext: &[Ext]) -> Self {
        ComponentKind::StorageSelect {
            supported_ext: supported_ext.to_vec(),
        }
        .into()
    }

    pub fn complex(fields: Vec<SubField>) -> Self {
        ComponentKind::ComplexComponent { fields }.into()
    }

    pub fn list(item_component: Component) -> Self {
        ComponentKind::ListComponent {
            item_component: Some(Box::new(item_component)),
        }
        .into()
    }
}

/// A literal value offered by a select widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ChoiceValue {
    /// Convert an enum literal from a schema; only strings and numbers qualify
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(ChoiceValue::Text(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(ChoiceValue::Integer)
                .or_else(|| n.as_f64().map(ChoiceValue::Float)),
            _ => None,
        }
    }
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        ChoiceValue::Text(value.to_string())
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        ChoiceValue::Integer(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        ChoiceValue::Float(value)
    }
}

/// One entry of a select widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectChoice {
    pub label: ChoiceValue,
    pub value: ChoiceValue,
}

impl SelectChoice {
    /// A choice labelled with its own value
    pub fn literal(value: impl Into<ChoiceValue>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// A nested field shown inside a `ComplexComponent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubField {
    #[serde(rename = "type")]
    pub port_type: PortType,
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
}

impl SubField {
    pub fn new(
        name: impl Into<String>,
        port_type: PortType,
        description: impl Into<String>,
        component: Option<Component>,
    ) -> Self {
        let name = name.into();
        Self {
            port_type,
            display_name: to_display_name(&name),
            name,
            description: description.into(),
            component,
        }
    }
}

/// The widget a port gets when its author did not choose one
pub fn default_component(port_type: PortType) -> Component {
    match port_type {
        PortType::Integer | PortType::Number => Component::number_field("Number field."),
        PortType::Boolean => Component::toggle(),
        PortType::String => Component::text_field("Text field."),
        PortType::Image => Component::storage_select(IMAGE_PICKER_EXTS),
        PortType::Video => Component::storage_select(VIDEO_PICKER_EXTS),
        PortType::Audio => Component::storage_select(AUDIO_PICKER_EXTS),
        PortType::Pdf => Component::storage_select(PDF_PICKER_EXTS),
        PortType::Array | PortType::Object | PortType::Any | PortType::Csv => Component::blank(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_component_is_total() {
        for port_type in PortType::ALL {
            let component = default_component(port_type);
            assert!(!component.freezed);
            assert!(!component.name().is_empty());
        }
    }

    #[test]
    fn test_default_component_table() {
        assert_eq!(default_component(PortType::Integer).name(), "NumberField");
        assert_eq!(default_component(PortType::Number).name(), "NumberField");
        assert_eq!(default_component(PortType::Boolean).name(), "Toggle");
        assert_eq!(default_component(PortType::String).name(), "TextField");
        assert_eq!(default_component(PortType::Csv).name(), "Blank");
        assert_eq!(default_component(PortType::Array).name(), "Blank");

        match default_component(PortType::Pdf).kind {
            ComponentKind::StorageSelect { supported_ext } => {
                assert_eq!(supported_ext, vec![Ext::Pdf])
            }
            other => panic!("unexpected component {:?}", other),
        }
    }

    #[test]
    fn test_flat_encoding_with_name_tag() {
        let json = serde_json::to_value(Component::slider(0, 100, 5.0)).unwrap();
        assert_eq!(
            json,
            json!({"name": "Slider", "leq": 100, "geq": 0, "step": 5.0, "freezed": false})
        );

        let json = serde_json::to_value(Component::toggle().freezed()).unwrap();
        assert_eq!(json, json!({"name": "Toggle", "freezed": true}));
    }

    #[test]
    fn test_decode_dispatches_on_name() {
        let component: Component = serde_json::from_value(json!({
            "name": "TextField",
            "placeholder": "Type here",
            "secret": true
        }))
        .unwrap();
        assert!(!component.freezed);
        assert_eq!(
            component.kind,
            ComponentKind::TextField {
                placeholder: "Type here".to_string(),
                multiline: false,
                secret: true,
            }
        );

        let preview: Component = serde_json::from_value(json!({"name": "PDFPreview"})).unwrap();
        assert_eq!(preview.kind, ComponentKind::PdfPreview);
    }

    #[test]
    fn test_decode_rejects_unknown_or_missing_tag() {
        assert!(serde_json::from_value::<Component>(json!({"name": "ColorPicker"})).is_err());
        assert!(serde_json::from_value::<Component>(json!({"placeholder": "x"})).is_err());
    }

    #[test]
    fn test_nested_list_of_complex() {
        let inner = Component::complex(vec![SubField::new(
            "first_name",
            PortType::String,
            "Given name",
            Some(default_component(PortType::String)),
        )]);
        let list = Component::list(inner);

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["name"], "ListComponent");
        assert_eq!(json["item_component"]["name"], "ComplexComponent");
        assert_eq!(
            json["item_component"]["fields"][0]["display_name"],
            "First Name"
        );

        let decoded: Component = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_choice_values() {
        let select = Component::select(vec![
            SelectChoice::literal("fast"),
            SelectChoice::literal(3_i64),
            SelectChoice::literal(0.5),
        ]);
        let json = serde_json::to_value(&select).unwrap();
        assert_eq!(json["choices"][0], json!({"label": "fast", "value": "fast"}));
        assert_eq!(json["choices"][1]["value"], 3);

        assert_eq!(
            ChoiceValue::from_json(&json!(2)),
            Some(ChoiceValue::Integer(2))
        );
        assert_eq!(ChoiceValue::from_json(&json!(null)), None);
    }
}
