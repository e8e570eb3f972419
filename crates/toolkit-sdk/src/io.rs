//! Storage-backed port values
//!
//! `Image`, `Audio`, `Video`, `Pdf` and `Csv` hold the name of an object in
//! blob storage, always `<uuid>.<ext>` with an extension allowed for the
//! kind. On the wire they are the bare file name; in schemas they are
//! `{"type": "<kind>"}`, which classifies to the matching port type.

use std::fmt;

use async_trait::async_trait;
use schemars::gen::SchemaGenerator;
use schemars::schema::{Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Result, SdkError};
use crate::ext::Ext;
use crate::storage::StorageClient;
use crate::types::PortType;

const FALLBACK_MIMETYPE: &str = "application/octet-stream";

/// A value whose bytes live in blob storage
#[async_trait]
pub trait StorageObject: Sized + Send + Sync {
    const PORT_TYPE: PortType;
    const ALLOWED_EXTS: &'static [Ext];

    #[doc(hidden)]
    fn from_name_unchecked(file_name: String) -> Self;

    fn file_name(&self) -> &str;

    #[doc(hidden)]
    fn set_file_name(&mut self, file_name: String);

    /// A fresh object name with a random UUID
    fn new(ext: Ext) -> Result<Self> {
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        if !Self::ALLOWED_EXTS.contains(&ext) {
            return Err(not_allowed(&file_name, ext));
        }
        Ok(Self::from_name_unchecked(file_name))
    }

    /// Wrap an existing object name after checking its shape
    fn from_file_name(file_name: &str) -> Result<Self> {
        parse_object_name(file_name, Self::ALLOWED_EXTS)?;
        Ok(Self::from_name_unchecked(file_name.to_string()))
    }

    fn ext(&self) -> Result<Ext> {
        parse_object_name(self.file_name(), Self::ALLOWED_EXTS)
    }

    /// Upload `data`; the object takes the name the service stored it under
    async fn save(&mut self, client: &StorageClient, data: Vec<u8>) -> Result<()> {
        let mimetype = self.ext()?.mimetype().unwrap_or(FALLBACK_MIMETYPE);
        let stored = client.post(self.file_name(), data, mimetype).await?;
        log::debug!("Stored {} as '{}'", Self::PORT_TYPE, stored);
        self.set_file_name(stored);
        Ok(())
    }

    /// Download the object's bytes
    async fn get_data(&self, client: &StorageClient) -> Result<Vec<u8>> {
        client.get(self.file_name()).await
    }
}

fn parse_object_name(file_name: &str, allowed: &[Ext]) -> Result<Ext> {
    let invalid = |reason: String| SdkError::InvalidObjectName {
        name: file_name.to_string(),
        reason,
    };

    let (stem, ext) = file_name
        .rsplit_once('.')
        .ok_or_else(|| invalid("missing extension".to_string()))?;
    Uuid::parse_str(stem).map_err(|_| invalid("name is not a UUID".to_string()))?;
    let ext: Ext = ext.parse().map_err(invalid)?;
    if !allowed.contains(&ext) {
        return Err(not_allowed(file_name, ext));
    }
    Ok(ext)
}

fn not_allowed(file_name: &str, ext: Ext) -> SdkError {
    SdkError::InvalidObjectName {
        name: file_name.to_string(),
        reason: format!("extension '{}' is not allowed for this kind of object", ext),
    }
}

fn storage_schema(port_type: PortType) -> Schema {
    let mut schema = SchemaObject::default();
    schema.extensions.insert(
        "type".to_string(),
        serde_json::Value::String(port_type.as_str().to_string()),
    );
    schema.into()
}

macro_rules! storage_object {
    ($(#[$doc:meta])* $name:ident, $port:expr, [$($ext:ident),+ $(,)?]) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            file_name: String,
        }

        impl StorageObject for $name {
            const PORT_TYPE: PortType = $port;
            const ALLOWED_EXTS: &'static [Ext] = &[$(Ext::$ext),+];

            fn from_name_unchecked(file_name: String) -> Self {
                Self { file_name }
            }

            fn file_name(&self) -> &str {
                &self.file_name
            }

            fn set_file_name(&mut self, file_name: String) {
                self.file_name = file_name;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.file_name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.file_name)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let file_name = String::deserialize(deserializer)?;
                <$name as StorageObject>::from_file_name(&file_name).map_err(serde::de::Error::custom)
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> String {
                stringify!($name).to_string()
            }

            fn is_referenceable() -> bool {
                false
            }

            fn json_schema(_: &mut SchemaGenerator) -> Schema {
                storage_schema($port)
            }
        }
    };
}

storage_object!(
    /// An image in blob storage
    Image,
    PortType::Image,
    [Png, Jpeg, Mpeg, Tiff, Tif, Bmp, Jp2, Dib, Pgm, Ppm, Pnm, Ras, Hdr, Webp, Jpg]
);

storage_object!(
    /// An audio clip in blob storage
    Audio,
    PortType::Audio,
    [Mp3, Webm, Wav]
);

storage_object!(
    /// A video in blob storage
    Video,
    PortType::Video,
    [Mp4, Webm, Avi, Mkv, Mov, Wmv, Gif]
);

storage_object!(
    /// A PDF document in blob storage
    Pdf,
    PortType::Pdf,
    [Pdf]
);

storage_object!(
    /// A CSV table in blob storage
    Csv,
    PortType::Csv,
    [Csv]
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::components::ComponentKind;
    use crate::model::PortModel;
    use crate::node::ToolkitNode;

    const NAME: &str = "6f1c1e0e-6a43-4b63-9a43-0b5a5d1f8a11";

    #[derive(Serialize, Deserialize, JsonSchema)]
    struct MediaInputs {
        photo: Image,
        clip: Option<Video>,
        pages: Vec<Pdf>,
    }
    impl PortModel for MediaInputs {}

    #[test]
    fn test_new_names_are_valid() {
        let image = Image::new(Ext::Png).unwrap();
        assert!(image.file_name().ends_with(".png"));
        assert_eq!(image.ext().unwrap(), Ext::Png);
        assert!(Image::from_file_name(image.file_name()).is_ok());
    }

    #[test]
    fn test_disallowed_extension() {
        assert!(matches!(
            Audio::new(Ext::Png),
            Err(SdkError::InvalidObjectName { .. })
        ));
        assert!(Csv::from_file_name(&format!("{}.pdf", NAME)).is_err());
    }

    #[test]
    fn test_malformed_names() {
        assert!(Pdf::from_file_name("report.pdf").is_err());
        assert!(Pdf::from_file_name(NAME).is_err());
        assert!(Pdf::from_file_name(&format!("{}.exe", NAME)).is_err());
        assert!(Pdf::from_file_name(&format!("{}.pdf", NAME)).is_ok());
    }

    #[test]
    fn test_wire_form_is_bare_name() {
        let name = format!("{}.mp4", NAME);
        let video = Video::from_file_name(&name).unwrap();
        assert_eq!(serde_json::to_value(&video).unwrap(), json!(name));

        let decoded: Video = serde_json::from_value(json!(name)).unwrap();
        assert_eq!(decoded, video);
        assert!(serde_json::from_value::<Video>(json!("clip.mp4")).is_err());
    }

    #[test]
    fn test_storage_ports_in_metadata() {
        let mut node = ToolkitNode::new("media", "Media");
        node.set_input::<MediaInputs>().unwrap();
        let inputs = &node.metadata().inputs;

        assert_eq!(inputs["photo"].port_type, PortType::Image);
        match &inputs["photo"].component.as_ref().unwrap().kind {
            ComponentKind::StorageSelect { supported_ext } => {
                assert_eq!(supported_ext, &vec![Ext::Png, Ext::Jpg, Ext::Jpeg])
            }
            other => panic!("unexpected component {:?}", other),
        }
        assert_eq!(inputs["clip"].port_type, PortType::Video);

        let ComponentKind::ListComponent { item_component } = &inputs["pages"].component.as_ref().unwrap().kind else {
            panic!("expected list component");
        };
        assert_eq!(item_component.as_deref().unwrap().name(), "StorageSelect");
    }
}
