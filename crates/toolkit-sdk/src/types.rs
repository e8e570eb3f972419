//! Core types for toolkit node ports
//!
//! These types define the closed set of port types, the three field
//! slots of a node, and the descriptive enums carried in node metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic type of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    Boolean,
    Number,
    Integer,
    String,
    Array,
    Object,
    Image,
    Audio,
    Video,
    Pdf,
    Csv,
    /// Absent or unrecognized schema type
    Any,
}

impl PortType {
    /// All port types, in declaration order
    pub const ALL: [PortType; 12] = [
        PortType::Boolean,
        PortType::Number,
        PortType::Integer,
        PortType::String,
        PortType::Array,
        PortType::Object,
        PortType::Image,
        PortType::Audio,
        PortType::Video,
        PortType::Pdf,
        PortType::Csv,
        PortType::Any,
    ];

    /// Classify a raw schema `type` keyword.
    ///
    /// Total: an absent or unknown keyword yields `Any`.
    pub fn classify(keyword: Option<&str>) -> PortType {
        match keyword {
            Some("boolean") => PortType::Boolean,
            Some("number") => PortType::Number,
            Some("integer") => PortType::Integer,
            Some("string") => PortType::String,
            Some("array") => PortType::Array,
            Some("object") => PortType::Object,
            Some("image") => PortType::Image,
            Some("audio") => PortType::Audio,
            Some("video") => PortType::Video,
            Some("pdf") => PortType::Pdf,
            Some("csv") => PortType::Csv,
            _ => PortType::Any,
        }
    }

    /// The keyword this type is written as in schemas and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            PortType::Boolean => "boolean",
            PortType::Number => "number",
            PortType::Integer => "integer",
            PortType::String => "string",
            PortType::Array => "array",
            PortType::Object => "object",
            PortType::Image => "image",
            PortType::Audio => "audio",
            PortType::Video => "video",
            PortType::Pdf => "pdf",
            PortType::Csv => "csv",
            PortType::Any => "any",
        }
    }

    /// Whether the value lives in blob storage rather than inline
    pub fn is_storage_object(&self) -> bool {
        matches!(
            self,
            PortType::Image | PortType::Audio | PortType::Video | PortType::Pdf | PortType::Csv
        )
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which field map of a node a port belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Inputs,
    Params,
    Outputs,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Inputs, Slot::Params, Slot::Outputs];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Inputs => f.write_str("inputs"),
            Slot::Params => f.write_str("params"),
            Slot::Outputs => f.write_str("outputs"),
        }
    }
}

/// Palette grouping for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Core,
    Utilities,
    Writers,
    Readers,
    Ai,
}

/// Third-party providers a node can require authentication with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedProviders {
    Github,
    Discord,
    Notion,
    Airtable,
    Twitter,
    Reddit,
    Outlook,
    Drive,
    Docs,
    Sheets,
    Gmail,
    Youtube,
}
