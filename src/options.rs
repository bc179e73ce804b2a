//! Build and encoding configuration, passed explicitly to whatever needs it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

pub const DRAFT_07_SCHEMA_URI: &str = "http://json-schema.org/draft-07/schema";

/// Which occurrences are promoted to shared definitions, beyond the ones that must be
/// (forced, id-tagged, or recursive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionPolicy {
    /// Only forced, id-tagged and recursive occurrences.
    Explicit,
    /// Also records and tagged unions that occur more than once in the build.
    #[default]
    Shared,
    /// Every node, including the root.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaOptions {
    pub definitions: DefinitionPolicy,
    /// Emit `additionalProperties: false` on records that declare properties.
    pub deny_additional_properties: bool,
    pub schema_uri: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            definitions: DefinitionPolicy::default(),
            deny_additional_properties: false,
            schema_uri: DRAFT_07_SCHEMA_URI.to_owned(),
        }
    }
}

impl SchemaOptions {
    pub fn with_definitions(mut self, policy: DefinitionPolicy) -> Self {
        self.definitions = policy;
        self
    }

    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        crate::path_de::from_str_with_path(src)
    }
}

/// Text encoding of a finished document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub pretty: bool,
    pub indent: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { pretty: true, indent: "  ".to_owned() }
    }
}

impl EncodeOptions {
    pub fn compact() -> Self {
        Self { pretty: false, ..Self::default() }
    }

    pub fn encode(&self, value: &Value) -> Result<String, SchemaError> {
        if !self.pretty {
            return Ok(serde_json::to_string(value)?);
        }
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;
        Ok(String::from_utf8(out)?)
    }
}
