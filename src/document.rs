//! Whole-document entry points: root fragment + drained definitions + `$schema`.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::catalog::DescriptorSet;
use crate::definitions::Registry;
use crate::descriptor::TypeDescriptor;
use crate::error::{FieldPath, SchemaError};
use crate::fragment::Fragment;
use crate::options::{EncodeOptions, SchemaOptions};
use crate::synth::{BuildContext, Synthesizer};

/// Build the schema document for the catalog entry named `root`.
pub fn build_schema(catalog: &DescriptorSet, root: &str, options: &SchemaOptions) -> Result<Value, SchemaError> {
    let descriptor = catalog.get(root).ok_or_else(|| SchemaError::UnknownType {
        path: FieldPath::root(),
        name: root.to_owned(),
    })?;
    build_document(catalog, descriptor, options)
}

/// Build a self-contained descriptor; named references inside it will not resolve.
pub fn build_schema_for(descriptor: &TypeDescriptor, options: &SchemaOptions) -> Result<Value, SchemaError> {
    build_document(&DescriptorSet::new(), descriptor, options)
}

pub fn build_document(
    catalog: &DescriptorSet,
    root: &TypeDescriptor,
    options: &SchemaOptions,
) -> Result<Value, SchemaError> {
    let cx = BuildContext::new(catalog, options, root);
    let mut registry = Registry::new();
    let fragment = Synthesizer::new(&cx, &mut registry).synthesize_root(root)?;
    let definitions = registry.drain()?;
    debug!(root = %root.name, definitions = definitions.len(), "built schema");

    let mut document = Fragment::new();
    document.insert("$schema".into(), Value::from(options.schema_uri.as_str()));
    document.extend(fragment);
    if !definitions.is_empty() {
        document.insert("definitions".into(), Value::Object(definitions));
    }
    Ok(Value::Object(document))
}

pub fn encode_to_schema(
    catalog: &DescriptorSet,
    root: &str,
    options: &SchemaOptions,
    encode: &EncodeOptions,
) -> Result<String, SchemaError> {
    encode.encode(&build_schema(catalog, root, options)?)
}

/// Serialize `value` and put `"$schema": url` in front of its keys.
pub fn with_schema_url<T: Serialize + ?Sized>(value: &T, url: &str) -> Result<Value, SchemaError> {
    let object = match serde_json::to_value(value)? {
        Value::Object(object) => object,
        other => return Err(SchemaError::NotAnObject { found: json_kind(&other) }),
    };
    let mut document = Fragment::new();
    document.insert("$schema".into(), Value::from(url));
    document.extend(object);
    Ok(Value::Object(document))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::descriptor::{Field, TypeRef};
    use crate::metadata::Metadata;
    use crate::options::DRAFT_07_SCHEMA_URI;

    #[test]
    fn document_leads_with_schema_uri() {
        let document = build_schema_for(&TypeDescriptor::boolean(), &SchemaOptions::default()).unwrap();
        assert_eq!(document, json!({ "$schema": DRAFT_07_SCHEMA_URI, "type": "boolean" }));
        assert_eq!(document.as_object().unwrap().keys().next().map(String::as_str), Some("$schema"));
    }

    #[test]
    fn mutually_recursive_forced_records_build_two_definitions() {
        let forced = Metadata::new().forced();
        let a = TypeDescriptor::record("A", vec![Field::optional("b", TypeRef::named("B"))]).with_metadata(forced.clone());
        let b = TypeDescriptor::record("B", vec![Field::optional("a", TypeRef::named("A"))]).with_metadata(forced);
        let catalog: DescriptorSet = [a, b].into_iter().collect();

        let document = build_schema(&catalog, "A", &SchemaOptions::default()).unwrap();
        let definitions = document["definitions"].as_object().unwrap();
        assert_eq!(definitions.len(), 2);

        let a_ref = document["$ref"].as_str().unwrap();
        let a_id = a_ref.strip_prefix("#/definitions/").unwrap();
        let b_ref = definitions[a_id]["properties"]["b"]["$ref"].as_str().unwrap();
        let b_id = b_ref.strip_prefix("#/definitions/").unwrap();
        assert_ne!(a_id, b_id);
        assert_eq!(definitions[b_id]["properties"]["a"]["$ref"], json!(a_ref));
    }

    #[test]
    fn unknown_root_is_an_error() {
        let error = build_schema(&DescriptorSet::new(), "Missing", &SchemaOptions::default()).unwrap_err();
        assert_eq!(error.to_string(), "unknown type `Missing` referenced at root");
    }

    #[test]
    fn compact_encoding() {
        let catalog: DescriptorSet = [TypeDescriptor::enumeration("Mode", ["on", "off"])].into_iter().collect();
        let text = encode_to_schema(&catalog, "Mode", &SchemaOptions::default(), &EncodeOptions::compact()).unwrap();
        assert_eq!(
            text,
            r#"{"$schema":"http://json-schema.org/draft-07/schema","type":"string","enum":["on","off"]}"#
        );
    }

    #[test]
    fn schema_url_goes_first_and_rejects_scalars() {
        #[derive(Serialize)]
        struct Settings {
            theme: &'static str,
        }
        let value = with_schema_url(&Settings { theme: "dark" }, "https://example.com/s.json").unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["$schema", "theme"]);

        let error = with_schema_url(&[1, 2], "x").unwrap_err();
        assert!(matches!(error, SchemaError::NotAnObject { found: "array" }));
    }
}
