use serde_json::Value;

use super::Synthesizer;
use crate::descriptor::Field;
use crate::error::{FieldPath, SchemaError};
use crate::fragment::{strings, typed, Fragment, JsonType};
use crate::metadata::Constraints;

/// `{type: object, properties, required}`. Properties and `required` follow declaration
/// order; `required` is left out when every field is optional.
pub fn record(
    synth: &mut Synthesizer<'_, '_>,
    fields: &[Field],
    path: &FieldPath,
) -> Result<Fragment, SchemaError> {
    let mut properties = Fragment::new();
    let mut required = Vec::new();
    for field in fields {
        let schema = synth.element(&field.element, &Constraints::default(), &path.child(&field.name))?;
        properties.insert(field.name.clone(), Value::Object(schema));
        if !field.optional {
            required.push(field.name.as_str());
        }
    }

    let mut fragment = typed(JsonType::Object);
    let deny_extra = synth.options().deny_additional_properties && !properties.is_empty();
    fragment.insert("properties".into(), Value::Object(properties));
    if deny_extra {
        fragment.insert("additionalProperties".into(), Value::Bool(false));
    }
    if !required.is_empty() {
        fragment.insert("required".into(), strings(required));
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::catalog::DescriptorSet;
    use crate::descriptor::TypeDescriptor;
    use crate::metadata::Metadata;
    use crate::options::{DefinitionPolicy, SchemaOptions};
    use crate::synth::tests::{inline, run};

    #[test]
    fn required_text_field_with_pattern_and_description() {
        let record = TypeDescriptor::record(
            "Sentence",
            vec![Field::required("text", TypeDescriptor::text())
                .with_metadata(Metadata::new().with_pattern("[A-Z].*").describe("t"))],
        );
        assert_eq!(
            inline(&record),
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "pattern": "[A-Z].*", "description": "t" }
                },
                "required": ["text"]
            })
        );
    }

    #[test]
    fn optional_fields_stay_out_of_required() {
        let record = TypeDescriptor::record(
            "Profile",
            vec![
                Field::optional("nick", TypeDescriptor::text()),
                Field::required("id", TypeDescriptor::integer()),
                Field::optional("bio", TypeDescriptor::text().nullable()),
            ],
        );
        let schema = inline(&record);
        assert_eq!(schema["required"], json!(["id"]));
        let names: Vec<_> = schema["properties"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, ["nick", "id", "bio"]);

        let all_optional = TypeDescriptor::record("Empty", vec![Field::optional("x", TypeDescriptor::boolean())]);
        assert!(inline(&all_optional).get("required").is_none());
    }

    #[test]
    fn empty_records_still_emit_properties() {
        assert_eq!(
            inline(&TypeDescriptor::record("Unit", vec![])),
            json!({ "type": "object", "properties": {} })
        );
    }

    #[test]
    fn closed_records_deny_additional_properties() {
        let options = SchemaOptions {
            deny_additional_properties: true,
            ..SchemaOptions::default().with_definitions(DefinitionPolicy::Explicit)
        };
        let record = TypeDescriptor::record("Pin", vec![Field::required("code", TypeDescriptor::text())]);
        let (schema, _) = run(&DescriptorSet::new(), &options, &record).unwrap();
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": { "code": { "type": "string" } },
                "additionalProperties": false,
                "required": ["code"]
            })
        );

        let (unit, _) = run(&DescriptorSet::new(), &options, &TypeDescriptor::record("Unit", vec![])).unwrap();
        assert!(unit.get("additionalProperties").is_none());
    }

    #[test]
    fn field_errors_carry_the_field_path() {
        let record = TypeDescriptor::record(
            "Person",
            vec![Field::required("age", TypeDescriptor::integer())
                .with_metadata(Metadata::new().with_pattern("[0-9]+"))],
        );
        let error = run(&DescriptorSet::new(), &SchemaOptions::default(), &record).unwrap_err();
        assert_eq!(error.to_string(), "`pattern` cannot be applied to integerNumber at root.age");
    }
}
