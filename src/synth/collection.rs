//! Lists and text-keyed maps. Both pass their value constraints down to the element.

use serde_json::Value;

use super::Synthesizer;
use crate::descriptor::{Element, Kind};
use crate::error::{FieldPath, SchemaError};
use crate::fragment::{typed, Fragment, JsonType};
use crate::metadata::Metadata;

pub fn list(
    synth: &mut Synthesizer<'_, '_>,
    element: &Element,
    effective: &Metadata,
    path: &FieldPath,
) -> Result<Fragment, SchemaError> {
    let items = synth.element(element, &effective.constraints(), &path.child("items"))?;
    let mut fragment = typed(JsonType::Array);
    fragment.insert("items".into(), Value::Object(items));
    Ok(fragment)
}

pub fn map(
    synth: &mut Synthesizer<'_, '_>,
    key: &Element,
    value: &Element,
    effective: &Metadata,
    path: &FieldPath,
) -> Result<Fragment, SchemaError> {
    let catalog = synth.catalog();
    let key_descriptor = catalog.resolve(&key.ty, path)?;
    if !matches!(key_descriptor.kind, Kind::Text) {
        return Err(SchemaError::NonTextMapKey {
            path: path.clone(),
            found: key_descriptor.kind.label(),
        });
    }

    let values = synth.element(value, &effective.constraints(), &path.child("values"))?;
    let mut fragment = typed(JsonType::Object);
    fragment.insert("additionalProperties".into(), Value::Object(values));
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::catalog::DescriptorSet;
    use crate::descriptor::{Field, TypeDescriptor};
    use crate::options::SchemaOptions;
    use crate::synth::tests::{inline, run};

    #[test]
    fn list_of_records() {
        let point = TypeDescriptor::record("Point", vec![Field::required("x", TypeDescriptor::integer())]);
        assert_eq!(
            inline(&TypeDescriptor::list(point)),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": { "x": { "type": "number" } },
                    "required": ["x"]
                }
            })
        );
    }

    #[test]
    fn text_keyed_map_uses_additional_properties() {
        let scores = TypeDescriptor::map(TypeDescriptor::text(), TypeDescriptor::integer());
        assert_eq!(
            inline(&scores),
            json!({ "type": "object", "additionalProperties": { "type": "number" } })
        );
    }

    #[test]
    fn list_constraints_reach_the_elements() {
        let tags = TypeDescriptor::list(TypeDescriptor::text())
            .with_metadata(Metadata::new().with_pattern("^#").describe("tags"));
        assert_eq!(
            inline(&tags),
            json!({
                "type": "array",
                "items": { "type": "string", "pattern": "^#" },
                "description": "tags"
            })
        );
    }

    #[test]
    fn map_value_constraints_nest_through_lists() {
        let grid = TypeDescriptor::map(
            TypeDescriptor::text(),
            TypeDescriptor::list(TypeDescriptor::integer()),
        )
        .with_metadata(Metadata::new().with_integer_range(1, 9));
        assert_eq!(
            inline(&grid)["additionalProperties"]["items"],
            json!({ "type": "number", "minimum": 1, "maximum": 9 })
        );
    }

    #[test]
    fn element_constraints_beat_inherited_ones() {
        let element = Element::new(TypeDescriptor::text()).with_metadata(Metadata::new().with_pattern("b"));
        let list = TypeDescriptor::list(element).with_metadata(Metadata::new().with_pattern("a"));
        assert_eq!(inline(&list)["items"]["pattern"], json!("b"));
    }

    #[test]
    fn type_level_constraints_beat_inherited_ones() {
        let code = TypeDescriptor::text().with_metadata(Metadata::new().with_pattern("b"));
        let list = TypeDescriptor::list(code).with_metadata(Metadata::new().with_pattern("a"));
        assert_eq!(inline(&list)["items"]["pattern"], json!("b"));

        let plain = TypeDescriptor::list(TypeDescriptor::text()).with_metadata(Metadata::new().with_pattern("a"));
        assert_eq!(inline(&plain)["items"]["pattern"], json!("a"));
    }

    #[test]
    fn non_text_map_keys_are_rejected() {
        let holder = TypeDescriptor::record(
            "Holder",
            vec![Field::required("byId", TypeDescriptor::map(TypeDescriptor::integer(), TypeDescriptor::text()))],
        );
        let error = run(&DescriptorSet::new(), &SchemaOptions::default(), &holder).unwrap_err();
        assert_eq!(error.to_string(), "map keys must be text, found integerNumber at root.byId");
    }
}
