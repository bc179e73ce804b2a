//! Tagged unions: a `type` discriminant plus one `anyOf` branch per variant.
//!
//! Each branch is the variant's record schema with `properties.type` pinned to the tag.
//! A promoted variant only yields a `$ref`, so its branch becomes
//! `{allOf: [$ref], properties: {type: {const: tag}}}` instead of editing the shared body.

use serde_json::{json, Value};

use super::Synthesizer;
use crate::descriptor::{Kind, Variant};
use crate::error::{FieldPath, SchemaError};
use crate::fragment::{null_schema, strings, typed, Fragment, JsonType};
use crate::metadata::Constraints;

pub const DISCRIMINATOR: &str = "type";

pub fn tagged_union(
    synth: &mut Synthesizer<'_, '_>,
    variants: &[Variant],
    nullable: bool,
    path: &FieldPath,
) -> Result<Fragment, SchemaError> {
    let mut any_of = Vec::with_capacity(variants.len() + usize::from(nullable));
    if nullable {
        any_of.push(null_schema());
    }

    for variant in variants {
        let variant_path = path.child(&variant.tag);
        let catalog = synth.catalog();
        let payload = catalog.resolve(&variant.element.ty, &variant_path)?;
        if !matches!(payload.kind, Kind::Record { .. }) {
            return Err(SchemaError::NonRecordVariant {
                path: variant_path,
                tag: variant.tag.clone(),
                found: payload.kind.label(),
            });
        }
        let branch = synth.element(&variant.element, &Constraints::default(), &variant_path)?;
        any_of.push(Value::Object(pin_tag(branch, &variant.tag)));
    }

    let mut discriminant = typed(JsonType::String);
    discriminant.insert("enum".into(), strings(variants.iter().map(|v| v.tag.as_str())));

    let mut properties = Fragment::new();
    properties.insert(DISCRIMINATOR.into(), Value::Object(discriminant));

    let mut fragment = Fragment::new();
    fragment.insert("properties".into(), Value::Object(properties));
    fragment.insert("anyOf".into(), Value::Array(any_of));
    fragment.insert("required".into(), strings([DISCRIMINATOR]));
    Ok(fragment)
}

fn pin_tag(mut branch: Fragment, tag: &str) -> Fragment {
    let constant = json!({ "const": tag });

    if let Some(Value::Object(properties)) = branch.get_mut("properties") {
        let mut pinned = Fragment::new();
        pinned.insert(DISCRIMINATOR.into(), constant);
        for (name, schema) in std::mem::take(properties) {
            if name != DISCRIMINATOR {
                pinned.insert(name, schema);
            }
        }
        *properties = pinned;
        return branch;
    }

    let mut wrapped = Fragment::new();
    wrapped.insert("allOf".into(), Value::Array(vec![Value::Object(branch)]));
    let mut properties = Fragment::new();
    properties.insert(DISCRIMINATOR.into(), constant);
    wrapped.insert("properties".into(), Value::Object(properties));
    wrapped
}
