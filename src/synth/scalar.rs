use regex::Regex;
use serde_json::Value;

use crate::descriptor::Kind;
use crate::error::{FieldPath, SchemaError};
use crate::fragment::{strings, typed, Fragment, JsonType};
use crate::metadata::Metadata;

/// Reject constraints the kind cannot carry, and kinds no schema exists for.
///
/// Lists and maps accept everything: their constraints are handed to the element and
/// checked there.
pub fn check_applicable(kind: &Kind, metadata: &Metadata, path: &FieldPath) -> Result<(), SchemaError> {
    if let Kind::Other { label } = kind {
        return Err(SchemaError::UnsupportedKind {
            path: path.clone(),
            kind: label.clone(),
        });
    }
    if matches!(kind, Kind::List { .. } | Kind::Map { .. }) {
        return Ok(());
    }

    let text = matches!(kind, Kind::Text);
    let checks = [
        ("pattern", metadata.pattern.is_some(), text),
        ("stringEnum", metadata.string_enum.is_some(), text),
        ("integerRange", metadata.integer_range.is_some(), matches!(kind, Kind::IntegerNumber)),
        ("floatRange", metadata.float_range.is_some(), matches!(kind, Kind::FloatingNumber)),
    ];
    for (annotation, present, allowed) in checks {
        if present && !allowed {
            return Err(SchemaError::KindMismatch {
                path: path.clone(),
                annotation,
                kind: kind.label(),
            });
        }
    }

    if let Some(pattern) = metadata.pattern.as_deref().filter(|p| !p.is_empty()) {
        Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
            path: path.clone(),
            pattern: pattern.to_owned(),
            source,
        })?;
    }
    Ok(())
}

pub fn boolean() -> Fragment {
    typed(JsonType::Boolean)
}

/// Integers and floats share `"number"`; the range kind was checked against the kind.
pub fn number(metadata: &Metadata) -> Fragment {
    let mut fragment = typed(JsonType::Number);
    if let Some(range) = metadata.integer_range {
        fragment.insert("minimum".into(), Value::from(range.min));
        fragment.insert("maximum".into(), Value::from(range.max));
    } else if let Some(range) = metadata.float_range {
        fragment.insert("minimum".into(), Value::from(range.min.into_inner()));
        fragment.insert("maximum".into(), Value::from(range.max.into_inner()));
    }
    fragment
}

pub fn text(metadata: &Metadata) -> Fragment {
    let mut fragment = typed(JsonType::String);
    if let Some(pattern) = metadata.pattern.as_deref().filter(|p| !p.is_empty()) {
        fragment.insert("pattern".into(), Value::from(pattern));
    }
    if let Some(values) = metadata.string_enum.as_ref().filter(|v| !v.is_empty()) {
        fragment.insert("enum".into(), strings(values.iter().cloned()));
    }
    fragment
}

pub fn enumeration(values: &[String]) -> Fragment {
    let mut fragment = typed(JsonType::String);
    fragment.insert("enum".into(), strings(values.iter().cloned()));
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::descriptor::TypeDescriptor;
    use crate::synth::tests::inline;

    #[test]
    fn integer_range_becomes_minimum_and_maximum() {
        let age = TypeDescriptor::integer().with_metadata(Metadata::new().with_integer_range(0, 150));
        assert_eq!(inline(&age), json!({ "type": "number", "minimum": 0, "maximum": 150 }));
    }

    #[test]
    fn float_range_keeps_fractions() {
        let ratio = TypeDescriptor::float().with_metadata(Metadata::new().with_float_range(0.0, 0.5));
        assert_eq!(inline(&ratio), json!({ "type": "number", "minimum": 0.0, "maximum": 0.5 }));
    }

    #[test]
    fn text_constraints_and_enumerations() {
        let code = TypeDescriptor::text()
            .with_metadata(Metadata::new().with_pattern("^[A-Z]{2}$").with_string_enum(["DE", "FR"]));
        assert_eq!(
            inline(&code),
            json!({ "type": "string", "pattern": "^[A-Z]{2}$", "enum": ["DE", "FR"] })
        );

        let level = TypeDescriptor::enumeration("Level", ["low", "high"]);
        assert_eq!(inline(&level), json!({ "type": "string", "enum": ["low", "high"] }));
        assert_eq!(inline(&TypeDescriptor::boolean()), json!({ "type": "boolean" }));
    }

    #[test]
    fn empty_pattern_and_enum_are_left_out() {
        let plain = TypeDescriptor::text()
            .with_metadata(Metadata::new().with_pattern("").with_string_enum(Vec::<String>::new()));
        assert_eq!(inline(&plain), json!({ "type": "string" }));
    }

    #[test]
    fn constraints_on_the_wrong_kind_are_rejected() {
        let path = FieldPath::root().child("count");
        let cases = [
            (Kind::IntegerNumber, Metadata::new().with_pattern("x"), "pattern"),
            (Kind::Boolean, Metadata::new().with_string_enum(["a"]), "stringEnum"),
            (Kind::FloatingNumber, Metadata::new().with_integer_range(0, 1), "integerRange"),
            (Kind::Text, Metadata::new().with_float_range(0.0, 1.0), "floatRange"),
        ];
        for (kind, metadata, expected) in cases {
            match check_applicable(&kind, &metadata, &path) {
                Err(SchemaError::KindMismatch { annotation, .. }) => assert_eq!(annotation, expected),
                other => panic!("expected mismatch for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_patterns_are_reported() {
        let error = check_applicable(&Kind::Text, &Metadata::new().with_pattern("[a-"), &FieldPath::root())
            .unwrap_err();
        assert!(matches!(error, SchemaError::InvalidPattern { .. }), "{error}");
    }
}
