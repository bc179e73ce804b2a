//! Schema fragments: ordered keyword maps, the output of every synthesis step.

use serde_json::{json, Value};

/// Keyword → value, in insertion order (`serde_json` is built with `preserve_order`).
pub type Fragment = serde_json::Map<String, Value>;

pub const DEFINITIONS_POINTER: &str = "#/definitions/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Array,
    Number,
    String,
    Boolean,
    Object,
    Null,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Array => "array",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Null => "null",
        }
    }

    pub fn json(self) -> Value {
        Value::from(self.as_str())
    }
}

/// `{ "type": <ty> }`
pub fn typed(ty: JsonType) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.insert("type".into(), ty.json());
    fragment
}

/// `#/definitions/<id>`, with the id escaped as a JSON Pointer token.
pub fn definition_pointer(id: &str) -> String {
    let token = id.replace('~', "~0").replace('/', "~1");
    format!("{DEFINITIONS_POINTER}{token}")
}

/// `{ "$ref": "#/definitions/<id>" }`
pub fn reference(id: &str) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.insert("$ref".into(), Value::from(definition_pointer(id)));
    fragment
}

pub fn null_schema() -> Value {
    json!({ "type": "null" })
}

pub fn strings<I, S>(values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Array(values.into_iter().map(|s| Value::String(s.into())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_escapes_pointer_tokens() {
        assert_eq!(
            Value::Object(reference("a/b~c")),
            json!({ "$ref": "#/definitions/a~1b~0c" })
        );
    }
}
