//! Hand-authored schemas.
//!
//! For the cases descriptors cannot express, or to patch a derived document:
//!
//! ```
//! use schema_synth::{PropertyBuilder, SchemaBuilder};
//!
//! let mut schema = SchemaBuilder::new();
//! let rgb = schema.definition("Rgb", PropertyBuilder::string().pattern("^#[0-9a-f]{6}$"));
//! schema
//!     .required_property("name", PropertyBuilder::string().description("Theme name"))
//!     .optional_property("accent", PropertyBuilder::reference(&rgb));
//! let value = schema.build();
//! assert_eq!(value["definitions"]["Rgb"]["type"], "string");
//! ```

use serde_json::Value;

use crate::fragment::{definition_pointer, reference, typed, Fragment, JsonType};
use crate::merge::merge;

/// Handle returned by [`SchemaBuilder::definition`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionRef {
    id: String,
}

impl DefinitionRef {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pointer(&self) -> String {
        definition_pointer(&self.id)
    }
}

/// One property schema. Keywords are kept in the order they are set, after `type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBuilder {
    data: Fragment,
    properties: Fragment,
    required: Vec<String>,
}

impl PropertyBuilder {
    fn typed(ty: JsonType) -> Self {
        Self { data: typed(ty), ..Self::default() }
    }

    fn with(mut self, keyword: &str, value: Value) -> Self {
        self.data.insert(keyword.to_owned(), value);
        self
    }

    pub fn string() -> Self {
        Self::typed(JsonType::String)
    }

    pub fn number() -> Self {
        Self::typed(JsonType::Number)
    }

    pub fn boolean() -> Self {
        Self::typed(JsonType::Boolean)
    }

    pub fn array(items: PropertyBuilder) -> Self {
        Self::typed(JsonType::Array).with("items", items.build_value())
    }

    pub fn object() -> Self {
        Self::typed(JsonType::Object)
    }

    /// Object with arbitrary keys whose values all match `value`.
    pub fn map(value: PropertyBuilder) -> Self {
        Self::typed(JsonType::Object).with("additionalProperties", value.build_value())
    }

    /// No `type`; accepts anything until constrained.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn reference(definition: &DefinitionRef) -> Self {
        Self { data: reference(&definition.id), ..Self::default() }
    }

    pub fn description(self, text: impl Into<String>) -> Self {
        self.with("description", Value::String(text.into()))
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.with("pattern", Value::String(pattern.into()))
    }

    pub fn enum_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with("enum", Value::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn minimum(self, minimum: impl Into<Value>) -> Self {
        self.with("minimum", minimum.into())
    }

    pub fn maximum(self, maximum: impl Into<Value>) -> Self {
        self.with("maximum", maximum.into())
    }

    pub fn min_items(self, count: u64) -> Self {
        self.with("minItems", Value::from(count))
    }

    pub fn max_items(self, count: u64) -> Self {
        self.with("maxItems", Value::from(count))
    }

    pub fn property_names(self, names: PropertyBuilder) -> Self {
        self.with("propertyNames", names.build_value())
    }

    pub fn additional_properties(self, allowed: bool) -> Self {
        self.with("additionalProperties", Value::Bool(allowed))
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.with("default", value.into())
    }

    pub fn const_value(self, value: impl Into<Value>) -> Self {
        self.with("const", value.into())
    }

    /// Nested property; only meaningful on [`PropertyBuilder::object`].
    pub fn property(mut self, name: impl Into<String>, property: PropertyBuilder, required: bool) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, property.build_value());
        self
    }

    pub fn build(self) -> Fragment {
        let Self { mut data, properties, required } = self;
        if !properties.is_empty() {
            data.insert("properties".into(), Value::Object(properties));
        }
        if !required.is_empty() {
            data.insert("required".into(), required.into_iter().map(Value::String).collect());
        }
        data
    }

    fn build_value(self) -> Value {
        Value::Object(self.build())
    }
}

/// Root object schema. Definitions registered anywhere in the tree live here and are
/// emitted once, at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaBuilder {
    root: PropertyBuilder,
    definitions: Fragment,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self { root: PropertyBuilder::object(), definitions: Fragment::new() }
    }

    pub fn property(&mut self, name: impl Into<String>, property: PropertyBuilder, required: bool) -> &mut Self {
        let root = std::mem::take(&mut self.root);
        self.root = root.property(name, property, required);
        self
    }

    pub fn required_property(&mut self, name: impl Into<String>, property: PropertyBuilder) -> &mut Self {
        self.property(name, property, true)
    }

    pub fn optional_property(&mut self, name: impl Into<String>, property: PropertyBuilder) -> &mut Self {
        self.property(name, property, false)
    }

    /// Register (or replace) the definition `id` and return a handle for `$ref`s to it.
    pub fn definition(&mut self, id: impl Into<String>, property: PropertyBuilder) -> DefinitionRef {
        let id = id.into();
        self.definitions.insert(id.clone(), property.build_value());
        DefinitionRef { id }
    }

    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        let root = std::mem::take(&mut self.root);
        self.root = root.description(text);
        self
    }

    pub fn additional_properties(&mut self, allowed: bool) -> &mut Self {
        let root = std::mem::take(&mut self.root);
        self.root = root.additional_properties(allowed);
        self
    }

    pub fn build(&self) -> Value {
        let mut fragment = self.root.clone().build();
        if !self.definitions.is_empty() {
            fragment.insert("definitions".into(), Value::Object(self.definitions.clone()));
        }
        Value::Object(fragment)
    }

    /// Layer the hand-written schema over `auto`, usually a derived document.
    pub fn merge_over(&self, auto: Value) -> Value {
        merge(auto, self.build())
    }
}
