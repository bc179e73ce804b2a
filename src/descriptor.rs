// Structural descriptors: the input graph the synthesizer walks.
//
// Cycles never appear as owned recursion. A child that refers back to a type names it
// through `TypeRef::Named`, which resolves against a `DescriptorSet`.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::fragment::JsonType;
use crate::metadata::Metadata;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Kind {
    Boolean,
    IntegerNumber,
    FloatingNumber,
    Text,
    /// Closed set of string constants.
    Enumeration { values: Vec<String> },
    List { element: Box<Element> },
    Map { key: Box<Element>, value: Box<Element> },
    Record { fields: Vec<Field> },
    TaggedUnion { variants: Vec<Variant> },
    /// Anything the producing layer could not classify; always rejected.
    Other { label: String },
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::IntegerNumber => "integerNumber",
            Kind::FloatingNumber => "floatingNumber",
            Kind::Text => "text",
            Kind::Enumeration { .. } => "enumeration",
            Kind::List { .. } => "list",
            Kind::Map { .. } => "map",
            Kind::Record { .. } => "record",
            Kind::TaggedUnion { .. } => "taggedUnion",
            Kind::Other { .. } => "other",
        }
    }

    pub fn json_type(&self) -> Option<JsonType> {
        match self {
            Kind::Boolean => Some(JsonType::Boolean),
            Kind::IntegerNumber | Kind::FloatingNumber => Some(JsonType::Number),
            Kind::Text | Kind::Enumeration { .. } => Some(JsonType::String),
            Kind::List { .. } => Some(JsonType::Array),
            Kind::Map { .. } | Kind::Record { .. } | Kind::TaggedUnion { .. } => {
                Some(JsonType::Object)
            }
            Kind::Other { .. } => None,
        }
    }

    /// Named composite types; the ones worth sharing when they repeat.
    pub fn is_composite(&self) -> bool {
        matches!(self, Kind::Record { .. } | Kind::TaggedUnion { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    /// Type-level metadata; layered under each occurrence's own metadata.
    #[serde(default, skip_serializing_if = "is_default_metadata")]
    pub metadata: Metadata,
}

fn is_default_metadata(metadata: &Metadata) -> bool {
    *metadata == Metadata::default()
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            metadata: Metadata::default(),
        }
    }

    pub fn boolean() -> Self {
        Self::new("boolean", Kind::Boolean)
    }

    pub fn integer() -> Self {
        Self::new("integer", Kind::IntegerNumber)
    }

    pub fn float() -> Self {
        Self::new("float", Kind::FloatingNumber)
    }

    pub fn text() -> Self {
        Self::new("string", Kind::Text)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(name, Kind::Enumeration { values })
    }

    pub fn list(element: impl Into<Element>) -> Self {
        Self::new("list", Kind::List { element: Box::new(element.into()) })
    }

    pub fn map(key: impl Into<Element>, value: impl Into<Element>) -> Self {
        Self::new(
            "map",
            Kind::Map {
                key: Box::new(key.into()),
                value: Box::new(value.into()),
            },
        )
    }

    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(name, Kind::Record { fields })
    }

    pub fn tagged_union(name: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self::new(name, Kind::TaggedUnion { variants })
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Reference to a child type: inline, or by name into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Named(NamedRef),
    Inline(Box<TypeDescriptor>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(NamedRef { name: name.into(), nullable: false })
    }

    pub fn named_nullable(name: impl Into<String>) -> Self {
        TypeRef::Named(NamedRef { name: name.into(), nullable: true })
    }
}

impl From<TypeDescriptor> for TypeRef {
    fn from(descriptor: TypeDescriptor) -> Self {
        TypeRef::Inline(Box::new(descriptor))
    }
}

/// One child position (list element, map key/value) with its occurrence metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "is_default_metadata")]
    pub metadata: Metadata,
}

impl Element {
    pub fn new(ty: impl Into<TypeRef>) -> Self {
        Self { ty: ty.into(), metadata: Metadata::default() }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl From<TypeDescriptor> for Element {
    fn from(descriptor: TypeDescriptor) -> Self {
        Element::new(descriptor)
    }
}

impl From<TypeRef> for Element {
    fn from(ty: TypeRef) -> Self {
        Element::new(ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(flatten)]
    pub element: Element,
}

impl Field {
    pub fn required(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self { name: name.into(), optional: false, element: Element::new(ty) }
    }

    pub fn optional(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self { name: name.into(), optional: true, element: Element::new(ty) }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.element.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub tag: String,
    #[serde(flatten)]
    pub element: Element,
}

impl Variant {
    pub fn new(tag: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self { tag: tag.into(), element: Element::new(ty) }
    }
}

// -------------------- compile-time descriptors --------------------

/// Ahead-of-time descriptor for a Rust type, in place of runtime reflection.
///
/// Self-referential types should name themselves with [`TypeRef::named`] and be
/// registered in a [`DescriptorSet`](crate::catalog::DescriptorSet).
pub trait Describe {
    fn descriptor() -> TypeDescriptor;
}

macro_rules! describe_scalar {
    ($ctor:ident => $($ty:ty),+) => {
        $(impl Describe for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::$ctor()
            }
        })+
    };
}

describe_scalar!(boolean => bool);
describe_scalar!(integer => i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
describe_scalar!(float => f32, f64);
describe_scalar!(text => String, char);

impl<T: Describe> Describe for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor().nullable()
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::descriptor())
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(TypeDescriptor::text(), V::descriptor())
    }
}

impl<V: Describe, S> Describe for HashMap<String, V, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(TypeDescriptor::text(), V::descriptor())
    }
}

impl<V: Describe, S> Describe for IndexMap<String, V, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(TypeDescriptor::text(), V::descriptor())
    }
}
