//! Draft-07 JSON Schema documents derived from static type descriptors.
//!
//! Describe types as [`TypeDescriptor`]s (by hand, through [`Describe`], or from a JSON
//! catalog), then call [`build_schema`]. Shared and recursive types end up under
//! `definitions` and are referenced with `$ref`.
pub mod builder;
pub mod catalog;
pub mod cli;
pub mod definitions;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod fragment;
pub mod merge;
pub mod metadata;
pub mod options;
pub mod synth;

mod path_de;

pub use builder::{DefinitionRef, PropertyBuilder, SchemaBuilder};
pub use catalog::DescriptorSet;
pub use definitions::{DefinitionKey, Registry, SharedRegistry};
pub use descriptor::{Describe, Element, Field, Kind, TypeDescriptor, TypeRef, Variant};
pub use document::{build_document, build_schema, build_schema_for, encode_to_schema, with_schema_url};
pub use error::{FieldPath, SchemaError};
pub use fragment::Fragment;
pub use merge::{merge, merge_fragments};
pub use metadata::Metadata;
pub use options::{DefinitionPolicy, EncodeOptions, SchemaOptions};
