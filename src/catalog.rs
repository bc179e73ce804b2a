//! Name-indexed descriptor catalog.
//!
//! Catalog files are JSON arrays of descriptors. Children point at other catalog entries
//! with `{"ref": "<name>"}`, which is the only way to write a recursive type.

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::descriptor::{Describe, TypeDescriptor, TypeRef};
use crate::error::{FieldPath, SchemaError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    types: IndexMap<String, TypeDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        let types: Vec<TypeDescriptor> = crate::path_de::from_str_with_path(src)?;
        Ok(types.into_iter().collect())
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        let types: Vec<TypeDescriptor> = crate::path_de::from_slice_with_path(bytes)?;
        Ok(types.into_iter().collect())
    }

    /// Register under the descriptor's own name; a later entry replaces an earlier one.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.types.insert(descriptor.name.clone(), descriptor)
    }

    pub fn register<T: Describe>(&mut self) -> &mut Self {
        self.insert(T::descriptor());
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a child reference. Named references are looked up and pick up the
    /// reference's own nullability.
    pub fn resolve<'s>(
        &'s self,
        ty: &'s TypeRef,
        path: &FieldPath,
    ) -> Result<Cow<'s, TypeDescriptor>, SchemaError> {
        match ty {
            TypeRef::Inline(descriptor) => Ok(Cow::Borrowed(descriptor)),
            TypeRef::Named(named) => {
                let descriptor = self.get(&named.name).ok_or_else(|| SchemaError::UnknownType {
                    path: path.clone(),
                    name: named.name.clone(),
                })?;
                if named.nullable && !descriptor.nullable {
                    Ok(Cow::Owned(descriptor.clone().nullable()))
                } else {
                    Ok(Cow::Borrowed(descriptor))
                }
            }
        }
    }
}

impl FromIterator<TypeDescriptor> for DescriptorSet {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        let mut set = DescriptorSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<TypeDescriptor> for DescriptorSet {
    fn extend<I: IntoIterator<Item = TypeDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Field, Kind};

    #[test]
    fn named_reference_picks_up_nullability() {
        let set: DescriptorSet = [TypeDescriptor::record("Leaf", vec![])].into_iter().collect();
        let plain = TypeRef::named("Leaf");
        let nullable = TypeRef::named_nullable("Leaf");

        assert!(!set.resolve(&plain, &FieldPath::root()).unwrap().nullable);
        assert!(set.resolve(&nullable, &FieldPath::root()).unwrap().nullable);
    }

    #[test]
    fn unknown_reference_reports_the_path() {
        let set = DescriptorSet::new();
        let missing = TypeRef::named("Ghost");
        let error = set
            .resolve(&missing, &FieldPath::root().child("haunt"))
            .unwrap_err();
        assert_eq!(error.to_string(), "unknown type `Ghost` referenced at root.haunt");
    }

    #[test]
    fn catalog_errors_name_the_json_path() {
        let src = r#"[
            { "name": "A", "kind": "text" },
            { "name": "B", "kind": "record", "fields": "nope" }
        ]"#;
        match DescriptorSet::from_json_str(src).unwrap_err() {
            SchemaError::Catalog { path, .. } => assert!(path.starts_with("[1]"), "{path}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn later_entries_replace_earlier_ones() {
        let mut set = DescriptorSet::new();
        set.insert(TypeDescriptor::record("A", vec![]));
        set.insert(TypeDescriptor::record("A", vec![Field::required("x", TypeDescriptor::text())]));
        assert_eq!(set.len(), 1);
        let Some(TypeDescriptor { kind: Kind::Record { fields }, .. }) = set.get("A") else {
            panic!("expected record A");
        };
        assert_eq!(fields.len(), 1);
    }
}
