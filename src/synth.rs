//! Schema synthesis: descriptor graph → schema fragments.
//!
//! Every occurrence of a type is either inlined or promoted to a shared definition and
//! replaced by a `$ref`. Promotion happens when the occurrence asks for it (force flag or
//! definition id), when the type is already being synthesized further up the stack (a
//! cycle), or when the build's [`DefinitionPolicy`] asks for it. `suppressDefinition`
//! opts out of everything but a real cycle.
pub mod collection;
pub mod record;
pub mod scalar;
pub mod union;

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::trace;

use crate::catalog::DescriptorSet;
use crate::definitions::{DefinitionKey, Registry};
use crate::descriptor::{Element, Kind, TypeDescriptor};
use crate::error::{FieldPath, SchemaError};
use crate::fragment::{null_schema, typed, Fragment, JsonType};
use crate::merge::merge_fragments;
use crate::metadata::{Constraints, Metadata};
use crate::options::{DefinitionPolicy, SchemaOptions};

// ----------------------------- Build context ------------------------------ //

/// Read-only state shared by every synthesizer of one build, including the ones
/// spawned later by deferred definition creators.
pub struct BuildContext<'a> {
    catalog: &'a DescriptorSet,
    options: &'a SchemaOptions,
    /// Composite keys occurring more than once; only filled under `Shared`.
    shared: HashSet<DefinitionKey>,
}

impl<'a> BuildContext<'a> {
    pub fn new(catalog: &'a DescriptorSet, options: &'a SchemaOptions, root: &TypeDescriptor) -> Self {
        let shared = match options.definitions {
            DefinitionPolicy::Shared => OccurrenceCounter::new(catalog).repeated(root),
            DefinitionPolicy::Explicit | DefinitionPolicy::All => HashSet::new(),
        };
        Self { catalog, options, shared }
    }

    pub fn options(&self) -> &'a SchemaOptions {
        self.options
    }

    pub fn catalog(&self) -> &'a DescriptorSet {
        self.catalog
    }

    fn wants_definition(&self, key: &DefinitionKey) -> bool {
        match self.options.definitions {
            DefinitionPolicy::Explicit => false,
            DefinitionPolicy::Shared => self.shared.contains(key),
            DefinitionPolicy::All => true,
        }
    }
}

/// Effective metadata of one occurrence and the key it is shared under.
///
/// Occurrence metadata wins over type-level metadata; constraints inherited from an
/// enclosing list or map only fill what both leave unset.
fn occurrence_key(
    descriptor: &TypeDescriptor,
    occurrence: &Metadata,
    inherited: &Constraints,
) -> (Metadata, DefinitionKey) {
    let effective = occurrence.layered_over(&descriptor.metadata).inheriting(inherited);
    let key = DefinitionKey::new(descriptor.clone(), &effective);
    (effective, key)
}

// ---------------------------- Occurrence count ---------------------------- //

/// Pre-pass for `DefinitionPolicy::Shared`: counts occurrences per key, descending into
/// a key only the first time it is met. That keeps the walk linear and stops cycles.
struct OccurrenceCounter<'a> {
    catalog: &'a DescriptorSet,
    counts: HashMap<DefinitionKey, usize>,
}

impl<'a> OccurrenceCounter<'a> {
    fn new(catalog: &'a DescriptorSet) -> Self {
        Self { catalog, counts: HashMap::new() }
    }

    fn repeated(mut self, root: &TypeDescriptor) -> HashSet<DefinitionKey> {
        self.visit(root, &Metadata::default(), &Constraints::default());
        self.counts
            .into_iter()
            .filter(|(key, count)| *count > 1 && key.descriptor().kind.is_composite())
            .map(|(key, _)| key)
            .collect()
    }

    fn visit(&mut self, descriptor: &TypeDescriptor, occurrence: &Metadata, inherited: &Constraints) {
        let (effective, key) = occurrence_key(descriptor, occurrence, inherited);
        let seen = self.counts.entry(key).or_insert(0);
        *seen += 1;
        if *seen > 1 {
            return;
        }

        let inherited = effective.constraints();
        let children: Vec<(&Element, Constraints)> = match &descriptor.kind {
            Kind::List { element } => vec![(element.as_ref(), inherited)],
            Kind::Map { value, .. } => vec![(value.as_ref(), inherited)],
            Kind::Record { fields } => fields
                .iter()
                .map(|field| (&field.element, Constraints::default()))
                .collect(),
            Kind::TaggedUnion { variants } => variants
                .iter()
                .map(|variant| (&variant.element, Constraints::default()))
                .collect(),
            _ => Vec::new(),
        };

        for (element, inherited) in children {
            // Unresolvable children are reported by the synthesis pass proper.
            let Ok(child) = self.catalog.resolve(&element.ty, &FieldPath::root()) else {
                continue;
            };
            self.visit(&child, &element.metadata, &inherited);
        }
    }
}

// ------------------------------ Synthesizer ------------------------------- //

pub struct Synthesizer<'s, 'r> {
    cx: &'s BuildContext<'s>,
    registry: &'r mut Registry<'s>,
    /// Keys currently being inlined, innermost last.
    active: Vec<DefinitionKey>,
}

impl<'s, 'r> Synthesizer<'s, 'r> {
    pub fn new(cx: &'s BuildContext<'s>, registry: &'r mut Registry<'s>) -> Self {
        Self { cx, registry, active: Vec::new() }
    }

    pub fn options(&self) -> &'s SchemaOptions {
        self.cx.options()
    }

    pub fn catalog(&self) -> &'s DescriptorSet {
        self.cx.catalog()
    }

    pub fn synthesize_root(&mut self, root: &TypeDescriptor) -> Result<Fragment, SchemaError> {
        self.synthesize(root, &Metadata::default(), &Constraints::default(), &FieldPath::root())
    }

    /// Fragment for one occurrence of `descriptor` that carries `occurrence` metadata.
    pub fn synthesize(
        &mut self,
        descriptor: &TypeDescriptor,
        occurrence: &Metadata,
        inherited: &Constraints,
        path: &FieldPath,
    ) -> Result<Fragment, SchemaError> {
        let (effective, key) = occurrence_key(descriptor, occurrence, inherited);
        let cyclic = self.active.contains(&key);

        if effective.suppress_definition {
            if cyclic {
                return Err(SchemaError::UnboundedRecursion {
                    path: path.clone(),
                    name: descriptor.name.clone(),
                });
            }
            return self.inline(descriptor, &effective, key, path);
        }

        if cyclic || effective.promotion_requested() || self.cx.wants_definition(&key) {
            trace!(%path, ty = %descriptor.name, cyclic, "promoting to definition");
            if descriptor.nullable && effective.explicit_definition_id().is_some() {
                return Ok(self.promote_nullable(descriptor, occurrence, &effective, path));
            }
            return Ok(self.promote(descriptor, occurrence, &effective, key, path));
        }

        self.inline(descriptor, &effective, key, path)
    }

    /// Resolve a child position and synthesize it, filling unset constraints from
    /// `inherited`.
    pub fn element(
        &mut self,
        element: &Element,
        inherited: &Constraints,
        path: &FieldPath,
    ) -> Result<Fragment, SchemaError> {
        let catalog = self.catalog();
        let descriptor = catalog.resolve(&element.ty, path)?;
        self.synthesize(&descriptor, &element.metadata, inherited, path)
    }

    fn inline(
        &mut self,
        descriptor: &TypeDescriptor,
        effective: &Metadata,
        key: DefinitionKey,
        path: &FieldPath,
    ) -> Result<Fragment, SchemaError> {
        self.active.push(key);
        let shaped = self.shape(descriptor, effective, path);
        self.active.pop();

        let mut fragment = shaped?;
        if let Some(text) = effective.description_text() {
            fragment.insert("description".into(), text.into());
        }
        Ok(fragment)
    }

    /// `$ref` for the occurrence, with its own description beside it. The deferred
    /// body only carries the type-level description, so differently described
    /// occurrences still share one body.
    fn promote(
        &mut self,
        descriptor: &TypeDescriptor,
        occurrence: &Metadata,
        effective: &Metadata,
        key: DefinitionKey,
        path: &FieldPath,
    ) -> Fragment {
        let cx = self.cx;
        let body_metadata = Metadata {
            description: descriptor.metadata.description.clone(),
            ..effective.clone()
        };
        let body_key = key.clone();
        let body_descriptor = descriptor.clone();
        let body_path = path.clone();

        let mut fragment = self.registry.get(key, move |registry: &mut Registry<'s>| {
            Synthesizer::new(cx, registry).inline(&body_descriptor, &body_metadata, body_key, &body_path)
        });
        if let Some(text) = occurrence.description_text() {
            fragment.insert("description".into(), text.into());
        }
        fragment
    }

    /// A caller-chosen id names the non-null body, whichever occurrence queues it first.
    /// Nullable occurrences admit `null` next to the `$ref`.
    fn promote_nullable(
        &mut self,
        descriptor: &TypeDescriptor,
        occurrence: &Metadata,
        effective: &Metadata,
        path: &FieldPath,
    ) -> Fragment {
        let mut non_null = descriptor.clone();
        non_null.nullable = false;
        let key = DefinitionKey::new(non_null.clone(), effective);
        let reference = self.promote(&non_null, &Metadata::default(), effective, key, path);

        let mut fragment = Fragment::new();
        fragment.insert("anyOf".into(), Value::Array(vec![null_schema(), Value::Object(reference)]));
        if let Some(text) = occurrence.description_text() {
            fragment.insert("description".into(), text.into());
        }
        fragment
    }

    fn shape(
        &mut self,
        descriptor: &TypeDescriptor,
        effective: &Metadata,
        path: &FieldPath,
    ) -> Result<Fragment, SchemaError> {
        scalar::check_applicable(&descriptor.kind, effective, path)?;

        let fragment = match &descriptor.kind {
            Kind::Boolean => scalar::boolean(),
            Kind::IntegerNumber | Kind::FloatingNumber => scalar::number(effective),
            Kind::Text => scalar::text(effective),
            Kind::Enumeration { values } => scalar::enumeration(values),
            Kind::List { element } => collection::list(self, element, effective, path)?,
            Kind::Map { key, value } => collection::map(self, key, value, effective, path)?,
            Kind::Record { fields } => record::record(self, fields, path)?,
            // Nullable unions carry a leading null branch instead of if/else.
            Kind::TaggedUnion { variants } => {
                return union::tagged_union(self, variants, descriptor.nullable, path);
            }
            // Rejected by `check_applicable`.
            Kind::Other { .. } => Fragment::new(),
        };

        match descriptor.kind.json_type() {
            Some(json_type) if descriptor.nullable => Ok(nullable(json_type, fragment)),
            _ => Ok(fragment),
        }
    }
}

/// `{if: {type: T}, else: {type: "null"}}` merged with the fragment's other keys.
fn nullable(json_type: JsonType, fragment: Fragment) -> Fragment {
    let mut skeleton = Fragment::new();
    skeleton.insert("if".into(), Value::Object(typed(json_type)));
    skeleton.insert("else".into(), null_schema());

    let rest: Fragment = fragment.into_iter().filter(|(keyword, _)| keyword != "type").collect();
    merge_fragments(skeleton, rest)
}
