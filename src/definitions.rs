//! Definition registry: shared, by-reference schema bodies.
//!
//! `get` hands out a `$ref` right away and queues the body's creator. `drain` then runs
//! creators until no new ids show up. A creator may call `get` again, so one pass can
//! uncover definitions the previous pass did not know about (mutual recursion).

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::TypeDescriptor;
use crate::error::SchemaError;
use crate::fragment::{reference, Fragment};
use crate::metadata::{Constraints, Metadata};

/// Identity of a shareable occurrence: resolved descriptor, effective constraints and
/// the caller's definition id, if any.
///
/// Descriptors hash structurally and stop at named references, so keys stay finite on
/// cyclic graphs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey {
    descriptor: TypeDescriptor,
    constraints: Constraints,
    definition_id: Option<String>,
}

impl DefinitionKey {
    pub fn new(descriptor: TypeDescriptor, effective: &Metadata) -> Self {
        Self {
            descriptor,
            constraints: effective.constraints(),
            definition_id: effective.explicit_definition_id().map(str::to_owned),
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// The caller's id, or `<name>-<digest>` derived from the key's hash.
    pub fn id(&self) -> String {
        if let Some(id) = &self.definition_id {
            return id.clone();
        }
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        format!("{}-{:08x}", sanitize(&self.descriptor.name), hasher.finish() as u32)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '_' })
        .collect()
}

/// Key → id table plus the set of ids whose creator has already been queued.
#[derive(Debug, Default)]
struct IdLedger {
    ids: HashMap<DefinitionKey, String>,
    scheduled: HashSet<String>,
}

impl IdLedger {
    /// Returns the key's id and whether this call is the first to schedule it.
    fn claim(&mut self, key: DefinitionKey) -> (String, bool) {
        let id = match self.ids.get(&key) {
            Some(id) => id.clone(),
            None => {
                let id = key.id();
                debug!(%id, ty = %key.descriptor.name, "assigned definition id");
                self.ids.insert(key, id.clone());
                id
            }
        };
        let first = self.scheduled.insert(id.clone());
        (id, first)
    }
}

pub type Creator<'a> = Box<dyn FnOnce(&mut Registry<'a>) -> Result<Fragment, SchemaError> + 'a>;

/// Registry scoped to a single build; no locking.
#[derive(Default)]
pub struct Registry<'a> {
    ledger: IdLedger,
    pending: IndexMap<String, Creator<'a>>,
    materialized: Fragment,
}

impl fmt::Debug for Registry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("materialized", &self.materialized.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$ref` to the key's definition. The creator is queued only the first time the id
    /// is seen; later calls drop it unrun.
    pub fn get<F>(&mut self, key: DefinitionKey, creator: F) -> Fragment
    where
        F: FnOnce(&mut Registry<'a>) -> Result<Fragment, SchemaError> + 'a,
    {
        let (id, first) = self.ledger.claim(key);
        if first {
            self.pending.insert(id.clone(), Box::new(creator));
        }
        reference(&id)
    }

    pub fn is_scheduled(&self, id: &str) -> bool {
        self.ledger.scheduled.contains(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run pending creators to a fixed point and return every body, in materialization
    /// order.
    pub fn drain(mut self) -> Result<Fragment, SchemaError> {
        let mut pass = 0usize;
        while !self.pending.is_empty() {
            pass += 1;
            let batch = std::mem::take(&mut self.pending);
            let before = self.materialized.len();
            for (id, create) in batch {
                let body = create(&mut self)?;
                self.materialized.insert(id, serde_json::Value::Object(body));
            }
            debug!(
                pass,
                materialized = self.materialized.len() - before,
                discovered = self.pending.len(),
                "definition drain pass"
            );
        }
        Ok(self.materialized)
    }
}

// -------------------- shared mode --------------------

pub type SharedCreator =
    Box<dyn FnOnce(&SharedRegistry) -> Result<Fragment, SchemaError> + Send + 'static>;

#[derive(Default)]
struct SharedState {
    ledger: IdLedger,
    pending: IndexMap<String, SharedCreator>,
}

/// Registry that several concurrent builds may populate.
///
/// Id assignment and creator queuing happen under one lock (insert-if-absent), so racing
/// threads agree on an id and queue its creator once. Draining needs `&mut self` and
/// must happen after every producer is done.
#[derive(Default)]
pub struct SharedRegistry {
    state: Mutex<SharedState>,
    materialized: Mutex<Fragment>,
}

impl fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("SharedRegistry")
            .field("pending", &state.pending.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get<F>(&self, key: DefinitionKey, creator: F) -> Fragment
    where
        F: FnOnce(&SharedRegistry) -> Result<Fragment, SchemaError> + Send + 'static,
    {
        let mut state = self.state();
        let (id, first) = state.ledger.claim(key);
        if first {
            state.pending.insert(id.clone(), Box::new(creator));
        }
        reference(&id)
    }

    pub fn drain(&mut self) -> Result<Fragment, SchemaError> {
        loop {
            let batch = std::mem::take(&mut self.state().pending);
            if batch.is_empty() {
                break;
            }
            for (id, create) in batch {
                let body = create(self)?;
                self.materialized
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(id, serde_json::Value::Object(body));
            }
        }
        let materialized = self.materialized.get_mut().unwrap_or_else(PoisonError::into_inner);
        Ok(std::mem::take(materialized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use crate::fragment::{typed, JsonType};

    fn key(name: &str) -> DefinitionKey {
        DefinitionKey::new(TypeDescriptor::record(name, vec![]), &Metadata::new())
    }

    #[test]
    fn equal_keys_share_one_id_and_one_creator_run() {
        let runs = Rc::new(Cell::new(0));
        let mut registry = Registry::new();

        let mut refs = Vec::new();
        for _ in 0..3 {
            let runs = Rc::clone(&runs);
            refs.push(registry.get(key("A"), move |_| {
                runs.set(runs.get() + 1);
                Ok(typed(JsonType::Object))
            }));
        }
        assert!(refs.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(registry.pending_len(), 1);

        let definitions = registry.drain().unwrap();
        assert_eq!(runs.get(), 1);
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn explicit_ids_win_and_differ_from_hashed_ones() {
        let named = DefinitionKey::new(
            TypeDescriptor::record("A", vec![]),
            &Metadata::new().with_definition_id("Custom"),
        );
        assert_eq!(named.id(), "Custom");

        let hashed = key("my type").id();
        assert!(hashed.starts_with("my_type-"), "{hashed}");
        assert_eq!(hashed, key("my type").id());

        let constrained = DefinitionKey::new(
            TypeDescriptor::text(),
            &Metadata::new().with_pattern("[a-z]"),
        );
        let plain = DefinitionKey::new(TypeDescriptor::text(), &Metadata::new());
        assert_ne!(constrained.id(), plain.id());
    }

    #[test]
    fn drain_reaches_a_fixed_point_across_mutual_recursion() {
        fn peer_body<'a>(me: &'static str, other: &'static str) -> Creator<'a> {
            Box::new(move |registry: &mut Registry<'a>| -> Result<Fragment, SchemaError> {
                let other_ref = registry.get(key(other), peer_body(other, me));
                let mut fragment = typed(JsonType::Object);
                fragment.insert(
                    "properties".into(),
                    json!({ "peer": serde_json::Value::Object(other_ref) }),
                );
                Ok(fragment)
            })
        }

        let mut registry = Registry::new();
        let root = registry.get(key("A"), peer_body("A", "B"));
        let definitions = registry.drain().unwrap();

        assert_eq!(definitions.len(), 2);
        let a_id = key("A").id();
        let b_id = key("B").id();
        assert_eq!(root["$ref"], json!(format!("#/definitions/{a_id}")));
        assert_eq!(
            definitions[&a_id]["properties"]["peer"]["$ref"],
            json!(format!("#/definitions/{b_id}"))
        );
        assert_eq!(
            definitions[&b_id]["properties"]["peer"]["$ref"],
            json!(format!("#/definitions/{a_id}"))
        );
    }

    #[test]
    fn creator_errors_abort_the_drain() {
        let mut registry = Registry::new();
        registry.get(key("Broken"), |_| {
            Err(SchemaError::NotAnObject { found: "string" })
        });
        assert!(registry.drain().is_err());
    }

    #[test]
    fn shared_registry_queues_racing_creators_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = SharedRegistry::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let runs = Arc::clone(&runs);
                let registry = &registry;
                scope.spawn(move || {
                    registry.get(key("Raced"), move |_| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok(typed(JsonType::Object))
                    })
                });
            }
        });

        let definitions = registry.drain().unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
