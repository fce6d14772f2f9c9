use crate::value::{MapRef, Value};
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use serde_json::Value as Json;
use std::sync::Arc;

/// Scope name of the current iteration element.
pub const ITEM: &str = "item";
/// Scope name of the current iteration index.
pub const INDEX: &str = "index";
/// Scope name bound to the defining environment during a closure call.
pub const THIS: &str = "this";
/// Early-exit flag consulted by `sequence`.
pub const EXIT: &str = "exit";
/// Last non-null result of a `sequence`.
pub const SEQ: &str = "seq";
/// Per-nesting-level results of running `sequence` calls.
pub const SEQ_ARRAY: &str = "seqArray";

/// The mutable mapping a program runs against.
///
/// One map is at the same time the root document (`$`), the lexical scope of
/// closures and iteration variables, and the holder of the `exit` flag.
/// Clones share both the map and the access lock: whoever evaluates against an
/// environment (a top-level run, a timer tick, a closure call) holds
/// [`Environment::exclusive`] for the duration, so concurrent timelines take
/// turns instead of interleaving. The lock is re-entrant, so nested calls on
/// the same thread do not block.
#[derive(Clone)]
pub struct Environment {
    scope: MapRef,
    access: Arc<ReentrantMutex<()>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::from_map(Arc::new(Mutex::new(IndexMap::new())))
    }

    pub fn from_map(scope: MapRef) -> Self {
        Environment {
            scope,
            access: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Seeds a fresh environment from a JSON object. Non-object documents
    /// yield an empty environment.
    pub fn from_json(doc: &Json) -> Self {
        match Value::from_json(doc) {
            Value::Map(scope) => Environment::from_map(scope),
            _ => Environment::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.scope.lock().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        let previous = self.scope.lock().insert(name.to_string(), value);
        drop(previous);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.scope.lock().shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scope.lock().contains_key(name)
    }

    /// The environment as a map value; writes through it are visible here.
    pub fn as_value(&self) -> Value {
        Value::Map(Arc::clone(&self.scope))
    }

    pub fn scope(&self) -> &MapRef {
        &self.scope
    }

    /// Holds exclusive evaluation access until the guard is dropped.
    pub fn exclusive(&self) -> ReentrantMutexGuard<'_, ()> {
        self.access.lock()
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.scope, &other.scope)
    }

    pub fn to_json(&self) -> Json {
        self.as_value().to_json()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
