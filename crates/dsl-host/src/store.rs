//! Document persistence behind the `mongoGet`, `mongoInsert` and
//! `mongoReplace` operators.
//!
//! Documents cross the store boundary as JSON objects. Each is identified by
//! its `_id` field; inserts without one get a generated id.
//!
//! The only backend shipped here is the in-process [`MemoryStore`]. There is
//! no MongoDB-backed [`DocumentStore`]; a real database is plugged in by
//! implementing the trait and passing it to [`operators`].

use dsl_core::{
    Argument, Arity, EvalCtx, EvalError, NativeHandle, NativeObject, OperatorDefinition, Value,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value as Json};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const ID_FIELD: &str = "_id";

pub type Document = Map<String, Json>;

/// A collection-oriented document store.
pub trait DocumentStore: Send + Sync {
    /// Every document of `collection`, in insertion order. Unknown
    /// collections are empty.
    fn find_all(&self, collection: &str) -> Result<Vec<Document>, EvalError>;

    /// Stores `doc` and returns its `_id`.
    fn insert(&self, collection: &str, doc: Document) -> Result<Json, EvalError>;

    /// Replaces the document whose `_id` equals `doc`'s. Returns whether one
    /// matched.
    fn replace(&self, collection: &str, doc: Document) -> Result<bool, EvalError>;
}

/// Process-local [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn generate_id(&self) -> Json {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Json::String(format!("{n:024x}"))
    }
}

impl DocumentStore for MemoryStore {
    fn find_all(&self, collection: &str) -> Result<Vec<Document>, EvalError> {
        Ok(self
            .collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn insert(&self, collection: &str, mut doc: Document) -> Result<Json, EvalError> {
        let id = match doc.get(ID_FIELD) {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let id = self.generate_id();
                doc.insert(ID_FIELD.to_string(), id.clone());
                id
            }
        };
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
            return Err(EvalError::host(format!(
                "duplicate {ID_FIELD} {id} in collection {collection}"
            )));
        }
        docs.push(doc);
        Ok(id)
    }

    fn replace(&self, collection: &str, doc: Document) -> Result<bool, EvalError> {
        let Some(id) = doc.get(ID_FIELD).cloned() else {
            return Ok(false);
        };
        let mut collections = self.collections.lock();
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|existing| existing.get(ID_FIELD) == Some(&id)));
        match slot {
            Some(existing) => {
                *existing = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Outcome of `mongoInsert`, readable as `$.result.insertedId`.
pub struct InsertResult {
    pub inserted_id: Json,
}

impl NativeObject for InsertResult {
    fn type_name(&self) -> &'static str {
        "insertResult"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "insertedId" => Some(Value::from_json(&self.inserted_id)),
            _ => None,
        }
    }

    fn to_json(&self) -> Json {
        json!({"insertedId": self.inserted_id})
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Outcome of `mongoReplace`, readable as `$.result.matched`.
pub struct ReplaceResult {
    pub matched: bool,
}

impl NativeObject for ReplaceResult {
    fn type_name(&self) -> &'static str {
        "replaceResult"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "matched" => Some(Value::Bool(self.matched)),
            _ => None,
        }
    }

    fn to_json(&self) -> Json {
        json!({"matched": self.matched})
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn collection<'a>(operator: &str, arg: &'a Argument) -> Result<&'a str, EvalError> {
    arg.as_raw_str().ok_or_else(|| {
        EvalError::argument(format!(
            "{operator} collection must be a string literal, got {}",
            arg.raw()
        ))
    })
}

fn document(operator: &str, arg: &Argument, ctx: &EvalCtx) -> Result<Document, EvalError> {
    match arg.evaluate(ctx)?.to_json() {
        Json::Object(doc) => Ok(doc),
        other => Err(EvalError::type_mismatch(format!(
            "{operator} expects a map document, got {other}"
        ))),
    }
}

fn get_eval(store: &dyn DocumentStore, args: &[Argument], _ctx: &EvalCtx) -> Result<Value, EvalError> {
    let name = collection("mongoGet", &args[0])?;
    let docs = store.find_all(name)?;
    Ok(Value::list(
        docs.into_iter()
            .map(|doc| Value::from_json(&Json::Object(doc)))
            .collect(),
    ))
}

fn insert_eval(store: &dyn DocumentStore, args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let name = collection("mongoInsert", &args[0])?;
    let doc = document("mongoInsert", &args[1], ctx)?;
    let inserted_id = store.insert(name, doc)?;
    tracing::debug!(collection = name, id = %inserted_id, "document inserted");
    Ok(Value::Native(NativeHandle::new(InsertResult { inserted_id })))
}

fn replace_eval(store: &dyn DocumentStore, args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let name = collection("mongoReplace", &args[0])?;
    let doc = document("mongoReplace", &args[1], ctx)?;
    let matched = store.replace(name, doc)?;
    Ok(Value::Native(NativeHandle::new(ReplaceResult { matched })))
}

pub fn operators(store: Arc<dyn DocumentStore>) -> Vec<Arc<OperatorDefinition>> {
    let (get_store, insert_store, replace_store) =
        (Arc::clone(&store), Arc::clone(&store), store);
    vec![
        Arc::new(OperatorDefinition {
            name: "mongoGet",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: Arc::new(move |args: &[Argument], ctx: &EvalCtx| {
                get_eval(get_store.as_ref(), args, ctx)
            }),
        }),
        Arc::new(OperatorDefinition {
            name: "mongoInsert",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: Arc::new(move |args: &[Argument], ctx: &EvalCtx| {
                insert_eval(insert_store.as_ref(), args, ctx)
            }),
        }),
        Arc::new(OperatorDefinition {
            name: "mongoReplace",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: Arc::new(move |args: &[Argument], ctx: &EvalCtx| {
                replace_eval(replace_store.as_ref(), args, ctx)
            }),
        }),
    ]
}
