//! Integration tests for the host collaborators.

use dsl_core::{Environment, EvalError, Program, Value};
use dsl_host::config::HostConfig;
use dsl_host::store::{Document, DocumentStore, InsertResult, MemoryStore};
use dsl_host::{registry, yaml};
use proptest::prelude::*;
use serde_json::{json, Value as Json};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn run_with(store: Arc<MemoryStore>, form: Json, env: &Environment) -> Result<Value, EvalError> {
    let registry = registry(&HostConfig::default(), store);
    Program::with_registry(form, registry).run(env)
}

fn check(form: Json, expected: Json) {
    let result = run_with(Arc::new(MemoryStore::new()), form.clone(), &Environment::new())
        .unwrap_or_else(|e| panic!("evaluate({}) failed: {}", form, e));
    assert_eq!(result.to_json(), expected, "form: {}", form);
}

/// Serves one canned HTTP response on a local port and returns its URL.
fn serve_once(status: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/")
}

// ---------------------------------------------------------------- YAML

#[test]
fn test_parse_yaml() {
    check(
        json!({"parseYaml": "name: box\ntags: [a, b]\nsize: 3\nratio: 0.5\nok: true\nnone: ~\n"}),
        json!({"name": "box", "tags": ["a", "b"], "size": 3, "ratio": 0.5, "ok": true, "none": null}),
    );
}

#[test]
fn test_parse_yaml_errors() {
    let err = run_with(
        Arc::new(MemoryStore::new()),
        json!({"parseYaml": "a: [1, 2"}),
        &Environment::new(),
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::HostCollaborator(_)), "got: {}", err);

    let err = run_with(Arc::new(MemoryStore::new()), json!({"parseYaml": [[1]]}), &Environment::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

#[test]
fn test_yaml_program_runs() {
    let form = yaml::parse_yaml(
        "sequence:\n  - $.total: 0\n  - forEach:\n      - [1, 2, 3]\n      - $.total: $.total + $.item\n  - $.total\n",
    )
    .unwrap();
    let result = run_with(Arc::new(MemoryStore::new()), form, &Environment::new()).unwrap();
    assert_eq!(result, Value::Int(6));
}

#[test]
fn test_run_yaml_is_detached() {
    let store = Arc::new(MemoryStore::new());
    let result = run_with(
        Arc::clone(&store),
        json!({"runYaml": "mongoInsert: [jobs, {state: done}]"}),
        &Environment::new(),
    )
    .unwrap();
    assert_eq!(result, Value::Null);

    let mut docs = Vec::new();
    for _ in 0..50 {
        docs = store.find_all("jobs").unwrap();
        if !docs.is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get("state"), Some(&json!("done")));
}

#[test]
fn test_load_program_by_extension() {
    let dir = std::env::temp_dir().join(format!("dsl-host-load-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let json_path = dir.join("p.json");
    let yaml_path = dir.join("p.yaml");
    std::fs::write(&json_path, r#"{"plus": [1, 2]}"#).unwrap();
    std::fs::write(&yaml_path, "plus: [1, 2]\n").unwrap();
    assert_eq!(yaml::load_program(&json_path).unwrap(), json!({"plus": [1, 2]}));
    assert_eq!(yaml::load_program(&yaml_path).unwrap(), json!({"plus": [1, 2]}));
    assert!(yaml::load_program(&dir.join("missing.yaml")).is_err());
    std::fs::remove_dir_all(&dir).unwrap();
}

fn scalar() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::from),
        any::<i32>().prop_map(Json::from),
        "[a-z][a-z0-9]{0,8}".prop_map(Json::from),
    ]
}

fn document() -> impl Strategy<Value = Json> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Json::from),
            proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Json::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn yaml_text_keeps_shape(doc in document()) {
        let text = serde_yaml::to_string(&doc).unwrap();
        let parsed = yaml::parse_yaml(&text).unwrap();
        prop_assert_eq!(Value::from_json(&parsed).to_json(), doc);
    }
}

// ---------------------------------------------------------------- Store

#[test]
fn test_store_operators() {
    let store = Arc::new(MemoryStore::new());
    let env = Environment::new();
    let inserted = run_with(
        Arc::clone(&store),
        json!({"sequence": [
            {"$.r": {"mongoInsert": ["items", {"_id": "a", "qty": 1}]}},
            "$.r.insertedId"
        ]}),
        &env,
    )
    .unwrap();
    assert_eq!(inserted, Value::from("a"));

    let replaced = run_with(
        Arc::clone(&store),
        json!({"sequence": [
            {"$.r": {"mongoReplace": ["items", {"_id": "a", "qty": 5}]}},
            "$.r.matched"
        ]}),
        &env,
    )
    .unwrap();
    assert_eq!(replaced, Value::Bool(true));

    let all = run_with(Arc::clone(&store), json!({"mongoGet": "items"}), &env).unwrap();
    assert_eq!(all.to_json(), json!([{"_id": "a", "qty": 5}]));
}

#[test]
fn test_insert_result_handle() {
    let store = Arc::new(MemoryStore::new());
    let result = run_with(store, json!({"mongoInsert": ["items", {"qty": 1}]}), &Environment::new())
        .unwrap();
    let Value::Native(handle) = result else {
        panic!("expected native handle");
    };
    let insert = handle.downcast_ref::<InsertResult>().unwrap();
    assert!(insert.inserted_id.is_string());
}

#[test]
fn test_store_argument_errors() {
    let store = Arc::new(MemoryStore::new());
    let err = run_with(Arc::clone(&store), json!({"mongoGet": [["items"]]}), &Environment::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::ArityOrArgument(_)), "got: {}", err);
    let err = run_with(store, json!({"mongoInsert": ["items", 3]}), &Environment::new()).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch(_)), "got: {}", err);
}

/// Stand-in for a database that cannot be reached.
struct OfflineStore;

impl DocumentStore for OfflineStore {
    fn find_all(&self, _collection: &str) -> Result<Vec<Document>, EvalError> {
        Err(EvalError::host("store offline"))
    }

    fn insert(&self, _collection: &str, _doc: Document) -> Result<Json, EvalError> {
        Err(EvalError::host("store offline"))
    }

    fn replace(&self, _collection: &str, _doc: Document) -> Result<bool, EvalError> {
        Err(EvalError::host("store offline"))
    }
}

#[test]
fn test_custom_store_backend() {
    let registry = registry(&HostConfig::default(), Arc::new(OfflineStore));
    for form in [
        json!({"mongoGet": "items"}),
        json!({"mongoInsert": ["items", {"qty": 1}]}),
        json!({"mongoReplace": ["items", {"_id": "a"}]}),
    ] {
        let err = Program::with_registry(form.clone(), Arc::clone(&registry))
            .run_fresh()
            .unwrap_err();
        assert_eq!(err, EvalError::host("store offline"), "form: {}", form);
    }
}

// ---------------------------------------------------------------- HTTP

#[test]
fn test_request_text_and_structured() {
    let url = serve_once("200 OK", "hello");
    check(json!({"request": ["get", url]}), json!("hello"));

    let url = serve_once("200 OK", r#"{"items": [1, 2]}"#);
    check(json!({"fetch": ["GET", url, "json"]}), json!({"items": [1, 2]}));
}

#[test]
fn test_request_failures() {
    let url = serve_once("404 Not Found", "missing");
    let err = run_with(
        Arc::new(MemoryStore::new()),
        json!({"request": ["get", url]}),
        &Environment::new(),
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::HostCollaborator(_)), "got: {}", err);

    let url = serve_once("200 OK", "not json");
    let err = run_with(
        Arc::new(MemoryStore::new()),
        json!({"request": ["get", url, "structured"]}),
        &Environment::new(),
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::HostCollaborator(_)), "got: {}", err);
}

#[test]
fn test_request_other_methods_are_null() {
    check(json!({"request": ["post", "http://127.0.0.1:9/"]}), json!(null));
}
