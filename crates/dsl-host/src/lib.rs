//! Host collaborators for `dsl-core`.
//!
//! [`registry`] assembles the built-in operators together with the HTTP
//! client, the YAML bridge and a document store into one frozen
//! [`Registry`]:
//!
//! ```
//! use dsl_host::{config::HostConfig, registry, store::MemoryStore};
//! use dsl_core::{Program, Value};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = registry(&HostConfig::default(), Arc::new(MemoryStore::new()));
//! let program = Program::with_registry(json!({"parseYaml": "a: 1"}), registry);
//! assert_eq!(program.run_fresh().unwrap().to_json(), json!({"a": 1}));
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod store;
pub mod yaml;

use config::HostConfig;
use dsl_core::{OperatorDefinition, Registry, RegistryBuilder};
use std::sync::Arc;
use store::DocumentStore;

pub use error::HostError;

/// Operators contributed by the host collaborators.
pub fn host_operators(
    config: &HostConfig,
    store: Arc<dyn DocumentStore>,
) -> Vec<Arc<OperatorDefinition>> {
    let mut ops = Vec::new();
    ops.extend(http::operators(Arc::new(http::HttpClient::new(&config.http))));
    ops.extend(yaml::operators());
    ops.extend(store::operators(store));
    ops
}

/// Built-in operators plus every host collaborator.
pub fn registry(config: &HostConfig, store: Arc<dyn DocumentStore>) -> Arc<Registry> {
    RegistryBuilder::with_builtins()
        .operators(host_operators(config, store))
        .build()
}
