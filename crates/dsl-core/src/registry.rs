//! The operator table and the host-value table.
//!
//! A [`Registry`] is assembled once with a [`RegistryBuilder`] and frozen
//! behind an `Arc`; evaluation only ever reads it, from any number of threads.

use crate::types::{operators_to_map, OperatorDefinition, OperatorMap};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub struct Registry {
    operators: OperatorMap,
    values: HashMap<String, Value>,
}

impl Registry {
    /// Looks up an operator by name or alias.
    pub fn operator(&self, name: &str) -> Option<&Arc<OperatorDefinition>> {
        self.operators.get(name)
    }

    /// Looks up a host-provided constant or function.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// The process-wide registry: whatever was passed to [`Registry::install`],
    /// or the built-in operators alone.
    pub fn global() -> Arc<Registry> {
        Arc::clone(GLOBAL.get_or_init(|| RegistryBuilder::with_builtins().build()))
    }

    /// Installs the process-wide registry. Fails (returning the argument) once
    /// a registry has been installed or [`Registry::global`] has been read.
    pub fn install(registry: Arc<Registry>) -> Result<(), Arc<Registry>> {
        GLOBAL.set(registry)
    }
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

#[derive(Default)]
pub struct RegistryBuilder {
    operators: Vec<Arc<OperatorDefinition>>,
    values: HashMap<String, Value>,
}

impl RegistryBuilder {
    /// An empty builder with no operators.
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// A builder pre-populated with every built-in operator.
    pub fn with_builtins() -> Self {
        RegistryBuilder {
            operators: crate::operators::all_operators(),
            values: HashMap::new(),
        }
    }

    /// Adds an operator. A later definition under the same name wins.
    pub fn operator(mut self, definition: OperatorDefinition) -> Self {
        self.operators.push(Arc::new(definition));
        self
    }

    pub fn operators(mut self, definitions: Vec<Arc<OperatorDefinition>>) -> Self {
        self.operators.extend(definitions);
        self
    }

    /// Binds a bare name to a host value (constant, host function, ...).
    pub fn value(mut self, name: &str, value: Value) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> Arc<Registry> {
        tracing::debug!(
            operators = self.operators.len(),
            values = self.values.len(),
            "registry built"
        );
        Arc::new(Registry {
            operators: operators_to_map(self.operators),
            values: self.values,
        })
    }
}
