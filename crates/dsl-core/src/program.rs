//! Reusable program handles.

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::evaluate::evaluate;
use crate::registry::Registry;
use crate::value::Value;
use serde_json::Value as Json;
use std::sync::Arc;

/// A parsed program bound to a registry, runnable against any number of
/// environments.
#[derive(Clone)]
pub struct Program {
    form: Json,
    registry: Arc<Registry>,
}

impl Program {
    /// A program using the process-wide registry.
    pub fn new(form: Json) -> Self {
        Program::with_registry(form, Registry::global())
    }

    pub fn with_registry(form: Json, registry: Arc<Registry>) -> Self {
        Program { form, registry }
    }

    pub fn form(&self) -> &Json {
        &self.form
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Evaluates the program against `env`, holding the environment's
    /// exclusive access for the whole run. Timers started by the program
    /// tick only once the run has returned.
    pub fn run(&self, env: &Environment) -> Result<Value, EvalError> {
        let _access = env.exclusive();
        let ctx = EvalCtx::new(env.clone(), Arc::clone(&self.registry));
        evaluate(&self.form, &ctx)
    }

    /// Runs against a fresh, empty environment.
    pub fn run_fresh(&self) -> Result<Value, EvalError> {
        self.run(&Environment::new())
    }
}
