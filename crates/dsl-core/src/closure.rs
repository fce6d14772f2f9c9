use crate::env::{Environment, EXIT, THIS};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::registry::Registry;
use crate::value::Value;
use serde_json::Value as Json;
use std::sync::Arc;

/// A callable built by the `function` operator.
///
/// The closure shares (does not copy) the environment it was defined in and
/// runs its body against that same map. A call binds parameters, `this` and
/// the fixed values into the map, and afterwards removes only `exit` and
/// `this`: parameter and fixed bindings stay behind in the environment after
/// the call returns.
pub struct Closure {
    params: Vec<String>,
    body: Json,
    fixed: Vec<(String, Value)>,
    env: Environment,
    registry: Arc<Registry>,
}

impl Closure {
    pub fn new(
        params: Vec<String>,
        body: Json,
        fixed: Vec<(String, Value)>,
        ctx: &EvalCtx,
    ) -> Self {
        Closure {
            params,
            body,
            fixed,
            env: ctx.env.clone(),
            registry: Arc::clone(&ctx.registry),
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &Json {
        &self.body
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Calls the closure with positional arguments. A parameter without a
    /// matching argument keeps whatever binding it already had.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        let _access = self.env.exclusive();
        for (name, value) in self.params.iter().zip(args) {
            self.env.set(name, value);
        }
        self.env.set(THIS, self.env.as_value());
        for (name, value) in &self.fixed {
            self.env.set(name, value.clone());
        }
        let ctx = EvalCtx::new(self.env.clone(), Arc::clone(&self.registry));
        let result = crate::evaluate(&self.body, &ctx);
        self.env.remove(EXIT);
        self.env.remove(THIS);
        result
    }
}
