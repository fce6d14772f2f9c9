use crate::env::Environment;
use crate::registry::Registry;
use std::sync::Arc;

/// The execution context passed to every operator.
///
/// Cheap to clone: both fields are shared handles. Timers and closures keep
/// their own clone so they can keep evaluating after the call that created
/// them has returned.
#[derive(Clone)]
pub struct EvalCtx {
    /// The environment being evaluated against.
    pub env: Environment,
    /// Operators and host values used for recursive evaluation.
    pub registry: Arc<Registry>,
}

impl EvalCtx {
    pub fn new(env: Environment, registry: Arc<Registry>) -> Self {
        EvalCtx { env, registry }
    }

    /// A context over the same registry but a different environment.
    pub fn with_env(&self, env: Environment) -> Self {
        EvalCtx {
            env,
            registry: Arc::clone(&self.registry),
        }
    }
}
