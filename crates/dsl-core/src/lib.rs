//! Evaluator for a data-as-code automation language.
//!
//! # Overview
//!
//! Programs are plain JSON-shaped documents (usually written in YAML). A
//! single-key object whose key names an operator is an invocation, strings
//! starting with `$` are paths into the environment, strings such as
//! `"$.n >= 3"` or `"$.n * 2"` are inline comparisons and arithmetic, and
//! everything else is data.
//!
//! # Example
//!
//! ```
//! use dsl_core::{Environment, Program, Value};
//! use serde_json::json;
//!
//! let program = Program::new(json!({"sequence": [
//!     {"$.total": 0},
//!     {"forEach": [[1, 2, 3], {"$.total": "$.total + $.item"}]},
//!     "$.total"
//! ]}));
//! let env = Environment::new();
//! assert_eq!(program.run(&env).unwrap(), Value::Int(6));
//! ```

pub mod closure;
pub mod dedup;
pub mod env;
pub mod error;
pub mod eval_ctx;
pub mod evaluate;
pub mod inline;
pub mod operators;
pub mod path;
pub mod program;
pub mod registry;
pub mod timer;
pub mod types;
pub mod value;

pub use closure::Closure;
pub use env::Environment;
pub use error::EvalError;
pub use eval_ctx::EvalCtx;
pub use evaluate::{evaluate, invoke};
pub use operators::operators_map;
pub use program::Program;
pub use registry::{Registry, RegistryBuilder};
pub use timer::TimerHandle;
pub use types::{Arity, Argument, EvalFn, OperatorDefinition, OperatorMap};
pub use value::{HostFn, NativeHandle, NativeObject, Value};
