//! The `function` operator.

use crate::closure::Closure;
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, Argument, OperatorDefinition, ROOT};
use crate::value::Value;
use serde_json::Value as Json;
use std::sync::Arc;

/// Reads a literal name list: a single string or an array of strings.
fn names(arg: &Argument, what: &str) -> Result<Vec<String>, EvalError> {
    let invalid = || {
        EvalError::argument(format!(
            "\"function\" {what} must be a string or a list of strings, got {}",
            arg.raw()
        ))
    };
    match arg.raw() {
        Json::String(name) => Ok(vec![name.clone()]),
        Json::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// `function(params, body, [fixed])`
///
/// Fixed names are read from the defining environment now, not at call time.
fn function_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let params = names(&args[0], "parameter list")?;
    let body = args[1].raw().clone();
    let fixed = match args.get(2) {
        Some(arg) => names(arg, "fixed list")?
            .into_iter()
            .map(|name| {
                let value = crate::evaluate(&Json::String(format!("{ROOT}.{name}")), ctx)?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, EvalError>>()?,
        None => Vec::new(),
    };
    tracing::debug!(?params, fixed = fixed.len(), "closure created");
    Ok(Value::Closure(Arc::new(Closure::new(params, body, fixed, ctx))))
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![Arc::new(OperatorDefinition {
        name: "function",
        aliases: &[],
        arity: Arity::Range(2, Some(3)),
        eval_fn: Arc::new(function_eval),
    })]
}
