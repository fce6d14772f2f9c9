//! The main `evaluate` function.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::inline;
use crate::types::{assert_arity, Argument, ROOT};
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

/// Evaluates a program form against an execution context.
///
/// - `"$"` is the environment itself.
/// - Strings shaped like `a < b` or `a + b` are rewritten into `compare` or
///   arithmetic invocations; other `$...` strings read a path via `get`.
/// - Other strings are host values when the registry binds that name, else
///   literals.
/// - Arrays evaluate element-wise into a list; they are never calls.
/// - A single-key object whose key is an operator invokes it with the value
///   (wrapped into a one-element list unless it is an array) as unevaluated
///   arguments. A single `$...` key is assignment sugar for `set`.
/// - Any other object is a literal map with each value evaluated.
pub fn evaluate(form: &Json, ctx: &EvalCtx) -> Result<Value, EvalError> {
    match form {
        Json::String(s) => evaluate_str(s, ctx),
        Json::Array(items) => items
            .iter()
            .map(|item| evaluate(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::list),
        Json::Object(entries) => evaluate_object(entries, ctx),
        other => Ok(Value::from_json(other)),
    }
}

fn evaluate_str(s: &str, ctx: &EvalCtx) -> Result<Value, EvalError> {
    if s == ROOT {
        return Ok(ctx.env.as_value());
    }
    if let Some(cmp) = inline::comparison(s) {
        let args = [
            Argument::from(cmp.op.as_str()),
            Argument::from(cmp.left),
            Argument::from(cmp.right),
        ];
        return invoke("compare", &args, ctx);
    }
    if let Some(calc) = inline::arithmetic(s) {
        let args = [Argument::from(calc.left), Argument::from(calc.right)];
        return invoke(calc.op.operator_name(), &args, ctx);
    }
    if s.starts_with(ROOT) {
        return invoke("get", &[Argument::from(s)], ctx);
    }
    match ctx.registry.value(s) {
        Some(value) => Ok(value.clone()),
        None => Ok(Value::String(s.to_string())),
    }
}

fn evaluate_object(entries: &Map<String, Json>, ctx: &EvalCtx) -> Result<Value, EvalError> {
    if entries.len() == 1 {
        if let Some((key, operand)) = entries.iter().next() {
            if ctx.registry.operator(key).is_some() {
                let args: Vec<Argument> = match operand {
                    Json::Array(items) => items.iter().cloned().map(Argument::new).collect(),
                    other => vec![Argument::new(other.clone())],
                };
                return invoke(key, &args, ctx);
            }
            if key.starts_with(ROOT) {
                let args = [
                    Argument::new(Json::String(key.clone())),
                    Argument::new(operand.clone()),
                ];
                return invoke("set", &args, ctx);
            }
        }
    }
    entries
        .iter()
        .map(|(key, value)| Ok((key.clone(), evaluate(value, ctx)?)))
        .collect::<Result<IndexMap<String, Value>, EvalError>>()
        .map(Value::map)
}

/// Invokes a registered operator by name with unevaluated arguments.
pub fn invoke(name: &str, args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let def = ctx
        .registry
        .operator(name)
        .cloned()
        .ok_or_else(|| EvalError::UnknownOperator(name.to_string()))?;
    assert_arity(def.name, &def.arity, args.len())?;
    tracing::trace!(operator = def.name, operands = args.len(), "invoke");
    (def.eval_fn)(args, ctx)
}
