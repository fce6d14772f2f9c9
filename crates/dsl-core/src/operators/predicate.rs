//! Equality and pattern predicates: `is`, `not`, `in` and `regexp`.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::Value;
use regex::Regex;
use std::sync::Arc;

/// A string tested against a pattern matches by search; anything else
/// compares structurally.
fn matches(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), Value::Pattern(re)) | (Value::Pattern(re), Value::String(s)) => {
            re.is_match(s)
        }
        _ => left.structural_eq(right),
    }
}

fn is_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let left = args[0].evaluate(ctx)?;
    let right = args[1].evaluate(ctx)?;
    Ok(Value::Bool(matches(&left, &right)))
}

fn not_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let left = args[0].evaluate(ctx)?;
    let right = args[1].evaluate(ctx)?;
    Ok(Value::Bool(!left.structural_eq(&right)))
}

/// `in(value, ...candidates)`: candidates are evaluated lazily and the first
/// hit wins.
fn in_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let value = args[0].evaluate(ctx)?;
    for arg in &args[1..] {
        let hit = match arg.evaluate(ctx)? {
            Value::Pattern(re) => re.is_match(&value.to_text()),
            candidate => candidate.structural_eq(&value),
        };
        if hit {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn regexp_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let source = match args[0].evaluate(ctx)? {
        Value::String(source) => source,
        other => {
            return Err(EvalError::argument(format!(
                "regexp source must be a string, got {}",
                other.kind_name()
            )))
        }
    };
    Regex::new(&source)
        .map(|re| Value::Pattern(Arc::new(re)))
        .map_err(|err| EvalError::argument(format!("invalid pattern {source:?}: {err}")))
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "is",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: Arc::new(is_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "not",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: Arc::new(not_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "in",
            aliases: &[],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(in_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "regexp",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: Arc::new(regexp_eval),
        }),
    ]
}
