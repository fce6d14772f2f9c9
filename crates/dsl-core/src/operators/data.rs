//! Data access operators: `get`, `set` and `do`.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::path::{resolve, Location};
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::Value;
use std::sync::Arc;

/// `get(path, ...segments, [default])`
///
/// A trailing string operand (after the path) is the default. Other trailing
/// operands are evaluated and dereferenced one after another.
fn get_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let (path, mut segments) = (&args[0], &args[1..]);
    let mut default = Value::Null;
    if let Some((last, init)) = segments.split_last() {
        if last.as_raw_str().is_some() {
            default = last.evaluate(ctx)?;
            segments = init;
        }
    }

    let mut cursor = match resolve(ctx, path)? {
        Location::NotFound => return Ok(default),
        location => location.read().unwrap_or(Value::Null),
    };
    for segment in segments {
        let key = segment.evaluate(ctx)?;
        cursor = cursor.member(&key).unwrap_or(Value::Null);
    }
    if cursor.is_null() {
        Ok(default)
    } else {
        Ok(cursor)
    }
}

/// `set(path, value)`: writes in place; a path that does not reach an
/// existing container is a silent no-op.
fn set_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let value = args[1].evaluate(ctx)?;
    if let Location::Slot { key, parent } = resolve(ctx, &args[0])? {
        if key.as_str() != Some("") && !parent.is_null() {
            parent.assign(&key, value)?;
        }
    }
    Ok(Value::Null)
}

/// `do(path, ...args)`
///
/// Walks from the resolved value through further operands as member names
/// until a callable is reached, then calls it with the remaining operands.
fn do_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let mut cursor = match resolve(ctx, &args[0])? {
        Location::NotFound => return Ok(Value::Null),
        location => location.read().unwrap_or(Value::Null),
    };
    let mut rest = args[1..].iter();
    while !cursor.is_callable() {
        let Some(arg) = rest.next() else {
            break;
        };
        let key = arg.evaluate(ctx)?;
        cursor = match cursor.member(&key) {
            Some(value) => value,
            None => return Ok(Value::Null),
        };
    }
    if !cursor.is_callable() {
        return Ok(Value::Null);
    }
    let call_args = rest
        .map(|arg| arg.evaluate(ctx))
        .collect::<Result<Vec<_>, _>>()?;
    cursor.call(call_args)
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "get",
            aliases: &[],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(get_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "set",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: Arc::new(set_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "do",
            aliases: &[],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(do_eval),
        }),
    ]
}
