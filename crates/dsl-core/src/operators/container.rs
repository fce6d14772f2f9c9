//! `len` and `reverse`.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::Value;
use std::sync::Arc;

fn len_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let len = match args[0].evaluate(ctx)? {
        Value::List(items) => items.lock().len(),
        Value::Map(entries) => entries.lock().len(),
        Value::String(s) => s.chars().count(),
        other => {
            return Err(EvalError::type_mismatch(format!(
                "len expects a list, map or string, got {}",
                other.kind_name()
            )))
        }
    };
    Ok(Value::Int(len as i64))
}

/// Returns a reversed copy; the source list is left untouched.
fn reverse_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    match args[0].evaluate(ctx)? {
        Value::List(items) => {
            let mut copy = items.lock().clone();
            copy.reverse();
            Ok(Value::list(copy))
        }
        other => Err(EvalError::type_mismatch(format!(
            "reverse expects a list, got {}",
            other.kind_name()
        ))),
    }
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "len",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: Arc::new(len_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "reverse",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: Arc::new(reverse_eval),
        }),
    ]
}
