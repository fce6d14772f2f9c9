//! Iteration operators: `forEach`, `filter`, `map` and `toUnique`.
//!
//! All of them bind the current element and its position directly in the
//! shared environment, so the body sees (and may overwrite) the caller's
//! variables of the same name.

use super::literal_str;
use crate::dedup;
use crate::env::{Environment, INDEX, ITEM};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::Value;
use std::sync::Arc;

#[derive(Clone, Copy)]
enum Mode {
    ForEach,
    Filter,
    Map,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Mode::ForEach => "forEach",
            Mode::Filter => "filter",
            Mode::Map => "map",
        }
    }
}

fn bind(env: &Environment, var: &str, index: usize, item: Value) {
    env.set(var, item);
    env.set(INDEX, Value::Int(index as i64));
}

fn iterate(mode: Mode, args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let var = match args.get(2) {
        Some(arg) => literal_str(mode.name(), arg, "item variable")?,
        None => ITEM,
    };
    let items = args[0].evaluate(ctx)?.to_elements();
    let body = &args[1];
    let env = &ctx.env;

    let mut kept = Vec::new();
    for (index, item) in items.iter().enumerate() {
        bind(env, var, index, item.clone());
        let result = body.evaluate(ctx)?;
        match mode {
            Mode::ForEach => {}
            Mode::Map => kept.push(result),
            Mode::Filter => match result {
                Value::Bool(true) => kept.push(item.clone()),
                Value::Bool(false) => {}
                other => {
                    return Err(EvalError::type_mismatch(format!(
                        "filter predicate {} evaluated to {}, expected bool",
                        body.raw(),
                        other.kind_name()
                    )))
                }
            },
        }
    }
    if !items.is_empty() {
        env.remove(var);
        env.remove(INDEX);
    }

    Ok(match mode {
        Mode::ForEach => Value::Null,
        Mode::Filter | Mode::Map => Value::list(kept),
    })
}

fn for_each_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    iterate(Mode::ForEach, args, ctx)
}

fn filter_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    iterate(Mode::Filter, args, ctx)
}

fn map_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    iterate(Mode::Map, args, ctx)
}

/// `toUnique(kind, keyExpr, capacity, source)`
///
/// Keeps the elements whose key has not been seen recently by the window
/// named `kind`. Windows outlive the call and are shared by every program in
/// the process.
fn to_unique_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let kind = match args[0].evaluate(ctx)? {
        Value::String(kind) => kind,
        other => {
            return Err(EvalError::argument(format!(
                "toUnique kind must be a string, got {}",
                other.kind_name()
            )))
        }
    };
    let capacity = match args[2].evaluate(ctx)? {
        Value::Int(n) if n > 0 => n as usize,
        other => {
            return Err(EvalError::argument(format!(
                "toUnique capacity must be a positive integer, got {other}"
            )))
        }
    };
    let items = match args[3].evaluate(ctx)? {
        Value::List(items) => items.lock().clone(),
        other => {
            return Err(EvalError::type_mismatch(format!(
                "toUnique source must be a list, got {}",
                other.kind_name()
            )))
        }
    };

    let window = dedup::window(&kind, capacity);
    let env = &ctx.env;
    let mut kept = Vec::new();
    let outcome = items.into_iter().enumerate().try_for_each(|(index, item)| {
        bind(env, ITEM, index, item.clone());
        let key = args[1].evaluate(ctx)?.identity_key();
        if window.lock().admit(key) {
            kept.push(item);
        }
        Ok::<(), EvalError>(())
    });
    env.remove(ITEM);
    env.remove(INDEX);
    outcome?;
    Ok(Value::list(kept))
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "forEach",
            aliases: &[],
            arity: Arity::Range(2, Some(3)),
            eval_fn: Arc::new(for_each_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "filter",
            aliases: &[],
            arity: Arity::Range(2, Some(3)),
            eval_fn: Arc::new(filter_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "map",
            aliases: &[],
            arity: Arity::Range(2, Some(3)),
            eval_fn: Arc::new(map_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "toUnique",
            aliases: &[],
            arity: Arity::Fixed(4),
            eval_fn: Arc::new(to_unique_eval),
        }),
    ]
}
