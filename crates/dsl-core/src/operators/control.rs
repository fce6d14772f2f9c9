//! Control-flow operators: `sequence`, `exit` and `when`.

use crate::env::{Environment, EXIT, SEQ, SEQ_ARRAY};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::{ListRef, Value};
use std::sync::Arc;

/// The `seqArray` list of the environment, created when absent.
fn seq_array(env: &Environment) -> ListRef {
    match env.get(SEQ_ARRAY) {
        Some(Value::List(list)) => list,
        _ => {
            let list = ListRef::default();
            env.set(SEQ_ARRAY, Value::List(Arc::clone(&list)));
            list
        }
    }
}

fn exit_requested(env: &Environment) -> bool {
    matches!(env.get(EXIT), Some(Value::Bool(true)))
}

/// `sequence(...forms)`
///
/// Each nesting level owns one slot of `seqArray` (its length on entry), so
/// a nested sequence cannot clobber the outer one's result. Stops after any
/// form that leaves `exit` set to true.
fn sequence_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let env = &ctx.env;
    let start = seq_array(env).lock().len();
    let mut outcome = Ok(());
    for arg in args {
        let value = match arg.evaluate(ctx) {
            Ok(value) => value,
            Err(err) => {
                outcome = Err(err);
                break;
            }
        };
        if !value.is_null() {
            env.set(SEQ, value.clone());
            let list = seq_array(env);
            let mut slots = list.lock();
            if slots.len() <= start {
                slots.resize(start + 1, Value::Null);
            }
            slots[start] = value;
        }
        if exit_requested(env) {
            break;
        }
    }
    seq_array(env).lock().truncate(start);
    outcome?;
    Ok(env.get(SEQ).unwrap_or(Value::Null))
}

fn exit_eval(_args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    ctx.env.set(EXIT, Value::Bool(true));
    Ok(Value::Null)
}

/// `when(cond1, branch1, cond2, branch2, ...)`
fn when_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let mut rest = args;
    while let Some((condition, tail)) = rest.split_first() {
        match condition.evaluate(ctx)? {
            Value::Bool(true) => {
                return match tail.first() {
                    Some(branch) => branch.evaluate(ctx),
                    None => Ok(Value::Null),
                };
            }
            Value::Bool(false) => rest = tail.get(1..).unwrap_or(&[]),
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "when condition {} evaluated to {}, expected bool",
                    condition.raw(),
                    other.kind_name()
                )))
            }
        }
    }
    Err(EvalError::NoMatch(format!(
        "when: none of {} conditions matched",
        args.len().div_ceil(2)
    )))
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "sequence",
            aliases: &[],
            arity: Arity::Any,
            eval_fn: Arc::new(sequence_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "exit",
            aliases: &[],
            arity: Arity::Any,
            eval_fn: Arc::new(exit_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "when",
            aliases: &[],
            arity: Arity::Any,
            eval_fn: Arc::new(when_eval),
        }),
    ]
}
