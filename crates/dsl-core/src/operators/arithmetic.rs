//! Integer arithmetic and comparison operators.
//!
//! Operands are coerced with [`Value::to_int`]: numeric strings parse and
//! floats truncate. Overflow wraps.

use super::{evaluate_all, literal_str};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::inline::CompareOp;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::Value;
use std::sync::Arc;

/// Evaluates every operand first, then coerces them in order.
fn ints(args: &[Argument], ctx: &EvalCtx) -> Result<Vec<i64>, EvalError> {
    evaluate_all(args, ctx)?.iter().map(Value::to_int).collect()
}

fn division_by_zero() -> EvalError {
    EvalError::type_mismatch("division by zero")
}

fn plus_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let sum = ints(args, ctx)?.into_iter().fold(0i64, i64::wrapping_add);
    Ok(Value::Int(sum))
}

fn multiply_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let product = ints(args, ctx)?.into_iter().fold(1i64, i64::wrapping_mul);
    Ok(Value::Int(product))
}

fn minus_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let operands = ints(args, ctx)?;
    let difference = operands[1..]
        .iter()
        .fold(operands[0], |acc, n| acc.wrapping_sub(*n));
    Ok(Value::Int(difference))
}

fn divide_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let operands = ints(args, ctx)?;
    operands[1..]
        .iter()
        .try_fold(operands[0], |acc, &divisor| {
            if divisor == 0 {
                return Err(division_by_zero());
            }
            Ok(acc.wrapping_div(divisor))
        })
        .map(Value::Int)
}

fn mod_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let operands = ints(args, ctx)?;
    operands[1..]
        .iter()
        .try_fold(operands[0], |acc, &divisor| {
            if divisor == 0 {
                return Err(division_by_zero());
            }
            Ok(acc.wrapping_rem(divisor))
        })
        .map(Value::Int)
}

/// `compare(op, left, right)` with `op` one of `< <= > >=`.
fn compare_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let raw = literal_str("compare", &args[0], "operator")?;
    let op = CompareOp::parse(raw)
        .ok_or_else(|| EvalError::argument(format!("unknown comparison operator \"{raw}\"")))?;
    let left = args[1].evaluate(ctx)?;
    let right = args[2].evaluate(ctx)?;
    let (left, right) = (left.to_int()?, right.to_int()?);
    Ok(Value::Bool(op.holds(left, right)))
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "plus",
            aliases: &["+"],
            arity: Arity::Any,
            eval_fn: Arc::new(plus_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "minus",
            aliases: &["-"],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(minus_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "multiply",
            aliases: &["*"],
            arity: Arity::Any,
            eval_fn: Arc::new(multiply_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "divide",
            aliases: &["/"],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(divide_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "mod",
            aliases: &["%"],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(mod_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "compare",
            aliases: &[],
            arity: Arity::Fixed(3),
            eval_fn: Arc::new(compare_eval),
        }),
    ]
}
