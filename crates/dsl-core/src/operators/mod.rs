//! Built-in operator definitions.

pub mod arithmetic;
pub mod container;
pub mod control;
pub mod data;
pub mod function;
pub mod iteration;
pub mod predicate;
pub mod schedule;
pub mod string;

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Argument, OperatorDefinition, OperatorMap, operators_to_map};
use crate::value::Value;
use std::sync::Arc;

/// All built-in operators.
pub fn all_operators() -> Vec<Arc<OperatorDefinition>> {
    let mut ops = Vec::new();
    ops.extend(data::operators());
    ops.extend(function::operators());
    ops.extend(control::operators());
    ops.extend(iteration::operators());
    ops.extend(arithmetic::operators());
    ops.extend(predicate::operators());
    ops.extend(string::operators());
    ops.extend(container::operators());
    ops.extend(schedule::operators());
    ops
}

/// Build the operator map from all built-in operators.
pub fn operators_map() -> OperatorMap {
    operators_to_map(all_operators())
}

/// Evaluates every argument left to right, stopping at the first error.
pub(crate) fn evaluate_all(args: &[Argument], ctx: &EvalCtx) -> Result<Vec<Value>, EvalError> {
    args.iter().map(|arg| arg.evaluate(ctx)).collect()
}

/// Reads an unevaluated operand that must be a string literal.
pub(crate) fn literal_str<'a>(
    operator: &str,
    arg: &'a Argument,
    what: &str,
) -> Result<&'a str, EvalError> {
    arg.as_raw_str().ok_or_else(|| {
        EvalError::argument(format!(
            "\"{operator}\" {what} must be a string literal, got {}",
            arg.raw()
        ))
    })
}
