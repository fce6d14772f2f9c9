//! `format` and `print`.

use super::{evaluate_all, literal_str};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::Value;
use std::sync::Arc;

const PLACEHOLDER: &str = "%s";

/// Replaces each `%s` of `template` with the next value, in order. Surplus
/// placeholders stay as written; surplus values are dropped.
pub fn format_template(template: &str, values: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut values = values.iter();
    let mut rest = template;
    while let Some(at) = rest.find(PLACEHOLDER) {
        out.push_str(&rest[..at]);
        match values.next() {
            Some(value) => out.push_str(&value.to_text()),
            None => out.push_str(PLACEHOLDER),
        }
        rest = &rest[at + PLACEHOLDER.len()..];
    }
    out.push_str(rest);
    out
}

/// `format(template, ...args)`; the template is taken as written.
fn format_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let template = literal_str("format", &args[0], "template")?;
    let values = evaluate_all(&args[1..], ctx)?;
    Ok(Value::String(format_template(template, &values)))
}

fn print_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let line = evaluate_all(args, ctx)?
        .iter()
        .map(Value::to_text)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    Ok(Value::Null)
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "format",
            aliases: &[],
            arity: Arity::Range(1, None),
            eval_fn: Arc::new(format_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "print",
            aliases: &[],
            arity: Arity::Any,
            eval_fn: Arc::new(print_eval),
        }),
    ]
}
