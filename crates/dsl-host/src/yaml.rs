//! YAML bridge: program loading plus the `parseYaml` and `runYaml` operators.

use crate::error::HostError;
use dsl_core::{Argument, Arity, Environment, EvalCtx, EvalError, OperatorDefinition, Program, Value};
use serde_json::Value as Json;
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// Parses YAML text into the JSON form programs are made of.
pub fn parse_yaml(text: &str) -> Result<Json, HostError> {
    Ok(serde_yaml::from_str(text)?)
}

/// Loads a program file: `.json` as JSON, anything else as YAML (a superset).
pub fn load_program(path: &Path) -> Result<Json, HostError> {
    let text = std::fs::read_to_string(path).map_err(|err| HostError::io(path, err))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        parse_yaml(&text)
    }
}

fn text_operand(operator: &str, arg: &Argument, ctx: &EvalCtx) -> Result<String, EvalError> {
    match arg.evaluate(ctx)? {
        Value::String(text) => Ok(text),
        other => Err(EvalError::type_mismatch(format!(
            "{operator} expects YAML text, got {}",
            other.kind_name()
        ))),
    }
}

fn parse_yaml_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let text = text_operand("parseYaml", &args[0], ctx)?;
    let doc = parse_yaml(&text)?;
    Ok(Value::from_json(&doc))
}

/// `runYaml(text)`: runs the parsed program on its own thread against a fresh
/// environment and returns right away.
fn run_yaml_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let text = text_operand("runYaml", &args[0], ctx)?;
    let program = Program::with_registry(parse_yaml(&text)?, Arc::clone(&ctx.registry));
    thread::Builder::new()
        .name("dsl-run-yaml".to_string())
        .spawn(move || {
            if let Err(err) = program.run(&Environment::new()) {
                tracing::warn!(error = %err, "runYaml program failed");
            }
        })
        .map_err(|err| EvalError::host(format!("cannot start runYaml thread: {err}")))?;
    Ok(Value::Null)
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "parseYaml",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: Arc::new(parse_yaml_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "runYaml",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: Arc::new(run_yaml_eval),
        }),
    ]
}
