use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;

/// The root sigil: `"$"` alone is the environment, `"$..."` is a path.
pub const ROOT: &str = "$";

/// An operand as written in the program, not yet evaluated.
///
/// Construction normalises path strings: `"$"` is kept, any other string
/// starting with `$` gets its leading `$` or `$.` rewritten to `$.`, so `$x`
/// and `$.x` are the same path downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    raw: Json,
}

impl Argument {
    pub fn new(raw: Json) -> Self {
        match raw {
            Json::String(s) => Argument {
                raw: Json::String(normalize_path(s)),
            },
            other => Argument { raw: other },
        }
    }

    pub fn raw(&self) -> &Json {
        &self.raw
    }

    /// The unevaluated operand when it is a plain string.
    pub fn as_raw_str(&self) -> Option<&str> {
        self.raw.as_str()
    }

    pub fn evaluate(&self, ctx: &EvalCtx) -> Result<Value, EvalError> {
        crate::evaluate(&self.raw, ctx)
    }
}

impl From<Json> for Argument {
    fn from(raw: Json) -> Self {
        Argument::new(raw)
    }
}

impl From<&str> for Argument {
    fn from(raw: &str) -> Self {
        Argument::new(Json::String(raw.to_string()))
    }
}

fn normalize_path(s: String) -> String {
    if s == ROOT {
        return s;
    }
    match s.strip_prefix(ROOT) {
        Some(rest) => {
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            format!("{ROOT}.{rest}")
        }
        None => s,
    }
}

/// Operator arity, counted in operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    /// Skip the arity check.
    Any,
    /// Exactly `n` operands.
    Fixed(usize),
    /// Between `min` and `max` operands. `None` for max = unlimited.
    Range(usize, Option<usize>),
}

/// Calling convention shared by built-in and host operators.
pub type EvalFn = Arc<dyn Fn(&[Argument], &EvalCtx) -> Result<Value, EvalError> + Send + Sync>;

pub struct OperatorDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub arity: Arity,
    pub eval_fn: EvalFn,
}

/// Map of operator name/alias -> definition.
pub type OperatorMap = HashMap<String, Arc<OperatorDefinition>>;

/// Asserts that an invocation has the correct number of operands.
pub fn assert_arity(operator: &str, arity: &Arity, operands: usize) -> Result<(), EvalError> {
    match arity {
        Arity::Any => Ok(()),
        Arity::Fixed(n) => {
            if operands != *n {
                Err(EvalError::ArityOrArgument(format!(
                    "\"{}\" operator expects {} operands, got {}.",
                    operator, n, operands
                )))
            } else {
                Ok(())
            }
        }
        Arity::Range(min, max) => {
            if operands < *min {
                Err(EvalError::ArityOrArgument(format!(
                    "\"{}\" operator expects at least {} operands.",
                    operator, min
                )))
            } else if let Some(max) = max {
                if operands > *max {
                    return Err(EvalError::ArityOrArgument(format!(
                        "\"{}\" operator expects at most {} operands.",
                        operator, max
                    )));
                }
                Ok(())
            } else {
                Ok(())
            }
        }
    }
}

/// Builds an `OperatorMap` from a list of operator definitions.
pub fn operators_to_map(operators: Vec<Arc<OperatorDefinition>>) -> OperatorMap {
    let mut map = HashMap::new();
    for op in operators {
        map.insert(op.name.to_string(), Arc::clone(&op));
        for alias in op.aliases {
            map.insert(alias.to_string(), Arc::clone(&op));
        }
    }
    map
}
