//! `timer` and `now`.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::timer;
use crate::types::{Arity, Argument, OperatorDefinition};
use crate::value::{NativeHandle, Value};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Shortest accepted period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

fn period(value: Value) -> Result<Duration, EvalError> {
    let seconds = match value {
        Value::Int(n) if n > 0 => n as f64,
        Value::Float(f) if f > 0.0 => f,
        other => {
            return Err(EvalError::argument(format!(
                "timer period must be a positive number of seconds, got {other}"
            )))
        }
    };
    let period = Duration::try_from_secs_f64(seconds).map_err(|err| {
        EvalError::argument(format!("timer period of {seconds} seconds is out of range: {err}"))
    })?;
    if period < MIN_PERIOD {
        return Err(EvalError::argument(format!(
            "timer period of {seconds} seconds is shorter than {}ms",
            MIN_PERIOD.as_millis()
        )));
    }
    Ok(period)
}

/// `timer(periodSeconds, body)`
///
/// Runs `body` once right away, then on every period in the background.
fn timer_eval(args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let period = period(args[0].evaluate(ctx)?)?;
    let body = args[1].raw().clone();
    crate::evaluate(&body, ctx)?;
    let handle = timer::schedule(period, body, ctx.clone())?;
    Ok(Value::Native(NativeHandle::new(handle)))
}

fn now_eval(_args: &[Argument], _ctx: &EvalCtx) -> Result<Value, EvalError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0);
    Ok(Value::Int(millis))
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "timer",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: Arc::new(timer_eval),
        }),
        Arc::new(OperatorDefinition {
            name: "now",
            aliases: &[],
            arity: Arity::Any,
            eval_fn: Arc::new(now_eval),
        }),
    ]
}
