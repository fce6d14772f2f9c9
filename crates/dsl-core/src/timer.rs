//! Scheduled repetition for the `timer` operator.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::value::{HostFn, NativeObject, Value};
use crossbeam::channel::{bounded, select, tick, Sender};
use serde_json::{json, Value as Json};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct TimerState {
    cancelled: AtomicBool,
    ticks: AtomicU64,
}

/// Cancellation handle for a running timer.
///
/// Programs reach it as a native value with a `cancel` member (via `do`);
/// hosts can downcast it and call [`TimerHandle::cancel`]. Dropping every
/// handle does not stop the timer.
#[derive(Clone)]
pub struct TimerHandle {
    state: Arc<TimerState>,
    cancel_tx: Sender<()>,
    period: Duration,
}

impl TimerHandle {
    /// Stops future ticks. A tick already running is not interrupted.
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            let _ = self.cancel_tx.try_send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Completed background ticks (the immediate first run is not counted).
    pub fn ticks(&self) -> u64 {
        self.state.ticks.load(Ordering::SeqCst)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl NativeObject for TimerHandle {
    fn type_name(&self) -> &'static str {
        "timer"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "cancel" => {
                let handle = self.clone();
                Some(Value::Host(HostFn::new("timer.cancel", move |_| {
                    handle.cancel();
                    Ok(Value::Null)
                })))
            }
            "cancelled" => Some(Value::Bool(self.is_cancelled())),
            "ticks" => Some(Value::Int(self.ticks() as i64)),
            _ => None,
        }
    }

    fn to_json(&self) -> Json {
        json!({
            "timer": self.period.as_secs_f64(),
            "cancelled": self.is_cancelled(),
            "ticks": self.ticks(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Re-evaluates `body` against `ctx.env` every `period` on a background
/// thread until cancelled. Each tick holds the environment's exclusive access.
pub fn schedule(period: Duration, body: Json, ctx: EvalCtx) -> Result<TimerHandle, EvalError> {
    let (cancel_tx, cancel_rx) = bounded::<()>(1);
    let state = Arc::new(TimerState {
        cancelled: AtomicBool::new(false),
        ticks: AtomicU64::new(0),
    });
    let handle = TimerHandle {
        state: Arc::clone(&state),
        cancel_tx: cancel_tx.clone(),
        period,
    };

    thread::Builder::new()
        .name("dsl-timer".to_string())
        .spawn(move || {
            // Keeps the channel connected after every handle is dropped.
            let _keepalive = cancel_tx;
            let ticker = tick(period);
            tracing::debug!(period_ms = period.as_millis() as u64, "timer started");
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let _access = ctx.env.exclusive();
                        if state.cancelled.load(Ordering::SeqCst) {
                            break;
                        }
                        if let Err(err) = crate::evaluate(&body, &ctx) {
                            tracing::warn!(error = %err, "timer tick failed");
                        }
                        state.ticks.fetch_add(1, Ordering::SeqCst);
                    }
                    recv(cancel_rx) -> _ => break,
                }
            }
            tracing::debug!("timer stopped");
        })
        .map_err(|err| EvalError::host(format!("cannot start timer thread: {err}")))?;

    Ok(handle)
}
