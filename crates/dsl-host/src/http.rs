//! The `request` operator (alias `fetch`): blocking HTTP GET.

use crate::config::HttpConfig;
use dsl_core::{Argument, Arity, EvalCtx, EvalError, OperatorDefinition, Value};
use std::sync::Arc;
use std::time::Duration;

/// How a response body is handed back to the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Text,
    Structured,
}

impl BodyFormat {
    fn parse(raw: Option<&str>) -> BodyFormat {
        match raw {
            Some("json") | Some("structured") => BodyFormat::Structured,
            _ => BodyFormat::Text,
        }
    }
}

pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms.max(1));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(&config.user_agent)
            .build();
        HttpClient { agent }
    }

    /// Fetches `url`. Non-2xx statuses are failures.
    pub fn get(&self, url: &str, format: BodyFormat) -> Result<Value, EvalError> {
        tracing::debug!(url, "http get");
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(EvalError::host(format!("GET {url} returned status {code}")))
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(EvalError::host(format!("GET {url} failed: {err}")))
            }
        };
        let body = response
            .into_string()
            .map_err(|err| EvalError::host(format!("cannot read body of {url}: {err}")))?;
        match format {
            BodyFormat::Text => Ok(Value::String(body)),
            BodyFormat::Structured => serde_json::from_str::<serde_json::Value>(&body)
                .map(|doc| Value::from_json(&doc))
                .map_err(|err| EvalError::host(format!("body of {url} is not JSON: {err}"))),
        }
    }
}

/// `request(method, url, [format])`
///
/// `method` and `format` are taken as written. Methods other than `get`
/// evaluate to null.
fn request_eval(client: &HttpClient, args: &[Argument], ctx: &EvalCtx) -> Result<Value, EvalError> {
    let method = args[0].as_raw_str().ok_or_else(|| {
        EvalError::argument(format!("request method must be a string literal, got {}", args[0].raw()))
    })?;
    if !method.eq_ignore_ascii_case("get") {
        return Ok(Value::Null);
    }
    let url = match args[1].evaluate(ctx)? {
        Value::String(url) => url,
        other => {
            return Err(EvalError::type_mismatch(format!(
                "request url must be a string, got {}",
                other.kind_name()
            )))
        }
    };
    let format = BodyFormat::parse(args.get(2).and_then(Argument::as_raw_str));
    client.get(&url, format)
}

pub fn operators(client: Arc<HttpClient>) -> Vec<Arc<OperatorDefinition>> {
    vec![Arc::new(OperatorDefinition {
        name: "request",
        aliases: &["fetch"],
        arity: Arity::Range(2, Some(3)),
        eval_fn: Arc::new(move |args: &[Argument], ctx: &EvalCtx| request_eval(&client, args, ctx)),
    })]
}
