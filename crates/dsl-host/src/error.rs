use dsl_core::EvalError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while configuring the host or loading programs.
///
/// Failures inside a running program are [`EvalError`]s; collaborators report
/// theirs as [`EvalError::HostCollaborator`].
#[derive(Error, Debug)]
pub enum HostError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HostError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<HostError> for EvalError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Eval(err) => err,
            other => EvalError::host(other.to_string()),
        }
    }
}
