use thiserror::Error;

/// Errors raised while evaluating a program.
///
/// A missing path segment is not an error: the path resolver reports it as
/// [`crate::path::Location::NotFound`] and each operator turns that into a
/// default value or a no-op.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An operand or predicate has the wrong runtime kind.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Too few/many operands, or an operand of the wrong unevaluated shape.
    #[error("{0}")]
    ArityOrArgument(String),

    /// `when` found no satisfied condition.
    #[error("no match: {0}")]
    NoMatch(String),

    /// Network, persistence or structured-text failure from a host collaborator.
    #[error("host collaborator failure: {0}")]
    HostCollaborator(String),

    /// An inline expression was rewritten to an operator the registry lacks.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

impl EvalError {
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        EvalError::TypeMismatch(msg.into())
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        EvalError::ArityOrArgument(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        EvalError::HostCollaborator(msg.into())
    }
}
