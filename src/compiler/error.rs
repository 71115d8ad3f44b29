use thiserror::Error;

use crate::env::Name;
use crate::kernel::error::TcError;

use super::trace::Pass;

pub type PassResult<T> = Result<T, ErrorKind>;

/// Ill-formed `tactic.eval_expr` applications.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotationError {
  #[error("invalid tactic.eval_expr application, it must have 3 arguments, got {0}")]
  WrongArity(usize),
  #[error("invalid tactic.eval_expr application, type must be a closed term")]
  OpenType,
}

#[derive(Debug, Error)]
pub enum ErrorKind {
  /// A pass produced a term that no longer has the declaration's type.
  #[error("self-check failed after {pass}: {source}")]
  SelfCheckFailure {
    pass: Pass,
    #[source]
    source: TcError,
  },
  #[error(transparent)]
  MalformedQuotationUsage(#[from] QuotationError),
  #[error("oracle failure: {0}")]
  OracleFailure(#[from] TcError),
  #[error("cannot compile recursor {rec}: {reason}")]
  UnsupportedRecursor { rec: Name, reason: String },
}

/// A failure tied to the declaration being compiled.
#[derive(Debug, Error)]
#[error("failed to compile {decl}: {kind}")]
pub struct CompileError {
  pub decl: Name,
  #[source]
  pub kind: ErrorKind,
}
