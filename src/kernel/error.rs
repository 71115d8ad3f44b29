use thiserror::Error;

use crate::env::{Expr, Name};

pub type TcResult<T> = Result<T, TcError>;

#[derive(Debug, Error)]
pub enum TcError {
  #[error("type expected: {expr} has type {inferred}")]
  TypeExpected { expr: Expr, inferred: Expr },
  #[error("function expected: {expr} has type {inferred}")]
  FunctionExpected { expr: Expr, inferred: Expr },
  #[error("definitional equality failure: {lhs} =?= {rhs}")]
  DefEqFailure { lhs: Expr, rhs: Expr },
  #[error("unknown constant: {name}")]
  UnknownConst { name: Name },
  #[error("unknown local: {name}")]
  UnknownLocal { name: Name },
  #[error("universe level count mismatch for {name}: expected {expected}, got {got}")]
  LevelCountMismatch { name: Name, expected: usize, got: usize },
  #[error("free bound variable at index {idx}")]
  FreeBoundVariable { idx: u64 },
  #[error("reduction limit of {limit} steps exceeded on {expr}")]
  ReductionLimit { expr: Expr, limit: usize },
  #[error("{msg}")]
  KernelException { msg: String },
}
