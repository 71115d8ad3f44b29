//! Names and term shapes shared by several passes.

use std::ops::Range;

use crate::env::*;

/// Metadata key tagging computationally irrelevant subterms.
pub const IRRELEVANT_KEY: &str = "compiler.irrelevant";

pub const NEUTRAL: &str = "_neutral";
pub const CNSTR: &str = "_cnstr";
pub const PROJ: &str = "_proj";
pub const CASES: &str = "_cases";
pub const NAT_CASES: &str = "_nat_cases";

/// Placeholder for erased values.
pub fn mk_neutral() -> Expr {
  Expr::cnst(Name::from(NEUTRAL), vec![])
}

#[cfg(test)]
pub(crate) fn is_neutral(e: &Expr) -> bool {
  e.const_name().is_some_and(|n| *n == Name::from(NEUTRAL))
}

pub fn mk_cnstr(cidx: usize) -> Expr {
  Expr::cnst(Name::from(CNSTR).append_num(cidx as u64), vec![])
}

pub fn mk_proj(idx: usize) -> Expr {
  Expr::cnst(Name::from(PROJ).append_num(idx as u64), vec![])
}

pub fn mk_cases(num_minors: usize) -> Expr {
  Expr::cnst(Name::from(CASES).append_num(num_minors as u64), vec![])
}

pub fn mk_nat_cases() -> Expr {
  Expr::cnst(Name::from(NAT_CASES), vec![])
}

pub fn mark_irrelevant(e: &Expr) -> Expr {
  if is_irrelevant(e) {
    return e.clone();
  }
  Expr::mdata(vec![(Name::from(IRRELEVANT_KEY), DataValue::OfBool(true))], e.clone())
    .copy_pos(e)
}

pub fn is_irrelevant(e: &Expr) -> bool {
  match e.as_data() {
    ExprData::Mdata(kvs, _) => kvs.iter().any(|(k, v)| {
      *k == Name::from(IRRELEVANT_KEY) && *v == DataValue::OfBool(true)
    }),
    _ => false,
  }
}

/// The term under an irrelevance tag.
pub fn strip_irrelevant(e: &Expr) -> Expr {
  match e.as_data() {
    ExprData::Mdata(_, inner) if is_irrelevant(e) => inner.clone(),
    _ => e.clone(),
  }
}

/// Argument layout of `T.casesOn`:
/// `params, motive, indices, major, minors, extra args...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasesOnInfo {
  pub induct: Name,
  pub num_params: usize,
  pub num_indices: usize,
  pub num_minors: usize,
}

impl CasesOnInfo {
  pub fn new(env: &Env, cases_on: &Name) -> Option<CasesOnInfo> {
    if !env.is_cases_on_recursor(cases_on) {
      return None;
    }
    let induct = cases_on.prefix();
    let ind = env.get_inductive(&induct)?;
    Some(CasesOnInfo {
      num_params: ind.num_params,
      num_indices: ind.num_indices,
      num_minors: ind.ctors.len(),
      induct,
    })
  }

  pub fn major_idx(&self) -> usize {
    self.num_params + 1 + self.num_indices
  }

  pub fn minors(&self) -> Range<usize> {
    let start = self.major_idx() + 1;
    start..start + self.num_minors
  }

  /// Arguments needed for the application to be saturated.
  pub fn arity(&self) -> usize {
    self.minors().end
  }
}

/// Number of leading lambdas of `e`.
pub fn lambda_arity(e: &Expr) -> usize {
  let mut n = 0;
  let mut cur = e;
  while let ExprData::Lam(_, _, b, _) = cur.as_data() {
    n += 1;
    cur = b;
  }
  n
}

/// Node count, stopping once `limit` is exceeded.
pub fn size_bounded(e: &Expr, limit: usize) -> usize {
  let mut count = 0;
  let mut stack = vec![e];
  while let Some(e) = stack.pop() {
    count += 1;
    if count > limit {
      return count;
    }
    match e.as_data() {
      ExprData::App(f, a) => {
        stack.push(f);
        stack.push(a);
      },
      ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
        stack.push(t);
        stack.push(b);
      },
      ExprData::LetE(_, t, v, b, _) => {
        stack.push(t);
        stack.push(v);
        stack.push(b);
      },
      ExprData::Mdata(_, s) | ExprData::Proj(_, _, s) => stack.push(s),
      _ => {},
    }
  }
  count
}

/// Whether the constant `name` occurs anywhere in `e`.
pub fn uses_const(e: &Expr, name: &Name) -> bool {
  let mut stack = vec![e];
  while let Some(e) = stack.pop() {
    match e.as_data() {
      ExprData::Const(n, _) if n == name => return true,
      ExprData::App(f, a) => {
        stack.push(f);
        stack.push(a);
      },
      ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
        stack.push(t);
        stack.push(b);
      },
      ExprData::LetE(_, t, v, b, _) => {
        stack.push(t);
        stack.push(v);
        stack.push(b);
      },
      ExprData::Mdata(_, s) | ExprData::Proj(_, _, s) => stack.push(s),
      _ => {},
    }
  }
  false
}
