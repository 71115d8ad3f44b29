//! Recursor-aware unfolding.
//!
//! Auxiliary and user recursors are reduced away, definitions that are not
//! compiled for the VM are unfolded, and `casesOn` applications are only
//! reduced when their major premise is a constructor. Proofs are left
//! alone.

use crate::env::*;
use crate::kernel::tc::TypeChecker;
use crate::kernel::whnf::{reduce_aux_recursor, reduce_rec, unfold_apps, unfold_definition, whnf_pred};

use super::error::PassResult;
use super::visitor::{StepVisitor, walk, walk_app};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursorKind {
  Aux,
  CasesOn,
  NotARecursor,
}

/// Classify the head of an application. `casesOn` takes precedence over the
/// auxiliary recursors it belongs to.
pub fn recursor_app_kind(env: &Env, e: &Expr) -> RecursorKind {
  let ExprData::App(..) = e.as_data() else {
    return RecursorKind::NotARecursor;
  };
  let Some(name) = e.get_app_fn().const_name() else {
    return RecursorKind::NotARecursor;
  };
  if env.is_cases_on_recursor(name) {
    RecursorKind::CasesOn
  } else if env.is_aux_recursor(name) || env.is_user_recursor(name) {
    RecursorKind::Aux
  } else {
    RecursorKind::NotARecursor
  }
}

pub fn expand_aux(tc: &mut TypeChecker<'_>, e: &Expr, limit: usize) -> PassResult<Expr> {
  ExpandAux { tc, limit }.visit(e)
}

struct ExpandAux<'t, 'a> {
  tc: &'t mut TypeChecker<'a>,
  limit: usize,
}

impl<'a> ExpandAux<'_, 'a> {
  fn env(&self) -> &'a Env {
    self.tc.env()
  }

  /// The head is a transparent definition that is neither a theorem, a
  /// projection, a no-confusion principle nor compiled for the VM.
  fn is_not_vm_function(&self, e: &Expr) -> bool {
    let env = self.env();
    let Some(name) = e.get_app_fn().const_name() else {
      return false;
    };
    match env.get(name) {
      Some(ConstantInfo::DefnInfo(_)) => {
        !env.is_projection(name) && !env.is_no_confusion(name) && !env.is_vm_function(name)
      },
      _ => false,
    }
  }

  fn visit_cases_on(&mut self, e: &Expr) -> PassResult<Expr> {
    let env = self.env();
    if let Some(unfolded) = reduce_aux_recursor(e, env) {
      let (head, args) = unfold_apps(&unfolded);
      if let ExprData::Const(name, levels) = head.as_data() {
        if let Some(reduced) = reduce_rec(name, levels, &args, env)? {
          return self.visit(&reduced.copy_pos(e));
        }
      }
    }
    walk_app(self, e)
  }

  fn visit_not_recursor(&mut self, e: &Expr) -> PassResult<Expr> {
    if self.is_not_vm_function(e) && !self.tc.is_proof(e)? {
      if let Some(r) = unfold_definition(e, self.env()) {
        return self.visit(&r.copy_pos(e));
      }
    }
    let new_e = whnf_pred(e, self.env(), |_| false, self.limit)?;
    if Expr::ptr_eq(&new_e, e) {
      walk_app(self, e)
    } else {
      self.visit(&new_e.copy_pos(e))
    }
  }

  fn visit_aux(&mut self, e: &Expr) -> PassResult<Expr> {
    let env = self.env();
    let new_e = whnf_pred(
      e,
      env,
      |t| recursor_app_kind(env, t) == RecursorKind::Aux,
      self.limit,
    )?;
    if Expr::ptr_eq(&new_e, e) {
      walk_app(self, e)
    } else {
      walk(self, &new_e.copy_pos(e))
    }
  }
}

impl<'a> StepVisitor<'a> for ExpandAux<'_, 'a> {
  fn tc(&mut self) -> &mut TypeChecker<'a> {
    &mut *self.tc
  }

  fn visit_app(&mut self, e: &Expr) -> PassResult<Expr> {
    match recursor_app_kind(self.env(), e) {
      RecursorKind::NotARecursor => self.visit_not_recursor(e),
      RecursorKind::CasesOn => self.visit_cases_on(e),
      RecursorKind::Aux => self.visit_aux(e),
    }
  }

  fn visit_constant(&mut self, e: &Expr) -> PassResult<Expr> {
    let env = self.env();
    let Some(name) = e.const_name() else {
      return Ok(e.clone());
    };
    if !matches!(env.get(name), Some(ConstantInfo::DefnInfo(_)))
      || env.is_aux_recursor(name)
      || env.is_user_recursor(name)
      || env.is_projection(name)
      || env.is_no_confusion(name)
      || env.is_vm_function(name)
    {
      return Ok(e.clone());
    }
    match unfold_definition(e, env) {
      Some(r) => self.visit(&r.copy_pos(e)),
      None => Ok(e.clone()),
    }
  }
}
