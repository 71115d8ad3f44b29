//! Term traversal shared by the typed passes.
//!
//! A pass implements [`StepVisitor`] and overrides the cases it cares
//! about; the `walk_*` functions are the default structural descent.
//! Binders are entered with fresh locals from the type checker so that
//! overrides can ask for the types of the subterms they see. Binder types,
//! Pi types and sorts are never rewritten, and a subterm tagged irrelevant
//! is returned as is.

use crate::env::*;
use crate::kernel::tc::TypeChecker;
use crate::kernel::whnf::{abstr, foldl_apps, inst, unfold_apps};

use super::error::PassResult;
use super::util::is_irrelevant;

pub trait StepVisitor<'a> {
  fn tc(&mut self) -> &mut TypeChecker<'a>;

  fn visit(&mut self, e: &Expr) -> PassResult<Expr> {
    walk(self, e)
  }

  fn visit_app(&mut self, e: &Expr) -> PassResult<Expr> {
    walk_app(self, e)
  }

  fn visit_constant(&mut self, e: &Expr) -> PassResult<Expr> {
    Ok(e.clone())
  }

  fn visit_lambda(&mut self, e: &Expr) -> PassResult<Expr> {
    walk_lambda(self, e)
  }

  fn visit_let(&mut self, e: &Expr) -> PassResult<Expr> {
    walk_let(self, e)
  }

  fn visit_mdata(&mut self, e: &Expr) -> PassResult<Expr> {
    walk_mdata(self, e)
  }

  fn visit_proj(&mut self, e: &Expr) -> PassResult<Expr> {
    walk_proj(self, e)
  }
}

pub fn walk<'a, V: StepVisitor<'a> + ?Sized>(v: &mut V, e: &Expr) -> PassResult<Expr> {
  match e.as_data() {
    ExprData::App(..) => v.visit_app(e),
    ExprData::Const(..) => v.visit_constant(e),
    ExprData::Lam(..) => v.visit_lambda(e),
    ExprData::LetE(..) => v.visit_let(e),
    ExprData::Mdata(..) => v.visit_mdata(e),
    ExprData::Proj(..) => v.visit_proj(e),
    ExprData::Bvar(..)
    | ExprData::Fvar(..)
    | ExprData::Mvar(..)
    | ExprData::Sort(..)
    | ExprData::ForallE(..)
    | ExprData::Lit(..) => Ok(e.clone()),
  }
}

/// Visit the head and every argument; `e` itself comes back when nothing
/// changed.
pub fn walk_app<'a, V: StepVisitor<'a> + ?Sized>(
  v: &mut V,
  e: &Expr,
) -> PassResult<Expr> {
  let (head, args) = unfold_apps(e);
  let new_head = v.visit(&head)?;
  let mut changed = !Expr::ptr_eq(&head, &new_head);
  let mut new_args = Vec::with_capacity(args.len());
  for a in &args {
    let na = v.visit(a)?;
    changed |= !Expr::ptr_eq(a, &na);
    new_args.push(na);
  }
  if !changed {
    return Ok(e.clone());
  }
  Ok(foldl_apps(new_head, new_args).copy_pos(e))
}

/// Open the whole lambda telescope, visit the body, close it again.
pub fn walk_lambda<'a, V: StepVisitor<'a> + ?Sized>(
  v: &mut V,
  e: &Expr,
) -> PassResult<Expr> {
  let (locals, body) = open_lambdas(v.tc(), e);
  let new_body = v.visit(&body)?;
  if Expr::ptr_eq(&body, &new_body) {
    return Ok(e.clone());
  }
  Ok(v.tc().mk_lambda(&locals, &new_body)?.copy_pos(e))
}

pub fn walk_let<'a, V: StepVisitor<'a> + ?Sized>(
  v: &mut V,
  e: &Expr,
) -> PassResult<Expr> {
  let ExprData::LetE(name, ty, val, body, nondep) = e.as_data() else {
    return walk(v, e);
  };
  let new_val = v.visit(val)?;
  let local = v.tc().mk_local(name, ty.clone(), BinderInfo::Default);
  let opened = inst(body, std::slice::from_ref(&local));
  let new_body = v.visit(&opened)?;
  if Expr::ptr_eq(val, &new_val) && Expr::ptr_eq(&opened, &new_body) {
    return Ok(e.clone());
  }
  let new_body = abstr(&new_body, &[local]);
  Ok(e.update(ExprData::LetE(name.clone(), ty.clone(), new_val, new_body, *nondep)))
}

pub fn walk_mdata<'a, V: StepVisitor<'a> + ?Sized>(
  v: &mut V,
  e: &Expr,
) -> PassResult<Expr> {
  let ExprData::Mdata(kvs, inner) = e.as_data() else {
    return walk(v, e);
  };
  if is_irrelevant(e) {
    return Ok(e.clone());
  }
  let new_inner = v.visit(inner)?;
  if Expr::ptr_eq(inner, &new_inner) {
    return Ok(e.clone());
  }
  Ok(e.update(ExprData::Mdata(kvs.clone(), new_inner)))
}

pub fn walk_proj<'a, V: StepVisitor<'a> + ?Sized>(
  v: &mut V,
  e: &Expr,
) -> PassResult<Expr> {
  let ExprData::Proj(name, idx, s) = e.as_data() else {
    return walk(v, e);
  };
  let new_s = v.visit(s)?;
  if Expr::ptr_eq(s, &new_s) {
    return Ok(e.clone());
  }
  Ok(e.update(ExprData::Proj(name.clone(), *idx, new_s)))
}

/// Replace the leading lambdas of `e` by fresh locals.
pub fn open_lambdas(tc: &mut TypeChecker<'_>, e: &Expr) -> (Vec<Expr>, Expr) {
  let mut locals = Vec::new();
  let mut cur = e.clone();
  while let ExprData::Lam(name, ty, body, bi) = cur.as_data() {
    let ty = inst(ty, &locals);
    let local = tc.mk_local(name, ty, *bi);
    locals.push(local);
    cur = body.clone();
  }
  let body = inst(&cur, &locals);
  (locals, body)
}
