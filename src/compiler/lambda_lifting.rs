//! Lambda lifting.
//!
//! Every lambda that is neither the parameter list of a procedure nor a
//! branch of a case analysis becomes a new top-level procedure, closed over
//! the variables it mentions. Terms are erased and in de Bruijn form.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::env::*;
use crate::kernel::whnf::{foldl_apps, inst, unfold_apps};
use crate::names::aux_name;

use super::procedure::Procedure;
use super::util::{CasesOnInfo, mk_neutral};

/// Lift the nested lambdas of every procedure. Lifted procedures are
/// placed before the procedure they came from, so the last procedure stays
/// the declaration itself.
pub fn lambda_lifting(env: &Env, decl: &Name, procs: Vec<Procedure>) -> Vec<Procedure> {
  let taken = procs.iter().map(|p| p.name.clone()).collect();
  let mut lifter = LambdaLifter { env, base: decl.clone(), taken, counter: 0, lifted: Vec::new() };
  let mut out = Vec::with_capacity(procs.len());
  for p in procs {
    let code = lifter.visit_proc(&p.code);
    out.append(&mut lifter.lifted);
    out.push(Procedure { code, ..p });
  }
  out
}

struct LambdaLifter<'a> {
  env: &'a Env,
  base: Name,
  taken: FxHashSet<Name>,
  counter: u64,
  lifted: Vec<Procedure>,
}

impl LambdaLifter<'_> {
  fn visit_proc(&mut self, code: &Expr) -> Expr {
    let mut ctx = Vec::new();
    self.visit_binders(code, &mut ctx)
  }

  /// Enter the leading lambdas of `e` without lifting them.
  fn visit_binders(&mut self, e: &Expr, ctx: &mut Vec<Name>) -> Expr {
    match e.as_data() {
      ExprData::Lam(name, ty, body, bi) => {
        ctx.push(name.clone());
        let body = self.visit_binders(body, ctx);
        ctx.pop();
        Expr::lam(name.clone(), ty.clone(), body, *bi).copy_pos(e)
      },
      _ => self.visit(e, ctx),
    }
  }

  fn visit(&mut self, e: &Expr, ctx: &mut Vec<Name>) -> Expr {
    match e.as_data() {
      ExprData::Lam(..) => {
        let lam = self.visit_binders(e, ctx);
        self.lift(&lam, ctx)
      },
      ExprData::App(..) => self.visit_app(e, ctx),
      ExprData::LetE(name, ty, val, body, non_dep) => {
        let val = self.visit(val, ctx);
        ctx.push(name.clone());
        let body = self.visit(body, ctx);
        ctx.pop();
        Expr::letE(name.clone(), ty.clone(), val, body, *non_dep).copy_pos(e)
      },
      ExprData::Mdata(kvs, inner) => Expr::mdata(kvs.clone(), self.visit(inner, ctx)).copy_pos(e),
      ExprData::Proj(s, idx, inner) => {
        Expr::proj(s.clone(), *idx, self.visit(inner, ctx)).copy_pos(e)
      },
      _ => e.clone(),
    }
  }

  fn visit_app(&mut self, e: &Expr, ctx: &mut Vec<Name>) -> Expr {
    let (head, args) = unfold_apps(e);
    let minors = match head.const_name().and_then(|n| CasesOnInfo::new(self.env, n)) {
      // erased layout: major, minors, extra args
      Some(info) => 1..1 + info.num_minors,
      None => 0..0,
    };
    let head = self.visit(&head, ctx);
    let args: Vec<Expr> = args
      .iter()
      .enumerate()
      .map(|(i, a)| if minors.contains(&i) { self.visit_binders(a, ctx) } else { self.visit(a, ctx) })
      .collect();
    foldl_apps(head, args).copy_pos(e)
  }

  /// Replace the lambda `lam`, whose own body is already lifted, by a new
  /// procedure applied to the variables it captures.
  fn lift(&mut self, lam: &Expr, ctx: &[Name]) -> Expr {
    let mut free = BTreeSet::new();
    loose_bvars(lam, 0, &mut free);
    // outermost first
    let captured: Vec<u64> = free.into_iter().rev().collect();
    let m = captured.len();
    let range = captured.first().map_or(0, |s| s + 1) as usize;
    let mut substs = vec![mk_neutral(); range];
    for (i, s) in captured.iter().enumerate() {
      substs[range - 1 - *s as usize] = Expr::bvar((m - 1 - i) as u64);
    }
    let mut code = inst(lam, &substs);
    for s in captured.iter().rev() {
      let name = ctx
        .len()
        .checked_sub(1 + *s as usize)
        .and_then(|i| ctx.get(i))
        .cloned()
        .unwrap_or_else(Name::anon);
      code = Expr::lam(name, mk_neutral(), code, BinderInfo::Default);
    }

    let name = aux_name(self.env, &self.taken, &self.base, "_lambda", &mut self.counter);
    self.taken.insert(name.clone());
    tracing::trace!(procedure = %name, captured = m, "lifted lambda");
    self.lifted.push(Procedure::new(name.clone(), lam.pos(), code));
    foldl_apps(Expr::cnst(name, vec![]), captured.iter().map(|s| Expr::bvar(*s))).copy_pos(lam)
  }
}

/// Loose bound variables of `e`, as indices relative to `e` itself.
fn loose_bvars(e: &Expr, offset: u64, out: &mut BTreeSet<u64>) {
  if e.loose_bvar_range() <= offset {
    return;
  }
  match e.as_data() {
    ExprData::Bvar(i) => {
      out.insert(i - offset);
    },
    ExprData::App(f, a) => {
      loose_bvars(f, offset, out);
      loose_bvars(a, offset, out);
    },
    ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
      loose_bvars(t, offset, out);
      loose_bvars(b, offset + 1, out);
    },
    ExprData::LetE(_, t, v, b, _) => {
      loose_bvars(t, offset, out);
      loose_bvars(v, offset, out);
      loose_bvars(b, offset + 1, out);
    },
    ExprData::Mdata(_, x) | ExprData::Proj(_, _, x) => loose_bvars(x, offset, out),
    _ => {},
  }
}
