//! Erasure of computationally irrelevant subterms.
//!
//! After this pass terms are untyped: every tagged subterm, sort, Pi type
//! and binder type is `_neutral`, constants carry no universe levels, and
//! case analysis only keeps the major premise and the branches.

use crate::env::*;
use crate::kernel::whnf::{foldl_apps, head_beta, unfold_apps};

use super::util::{CasesOnInfo, is_irrelevant, mk_neutral};

/// Erase the code of one procedure.
pub fn erase_irrelevant(env: &Env, e: &Expr) -> Expr {
  Eraser { env }.visit(e)
}

struct Eraser<'a> {
  env: &'a Env,
}

impl Eraser<'_> {
  fn visit(&self, e: &Expr) -> Expr {
    if is_irrelevant(e) {
      return mk_neutral().copy_pos(e);
    }
    match e.as_data() {
      ExprData::Sort(..) | ExprData::ForallE(..) => mk_neutral().copy_pos(e),
      ExprData::Mdata(_, inner) => self.visit(inner),
      ExprData::Const(name, levels) if !levels.is_empty() => {
        Expr::cnst(name.clone(), vec![]).copy_pos(e)
      },
      ExprData::Lam(name, _, body, bi) => {
        Expr::lam(name.clone(), mk_neutral(), self.visit(body), *bi).copy_pos(e)
      },
      ExprData::LetE(name, _, val, body, non_dep) => {
        Expr::letE(name.clone(), mk_neutral(), self.visit(val), self.visit(body), *non_dep)
          .copy_pos(e)
      },
      ExprData::Proj(s, idx, x) => Expr::proj(s.clone(), *idx, self.visit(x)).copy_pos(e),
      ExprData::App(..) => self.visit_app(e),
      _ => e.clone(),
    }
  }

  fn visit_args(&self, args: &[Expr]) -> Vec<Expr> {
    args.iter().map(|a| self.visit(a)).collect()
  }

  fn visit_app(&self, e: &Expr) -> Expr {
    let (head, args) = unfold_apps(e);
    if let ExprData::Const(name, levels) = head.as_data()
      && self.is_unerased(name, levels)
    {
      if let Some(info) = CasesOnInfo::new(self.env, name) {
        if args.len() >= info.arity() {
          return self.visit_cases_on(e, name, &info, &args);
        }
      }
      if let Some(rec) = self.env.get_rec(name) {
        if rec.num_minors == 1 && args.len() > rec.major_idx() {
          let induct = rec.induct();
          if self.env.is_prop_inductive(&induct) {
            let num_fields = rec.rules.first().map_or(0, |r| r.n_fields);
            let minor = &args[rec.num_params + 1];
            return self.prop_elim(e, minor, num_fields, &args[rec.major_idx() + 1..]);
          }
        }
      }
    }
    let head = self.visit(&head);
    foldl_apps(head, self.visit_args(&args)).copy_pos(e)
  }

  /// Erasure drops universe levels, so a use that still carries all of
  /// its constant's levels has not been erased yet.
  fn is_unerased(&self, name: &Name, levels: &[Level]) -> bool {
    self.env.get(name).is_some_and(|c| c.get_level_params().len() == levels.len())
  }

  fn visit_cases_on(&self, e: &Expr, name: &Name, info: &CasesOnInfo, args: &[Expr]) -> Expr {
    let minors = info.minors();
    let extra = &args[minors.end..];
    if info.num_minors == 1 && self.env.is_prop_inductive(&info.induct) {
      let num_fields = self.num_fields(&info.induct);
      return self.prop_elim(e, &args[minors.start], num_fields, extra);
    }
    let mut new_args = vec![self.visit(&args[info.major_idx()])];
    new_args.extend(self.visit_args(&args[minors]));
    new_args.extend(self.visit_args(extra));
    foldl_apps(Expr::cnst(name.clone(), vec![]), new_args).copy_pos(e)
  }

  /// The only branch of an eliminator over a proposition, with every field
  /// replaced by `_neutral`.
  fn prop_elim(&self, e: &Expr, minor: &Expr, num_fields: usize, extra: &[Expr]) -> Expr {
    let minor = self.visit(minor);
    let body = head_beta(&foldl_apps(minor, (0..num_fields).map(|_| mk_neutral())));
    foldl_apps(body, self.visit_args(extra)).copy_pos(e)
  }

  fn num_fields(&self, induct: &Name) -> usize {
    self
      .env
      .get_inductive(induct)
      .and_then(|ind| ind.ctors.first())
      .and_then(|c| self.env.get_ctor(c))
      .map_or(0, |c| c.num_fields)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compiler::util::{is_neutral, mark_irrelevant};
  use crate::test_support::*;

  fn neutral() -> Expr {
    mk_neutral()
  }

  #[test]
  fn binder_types_and_tags_become_neutral() {
    let env = prelude();
    let e = lam(&[("x", nat())], app(cnst("f"), [mark_irrelevant(&nat()), fv("x")]));
    let r = erase_irrelevant(&env, &e);
    let expected = Expr::lam(
      n("x"),
      neutral(),
      app(cnst("f"), [neutral(), Expr::bvar(0)]),
      BinderInfo::Default,
    );
    assert_eq!(r, expected);
    assert!(is_neutral(&erase_irrelevant(&env, &type0())));
  }

  #[test]
  fn cases_on_keeps_major_and_branches() {
    let env = prelude();
    let motive = mark_irrelevant(&lam(&[("t", nat())], nat()));
    let e = app(
      cnst_l("Nat.casesOn", vec![Level::one()]),
      [motive, nat_lit(3), nat_lit(0), lam(&[("n", nat())], fv("n"))],
    );
    let r = erase_irrelevant(&env, &e);
    let expected = app(
      cnst("Nat.casesOn"),
      [nat_lit(3), nat_lit(0), Expr::lam(n("n"), neutral(), Expr::bvar(0), BinderInfo::Default)],
    );
    assert_eq!(r, expected);
  }

  #[test]
  fn proposition_elimination_takes_the_branch() {
    let env = prelude();
    let tt = cnst("True");
    let and_tt = app(cnst("And"), [tt.clone(), tt.clone()]);
    let e = app(
      cnst_l("And.casesOn", vec![Level::one()]),
      [
        mark_irrelevant(&tt),
        mark_irrelevant(&tt),
        mark_irrelevant(&lam(&[("t", and_tt.clone())], nat())),
        mark_irrelevant(&fv("h")),
        lam(&[("l", tt.clone()), ("r", tt)], nat_lit(5)),
      ],
    );
    assert_eq!(erase_irrelevant(&env, &e), nat_lit(5));
  }

  #[test]
  fn erasing_twice_changes_nothing() {
    let env = prelude();
    let motive = mark_irrelevant(&lam(&[("t", nat())], nat()));
    let cases = app(
      cnst_l("Nat.casesOn", vec![Level::one()]),
      [motive, fv("x"), nat_lit(0), lam(&[("n", nat())], app(cnst("Nat.succ"), [fv("n")]))],
    );
    let e = lam(&[("x", nat())], app(cnst("f"), [mark_irrelevant(&nat()), cases]));
    let once = erase_irrelevant(&env, &e);
    assert_eq!(erase_irrelevant(&env, &once), once);
  }

  #[test]
  fn levels_are_dropped() {
    let env = prelude();
    let e = cnst_l("OfNat.ofNat", vec![Level::zero()]);
    assert_eq!(erase_irrelevant(&env, &e), cnst("OfNat.ofNat"));
  }
}
