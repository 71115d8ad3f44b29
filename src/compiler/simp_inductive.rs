//! Lowering of inductive data to the runtime value layout: constructors
//! become `_cnstr.<cidx>`, projections `_proj.<i>` and case analysis
//! `_cases.<n>` or `_nat_cases`.

use crate::env::*;
use crate::kernel::whnf::{foldl_apps, head_beta, lift_loose_bvars, unfold_apps};

use super::util::{
  CasesOnInfo, mk_cases, mk_cnstr, mk_nat_cases, mk_neutral, mk_proj,
};

pub fn simp_inductive(env: &Env, e: &Expr) -> Expr {
  SimpInductive { env }.visit(e)
}

struct SimpInductive<'a> {
  env: &'a Env,
}

fn is_nat(name: &Name) -> bool {
  *name == Name::from("Nat")
}

impl SimpInductive<'_> {
  fn visit(&self, e: &Expr) -> Expr {
    match e.as_data() {
      ExprData::App(..) | ExprData::Const(..) => self.visit_app(e),
      ExprData::Lam(name, ty, body, bi) => {
        Expr::lam(name.clone(), ty.clone(), self.visit(body), *bi).copy_pos(e)
      },
      ExprData::LetE(name, ty, val, body, non_dep) => {
        Expr::letE(name.clone(), ty.clone(), self.visit(val), self.visit(body), *non_dep)
          .copy_pos(e)
      },
      ExprData::Mdata(_, inner) => self.visit(inner),
      ExprData::Proj(_, idx, s) => {
        Expr::app(mk_proj(*idx as usize), self.visit(s)).copy_pos(e)
      },
      _ => e.clone(),
    }
  }

  fn visit_args(&self, args: &[Expr]) -> Vec<Expr> {
    args.iter().map(|a| self.visit(a)).collect()
  }

  fn visit_app(&self, e: &Expr) -> Expr {
    let (head, args) = unfold_apps(e);
    if let ExprData::Const(name, _) = head.as_data() {
      if let Some(ctor) = self.env.get_ctor(name) {
        if !is_nat(&ctor.induct) && args.len() >= ctor.num_params {
          let fields = self.visit_args(&args[ctor.num_params..]);
          return foldl_apps(mk_cnstr(ctor.cidx), fields).copy_pos(e);
        }
      }
      if let Some(proj) = self.env.get_projection(name) {
        if args.len() > proj.num_params {
          let s = self.visit(&args[proj.num_params]);
          let rest = self.visit_args(&args[proj.num_params + 1..]);
          return foldl_apps(Expr::app(mk_proj(proj.idx), s), rest).copy_pos(e);
        }
      }
      if let Some(info) = CasesOnInfo::new(self.env, name) {
        // erased layout: major, minors, extra args
        if args.len() > info.num_minors {
          return self.visit_cases(e, &info, &args);
        }
      }
    }
    if args.is_empty() {
      return e.clone();
    }
    foldl_apps(self.visit(&head), self.visit_args(&args)).copy_pos(e)
  }

  fn visit_cases(&self, e: &Expr, info: &CasesOnInfo, args: &[Expr]) -> Expr {
    let major = self.visit(&args[0]);
    let minors = self.visit_args(&args[1..1 + info.num_minors]);
    let extra = self.visit_args(&args[1 + info.num_minors..]);

    if is_nat(&info.induct) {
      let mut new_args = vec![major];
      new_args.extend(minors);
      new_args.extend(extra);
      return foldl_apps(mk_nat_cases(), new_args).copy_pos(e);
    }

    if let [minor] = minors.as_slice() {
      let num_fields = self.num_fields(&info.induct);
      if matches!(major.as_data(), ExprData::Bvar(_)) {
        let fields = (0..num_fields).map(|i| Expr::app(mk_proj(i), major.clone()));
        let body = head_beta(&foldl_apps(minor.clone(), fields));
        return foldl_apps(body, extra).copy_pos(e);
      }
      let fields = (0..num_fields).map(|i| Expr::app(mk_proj(i), Expr::bvar(0)));
      let body = head_beta(&foldl_apps(lift_loose_bvars(minor, 1), fields));
      let body = foldl_apps(body, extra.iter().map(|a| lift_loose_bvars(a, 1)));
      return Expr::letE(Name::from("_x"), mk_neutral(), major, body, false).copy_pos(e);
    }

    let mut new_args = vec![major];
    new_args.extend(minors);
    new_args.extend(extra);
    foldl_apps(mk_cases(info.num_minors), new_args).copy_pos(e)
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
  use crate::test_support::*;

  fn lam_db(name: &str, body: Expr) -> Expr {
    Expr::lam(n(name), mk_neutral(), body, BinderInfo::Default)
  }

  #[test]
  fn constructors_and_projections() {
    let env = prelude();
    let mk = app(cnst("Pair.mk"), [nat_lit(1), cnst("Bool.true")]);
    assert_eq!(
      simp_inductive(&env, &mk),
      app(cnst("_cnstr.0"), [nat_lit(1), cnst("_cnstr.1")])
    );
    let p = lam_db("p", app(cnst("Pair.snd"), [Expr::bvar(0)]));
    assert_eq!(simp_inductive(&env, &p), lam_db("p", app(cnst("_proj.1"), [Expr::bvar(0)])));
    let succ = app(cnst("Nat.succ"), [nat_lit(1)]);
    assert_eq!(simp_inductive(&env, &succ), succ);
  }

  #[test]
  fn case_analysis() {
    let env = prelude();
    let nat_cases = lam_db(
      "x",
      app(cnst("Nat.casesOn"), [Expr::bvar(0), nat_lit(0), lam_db("n", Expr::bvar(0))]),
    );
    assert_eq!(
      simp_inductive(&env, &nat_cases),
      lam_db("x", app(cnst("_nat_cases"), [Expr::bvar(0), nat_lit(0), lam_db("n", Expr::bvar(0))]))
    );
    let bool_cases =
      lam_db("b", app(cnst("Bool.casesOn"), [Expr::bvar(0), nat_lit(1), nat_lit(2)]));
    assert_eq!(
      simp_inductive(&env, &bool_cases),
      lam_db("b", app(cnst("_cases.2"), [Expr::bvar(0), nat_lit(1), nat_lit(2)]))
    );
  }

  #[test]
  fn structure_cases_bind_projections() {
    let env = prelude();
    // fun p => Pair.casesOn p (fun a b => a)
    let e = lam_db(
      "p",
      app(cnst("Pair.casesOn"), [Expr::bvar(0), lam_db("a", lam_db("b", Expr::bvar(1)))]),
    );
    assert_eq!(
      simp_inductive(&env, &e),
      lam_db("p", app(cnst("_proj.0"), [Expr::bvar(0)]))
    );
    // non-variable majors are let-bound
    let e = app(cnst("Pair.casesOn"), [app(cnst("mkPair"), [nat_lit(0)]), lam_db("a", lam_db("b", Expr::bvar(0)))]);
    let expected = Expr::letE(
      n("_x"),
      mk_neutral(),
      app(cnst("mkPair"), [nat_lit(0)]),
      app(cnst("_proj.1"), [Expr::bvar(0)]),
      false,
    );
    assert_eq!(simp_inductive(&env, &e), expected);
  }

  #[test]
  fn simplifying_twice_changes_nothing() {
    let env = prelude();
    let pair_cases = app(
      cnst("Pair.casesOn"),
      [app(cnst("mkPair"), [Expr::bvar(0)]), lam_db("a", lam_db("b", Expr::bvar(1)))],
    );
    let bool_cases = app(cnst("Bool.casesOn"), [Expr::bvar(0), pair_cases, nat_lit(2)]);
    let nat_cases = app(
      cnst("Nat.casesOn"),
      [Expr::bvar(0), app(cnst("Pair.mk"), [nat_lit(1), cnst("Bool.true")]), lam_db("n", bool_cases)],
    );
    let e = lam_db("x", nat_cases);
    let once = simp_inductive(&env, &e);
    assert_eq!(simp_inductive(&env, &once), once);
  }
}
