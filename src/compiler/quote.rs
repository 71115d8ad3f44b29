//! Reification of terms as values of the reflected `expr` type.

use crate::env::*;
use crate::nat::Nat;

/// Produces the term stored as the reflection argument of
/// `tactic.eval_expr`. `reflected α a` unfolds to `expr`, so the quotation
/// of `α` is its own evidence.
pub trait Quoter: Send + Sync {
  /// A term of type `expr` denoting `e`.
  fn quote(&self, e: &Expr) -> Expr;
}

/// Builds `expr.*` constructor applications directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprQuoter;

fn c(s: &str) -> Expr {
  Expr::cnst(Name::from(s), vec![])
}

fn apps(f: Expr, args: impl IntoIterator<Item = Expr>) -> Expr {
  args.into_iter().fold(f, Expr::app)
}

impl ExprQuoter {
  fn name(&self, n: &Name) -> Expr {
    match n.as_data() {
      NameData::Anonymous => c("name.anonymous"),
      NameData::Str(pre, s, _) => {
        apps(c("name.mk_string"), [Expr::str_lit(s), self.name(pre)])
      },
      NameData::Num(pre, k, _) => {
        apps(c("name.mk_numeral"), [Expr::nat_lit(Nat::from(*k)), self.name(pre)])
      },
    }
  }

  fn level(&self, l: &Level) -> Expr {
    match l.as_data() {
      LevelData::Zero => c("level.zero"),
      LevelData::Succ(x) => apps(c("level.succ"), [self.level(x)]),
      LevelData::Max(a, b) => apps(c("level.max"), [self.level(a), self.level(b)]),
      LevelData::Imax(a, b) => apps(c("level.imax"), [self.level(a), self.level(b)]),
      LevelData::Param(n) => apps(c("level.param"), [self.name(n)]),
      LevelData::Mvar(n) => apps(c("level.mvar"), [self.name(n)]),
    }
  }

  fn levels(&self, ls: &[Level]) -> Expr {
    let level_ty = c("level");
    let nil = apps(
      Expr::cnst(Name::from("list.nil"), vec![Level::zero()]),
      [level_ty.clone()],
    );
    ls.iter().rev().fold(nil, |tl, l| {
      apps(
        Expr::cnst(Name::from("list.cons"), vec![Level::zero()]),
        [level_ty.clone(), self.level(l), tl],
      )
    })
  }

  fn binder_info(&self, bi: BinderInfo) -> Expr {
    match bi {
      BinderInfo::Default => c("binder_info.default"),
      BinderInfo::Implicit => c("binder_info.implicit"),
      BinderInfo::StrictImplicit => c("binder_info.strict_implicit"),
      BinderInfo::InstImplicit => c("binder_info.inst_implicit"),
    }
  }
}

impl Quoter for ExprQuoter {
  fn quote(&self, e: &Expr) -> Expr {
    match e.as_data() {
      ExprData::Bvar(i) => apps(c("expr.var"), [Expr::nat_lit(Nat::from(*i))]),
      ExprData::Sort(l) => apps(c("expr.sort"), [self.level(l)]),
      ExprData::Const(n, ls) => apps(c("expr.const"), [self.name(n), self.levels(ls)]),
      ExprData::Mvar(n) | ExprData::Fvar(n) => apps(c("expr.mvar"), [self.name(n)]),
      ExprData::App(f, a) => apps(c("expr.app"), [self.quote(f), self.quote(a)]),
      ExprData::Lam(n, t, b, bi) => apps(
        c("expr.lam"),
        [self.name(n), self.binder_info(*bi), self.quote(t), self.quote(b)],
      ),
      ExprData::ForallE(n, t, b, bi) => apps(
        c("expr.pi"),
        [self.name(n), self.binder_info(*bi), self.quote(t), self.quote(b)],
      ),
      ExprData::LetE(n, t, v, b, _) => apps(
        c("expr.elet"),
        [self.name(n), self.quote(t), self.quote(v), self.quote(b)],
      ),
      ExprData::Lit(Literal::NatVal(k)) => {
        apps(c("expr.lit_nat"), [Expr::nat_lit(k.clone())])
      },
      ExprData::Lit(Literal::StrVal(s)) => apps(c("expr.lit_str"), [Expr::str_lit(s)]),
      ExprData::Mdata(_, inner) => self.quote(inner),
      ExprData::Proj(n, i, s) => apps(
        c("expr.proj"),
        [self.name(n), Expr::nat_lit(Nat::from(*i)), self.quote(s)],
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::names::FreshNameSupply;
  use crate::kernel::tc::TypeChecker;
  use crate::test_support::*;

  #[test]
  fn quoted_terms_have_type_expr() {
    let env = prelude();
    let mut names = FreshNameSupply::new();
    let mut tc = TypeChecker::new(&env, &mut names);
    let t = pi(&[("x", nat())], app(cnst_l("list", vec![Level::zero()]), [nat()]));
    let q = ExprQuoter.quote(&t);
    assert_eq!(tc.infer(&q).unwrap(), cnst("expr"));
  }

  #[test]
  fn quotation_is_reflection_evidence() {
    let env = prelude();
    let mut names = FreshNameSupply::new();
    let mut tc = TypeChecker::new(&env, &mut names);
    let reflected_nat =
      app(cnst_l("reflected", vec![Level::succ(Level::one())]), [type0(), nat()]);
    tc.check(&ExprQuoter.quote(&nat()), &reflected_nat).unwrap();
    assert!(tc.check(&nat_lit(0), &reflected_nat).is_err());
  }
}
