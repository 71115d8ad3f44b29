use crate::env::*;
use crate::kernel::tc::TypeChecker;
use crate::kernel::whnf::{foldl_apps, inst, unfold_apps};

use super::error::PassResult;
use super::util::{is_irrelevant, mark_irrelevant};
use super::visitor::{StepVisitor, walk};

/// Tag types, type formers and proofs so that erasure can find them later.
pub fn mark_comp_irrelevant(tc: &mut TypeChecker<'_>, e: &Expr) -> PassResult<Expr> {
  CompIrrelevant { tc }.visit(e)
}

struct CompIrrelevant<'t, 'a> {
  tc: &'t mut TypeChecker<'a>,
}

impl CompIrrelevant<'_, '_> {
  /// `e : Sort u`, `e : Π xs, Sort u` or `e : p` with `p : Prop`.
  fn is_irrelevant_term(&mut self, e: &Expr) -> PassResult<bool> {
    let ty = self.tc.infer(e)?;
    let mut cur = self.tc.whnf(&ty)?;
    loop {
      match cur.as_data() {
        ExprData::Sort(_) => return Ok(true),
        ExprData::ForallE(n, d, b, bi) => {
          let local = self.tc.mk_local(n, d.clone(), *bi);
          let body = inst(b, &[local]);
          cur = self.tc.whnf(&body)?;
        },
        _ => break,
      }
    }
    Ok(self.tc.is_prop(&ty)?)
  }
}

impl<'a> StepVisitor<'a> for CompIrrelevant<'_, 'a> {
  fn tc(&mut self) -> &mut TypeChecker<'a> {
    &mut *self.tc
  }

  fn visit(&mut self, e: &Expr) -> PassResult<Expr> {
    match e.as_data() {
      ExprData::Sort(..) | ExprData::ForallE(..) => return Ok(mark_irrelevant(e)),
      ExprData::Lit(..) | ExprData::Bvar(..) | ExprData::Mvar(..) => return Ok(e.clone()),
      ExprData::Mdata(..) if is_irrelevant(e) => return Ok(e.clone()),
      _ => {},
    }
    if self.is_irrelevant_term(e)? {
      return Ok(mark_irrelevant(e));
    }
    walk(self, e)
  }

  /// Constant and local heads are kept untagged; only the arguments and
  /// other heads are visited.
  fn visit_app(&mut self, e: &Expr) -> PassResult<Expr> {
    let (head, args) = unfold_apps(e);
    let new_head = match head.as_data() {
      ExprData::Const(..) | ExprData::Fvar(..) => head.clone(),
      _ => self.visit(&head)?,
    };
    let mut changed = !Expr::ptr_eq(&head, &new_head);
    let mut new_args = Vec::with_capacity(args.len());
    for a in &args {
      let na = self.visit(a)?;
      changed |= !Expr::ptr_eq(a, &na);
      new_args.push(na);
    }
    if !changed {
      return Ok(e.clone());
    }
    Ok(foldl_apps(new_head, new_args).copy_pos(e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::names::FreshNameSupply;
  use crate::test_support::*;

  fn run(e: &Expr) -> Expr {
    let env = prelude();
    let mut names = FreshNameSupply::new();
    let mut tc = TypeChecker::new(&env, &mut names);
    mark_comp_irrelevant(&mut tc, e).unwrap()
  }

  #[test]
  fn tags_types_and_proofs() {
    assert!(is_irrelevant(&run(&nat())));
    assert!(is_irrelevant(&run(&cnst("True.intro"))));
    assert!(is_irrelevant(&run(&pi(&[("x", nat())], nat()))));
    assert!(!is_irrelevant(&run(&nat_lit(3))));
  }

  #[test]
  fn tags_arguments_not_heads() {
    let motive = lam(&[("t", nat())], nat());
    let e = lam(
      &[("x", nat())],
      app(
        cnst_l("Nat.rec", vec![Level::one()]),
        [motive.clone(), nat_lit(0), lam(&[("k", nat()), ("ih", nat())], fv("ih")), fv("x")],
      ),
    );
    let r = run(&e);
    let expected = lam(
      &[("x", nat())],
      app(
        cnst_l("Nat.rec", vec![Level::one()]),
        [
          mark_irrelevant(&motive),
          nat_lit(0),
          lam(&[("k", nat()), ("ih", nat())], fv("ih")),
          fv("x"),
        ],
      ),
    );
    assert_eq!(r, expected);
  }

  #[test]
  fn idempotent() {
    let e = lam(
      &[("p", cnst("True")), ("x", nat())],
      app(cnst("Nat.succ"), [fv("x")]),
    );
    let once = run(&e);
    assert_eq!(run(&once), once);
  }
}
