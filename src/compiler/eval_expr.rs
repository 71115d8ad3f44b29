use crate::env::*;
use crate::kernel::whnf::{foldl_apps, replace, unfold_apps};

use super::error::{PassResult, QuotationError};
use super::quote::Quoter;

pub const EVAL_EXPR: &str = "tactic.eval_expr";

/// Make the reflection argument of every `tactic.eval_expr α r e` the
/// quotation of `α`. Fails on an application with other than three
/// arguments or whose type argument is open.
pub fn fix_eval_expr(e: &Expr, quoter: &dyn Quoter) -> PassResult<Expr> {
  Ok(fix(e, quoter)?)
}

fn fix(e: &Expr, quoter: &dyn Quoter) -> Result<Expr, QuotationError> {
  let head_name = Name::from(EVAL_EXPR);
  let mut failure: Option<QuotationError> = None;
  let out = replace(e, |e, _| {
    if failure.is_some() {
      return Some(e.clone());
    }
    let ExprData::App(..) = e.as_data() else {
      return None;
    };
    let (head, args) = unfold_apps(e);
    let ExprData::Const(name, _) = head.as_data() else {
      return None;
    };
    if *name != head_name {
      return None;
    }
    match fix_app(&head, args, quoter) {
      Ok(r) => Some(r.copy_pos(e)),
      Err(err) => {
        failure = Some(err);
        Some(e.clone())
      },
    }
  });
  match failure {
    Some(err) => Err(err),
    None => Ok(out),
  }
}

fn fix_app(head: &Expr, mut args: Vec<Expr>, quoter: &dyn Quoter) -> Result<Expr, QuotationError> {
  if args.len() != 3 {
    return Err(QuotationError::WrongArity(args.len()));
  }
  if !args[0].is_ground() {
    return Err(QuotationError::OpenType);
  }
  args[1] = quoter.quote(&args[0]);
  args[2] = fix(&args[2], quoter)?;
  Ok(foldl_apps(head.clone(), args))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compiler::error::ErrorKind;
  use crate::compiler::quote::ExprQuoter;
  use crate::test_support::*;

  fn eval_expr(args: Vec<Expr>) -> Expr {
    app(cnst_l(EVAL_EXPR, vec![Level::zero()]), args)
  }

  #[test]
  fn second_argument_becomes_quotation() {
    let e = eval_expr(vec![nat(), cnst("junk"), cnst("e")]);
    let r = fix_eval_expr(&e, &ExprQuoter).unwrap();
    let (_, args) = unfold_apps(&r);
    assert_eq!(args[0], nat());
    assert_eq!(args[1], ExprQuoter.quote(&args[0]));
    assert_eq!(args[2], cnst("e"));
  }

  #[test]
  fn nested_occurrences_are_fixed() {
    let inner = eval_expr(vec![nat(), cnst("junk"), cnst("e")]);
    let outer = lam(&[("x", nat())], app(cnst("f"), [inner, fv("x")]));
    let r = fix_eval_expr(&outer, &ExprQuoter).unwrap();
    let quoted = ExprQuoter.quote(&nat());
    let fixed = eval_expr(vec![nat(), quoted, cnst("e")]);
    assert_eq!(r, lam(&[("x", nat())], app(cnst("f"), [fixed, fv("x")])));
  }

  #[test]
  fn wrong_arity() {
    let e = eval_expr(vec![nat(), cnst("junk")]);
    assert!(matches!(
      fix_eval_expr(&e, &ExprQuoter),
      Err(ErrorKind::MalformedQuotationUsage(QuotationError::WrongArity(2)))
    ));
  }

  #[test]
  fn open_type() {
    let e = lam(&[("a", type0())], eval_expr(vec![fv("a"), cnst("r"), cnst("e")]));
    assert!(matches!(
      fix_eval_expr(&e, &ExprQuoter),
      Err(ErrorKind::MalformedQuotationUsage(QuotationError::OpenType))
    ));
    let local = eval_expr(vec![fv("a"), cnst("r"), cnst("e")]);
    assert!(fix_eval_expr(&local, &ExprQuoter).is_err());
  }

  #[test]
  fn untouched_without_primitive() {
    let e = app(cnst("Nat.succ"), [nat_lit(1)]);
    assert!(Expr::ptr_eq(&e, &fix_eval_expr(&e, &ExprQuoter).unwrap()));
  }
}
