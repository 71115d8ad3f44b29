use num_bigint::BigUint;

use crate::env::*;
use crate::kernel::whnf::{replace, unfold_apps};
use crate::nat::Nat;

use super::util::is_irrelevant;

/// Fold `Nat.zero`, `Nat.succ` chains ending in a numeral, and
/// `OfNat.ofNat Nat n inst` into literals.
pub fn find_nat_values(e: &Expr) -> Expr {
  replace(e, |e, _| {
    if is_irrelevant(e) {
      return Some(e.clone());
    }
    match e.as_data() {
      ExprData::Const(name, _) if is_const(name, "Nat.zero") => {
        Some(Expr::nat_lit(Nat::ZERO).copy_pos(e))
      },
      ExprData::App(..) => nat_value(e).map(|v| Expr::nat_lit(Nat(v)).copy_pos(e)),
      _ => None,
    }
  })
}

fn is_const(name: &Name, s: &str) -> bool {
  *name == Name::from(s)
}

fn strip_mdata(e: &Expr) -> &Expr {
  let mut cur = e;
  while let ExprData::Mdata(_, inner) = cur.as_data() {
    cur = inner;
  }
  cur
}

fn literal(e: &Expr) -> Option<BigUint> {
  match e.as_data() {
    ExprData::Lit(Literal::NatVal(n)) => Some(n.0.clone()),
    ExprData::Const(name, _) if is_const(name, "Nat.zero") => Some(BigUint::ZERO),
    _ => None,
  }
}

fn nat_value(e: &Expr) -> Option<BigUint> {
  let mut succs = 0u64;
  let mut cur = e;
  while let ExprData::App(f, a) = cur.as_data() {
    match f.const_name() {
      Some(name) if is_const(name, "Nat.succ") => {
        succs += 1;
        cur = a;
      },
      _ => break,
    }
  }
  if succs > 0 {
    return literal(cur).map(|base| base + BigUint::from(succs));
  }
  let (head, args) = unfold_apps(e);
  match (head.const_name(), args.as_slice()) {
    (Some(name), [ty, n, _inst]) if is_const(name, "OfNat.ofNat") => {
      let is_nat = strip_mdata(ty).const_name().is_some_and(|t| is_const(t, "Nat"));
      if is_nat { literal(n) } else { None }
    },
    _ => None,
  }
}
