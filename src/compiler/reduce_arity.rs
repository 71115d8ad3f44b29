use crate::env::*;
use crate::kernel::whnf::{foldl_apps, has_loose_bvar, inst, replace, unfold_apps};

use super::procedure::Procedure;
use super::util::mk_neutral;

/// Drop the parameters an auxiliary procedure never reads.
///
/// Only procedures whose every call site supplies all of their leading
/// parameters are rewritten, and the last procedure (the declaration
/// itself) keeps its external arity.
pub fn reduce_arity(procs: &mut [Procedure]) {
  let Some(last) = procs.len().checked_sub(1) else {
    return;
  };
  for i in 0..last {
    let (binders, body) = split_lambdas(&procs[i].code);
    let arity = binders.len();
    let keep: Vec<bool> = (0..arity)
      .map(|j| has_loose_bvar(&body, (arity - 1 - j) as u64))
      .collect();
    if keep.iter().all(|k| *k) {
      continue;
    }
    let name = procs[i].name.clone();
    if !procs.iter().all(|p| uses_saturated(&p.code, &name, arity)) {
      continue;
    }
    tracing::trace!(
      procedure = %name,
      dropped = keep.iter().filter(|k| !**k).count(),
      "reducing arity"
    );
    procs[i].code = rebuild(&procs[i].code, &binders, &body, &keep);
    for p in procs.iter_mut() {
      p.code = drop_args(&p.code, &name, &keep);
    }
  }
}

struct Binder {
  name: Name,
  ty: Expr,
  bi: BinderInfo,
}

fn split_lambdas(e: &Expr) -> (Vec<Binder>, Expr) {
  let mut binders = Vec::new();
  let mut cur = e.clone();
  while let ExprData::Lam(name, ty, body, bi) = cur.as_data() {
    binders.push(Binder { name: name.clone(), ty: ty.clone(), bi: *bi });
    let next = body.clone();
    cur = next;
  }
  (binders, cur)
}

fn rebuild(code: &Expr, binders: &[Binder], body: &Expr, keep: &[bool]) -> Expr {
  let kept = keep.iter().filter(|k| **k).count();
  let mut position = 0;
  let substs: Vec<Expr> = keep
    .iter()
    .map(|k| {
      if *k {
        position += 1;
        Expr::bvar((kept - position) as u64)
      } else {
        mk_neutral()
      }
    })
    .collect();
  let mut result = inst(body, &substs);
  for (b, _) in binders.iter().zip(keep).rev().filter(|(_, k)| **k) {
    result = Expr::lam(b.name.clone(), b.ty.clone(), result, b.bi);
  }
  result.copy_pos(code)
}

/// Whether every occurrence of `name` in `e` has at least `arity` arguments.
fn uses_saturated(e: &Expr, name: &Name, arity: usize) -> bool {
  match e.as_data() {
    ExprData::Const(n, _) => n != name || arity == 0,
    ExprData::App(..) => {
      let (head, args) = unfold_apps(e);
      if head.const_name() == Some(name) && args.len() < arity {
        return false;
      }
      let head_ok = head.const_name().is_some() || uses_saturated(&head, name, arity);
      head_ok && args.iter().all(|a| uses_saturated(a, name, arity))
    },
    ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
      uses_saturated(t, name, arity) && uses_saturated(b, name, arity)
    },
    ExprData::LetE(_, t, v, b, _) => {
      uses_saturated(t, name, arity)
        && uses_saturated(v, name, arity)
        && uses_saturated(b, name, arity)
    },
    ExprData::Mdata(_, x) | ExprData::Proj(_, _, x) => uses_saturated(x, name, arity),
    _ => true,
  }
}

fn drop_args(e: &Expr, name: &Name, keep: &[bool]) -> Expr {
  replace(e, |e, _| {
    if !matches!(e.as_data(), ExprData::App(..)) {
      return None;
    }
    let (head, args) = unfold_apps(e);
    if head.const_name() != Some(name) {
      return None;
    }
    let args = args.iter().map(|a| drop_args(a, name, keep));
    let kept = args
      .enumerate()
      .filter(|(i, _)| keep.get(*i).is_none_or(|k| *k))
      .map(|(_, a)| a);
    Some(foldl_apps(head, kept).copy_pos(e))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::*;

  fn neutral() -> Expr {
    mk_neutral()
  }

  fn lam_db(name: &str, body: Expr) -> Expr {
    Expr::lam(n(name), neutral(), body, BinderInfo::Default)
  }

  #[test]
  fn drops_unused_parameters() {
    // f._rec_1 := fun a x => x;  f := fun y => f._rec_1 _neutral y
    let aux = lam_db("a", lam_db("x", Expr::bvar(0)));
    let primary = lam_db("y", app(cnst("f._rec_1"), [neutral(), Expr::bvar(0)]));
    let mut procs = vec![
      Procedure::new(n("f._rec_1"), None, aux),
      Procedure::new(n("f"), None, primary),
    ];
    reduce_arity(&mut procs);
    assert_eq!(procs[0].code, lam_db("x", Expr::bvar(0)));
    assert_eq!(procs[1].code, lam_db("y", app(cnst("f._rec_1"), [Expr::bvar(0)])));
  }

  #[test]
  fn keeps_parameters_of_partially_applied_procedures() {
    let aux = lam_db("a", lam_db("x", Expr::bvar(0)));
    let primary = app(cnst("f._rec_1"), [neutral()]);
    let mut procs = vec![
      Procedure::new(n("f._rec_1"), None, aux.clone()),
      Procedure::new(n("f"), None, primary.clone()),
    ];
    reduce_arity(&mut procs);
    assert_eq!(procs[0].code, aux);
    assert_eq!(procs[1].code, primary);
  }

  #[test]
  fn primary_keeps_its_arity() {
    let primary = lam_db("unused", nat_lit(1));
    let mut procs = vec![Procedure::new(n("k"), None, primary.clone())];
    reduce_arity(&mut procs);
    assert_eq!(procs[0].code, primary);
  }

  #[test]
  fn recursive_calls_are_rewritten() {
    // g._rec_1 := fun a x => Nat.casesOn x 0 (fun n => g._rec_1 _neutral n)
    let rec_call = app(cnst("g._rec_1"), [neutral(), Expr::bvar(0)]);
    let body = app(cnst("Nat.casesOn"), [Expr::bvar(0), nat_lit(0), lam_db("n", rec_call)]);
    let aux = lam_db("a", lam_db("x", body));
    let mut procs = vec![
      Procedure::new(n("g._rec_1"), None, aux),
      Procedure::new(n("g"), None, lam_db("y", app(cnst("g._rec_1"), [neutral(), Expr::bvar(0)]))),
    ];
    reduce_arity(&mut procs);
    let expected = lam_db(
      "x",
      app(
        cnst("Nat.casesOn"),
        [Expr::bvar(0), nat_lit(0), lam_db("n", app(cnst("g._rec_1"), [Expr::bvar(0)]))],
      ),
    );
    assert_eq!(procs[0].code, expected);
  }

  #[test]
  fn reducing_twice_changes_nothing() {
    let rec_call = app(cnst("g._rec_1"), [neutral(), Expr::bvar(0)]);
    let body = app(cnst("Nat.casesOn"), [Expr::bvar(0), nat_lit(0), lam_db("n", rec_call)]);
    let mut procs = vec![
      Procedure::new(n("g._rec_1"), None, lam_db("a", lam_db("x", body))),
      Procedure::new(n("g"), None, lam_db("y", app(cnst("g._rec_1"), [neutral(), Expr::bvar(0)]))),
    ];
    reduce_arity(&mut procs);
    let once = procs.clone();
    reduce_arity(&mut procs);
    assert_eq!(procs, once);
  }
}
