use crate::env::*;

use super::error::{TcError, TcResult};
use super::level::{is_equivalent, is_equivalent_many};
use super::tc::TypeChecker;
use super::whnf::*;

const DEF_EQ_STEP_LIMIT: usize = 1_000_000;
const MAX_DELTA_ITERS: u32 = 10_000;

/// Result of lazy delta reduction.
enum DeltaResult {
  Found(bool),
  Exhausted(Expr, Expr),
}

/// Check definitional equality of two expressions.
///
/// Uses a conjunction work stack: processes pairs iteratively, all must be equal.
/// Running out of steps is an error, not a negative answer.
pub fn def_eq(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  def_eq_bounded(x, y, tc, DEF_EQ_STEP_LIMIT)
}

fn def_eq_bounded(
  x: &Expr,
  y: &Expr,
  tc: &mut TypeChecker,
  limit: usize,
) -> TcResult<bool> {
  let mut work: Vec<(Expr, Expr)> = vec![(x.clone(), y.clone())];
  let mut steps: usize = 0;

  while let Some((a, b)) = work.pop() {
    steps += 1;
    if steps > limit {
      tracing::debug!(steps, "definitional equality step limit exceeded");
      return Err(TcError::ReductionLimit { expr: x.clone(), limit });
    }
    if !def_eq_step(&a, &b, &mut work, tc)? {
      return Ok(false);
    }
  }
  Ok(true)
}

/// Side queries that fail count as a negative answer; an exhausted
/// reduction budget does not.
fn soft<T>(r: TcResult<T>) -> TcResult<Option<T>> {
  match r {
    Ok(v) => Ok(Some(v)),
    Err(e @ TcError::ReductionLimit { .. }) => Err(e),
    Err(_) => Ok(None),
  }
}

/// Process one pair. Returns false if definitely not equal; may push
/// further pairs onto `work` that must all be equal.
fn def_eq_step(
  x: &Expr,
  y: &Expr,
  work: &mut Vec<(Expr, Expr)>,
  tc: &mut TypeChecker,
) -> TcResult<bool> {
  if let Some(quick) = def_eq_quick_check(x, y) {
    return Ok(quick);
  }

  let x_n = tc.whnf_core(x)?;
  let y_n = tc.whnf_core(y)?;

  if let Some(quick) = def_eq_quick_check(&x_n, &y_n) {
    return Ok(quick);
  }

  if proof_irrel_eq(&x_n, &y_n, tc)? {
    return Ok(true);
  }

  match lazy_delta_step(&x_n, &y_n, tc)? {
    DeltaResult::Found(result) => Ok(result),
    DeltaResult::Exhausted(x_e, y_e) => Ok(
      def_eq_const(&x_e, &y_e)
        || def_eq_fvar(&x_e, &y_e)
        || def_eq_lit(&x_e, &y_e)
        || def_eq_proj_push(&x_e, &y_e, work)
        || def_eq_app_push(&x_e, &y_e, work)
        || def_eq_binder(&x_e, &y_e, work, tc)
        || try_eta_expansion(&x_e, &y_e, tc)?
        || try_eta_struct(&x_e, &y_e, tc)?
        || is_def_eq_unit_like(&x_e, &y_e, tc)?,
    ),
  }
}

fn def_eq_quick_check(x: &Expr, y: &Expr) -> Option<bool> {
  if Expr::ptr_eq(x, y) || x == y {
    return Some(true);
  }
  match (x.as_data(), y.as_data()) {
    (ExprData::Sort(l), ExprData::Sort(r)) => Some(is_equivalent(l, r)),
    (ExprData::Mdata(_, x), _) => def_eq_quick_check(x, y),
    (_, ExprData::Mdata(_, y)) => def_eq_quick_check(x, y),
    _ => None,
  }
}

fn def_eq_const(x: &Expr, y: &Expr) -> bool {
  match (x.as_data(), y.as_data()) {
    (ExprData::Const(xn, xl), ExprData::Const(yn, yl)) => {
      xn == yn && is_equivalent_many(xl, yl)
    },
    _ => false,
  }
}

fn def_eq_fvar(x: &Expr, y: &Expr) -> bool {
  matches!(
    (x.as_data(), y.as_data()),
    (ExprData::Fvar(a), ExprData::Fvar(b)) if a == b
  )
}

fn def_eq_lit(x: &Expr, y: &Expr) -> bool {
  matches!(
    (x.as_data(), y.as_data()),
    (ExprData::Lit(a), ExprData::Lit(b)) if a == b
  )
}

fn def_eq_proj_push(x: &Expr, y: &Expr, work: &mut Vec<(Expr, Expr)>) -> bool {
  match (x.as_data(), y.as_data()) {
    (ExprData::Proj(_, idx_l, sl), ExprData::Proj(_, idx_r, sr))
      if idx_l == idx_r =>
    {
      work.push((sl.clone(), sr.clone()));
      true
    },
    _ => false,
  }
}

/// App congruence: push head + arg pairs onto work stack.
fn def_eq_app_push(x: &Expr, y: &Expr, work: &mut Vec<(Expr, Expr)>) -> bool {
  let (f1, args1) = unfold_apps(x);
  let (f2, args2) = unfold_apps(y);
  if args1.is_empty() || args1.len() != args2.len() {
    return false;
  }
  work.push((f1, f2));
  work.extend(args1.into_iter().zip(args2));
  true
}

/// Eager app congruence, used by lazy delta where a definite answer is
/// needed before unfolding further.
fn def_eq_app(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  let (f1, args1) = unfold_apps(x);
  let (f2, args2) = unfold_apps(y);
  if args1.is_empty() || args1.len() != args2.len() || !def_eq(&f1, &f2, tc)? {
    return Ok(false);
  }
  for (a, b) in args1.iter().zip(&args2) {
    if !def_eq(a, b, tc)? {
      return Ok(false);
    }
  }
  Ok(true)
}

/// Binder comparison: domains pairwise, bodies under a shared fresh local.
fn def_eq_binder(
  x: &Expr,
  y: &Expr,
  work: &mut Vec<(Expr, Expr)>,
  tc: &mut TypeChecker,
) -> bool {
  let mut cx = x.clone();
  let mut cy = y.clone();
  let mut locals = Vec::new();
  loop {
    match (cx.as_data(), cy.as_data()) {
      (ExprData::ForallE(n, t1, b1, bi), ExprData::ForallE(_, t2, b2, _))
      | (ExprData::Lam(n, t1, b1, bi), ExprData::Lam(_, t2, b2, _)) => {
        let t1 = inst(t1, &locals);
        work.push((t1.clone(), inst(t2, &locals)));
        locals.push(tc.mk_local(n, t1, *bi));
        let (b1, b2) = (b1.clone(), b2.clone());
        cx = b1;
        cy = b2;
      },
      _ => break,
    }
  }
  if locals.is_empty() {
    return false;
  }
  work.push((inst(&cx, &locals), inst(&cy, &locals)));
  true
}

/// Proof irrelevance: two proofs of the same proposition are equal.
fn proof_irrel_eq(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  let Some(x_ty) = soft(tc.infer(x))? else { return Ok(false) };
  if soft(tc.is_prop(&x_ty))? != Some(true) {
    return Ok(false);
  }
  let Some(y_ty) = soft(tc.infer(y))? else { return Ok(false) };
  def_eq(&x_ty, &y_ty, tc)
}

/// Eta: `fun x => f x` is `f` when `f : (x : A) -> B`.
fn try_eta_expansion(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  Ok(try_eta_expansion_aux(x, y, tc)? || try_eta_expansion_aux(y, x, tc)?)
}

fn try_eta_expansion_aux(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  if !x.is_lambda() || y.is_lambda() {
    return Ok(false);
  }
  let Some(y_ty) = soft(tc.infer(y))? else { return Ok(false) };
  let y_ty = tc.whnf(&y_ty)?;
  match y_ty.as_data() {
    ExprData::ForallE(name, binder_type, _, bi) => {
      let body = Expr::app(lift_loose_bvars(y, 1), Expr::bvar(0));
      let expanded = Expr::lam(name.clone(), binder_type.clone(), body, *bi);
      def_eq(x, &expanded, tc)
    },
    _ => Ok(false),
  }
}

/// One constructor, not recursive, no indices.
fn is_structure_like(name: &Name, env: &Env) -> bool {
  env
    .get_inductive(name)
    .is_some_and(|iv| iv.ctors.len() == 1 && !iv.is_rec && iv.num_indices == 0)
}

/// Structure eta: `p` is `S.mk p.1 .. p.n`.
fn try_eta_struct(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  Ok(try_eta_struct_core(x, y, tc)? || try_eta_struct_core(y, x, tc)?)
}

fn try_eta_struct_core(t: &Expr, s: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  let (head, args) = unfold_apps(s);
  let Some(ctor) = head.const_name().and_then(|n| tc.env().get_ctor(n)) else {
    return Ok(false);
  };
  if !is_structure_like(&ctor.induct, tc.env())
    || args.len() != ctor.num_params + ctor.num_fields
  {
    return Ok(false);
  }
  let Some(t_ty) = soft(tc.infer(t))? else { return Ok(false) };
  let Some(s_ty) = soft(tc.infer(s))? else { return Ok(false) };
  if !def_eq(&t_ty, &s_ty, tc)? {
    return Ok(false);
  }
  for i in 0..ctor.num_fields {
    let proj = Expr::proj(ctor.induct.clone(), i as u64, t.clone());
    if !def_eq(&args[ctor.num_params + i], &proj, tc)? {
      return Ok(false);
    }
  }
  Ok(true)
}

/// Types with a single zero-field constructor have one inhabitant.
fn is_def_eq_unit_like(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<bool> {
  let Some(x_ty) = soft(tc.infer(x))? else { return Ok(false) };
  let x_ty = tc.whnf(&x_ty)?;
  let Some(ind) = x_ty.get_app_fn().const_name().and_then(|n| tc.env().get_inductive(n))
  else {
    return Ok(false);
  };
  let unit_like = ind.ctors.len() == 1
    && tc.env().get_ctor(&ind.ctors[0]).is_some_and(|c| c.num_fields == 0);
  if !unit_like {
    return Ok(false);
  }
  let Some(y_ty) = soft(tc.infer(y))? else { return Ok(false) };
  def_eq(&x_ty, &y_ty, tc)
}

fn is_nat_zero(e: &Expr) -> bool {
  match e.as_data() {
    ExprData::Const(name, _) => *name == Name::from("Nat.zero"),
    ExprData::Lit(Literal::NatVal(n)) => n.is_zero(),
    _ => false,
  }
}

/// Predecessor of `Nat.succ n` or of a positive literal.
fn is_nat_succ(e: &Expr) -> Option<Expr> {
  match e.as_data() {
    ExprData::App(f, arg) if f.const_name() == Some(&Name::from("Nat.succ")) => {
      Some(arg.clone())
    },
    ExprData::Lit(Literal::NatVal(n)) => n.pred().map(Expr::nat_lit),
    _ => None,
  }
}

fn def_eq_nat_offset(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<Option<bool>> {
  if is_nat_zero(x) && is_nat_zero(y) {
    return Ok(Some(true));
  }
  match (is_nat_succ(x), is_nat_succ(y)) {
    (Some(x_pred), Some(y_pred)) => def_eq(&x_pred, &y_pred, tc).map(Some),
    _ => Ok(None),
  }
}

/// Lazy delta reduction: unfold the side with the greater height first.
fn lazy_delta_step(x: &Expr, y: &Expr, tc: &mut TypeChecker) -> TcResult<DeltaResult> {
  let mut x = x.clone();
  let mut y = y.clone();
  let mut iters: u32 = 0;

  loop {
    iters += 1;
    if iters > MAX_DELTA_ITERS {
      return Ok(DeltaResult::Exhausted(x, y));
    }

    if let Some(quick) = def_eq_nat_offset(&x, &y, tc)? {
      return Ok(DeltaResult::Found(quick));
    }

    if let Some(x_r) = try_reduce_nat(&x, tc.env())? {
      x = tc.whnf_core(&x_r)?;
      if let Some(quick) = def_eq_quick_check(&x, &y) {
        return Ok(DeltaResult::Found(quick));
      }
      continue;
    }
    if let Some(y_r) = try_reduce_nat(&y, tc.env())? {
      y = tc.whnf_core(&y_r)?;
      if let Some(quick) = def_eq_quick_check(&x, &y) {
        return Ok(DeltaResult::Found(quick));
      }
      continue;
    }

    let x_def = get_applied_def(&x, tc.env());
    let y_def = get_applied_def(&y, tc.env());

    match (&x_def, &y_def) {
      (None, None) => return Ok(DeltaResult::Exhausted(x, y)),
      (Some(_), None) => x = delta(&x, tc)?,
      (None, Some(_)) => y = delta(&y, tc)?,
      (Some((x_name, x_hint)), Some((y_name, y_hint))) => {
        if x_name == y_name && x_hint == y_hint {
          if def_eq_app(&x, &y, tc)? {
            return Ok(DeltaResult::Found(true));
          }
          x = delta(&x, tc)?;
          y = delta(&y, tc)?;
        } else if hint_lt(x_hint, y_hint) {
          y = delta(&y, tc)?;
        } else {
          x = delta(&x, tc)?;
        }
      },
    }

    if let Some(quick) = def_eq_quick_check(&x, &y) {
      return Ok(DeltaResult::Found(quick));
    }
  }
}

fn get_applied_def(e: &Expr, env: &Env) -> Option<(Name, ReducibilityHints)> {
  let name = e.get_app_fn().const_name()?;
  match env.get(name)? {
    ConstantInfo::DefnInfo(d) if d.hints != ReducibilityHints::Opaque => {
      Some((name.clone(), d.hints))
    },
    _ => None,
  }
}

/// Unfold once, then cheap WHNF (no delta).
fn delta(e: &Expr, tc: &mut TypeChecker) -> TcResult<Expr> {
  match unfold_definition(e, tc.env()) {
    Some(unfolded) => tc.whnf_core(&unfolded),
    None => Ok(e.clone()),
  }
}

fn hint_lt(a: &ReducibilityHints, b: &ReducibilityHints) -> bool {
  match (a, b) {
    (ReducibilityHints::Opaque, _) => true,
    (_, ReducibilityHints::Opaque) => false,
    (ReducibilityHints::Abbrev, _) => false,
    (_, ReducibilityHints::Abbrev) => true,
    (ReducibilityHints::Regular(ha), ReducibilityHints::Regular(hb)) => ha < hb,
  }
}
