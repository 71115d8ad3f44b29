use num_bigint::BigUint;
use rustc_hash::FxHashMap;

use crate::env::*;
use crate::nat::Nat;
use crate::FxIndexSet;

use super::error::{TcError, TcResult};
use super::level::subst_level;

/// Upper bound on core reduction steps before giving up on a term.
const WHNF_STEP_LIMIT: usize = 1_000_000;

// ============================================================================
// Expression helpers (replace, inst, abstr, unfold_apps, subst_expr_levels)
// ============================================================================

/// Rewrites `e` top-down. `f(node, offset)` is consulted on every node,
/// where `offset` counts the binders crossed so far; `Some(r)` replaces the
/// node without descending into it. Untouched subtrees are shared with the
/// input, and shared input nodes are rewritten once per offset.
pub fn replace<F>(e: &Expr, mut f: F) -> Expr
where
  F: FnMut(&Expr, u64) -> Option<Expr>,
{
  enum Frame<'a> {
    Visit(&'a Expr, u64),
    Rebuild(&'a Expr, u64),
  }

  let mut cache: FxHashMap<(usize, u64), Expr> = FxHashMap::default();
  let mut work: Vec<Frame<'_>> = vec![Frame::Visit(e, 0)];
  let mut results: Vec<Expr> = Vec::new();

  while let Some(frame) = work.pop() {
    match frame {
      Frame::Visit(e, offset) => {
        if let Some(cached) = cache.get(&(e.ptr_key(), offset)) {
          results.push(cached.clone());
          continue;
        }
        if let Some(r) = f(e, offset) {
          results.push(r);
          continue;
        }
        match e.as_data() {
          ExprData::App(g, a) => {
            work.push(Frame::Rebuild(e, offset));
            work.push(Frame::Visit(a, offset));
            work.push(Frame::Visit(g, offset));
          },
          ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
            work.push(Frame::Rebuild(e, offset));
            work.push(Frame::Visit(b, offset + 1));
            work.push(Frame::Visit(t, offset));
          },
          ExprData::LetE(_, t, v, b, _) => {
            work.push(Frame::Rebuild(e, offset));
            work.push(Frame::Visit(b, offset + 1));
            work.push(Frame::Visit(v, offset));
            work.push(Frame::Visit(t, offset));
          },
          ExprData::Proj(_, _, s) | ExprData::Mdata(_, s) => {
            work.push(Frame::Rebuild(e, offset));
            work.push(Frame::Visit(s, offset));
          },
          ExprData::Bvar(..)
          | ExprData::Fvar(..)
          | ExprData::Mvar(..)
          | ExprData::Sort(..)
          | ExprData::Const(..)
          | ExprData::Lit(..) => results.push(e.clone()),
        }
      },
      Frame::Rebuild(e, offset) => {
        let rebuilt = match e.as_data() {
          ExprData::App(g, a) => {
            let kids = results.split_off(results.len() - 2);
            if Expr::ptr_eq(g, &kids[0]) && Expr::ptr_eq(a, &kids[1]) {
              e.clone()
            } else {
              e.update(ExprData::App(kids[0].clone(), kids[1].clone()))
            }
          },
          ExprData::Lam(n, t, b, bi) | ExprData::ForallE(n, t, b, bi) => {
            let kids = results.split_off(results.len() - 2);
            if Expr::ptr_eq(t, &kids[0]) && Expr::ptr_eq(b, &kids[1]) {
              e.clone()
            } else if e.is_lambda() {
              e.update(ExprData::Lam(
                n.clone(),
                kids[0].clone(),
                kids[1].clone(),
                *bi,
              ))
            } else {
              e.update(ExprData::ForallE(
                n.clone(),
                kids[0].clone(),
                kids[1].clone(),
                *bi,
              ))
            }
          },
          ExprData::LetE(n, t, v, b, nd) => {
            let kids = results.split_off(results.len() - 3);
            if Expr::ptr_eq(t, &kids[0])
              && Expr::ptr_eq(v, &kids[1])
              && Expr::ptr_eq(b, &kids[2])
            {
              e.clone()
            } else {
              e.update(ExprData::LetE(
                n.clone(),
                kids[0].clone(),
                kids[1].clone(),
                kids[2].clone(),
                *nd,
              ))
            }
          },
          ExprData::Proj(n, i, s) => {
            let kids = results.split_off(results.len() - 1);
            if Expr::ptr_eq(s, &kids[0]) {
              e.clone()
            } else {
              e.update(ExprData::Proj(n.clone(), *i, kids[0].clone()))
            }
          },
          ExprData::Mdata(kvs, s) => {
            let kids = results.split_off(results.len() - 1);
            if Expr::ptr_eq(s, &kids[0]) {
              e.clone()
            } else {
              e.update(ExprData::Mdata(kvs.clone(), kids[0].clone()))
            }
          },
          _ => e.clone(),
        };
        cache.insert((e.ptr_key(), offset), rebuilt.clone());
        results.push(rebuilt);
      },
    }
  }

  results.pop().unwrap_or_else(|| e.clone())
}

/// Instantiate bound variables: `body[0 := substs[n-1], 1 := substs[n-2], ...]`.
/// Follows Lean 4's `instantiate` convention: `substs[0]` is the outermost
/// variable and replaces `Bvar(n-1)`, while `substs[n-1]` is the innermost
/// and replaces `Bvar(0)`. Remaining loose variables are shifted down by `n`.
pub fn inst(body: &Expr, substs: &[Expr]) -> Expr {
  if substs.is_empty() || !body.has_loose_bvars() {
    return body.clone();
  }
  let n = substs.len() as u64;
  replace(body, |e, offset| {
    if e.loose_bvar_range() <= offset {
      return Some(e.clone());
    }
    match e.as_data() {
      ExprData::Bvar(idx) => {
        let adjusted = idx - offset;
        if adjusted < n {
          let s = &substs[(n - 1 - adjusted) as usize];
          Some(lift_loose_bvars(s, offset))
        } else {
          Some(Expr::bvar(idx - n))
        }
      },
      _ => None,
    }
  })
}

/// Shift every loose bound variable of `e` up by `d`.
pub fn lift_loose_bvars(e: &Expr, d: u64) -> Expr {
  if d == 0 || !e.has_loose_bvars() {
    return e.clone();
  }
  replace(e, |e, offset| {
    if e.loose_bvar_range() <= offset {
      return Some(e.clone());
    }
    match e.as_data() {
      ExprData::Bvar(idx) => Some(Expr::bvar(idx + d)),
      _ => None,
    }
  })
}

/// Whether loose bound variable `idx` occurs in `e`.
pub fn has_loose_bvar(e: &Expr, idx: u64) -> bool {
  let mut stack: Vec<(&Expr, u64)> = vec![(e, idx)];
  while let Some((e, idx)) = stack.pop() {
    if e.loose_bvar_range() <= idx {
      continue;
    }
    match e.as_data() {
      ExprData::Bvar(i) if *i == idx => return true,
      ExprData::App(f, a) => {
        stack.push((f, idx));
        stack.push((a, idx));
      },
      ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
        stack.push((t, idx));
        stack.push((b, idx + 1));
      },
      ExprData::LetE(_, t, v, b, _) => {
        stack.push((t, idx));
        stack.push((v, idx));
        stack.push((b, idx + 1));
      },
      ExprData::Proj(_, _, s) | ExprData::Mdata(_, s) => stack.push((s, idx)),
      _ => {},
    }
  }
  false
}

/// Abstract: replace free variables with bound variables.
/// Follows Lean 4 convention: `fvars[0]` (outermost) maps to `Bvar(n-1+offset)`,
/// `fvars[n-1]` (innermost) maps to `Bvar(0+offset)`.
pub fn abstr(e: &Expr, fvars: &[Expr]) -> Expr {
  if fvars.is_empty() || !e.has_fvar() {
    return e.clone();
  }
  let n = fvars.len() as u64;
  replace(e, |e, offset| {
    if !e.has_fvar() {
      return Some(e.clone());
    }
    match e.as_data() {
      ExprData::Fvar(_) => match fvars.iter().rposition(|v| v == e) {
        Some(i) => Some(Expr::bvar(offset + n - 1 - i as u64)),
        None => Some(e.clone()),
      },
      _ => None,
    }
  })
}

/// Free locals of `e`, in order of first occurrence.
pub fn collect_fvars(e: &Expr, out: &mut FxIndexSet<Name>) {
  let mut stack: Vec<&Expr> = vec![e];
  while let Some(e) = stack.pop() {
    if !e.has_fvar() {
      continue;
    }
    match e.as_data() {
      ExprData::Fvar(n) => {
        out.insert(n.clone());
      },
      ExprData::App(f, a) => {
        stack.push(a);
        stack.push(f);
      },
      ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
        stack.push(b);
        stack.push(t);
      },
      ExprData::LetE(_, t, v, b, _) => {
        stack.push(b);
        stack.push(v);
        stack.push(t);
      },
      ExprData::Proj(_, _, s) | ExprData::Mdata(_, s) => stack.push(s),
      _ => {},
    }
  }
}

/// Decompose `f a1 a2 ... an` into `(f, [a1, a2, ..., an])`.
pub fn unfold_apps(e: &Expr) -> (Expr, Vec<Expr>) {
  let mut args = Vec::new();
  let mut cursor = e.clone();
  while let ExprData::App(f, a) = cursor.as_data() {
    args.push(a.clone());
    cursor = f.clone();
  }
  args.reverse();
  (cursor, args)
}

/// Reconstruct `f a1 a2 ... an`.
pub fn foldl_apps(mut fun: Expr, args: impl IntoIterator<Item = Expr>) -> Expr {
  for arg in args {
    fun = Expr::app(fun, arg);
  }
  fun
}

/// Beta-reduce the head of `e` as far as its arguments allow.
pub fn head_beta(e: &Expr) -> Expr {
  let (mut f, args) = unfold_apps(e);
  if args.is_empty() || !f.is_lambda() {
    return e.clone();
  }
  let mut used = 0;
  while used < args.len() {
    match f.as_data() {
      ExprData::Lam(_, _, body, _) => {
        f = body.clone();
        used += 1;
      },
      _ => break,
    }
  }
  let body = inst(&f, &args[..used]);
  head_beta(&foldl_apps(body, args[used..].iter().cloned()))
}

/// Substitute universe level parameters in an expression.
pub fn subst_expr_levels(e: &Expr, params: &[Name], values: &[Level]) -> Expr {
  if params.is_empty() {
    return e.clone();
  }
  replace(e, |e, _| match e.as_data() {
    ExprData::Sort(l) => {
      Some(e.update(ExprData::Sort(subst_level(l, params, values))))
    },
    ExprData::Const(n, ls) => {
      let ls = ls.iter().map(|l| subst_level(l, params, values)).collect();
      Some(e.update(ExprData::Const(n.clone(), ls)))
    },
    _ => None,
  })
}

// ============================================================================
// WHNF
// ============================================================================

/// Weak head normal form without delta: beta, zeta, metadata, iota and
/// projection-of-constructor steps. Returns `e` itself (same node) when no
/// step applies.
pub fn whnf_core(e: &Expr, env: &Env) -> TcResult<Expr> {
  whnf_core_bounded(e, env, WHNF_STEP_LIMIT)
}

fn whnf_core_bounded(e: &Expr, env: &Env, limit: usize) -> TcResult<Expr> {
  let mut cur = e.clone();
  for _ in 0..limit {
    match whnf_core_step(&cur, env)? {
      Some(next) => cur = next,
      None => return Ok(cur),
    }
  }
  Err(TcError::ReductionLimit { expr: e.clone(), limit })
}

fn whnf_core_step(e: &Expr, env: &Env) -> TcResult<Option<Expr>> {
  match e.as_data() {
    ExprData::Mdata(_, inner) => Ok(Some(inner.clone())),
    ExprData::LetE(_, _, v, b, _) => Ok(Some(inst(b, &[v.clone()]))),
    ExprData::Proj(_, idx, s) => reduce_proj(*idx, s, env),
    ExprData::App(..) => {
      let (f, args) = unfold_apps(e);
      match f.as_data() {
        ExprData::Lam(..) => Ok(Some(head_beta(e))),
        ExprData::Const(name, levels) => reduce_rec(name, levels, &args, env),
        _ => Ok(whnf_core_step(&f, env)?.map(|f| foldl_apps(f, args))),
      }
    },
    _ => Ok(None),
  }
}

/// Full weak head normal form, including nat primitives and delta.
pub fn whnf(e: &Expr, env: &Env) -> TcResult<Expr> {
  whnf_bounded(e, env, WHNF_STEP_LIMIT)
}

fn whnf_bounded(e: &Expr, env: &Env, limit: usize) -> TcResult<Expr> {
  let mut cur = e.clone();
  for _ in 0..limit {
    let core = whnf_core(&cur, env)?;
    if let Some(r) = try_reduce_nat(&core, env)? {
      cur = r;
      continue;
    }
    match unfold_definition(&core, env) {
      Some(r) => cur = r,
      None => return Ok(core),
    }
  }
  Err(TcError::ReductionLimit { expr: e.clone(), limit })
}

/// Reduce `e` with core steps, delta-unfolding its head only while `pred`
/// holds of the current term. At most `limit` unfoldings are performed.
pub fn whnf_pred<P>(
  e: &Expr,
  env: &Env,
  mut pred: P,
  limit: usize,
) -> TcResult<Expr>
where
  P: FnMut(&Expr) -> bool,
{
  let mut cur = e.clone();
  for _ in 0..=limit {
    let t = whnf_core(&cur, env)?;
    if !pred(&t) {
      return Ok(t);
    }
    match unfold_definition(&t, env) {
      Some(next) => cur = next,
      None => return Ok(t),
    }
  }
  Err(TcError::ReductionLimit { expr: e.clone(), limit })
}

/// Unfold the head constant of `e` once and beta-reduce against its
/// arguments. Only transparent definitions unfold.
pub fn unfold_definition(e: &Expr, env: &Env) -> Option<Expr> {
  let (head, args) = unfold_apps(e);
  let (name, levels) = match head.as_data() {
    ExprData::Const(name, levels) => (name, levels),
    _ => return None,
  };
  let def = match env.get(name)? {
    ConstantInfo::DefnInfo(d) if d.hints != ReducibilityHints::Opaque => d,
    _ => return None,
  };
  if levels.len() != def.cnst.level_params.len() {
    return None;
  }
  let val = subst_expr_levels(&def.value, &def.cnst.level_params, levels);
  Some(head_beta(&foldl_apps(val, args)))
}

/// Unfold an application headed by an auxiliary or user-defined recursor.
pub fn reduce_aux_recursor(e: &Expr, env: &Env) -> Option<Expr> {
  let name = e.get_app_fn().const_name()?;
  if env.is_aux_recursor(name) || env.is_user_recursor(name) {
    unfold_definition(e, env)
  } else {
    None
  }
}

/// One iota step on a recursor application whose major premise reduces to
/// a constructor.
pub fn reduce_rec(
  name: &Name,
  levels: &[Level],
  args: &[Expr],
  env: &Env,
) -> TcResult<Option<Expr>> {
  let Some(rec) = env.get_rec(name) else {
    return Ok(None);
  };
  let Some(major) = args.get(rec.major_idx()) else {
    return Ok(None);
  };
  let major = whnf(major, env)?;
  Ok(iota(rec, levels, args, &major))
}

fn iota(rec: &RecursorVal, levels: &[Level], args: &[Expr], major: &Expr) -> Option<Expr> {
  let major_idx = rec.major_idx();
  let (ctor_head, ctor_args) = match major.as_data() {
    ExprData::Lit(Literal::NatVal(n)) => nat_lit_to_ctor(n),
    _ => unfold_apps(major),
  };
  let ctor_name = ctor_head.const_name()?;
  let rule = rec.rules.iter().find(|r| r.ctor == *ctor_name)?;
  if ctor_args.len() < rule.n_fields {
    return None;
  }
  let ctor_fields = &ctor_args[ctor_args.len() - rule.n_fields..];

  let rhs = subst_expr_levels(&rule.rhs, &rec.cnst.level_params, levels);
  let prefix = rec.num_params + rec.num_motives + rec.num_minors;
  let all_args = args[..prefix]
    .iter()
    .chain(ctor_fields)
    .chain(&args[major_idx + 1..])
    .cloned();
  Some(foldl_apps(rhs, all_args))
}

fn nat_lit_to_ctor(n: &Nat) -> (Expr, Vec<Expr>) {
  match n.pred() {
    None => (Expr::cnst(Name::from("Nat.zero"), vec![]), vec![]),
    Some(p) => {
      (Expr::cnst(Name::from("Nat.succ"), vec![]), vec![Expr::nat_lit(p)])
    },
  }
}

/// Projection of a term that reduces to a constructor application.
fn reduce_proj(idx: u64, structure: &Expr, env: &Env) -> TcResult<Option<Expr>> {
  let s = whnf(structure, env)?;
  let (head, args) = unfold_apps(&s);
  let ctor = head.const_name().and_then(|n| env.get_ctor(n));
  Ok(ctor.and_then(|c| args.get(c.num_params + idx as usize).cloned()))
}

const NAT_BINOPS: [&str; 7] =
  ["Nat.add", "Nat.sub", "Nat.mul", "Nat.div", "Nat.mod", "Nat.beq", "Nat.ble"];

/// Try to reduce nat operations on literal arguments.
pub(crate) fn try_reduce_nat(e: &Expr, env: &Env) -> TcResult<Option<Expr>> {
  if e.has_fvar() {
    return Ok(None);
  }
  let (head, args) = unfold_apps(e);
  let Some(name) = head.const_name() else {
    return Ok(None);
  };
  let name = name.pretty();
  match (name.as_str(), args.as_slice()) {
    ("Nat.succ", [a]) => {
      let n = nat_value(a, env)?;
      Ok(n.map(|n| Expr::nat_lit(Nat(n + BigUint::from(1u64)))))
    },
    (op, [a, b]) if NAT_BINOPS.contains(&op) => {
      let Some(a) = nat_value(a, env)? else {
        return Ok(None);
      };
      let Some(b) = nat_value(b, env)? else {
        return Ok(None);
      };
      let lit = |n: BigUint| Expr::nat_lit(Nat(n));
      Ok(Some(match op {
        "Nat.add" => lit(a + b),
        "Nat.sub" => lit(if a >= b { a - b } else { BigUint::ZERO }),
        "Nat.mul" => lit(a * b),
        "Nat.div" => lit(if b == BigUint::ZERO { BigUint::ZERO } else { a / b }),
        "Nat.mod" => lit(if b == BigUint::ZERO { a } else { a % b }),
        "Nat.beq" => bool_to_expr(a == b),
        _ => bool_to_expr(a <= b),
      }))
    },
    _ => Ok(None),
  }
}

fn nat_value(e: &Expr, env: &Env) -> TcResult<Option<BigUint>> {
  Ok(get_nat_value(&whnf(e, env)?))
}

fn get_nat_value(e: &Expr) -> Option<BigUint> {
  match e.as_data() {
    ExprData::Lit(Literal::NatVal(n)) => Some(n.0.clone()),
    ExprData::Const(name, _) if *name == Name::from("Nat.zero") => {
      Some(BigUint::ZERO)
    },
    _ => None,
  }
}

fn bool_to_expr(b: bool) -> Expr {
  let name = if b { "Bool.true" } else { "Bool.false" };
  Expr::cnst(Name::from(name), vec![])
}

// ============================================================================
// Tests
// ============================================================================
