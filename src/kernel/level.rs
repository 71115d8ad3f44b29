use std::cmp::Ordering;

use crate::env::{Level, LevelData, Name};

/// Splits `l` into `(base, k)` such that `l = succ^k base`.
pub fn to_offset(l: &Level) -> (&Level, u64) {
  let mut k = 0;
  let mut cur = l;
  while let LevelData::Succ(inner) = cur.as_data() {
    k += 1;
    cur = inner;
  }
  (cur, k)
}

fn add_offset(mut l: Level, k: u64) -> Level {
  for _ in 0..k {
    l = Level::succ(l);
  }
  l
}

/// `Some(k)` if `l` is the closed level `k`.
pub fn to_explicit(l: &Level) -> Option<u64> {
  let (base, k) = to_offset(l);
  matches!(base.as_data(), LevelData::Zero).then_some(k)
}

/// Never zero under any assignment of its parameters.
pub fn is_never_zero(l: &Level) -> bool {
  match l.as_data() {
    LevelData::Zero | LevelData::Param(_) | LevelData::Mvar(_) => false,
    LevelData::Succ(_) => true,
    LevelData::Max(a, b) => is_never_zero(a) || is_never_zero(b),
    LevelData::Imax(_, b) => is_never_zero(b),
  }
}

fn kind_rank(l: &Level) -> u8 {
  match l.as_data() {
    LevelData::Zero => 0,
    LevelData::Param(_) => 1,
    LevelData::Mvar(_) => 2,
    LevelData::Max(..) => 3,
    LevelData::Imax(..) => 4,
    LevelData::Succ(_) => 5,
  }
}

/// Total order on normalized levels: by base, then by offset.
fn norm_cmp(a: &Level, b: &Level) -> Ordering {
  let (ab, ak) = to_offset(a);
  let (bb, bk) = to_offset(b);
  base_cmp(ab, bb).then(ak.cmp(&bk))
}

fn base_cmp(a: &Level, b: &Level) -> Ordering {
  match (a.as_data(), b.as_data()) {
    (LevelData::Param(x), LevelData::Param(y))
    | (LevelData::Mvar(x), LevelData::Mvar(y)) => x.cmp(y),
    (LevelData::Max(a1, a2), LevelData::Max(b1, b2))
    | (LevelData::Imax(a1, a2), LevelData::Imax(b1, b2)) => {
      norm_cmp(a1, b1).then_with(|| norm_cmp(a2, b2))
    },
    _ => kind_rank(a).cmp(&kind_rank(b)),
  }
}

fn push_max_args(l: &Level, out: &mut Vec<Level>) {
  match l.as_data() {
    LevelData::Max(a, b) => {
      push_max_args(a, out);
      push_max_args(b, out);
    },
    _ => out.push(l.clone()),
  }
}

fn mk_max_chain(mut args: Vec<Level>) -> Level {
  let Some(mut acc) = args.pop() else {
    return Level::zero();
  };
  while let Some(l) = args.pop() {
    acc = Level::max(l, acc);
  }
  acc
}

fn mk_imax_core(a: Level, b: Level) -> Level {
  if is_never_zero(&b) {
    normalize(&Level::max(a, b))
  } else if to_explicit(&b) == Some(0) {
    b
  } else if matches!(to_explicit(&a), Some(0) | Some(1)) || a == b {
    b
  } else {
    Level::imax(a, b)
  }
}

/// Normal form: offsets pushed into `max` arguments, nested `max`
/// flattened, sorted and deduplicated, `imax` eliminated where possible.
pub fn normalize(l: &Level) -> Level {
  let (base, k) = to_offset(l);
  match base.as_data() {
    LevelData::Zero
    | LevelData::Param(_)
    | LevelData::Mvar(_)
    | LevelData::Succ(_) => l.clone(),
    LevelData::Imax(a, b) => {
      let r = mk_imax_core(normalize(a), normalize(b));
      match r.as_data() {
        LevelData::Max(..) if k > 0 => normalize(&add_offset(r, k)),
        _ => add_offset(r, k),
      }
    },
    LevelData::Max(..) => {
      let mut raw = Vec::new();
      push_max_args(base, &mut raw);
      let mut args = Vec::new();
      for a in &raw {
        push_max_args(&normalize(a), &mut args);
      }
      let mut args: Vec<Level> =
        args.into_iter().map(|a| add_offset(a, k)).collect();
      args.sort_by(norm_cmp);
      // Same base: keep only the largest offset.
      let mut dedup: Vec<Level> = Vec::with_capacity(args.len());
      for a in args {
        let same_base = dedup.last().is_some_and(|last| {
          base_cmp(to_offset(last).0, to_offset(&a).0) == Ordering::Equal
        });
        if same_base {
          dedup.pop();
        }
        dedup.push(a);
      }
      // A closed level is subsumed by any argument with at least its offset.
      let max_other = dedup
        .iter()
        .filter(|a| to_explicit(a).is_none())
        .map(|a| to_offset(a).1)
        .max();
      if let Some(m) = max_other {
        dedup.retain(|a| match to_explicit(a) {
          Some(c) => c > m,
          None => true,
        });
      }
      mk_max_chain(dedup)
    },
  }
}

/// Level equality up to normalization.
pub fn is_equivalent(l: &Level, r: &Level) -> bool {
  l == r || normalize(l) == normalize(r)
}

pub fn is_equivalent_many(ls: &[Level], rs: &[Level]) -> bool {
  ls.len() == rs.len()
    && ls.iter().zip(rs.iter()).all(|(l, r)| is_equivalent(l, r))
}

/// Definitionally zero, i.e. the sort is `Prop`.
pub fn is_zero(l: &Level) -> bool {
  to_explicit(&normalize(l)) == Some(0)
}

/// Substitute universe parameters: `level[params[i] := values[i]]`.
pub fn subst_level(level: &Level, params: &[Name], values: &[Level]) -> Level {
  match level.as_data() {
    LevelData::Zero | LevelData::Mvar(_) => level.clone(),
    LevelData::Succ(inner) => Level::succ(subst_level(inner, params, values)),
    LevelData::Max(a, b) => Level::max(
      subst_level(a, params, values),
      subst_level(b, params, values),
    ),
    LevelData::Imax(a, b) => Level::imax(
      subst_level(a, params, values),
      subst_level(b, params, values),
    ),
    LevelData::Param(name) => params
      .iter()
      .position(|p| p == name)
      .and_then(|i| values.get(i))
      .cloned()
      .unwrap_or_else(|| level.clone()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn u() -> Level {
    Level::param(Name::from("u"))
  }

  fn v() -> Level {
    Level::param(Name::from("v"))
  }

  #[test]
  fn max_with_zero_collapses() {
    let m = Level::max(Level::zero(), u());
    assert_eq!(normalize(&m), u());
  }

  #[test]
  fn max_is_commutative() {
    assert!(is_equivalent(&Level::max(u(), v()), &Level::max(v(), u())));
  }

  #[test]
  fn succ_distributes_over_max() {
    let l = Level::succ(Level::max(u(), v()));
    let r = Level::max(Level::succ(v()), Level::succ(u()));
    assert!(is_equivalent(&l, &r));
  }

  #[test]
  fn imax_with_zero_right_is_zero() {
    assert!(is_zero(&Level::imax(u(), Level::zero())));
  }

  #[test]
  fn imax_with_succ_right_is_max() {
    let l = Level::imax(u(), Level::one());
    assert!(is_equivalent(&l, &Level::max(u(), Level::one())));
    assert!(!is_zero(&l));
  }

  #[test]
  fn imax_with_param_right_stays() {
    let l = Level::imax(u(), v());
    assert!(!is_equivalent(&l, &Level::max(u(), v())));
    assert!(!is_zero(&l));
  }

  #[test]
  fn closed_levels_are_subsumed() {
    let l = Level::max(Level::one(), Level::succ(u()));
    assert!(is_equivalent(&l, &Level::succ(u())));
    let r = Level::max(Level::succ(Level::one()), u());
    assert_eq!(to_offset(&normalize(&r)).1, 0);
  }

  #[test]
  fn normalize_is_idempotent() {
    let l = Level::max(
      Level::imax(u(), Level::succ(v())),
      Level::succ(Level::zero()),
    );
    let once = normalize(&l);
    assert_eq!(normalize(&once), once);
  }

  #[test]
  fn subst_replaces_params() {
    let l = Level::succ(u());
    let r = subst_level(&l, &[Name::from("u")], &[Level::zero()]);
    assert_eq!(r, Level::one());
    let untouched = subst_level(&v(), &[Name::from("u")], &[Level::zero()]);
    assert_eq!(untouched, v());
  }
}
