//! Fresh-name supply and deterministic auxiliary names.

use rustc_hash::FxHashSet;

use crate::env::{Env, Name};

/// Root component reserved for internal names.
pub const FRESH_PREFIX: &str = "_fresh";

/// Size of the range handed to each worker by [`FreshNameSupply::split`].
const PARTITION_SIZE: u64 = 1 << 32;

/// Source of internal names `_fresh.<k>`, distinct from every user or
/// environment name. Each supply owns the half-open range `[next, end)`;
/// supplies obtained by `split` own disjoint ranges, so they can be used
/// from different threads without coordination.
#[derive(Debug)]
pub struct FreshNameSupply {
  prefix: Name,
  next: u64,
  end: u64,
  issued: u64,
}

impl FreshNameSupply {
  pub fn new() -> Self {
    FreshNameSupply {
      prefix: Name::from(FRESH_PREFIX),
      next: 0,
      end: u64::MAX,
      issued: 0,
    }
  }

  pub fn next_name(&mut self) -> Name {
    debug_assert!(self.next < self.end, "fresh-name range exhausted");
    let n = Name::num(self.prefix.clone(), self.next);
    self.next += 1;
    self.issued += 1;
    n
  }

  /// Carve `n` disjoint ranges off the front of this supply.
  pub fn split(&mut self, n: usize) -> Vec<FreshNameSupply> {
    let mut parts = Vec::with_capacity(n);
    for _ in 0..n {
      let start = self.next;
      let end = start.saturating_add(PARTITION_SIZE).min(self.end);
      self.next = end;
      parts.push(FreshNameSupply {
        prefix: self.prefix.clone(),
        next: start,
        end,
        issued: 0,
      });
    }
    parts
  }

  /// Fold the usage of a worker's partition back into this supply.
  pub fn absorb(&mut self, part: FreshNameSupply) {
    self.issued += part.shutdown();
  }

  pub fn issued(&self) -> u64 {
    self.issued
  }

  /// Release the supply, returning how many names it issued.
  pub fn shutdown(self) -> u64 {
    tracing::trace!(issued = self.issued, "fresh-name supply shut down");
    self.issued
  }
}

impl Default for FreshNameSupply {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
pub(crate) fn is_fresh(name: &Name) -> bool {
  name.root() == Name::from(FRESH_PREFIX)
}

/// `<base>.<suffix>_<k>` for the next `k` whose name is neither in `env`
/// nor in `taken`. `counter` holds the last `k` handed out.
pub fn aux_name(
  env: &Env,
  taken: &FxHashSet<Name>,
  base: &Name,
  suffix: &str,
  counter: &mut u64,
) -> Name {
  loop {
    *counter += 1;
    let candidate = base.append_str(&format!("{suffix}_{counter}"));
    if !env.contains(&candidate) && !taken.contains(&candidate) {
      return candidate;
    }
  }
}
