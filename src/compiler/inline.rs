use crate::env::*;
use crate::kernel::whnf::{foldl_apps, head_beta, replace, subst_expr_levels, unfold_apps};

use super::util::{size_bounded, uses_const};

/// Inline references to `@[inline]` definitions and to small,
/// non-recursive ones. Definitions compiled for the VM, recursors,
/// projections and opaque constants are kept as calls.
pub fn inline_simple_definitions(e: &Expr, env: &Env, max_size: usize) -> Expr {
  Inliner { env, max_size, active: Vec::new() }.run(e)
}

struct Inliner<'e> {
  env: &'e Env,
  max_size: usize,
  /// Definitions currently being expanded.
  active: Vec<Name>,
}

impl Inliner<'_> {
  fn run(&mut self, e: &Expr) -> Expr {
    replace(e, |e, _| {
      let head = e.get_app_fn();
      let ExprData::Const(name, levels) = head.as_data() else {
        return None;
      };
      let value = self.candidate(name, levels)?;
      let (_, args) = unfold_apps(e);
      self.active.push(name.clone());
      let r = self.run(&head_beta(&foldl_apps(value, args)));
      self.active.pop();
      Some(r.copy_pos(e))
    })
  }

  fn candidate(&self, name: &Name, levels: &[Level]) -> Option<Expr> {
    if self.active.contains(name) {
      return None;
    }
    let ConstantInfo::DefnInfo(d) = self.env.get(name)? else {
      return None;
    };
    let env = self.env;
    if d.hints == ReducibilityHints::Opaque
      || env.is_vm_function(name)
      || env.is_aux_recursor(name)
      || env.is_user_recursor(name)
      || env.is_projection(name)
      || env.is_no_confusion(name)
      || levels.len() != d.cnst.level_params.len()
      || uses_const(&d.value, name)
    {
      return None;
    }
    if !env.has_inline_attribute(name) && !is_simple(&d.value, self.max_size) {
      return None;
    }
    Some(subst_expr_levels(&d.value, &d.cnst.level_params, levels))
  }
}

fn is_atom(e: &Expr) -> bool {
  matches!(
    e.as_data(),
    ExprData::Bvar(..)
      | ExprData::Fvar(..)
      | ExprData::Const(..)
      | ExprData::Lit(..)
      | ExprData::Sort(..)
  )
}

/// An atom or an atom applied to atoms, under leading lambdas.
fn is_simple(value: &Expr, max_size: usize) -> bool {
  if size_bounded(value, max_size) > max_size {
    return false;
  }
  let mut body = value;
  while let ExprData::Lam(_, _, b, _) = body.as_data() {
    body = b;
  }
  let (head, args) = unfold_apps(body);
  is_atom(&head) && args.iter().all(is_atom)
}
