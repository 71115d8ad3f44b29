use crate::env::*;
use crate::kernel::tc::TypeChecker;
use crate::kernel::whnf::{foldl_apps, unfold_apps};

use super::error::PassResult;
use super::visitor::{StepVisitor, walk_app, walk_proj};

/// Reduce projections whose structure argument is a constructor
/// application.
pub fn simp_projections(tc: &mut TypeChecker<'_>, e: &Expr) -> PassResult<Expr> {
  SimpProj { tc }.visit(e)
}

struct SimpProj<'t, 'a> {
  tc: &'t mut TypeChecker<'a>,
}

impl SimpProj<'_, '_> {
  /// Field `idx` of `s` when `s` is a saturated application of `ctor`.
  fn field_of(&self, s: &Expr, ctor: Option<&Name>, idx: usize) -> Option<Expr> {
    let env = self.tc.env();
    let (head, args) = unfold_apps(s);
    let name = head.const_name()?;
    if ctor.is_some_and(|c| c != name) {
      return None;
    }
    let info = env.get_ctor(name)?;
    if args.len() != info.num_params + info.num_fields || idx >= info.num_fields {
      return None;
    }
    args.get(info.num_params + idx).cloned()
  }
}

impl<'a> StepVisitor<'a> for SimpProj<'_, 'a> {
  fn tc(&mut self) -> &mut TypeChecker<'a> {
    &mut *self.tc
  }

  fn visit_proj(&mut self, e: &Expr) -> PassResult<Expr> {
    let e = walk_proj(self, e)?;
    if let ExprData::Proj(_, idx, s) = e.as_data() {
      if let Some(field) = self.field_of(s, None, *idx as usize) {
        return Ok(field);
      }
    }
    Ok(e)
  }

  fn visit_app(&mut self, e: &Expr) -> PassResult<Expr> {
    let e = walk_app(self, e)?;
    let (head, args) = unfold_apps(&e);
    let Some(proj) = head.const_name().and_then(|n| self.tc.env().get_projection(n)) else {
      return Ok(e);
    };
    let Some(s) = args.get(proj.num_params) else {
      return Ok(e);
    };
    match self.field_of(s, Some(&proj.ctor), proj.idx) {
      Some(field) => {
        let rest = args[proj.num_params + 1..].iter().cloned();
        Ok(foldl_apps(field, rest).copy_pos(&e))
      },
      None => Ok(e),
    }
  }
}
