use crate::env::*;
use crate::kernel::tc::TypeChecker;
use crate::kernel::whnf::{foldl_apps, head_beta, inst, unfold_apps};

use super::error::PassResult;
use super::util::{CasesOnInfo, is_irrelevant, lambda_arity};
use super::visitor::StepVisitor;

/// Saturate constructor, recursor, `casesOn` and projection applications,
/// and give every `casesOn` minor premise one lambda per constructor field.
pub fn eta_expand(tc: &mut TypeChecker<'_>, e: &Expr) -> PassResult<Expr> {
  EtaExpand { tc }.visit(e)
}

struct EtaExpand<'t, 'a> {
  tc: &'t mut TypeChecker<'a>,
}

impl<'a> EtaExpand<'_, 'a> {
  fn env(&self) -> &'a Env {
    self.tc.env()
  }

  /// Number of arguments a saturated application of `name` takes.
  fn arity(&self, name: &Name) -> Option<usize> {
    let env = self.env();
    if let Some(info) = CasesOnInfo::new(env, name) {
      return Some(info.arity());
    }
    if let Some(proj) = env.get_projection(name) {
      return Some(proj.num_params + 1);
    }
    match env.get(name)? {
      ConstantInfo::CtorInfo(c) => Some(c.num_params + c.num_fields),
      ConstantInfo::RecInfo(r) => Some(r.major_idx() + 1),
      _ => None,
    }
  }

  /// Fresh locals for the next `n` binders of the type `ty`.
  fn open_pis(&mut self, ty: &Expr, n: usize) -> PassResult<Vec<Expr>> {
    let mut locals = Vec::with_capacity(n);
    let mut cur = ty.clone();
    for _ in 0..n {
      let pi = self.tc.ensure_pi(&cur)?;
      let ExprData::ForallE(name, dom, body, bi) = pi.as_data() else {
        break;
      };
      let local = self.tc.mk_local(name, dom.clone(), *bi);
      cur = inst(body, std::slice::from_ref(&local));
      locals.push(local);
    }
    Ok(locals)
  }

  fn expand_minor(&mut self, minor: &Expr, num_fields: usize) -> PassResult<Expr> {
    if is_irrelevant(minor) || lambda_arity(minor) >= num_fields {
      return Ok(minor.clone());
    }
    let ty = self.tc.infer(minor)?;
    let locals = self.open_pis(&ty, num_fields)?;
    let body = head_beta(&foldl_apps(minor.clone(), locals.iter().cloned()));
    Ok(self.tc.mk_lambda(&locals, &body)?.copy_pos(minor))
  }

  fn ctor_fields(&self, info: &CasesOnInfo) -> Vec<usize> {
    let env = self.env();
    env
      .get_inductive(&info.induct)
      .map(|ind| {
        ind
          .ctors
          .iter()
          .map(|c| env.get_ctor(c).map_or(0, |c| c.num_fields))
          .collect()
      })
      .unwrap_or_default()
  }

  fn expand(&mut self, e: &Expr, head: &Expr, mut args: Vec<Expr>, changed: bool) -> PassResult<Expr> {
    let Some(name) = head.const_name() else {
      return Ok(if changed { foldl_apps(head.clone(), args).copy_pos(e) } else { e.clone() });
    };
    let arity = self.arity(name).unwrap_or(0);
    let partial = foldl_apps(head.clone(), args.iter().cloned());
    let locals = if args.len() < arity {
      let ty = self.tc.infer(&partial)?;
      self.open_pis(&ty, arity - args.len())?
    } else {
      Vec::new()
    };
    args.extend(locals.iter().cloned());

    let mut minors_changed = false;
    if let Some(info) = CasesOnInfo::new(self.env(), name) {
      let fields = self.ctor_fields(&info);
      for (i, idx) in info.minors().enumerate() {
        let Some(minor) = args.get(idx).cloned() else {
          break;
        };
        let expanded = self.expand_minor(&minor, fields.get(i).copied().unwrap_or(0))?;
        minors_changed |= !Expr::ptr_eq(&minor, &expanded);
        args[idx] = expanded;
      }
    }

    if locals.is_empty() && !minors_changed && !changed {
      return Ok(e.clone());
    }
    let body = foldl_apps(head.clone(), args);
    if locals.is_empty() {
      return Ok(body.copy_pos(e));
    }
    Ok(self.tc.mk_lambda(&locals, &body)?.copy_pos(e))
  }
}

impl<'a> StepVisitor<'a> for EtaExpand<'_, 'a> {
  fn tc(&mut self) -> &mut TypeChecker<'a> {
    &mut *self.tc
  }

  fn visit_app(&mut self, e: &Expr) -> PassResult<Expr> {
    let (head, args) = unfold_apps(e);
    let new_head = match head.as_data() {
      ExprData::Const(..) => head.clone(),
      _ => self.visit(&head)?,
    };
    let mut changed = !Expr::ptr_eq(&head, &new_head);
    let mut new_args = Vec::with_capacity(args.len());
    for a in &args {
      let na = self.visit(a)?;
      changed |= !Expr::ptr_eq(a, &na);
      new_args.push(na);
    }
    self.expand(e, &new_head, new_args, changed)
  }

  fn visit_constant(&mut self, e: &Expr) -> PassResult<Expr> {
    self.expand(e, e, Vec::new(), false)
  }
}
