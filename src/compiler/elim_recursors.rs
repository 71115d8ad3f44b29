//! Recursor elimination.
//!
//! Every remaining `T.rec` application becomes a call to a fresh auxiliary
//! procedure defined by case analysis on the major premise. The procedure
//! abstracts over the locals the parameters, motive and minor premises
//! mention, and calls itself on recursive fields to build the induction
//! hypotheses the minor premises expect.

use rustc_hash::FxHashSet;

use crate::FxIndexSet;
use crate::env::*;
use crate::kernel::tc::TypeChecker;
use crate::kernel::whnf::{collect_fvars, foldl_apps, head_beta, inst, subst_expr_levels, unfold_apps};
use crate::names::aux_name;

use super::error::{ErrorKind, PassResult};
use super::procedure::Declaration;
use super::util::strip_irrelevant;
use super::visitor::{StepVisitor, walk_app};

/// A procedure produced by recursor elimination, with the type used to
/// self-check it and its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxProcedure {
  pub name: Name,
  pub typ: Expr,
  pub code: Expr,
  pub pos: Option<Pos>,
}

/// Returns the rewritten body together with the auxiliary procedures it
/// calls, innermost first.
pub fn elim_recursors(
  tc: &mut TypeChecker<'_>,
  decl: &Declaration,
  e: &Expr,
) -> PassResult<(Expr, Vec<AuxProcedure>)> {
  let mut pass = ElimRecursors {
    tc,
    base: decl.name.clone(),
    levels: decl.level_params.iter().cloned().map(Level::param).collect(),
    counter: 0,
    taken: FxHashSet::default(),
    aux: Vec::new(),
  };
  let code = pass.visit(e)?;
  Ok((code, pass.aux))
}

struct ElimRecursors<'t, 'a> {
  tc: &'t mut TypeChecker<'a>,
  base: Name,
  levels: Vec<Level>,
  counter: u64,
  taken: FxHashSet<Name>,
  aux: Vec<AuxProcedure>,
}

fn unsupported(rec: &Name, reason: &str) -> ErrorKind {
  ErrorKind::UnsupportedRecursor { rec: rec.clone(), reason: reason.to_owned() }
}

impl<'a> ElimRecursors<'_, 'a> {
  fn env(&self) -> &'a Env {
    self.tc.env()
  }

  /// Instantiate the leading binders of the Pi type `ty` with `args`.
  fn instantiate_pi(&mut self, ty: &Expr, args: &[Expr]) -> PassResult<Expr> {
    let mut cur = ty.clone();
    for a in args {
      let pi = self.tc.ensure_pi(&cur)?;
      if let ExprData::ForallE(_, _, body, _) = pi.as_data() {
        cur = inst(body, std::slice::from_ref(a));
      }
    }
    Ok(cur)
  }

  /// Open up to `max` binders of `ty` (all of them when `max` is `None`),
  /// returning the locals and the remaining type.
  fn open_pis(&mut self, ty: &Expr, max: Option<usize>) -> PassResult<(Vec<Expr>, Expr)> {
    let mut locals = Vec::new();
    let mut cur = ty.clone();
    while max.is_none_or(|m| locals.len() < m) {
      let whnfd = self.tc.whnf(&cur)?;
      let ExprData::ForallE(name, dom, body, bi) = whnfd.as_data() else {
        break;
      };
      let local = self.tc.mk_local(name, dom.clone(), *bi);
      cur = inst(body, std::slice::from_ref(&local));
      locals.push(local);
    }
    Ok((locals, cur))
  }

  /// Locals occurring in `terms` or in the types of such locals, in
  /// creation order.
  fn captured_locals(&self, terms: &[Expr]) -> Vec<Expr> {
    let mut found = FxIndexSet::default();
    for t in terms {
      collect_fvars(t, &mut found);
    }
    let mut i = 0;
    while let Some(name) = found.get_index(i).cloned() {
      if let Some(decl) = self.tc.local_decl(&name) {
        let ty = decl.ty.clone();
        collect_fvars(&ty, &mut found);
      }
      i += 1;
    }
    let mut names: Vec<Name> = found.into_iter().collect();
    names.sort_by_key(|n| self.tc.local_index(n));
    names.into_iter().map(Expr::fvar).collect()
  }

  fn eliminate(
    &mut self,
    e: &Expr,
    rec_name: &Name,
    levels: &[Level],
    rec: &'a RecursorVal,
    args: Vec<Expr>,
  ) -> PassResult<Expr> {
    let env = self.env();
    let induct = rec.induct();
    if rec.num_motives != 1 {
      return Err(unsupported(rec_name, "mutual and nested inductives are not supported"));
    }
    if env.is_prop_inductive(&induct) {
      if env.get_inductive(&induct).is_some_and(|ind| ind.is_rec) {
        return Err(unsupported(rec_name, "recursive propositions cannot be compiled"));
      }
      return Ok(e.clone());
    }
    if rec.num_minors == 0 {
      return Ok(e.clone());
    }
    let ind = env
      .get_inductive(&induct)
      .ok_or_else(|| unsupported(rec_name, "unknown inductive type"))?;
    let cases_on = induct.append_str("casesOn");
    if !env.is_cases_on_recursor(&cases_on) {
      return Err(unsupported(rec_name, "inductive type has no casesOn"));
    }

    let np = rec.num_params;
    let minors_start = np + 1;
    let minors_end = minors_start + rec.num_minors;
    let params = &args[..np];
    let motive = &args[np];

    let captured = self.captured_locals(&args[..minors_end]);
    let name = aux_name(env, &self.taken, &self.base, "_rec", &mut self.counter);
    self.taken.insert(name.clone());
    let aux_head = foldl_apps(Expr::cnst(name.clone(), self.levels.clone()), captured.iter().cloned());

    // Π indices (x : T params indices), motive indices x
    let rec_ty = subst_expr_levels(&rec.cnst.typ, &rec.cnst.level_params, levels);
    let mut fixed = args[..minors_end].to_vec();
    fixed[np] = strip_irrelevant(motive);
    let rest = self.instantiate_pi(&rec_ty, &fixed)?;
    let (targets, result_ty) = self.open_pis(&rest, Some(rec.num_indices + 1))?;
    let result_ty = head_beta(&result_ty);

    let ind_levels = &levels[levels.len().saturating_sub(ind.cnst.level_params.len())..];
    let mut cases_args: Vec<Expr> = params.to_vec();
    cases_args.push(motive.clone());
    cases_args.extend(targets.iter().cloned());
    for (j, ctor) in ind.ctors.iter().enumerate() {
      let minor = &args[minors_start + j];
      let new_minor = self.minor(ctor, ind_levels, params, minor, &aux_head, &induct)?;
      cases_args.push(new_minor);
    }
    let cases = foldl_apps(Expr::cnst(cases_on, levels.to_vec()), cases_args);

    let mut binders = captured;
    binders.extend(targets);
    let typ = self.tc.mk_pi(&binders, &result_ty)?;
    let code = self.tc.mk_lambda(&binders, &cases)?;
    tracing::trace!(aux = %name, rec = %rec_name, "eliminated recursor");
    self.aux.push(AuxProcedure { name, typ, code, pos: e.pos() });

    Ok(foldl_apps(aux_head, args[minors_end..].iter().cloned()).copy_pos(e))
  }

  /// `fun fields => minor fields ihs` for one constructor.
  fn minor(
    &mut self,
    ctor_name: &Name,
    ind_levels: &[Level],
    params: &[Expr],
    minor: &Expr,
    aux_head: &Expr,
    induct: &Name,
  ) -> PassResult<Expr> {
    let env = self.env();
    let ctor = env
      .get_ctor(ctor_name)
      .ok_or_else(|| unsupported(ctor_name, "unknown constructor"))?;
    let ctor_ty = subst_expr_levels(&ctor.cnst.typ, &ctor.cnst.level_params, ind_levels);
    let ctor_ty = self.instantiate_pi(&ctor_ty, params)?;
    let (fields, _) = self.open_pis(&ctor_ty, Some(ctor.num_fields))?;

    let mut ihs = Vec::new();
    for field in &fields {
      let ExprData::Fvar(field_name) = field.as_data() else {
        continue;
      };
      let Some(field_ty) = self.tc.local_decl(field_name).map(|d| d.ty.clone()) else {
        continue;
      };
      let (ys, target) = self.open_pis(&field_ty, None)?;
      let target = self.tc.whnf(&target)?;
      let (head, target_args) = unfold_apps(&target);
      if head.const_name() != Some(induct) {
        continue;
      }
      let indices = target_args[params.len().min(target_args.len())..].iter().cloned();
      let applied_field = foldl_apps(field.clone(), ys.iter().cloned());
      let call = foldl_apps(aux_head.clone(), indices.chain([applied_field]));
      ihs.push(self.tc.mk_lambda(&ys, &call)?);
    }

    let body = head_beta(&foldl_apps(minor.clone(), fields.iter().chain(&ihs).cloned()));
    Ok(self.tc.mk_lambda(&fields, &body)?)
  }
}

impl<'a> StepVisitor<'a> for ElimRecursors<'_, 'a> {
  fn tc(&mut self) -> &mut TypeChecker<'a> {
    &mut *self.tc
  }

  fn visit_app(&mut self, e: &Expr) -> PassResult<Expr> {
    let env = self.env();
    let head = e.get_app_fn();
    if let ExprData::Const(name, levels) = head.as_data() {
      if let Some(rec) = env.get_rec(name) {
        if e.get_app_num_args() > rec.major_idx() {
          let visited = walk_app(self, e)?;
          let (_, args) = unfold_apps(&visited);
          return self.eliminate(&visited, name, levels, rec, args);
        }
      }
    }
    walk_app(self, e)
  }
}
