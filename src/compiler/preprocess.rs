//! The pipeline driver.
//!
//! A declaration body goes through the typed passes one after the other,
//! each result re-checked against the declaration type when self-checking
//! is on. Recursor elimination splits it into procedures, and the untyped
//! passes then rewrite that list.

use rayon::prelude::*;

use crate::env::*;
use crate::kernel::error::TcError;
use crate::kernel::tc::TypeChecker;
use crate::names::FreshNameSupply;

use super::comp_irrelevant::mark_comp_irrelevant;
use super::config::CompilerConfig;
use super::elim_recursors::elim_recursors;
use super::erase_irrelevant::erase_irrelevant;
use super::error::{CompileError, ErrorKind, PassResult};
use super::eta_expand::eta_expand;
use super::eval_expr::fix_eval_expr;
use super::expand_aux::expand_aux;
use super::inline::inline_simple_definitions;
use super::lambda_lifting::lambda_lifting;
use super::nat_value::find_nat_values;
use super::procedure::{Declaration, Procedure};
use super::quote::{ExprQuoter, Quoter};
use super::reduce_arity::reduce_arity;
use super::simp_inductive::simp_inductive;
use super::simp_proj::simp_projections;
use super::trace::Pass;

/// Lowers declarations of one environment, drawing internal names from
/// its own supply.
pub struct Preprocessor<'e> {
  env: &'e Env,
  supply: FreshNameSupply,
  config: CompilerConfig,
  quoter: Box<dyn Quoter>,
}

impl<'e> Preprocessor<'e> {
  pub fn new(env: &'e Env, supply: FreshNameSupply, config: CompilerConfig) -> Self {
    Preprocessor { env, supply, config, quoter: Box::new(ExprQuoter) }
  }

  pub fn with_quoter(mut self, quoter: Box<dyn Quoter>) -> Self {
    self.quoter = quoter;
    self
  }

  pub fn config(&self) -> &CompilerConfig {
    &self.config
  }

  /// Hand back the fresh-name supply.
  pub fn finish(self) -> FreshNameSupply {
    self.supply
  }

  /// Lower `decl`. On failure nothing of the declaration is returned.
  pub fn run(&mut self, decl: &Declaration) -> Result<Vec<Procedure>, CompileError> {
    let _span = tracing::debug_span!("preprocess", decl = %decl.name).entered();
    self.lower(decl).map_err(|kind| {
      tracing::debug!(decl = %decl.name, error = %kind, "compilation failed");
      CompileError { decl: decl.name.clone(), kind }
    })
  }

  fn lower(&mut self, decl: &Declaration) -> PassResult<Vec<Procedure>> {
    let Preprocessor { env, supply, config, quoter } = self;
    let env: &Env = *env;
    let config: &CompilerConfig = config;
    let trace = &config.trace;
    let mut tc = TypeChecker::new(env, supply);

    trace.term(Pass::Input, &decl.value);
    let e = fix_eval_expr(&decl.value, quoter.as_ref())?;
    checked(&mut tc, config, Pass::EvalExpr, &e, &decl.typ)?;
    let e = inline_simple_definitions(&e, env, config.inline_max_size);
    checked(&mut tc, config, Pass::Inline, &e, &decl.typ)?;
    let e = expand_aux(&mut tc, &e, config.whnf_pred_limit)?;
    checked(&mut tc, config, Pass::ExpandAux, &e, &decl.typ)?;
    let e = mark_comp_irrelevant(&mut tc, &e)?;
    checked(&mut tc, config, Pass::CompIrrelevant, &e, &decl.typ)?;
    let e = find_nat_values(&e);
    checked(&mut tc, config, Pass::NatValue, &e, &decl.typ)?;
    let e = eta_expand(&mut tc, &e)?;
    checked(&mut tc, config, Pass::EtaExpansion, &e, &decl.typ)?;
    let e = simp_projections(&mut tc, &e)?;
    checked(&mut tc, config, Pass::SimplifyProj, &e, &decl.typ)?;

    let (code, aux) = elim_recursors(&mut tc, decl, &e)?;
    for a in &aux {
      tc.add_aux_axiom(a.name.clone(), decl.level_params.clone(), a.typ.clone());
    }
    if config.self_check {
      for a in &aux {
        self_check(&mut tc, Pass::ElimRecursors, &a.code, &a.typ)?;
      }
      self_check(&mut tc, Pass::ElimRecursors, &code, &decl.typ)?;
    }
    let mut procs: Vec<Procedure> =
      aux.into_iter().map(|a| Procedure::new(a.name, a.pos, a.code)).collect();
    let pos = env.decl_pos(&decl.name).or_else(|| decl.value.pos());
    procs.push(Procedure::new(decl.name.clone(), pos, code));
    trace.procs(Pass::ElimRecursors, &procs);

    for p in &mut procs {
      p.code = erase_irrelevant(env, &p.code);
    }
    trace.procs(Pass::EraseIrrelevant, &procs);
    reduce_arity(&mut procs);
    trace.procs(Pass::ReduceArity, &procs);
    let mut procs = lambda_lifting(env, &decl.name, procs);
    trace.procs(Pass::LambdaLifting, &procs);
    for p in &mut procs {
      p.code = simp_inductive(env, &p.code);
    }
    trace.procs(Pass::SimplifyInductive, &procs);
    trace.procs(Pass::Preprocess, &procs);
    Ok(procs)
  }
}

fn self_check(tc: &mut TypeChecker<'_>, pass: Pass, e: &Expr, ty: &Expr) -> PassResult<()> {
  tc.check(e, ty).map_err(|source| check_failure(pass, source))
}

/// A check that ran out of reduction budget says nothing about the pass.
fn check_failure(pass: Pass, source: TcError) -> ErrorKind {
  match source {
    TcError::ReductionLimit { .. } => ErrorKind::OracleFailure(source),
    source => ErrorKind::SelfCheckFailure { pass, source },
  }
}

/// Trace the output of a typed pass and re-check it when enabled.
fn checked(
  tc: &mut TypeChecker<'_>,
  config: &CompilerConfig,
  pass: Pass,
  e: &Expr,
  ty: &Expr,
) -> PassResult<()> {
  config.trace.term(pass, e);
  if config.self_check {
    self_check(tc, pass, e, ty)?;
  }
  Ok(())
}

/// Lower one declaration with a private name supply.
pub fn compile_declaration(
  env: &Env,
  decl: &Declaration,
  config: CompilerConfig,
) -> Result<Vec<Procedure>, CompileError> {
  Preprocessor::new(env, FreshNameSupply::new(), config).run(decl)
}

/// Lower independent declarations in parallel. Each one gets a disjoint
/// slice of `supply`; results come back in input order.
pub fn compile_batch(
  env: &Env,
  decls: &[Declaration],
  supply: &mut FreshNameSupply,
  config: &CompilerConfig,
) -> Vec<Result<Vec<Procedure>, CompileError>> {
  let parts = supply.split(decls.len());
  let outcomes: Vec<_> = decls
    .par_iter()
    .zip(parts)
    .map(|(decl, part)| {
      let mut pp = Preprocessor::new(env, part, config.clone());
      let result = pp.run(decl);
      (result, pp.finish())
    })
    .collect();
  outcomes
    .into_iter()
    .map(|(result, part)| {
      supply.absorb(part);
      result
    })
    .collect()
}
