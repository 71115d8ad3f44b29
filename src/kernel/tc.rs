use rustc_hash::FxHashMap;

use crate::env::*;
use crate::names::FreshNameSupply;
use crate::FxIndexMap;

use super::def_eq::def_eq;
use super::error::{TcError, TcResult};
use super::level;
use super::whnf::*;

/// A local introduced when entering a binder.
#[derive(Debug, Clone)]
pub struct LocalDecl {
  pub user_name: Name,
  pub ty: Expr,
  pub bi: BinderInfo,
}

/// Type inference and definitional equality over a read-only environment.
///
/// Locals are free variables named from the fresh-name supply; their
/// declarations are kept in creation order, which callers rely on when
/// abstracting over a set of locals.
pub struct TypeChecker<'a> {
  env: &'a Env,
  names: &'a mut FreshNameSupply,
  aux: FxHashMap<Name, ConstantInfo>,
  lctx: FxIndexMap<Name, LocalDecl>,
  whnf_cache: FxHashMap<Expr, Expr>,
  whnf_core_cache: FxHashMap<Expr, Expr>,
  infer_cache: FxHashMap<Expr, Expr>,
}

impl<'a> TypeChecker<'a> {
  pub fn new(env: &'a Env, names: &'a mut FreshNameSupply) -> Self {
    TypeChecker {
      env,
      names,
      aux: FxHashMap::default(),
      lctx: FxIndexMap::default(),
      whnf_cache: FxHashMap::default(),
      whnf_core_cache: FxHashMap::default(),
      infer_cache: FxHashMap::default(),
    }
  }

  pub fn env(&self) -> &'a Env {
    self.env
  }

  /// Looks through auxiliary axioms before the environment.
  pub fn get_const(&self, name: &Name) -> Option<&ConstantInfo> {
    self.aux.get(name).or_else(|| self.env.get(name))
  }

  /// Declare `name : ty` for the lifetime of this checker, without a value.
  /// Used to check procedures that call each other before they exist.
  pub fn add_aux_axiom(&mut self, name: Name, level_params: Vec<Name>, ty: Expr) {
    let cnst = ConstantVal { name: name.clone(), level_params, typ: ty };
    self
      .aux
      .insert(name, ConstantInfo::AxiomInfo(AxiomVal { cnst, is_unsafe: false }));
  }

  // ==========================================================================
  // Local context
  // ==========================================================================

  pub fn mk_local(&mut self, user_name: &Name, ty: Expr, bi: BinderInfo) -> Expr {
    let name = self.names.next_name();
    self
      .lctx
      .insert(name.clone(), LocalDecl { user_name: user_name.clone(), ty, bi });
    Expr::fvar(name)
  }

  pub fn local_decl(&self, name: &Name) -> Option<&LocalDecl> {
    self.lctx.get(name)
  }

  /// Creation index of a local, usable to order sets of locals.
  pub fn local_index(&self, name: &Name) -> Option<usize> {
    self.lctx.get_index_of(name)
  }

  /// Enter a binder: a fresh local for the bound variable and the body
  /// instantiated with it.
  pub fn open_binder(&mut self, e: &Expr) -> Option<(Expr, Expr)> {
    match e.as_data() {
      ExprData::Lam(n, t, b, bi) | ExprData::ForallE(n, t, b, bi) => {
        let local = self.mk_local(n, t.clone(), *bi);
        let body = inst(b, std::slice::from_ref(&local));
        Some((local, body))
      },
      _ => None,
    }
  }

  pub fn mk_lambda(&self, locals: &[Expr], body: &Expr) -> TcResult<Expr> {
    self.mk_binding(locals, body, true)
  }

  pub fn mk_pi(&self, locals: &[Expr], body: &Expr) -> TcResult<Expr> {
    self.mk_binding(locals, body, false)
  }

  fn mk_binding(&self, locals: &[Expr], body: &Expr, lam: bool) -> TcResult<Expr> {
    let mut result = abstr(body, locals);
    for i in (0..locals.len()).rev() {
      let decl = match locals[i].as_data() {
        ExprData::Fvar(n) => self
          .lctx
          .get(n)
          .ok_or_else(|| TcError::UnknownLocal { name: n.clone() })?,
        _ => {
          return Err(TcError::KernelException {
            msg: format!("cannot abstract over non-local {}", locals[i]),
          });
        },
      };
      let ty = abstr(&decl.ty, &locals[..i]);
      result = if lam {
        Expr::lam(decl.user_name.clone(), ty, result, decl.bi)
      } else {
        Expr::all(decl.user_name.clone(), ty, result, decl.bi)
      };
    }
    Ok(result)
  }

  // ==========================================================================
  // WHNF with caching
  // ==========================================================================

  /// Returns `e` itself when it is already in weak head normal form.
  pub fn whnf(&mut self, e: &Expr) -> TcResult<Expr> {
    if let Some(cached) = self.whnf_cache.get(e) {
      return Ok(cached.clone());
    }
    let r = whnf(e, self.env)?;
    let r = if r == *e { e.clone() } else { r };
    self.whnf_cache.insert(e.clone(), r.clone());
    Ok(r)
  }

  pub fn whnf_core(&mut self, e: &Expr) -> TcResult<Expr> {
    if let Some(cached) = self.whnf_core_cache.get(e) {
      return Ok(cached.clone());
    }
    let r = whnf_core(e, self.env)?;
    self.whnf_core_cache.insert(e.clone(), r.clone());
    Ok(r)
  }

  pub fn ensure_sort(&mut self, e: &Expr) -> TcResult<Level> {
    if let ExprData::Sort(l) = e.as_data() {
      return Ok(l.clone());
    }
    let whnfd = self.whnf(e)?;
    match whnfd.as_data() {
      ExprData::Sort(l) => Ok(l.clone()),
      _ => Err(TcError::TypeExpected { expr: e.clone(), inferred: whnfd }),
    }
  }

  pub fn ensure_pi(&mut self, e: &Expr) -> TcResult<Expr> {
    if let ExprData::ForallE(..) = e.as_data() {
      return Ok(e.clone());
    }
    let whnfd = self.whnf(e)?;
    match whnfd.as_data() {
      ExprData::ForallE(..) => Ok(whnfd),
      _ => Err(TcError::FunctionExpected { expr: e.clone(), inferred: whnfd }),
    }
  }

  pub fn infer_sort_of(&mut self, e: &Expr) -> TcResult<Level> {
    let ty = self.infer(e)?;
    self.ensure_sort(&ty)
  }

  // ==========================================================================
  // Type inference
  // ==========================================================================

  pub fn infer(&mut self, e: &Expr) -> TcResult<Expr> {
    if let Some(cached) = self.infer_cache.get(e) {
      return Ok(cached.clone());
    }
    let result = self.infer_core(e)?;
    self.infer_cache.insert(e.clone(), result.clone());
    Ok(result)
  }

  fn infer_core(&mut self, e: &Expr) -> TcResult<Expr> {
    match e.as_data() {
      ExprData::Mdata(_, inner) => self.infer(inner),
      ExprData::LetE(_, typ, val, body, _) => {
        self.infer_sort_of(typ)?;
        let val_ty = self.infer(val)?;
        self.assert_def_eq(&val_ty, typ)?;
        self.infer(&inst(body, std::slice::from_ref(val)))
      },
      ExprData::Sort(l) => Ok(Expr::sort(Level::succ(l.clone()))),
      ExprData::Const(name, levels) => self.infer_const(name, levels),
      ExprData::App(..) => self.infer_app(e),
      ExprData::Lam(..) => self.infer_lambda(e),
      ExprData::ForallE(..) => self.infer_pi(e),
      ExprData::Lit(Literal::NatVal(_)) => Ok(Expr::cnst(Name::from("Nat"), vec![])),
      ExprData::Lit(Literal::StrVal(_)) => {
        Ok(Expr::cnst(Name::from("String"), vec![]))
      },
      ExprData::Proj(type_name, idx, structure) => {
        self.infer_proj(type_name, *idx, structure)
      },
      ExprData::Fvar(name) => match self.lctx.get(name) {
        Some(decl) => Ok(decl.ty.clone()),
        None => Err(TcError::UnknownLocal { name: name.clone() }),
      },
      ExprData::Bvar(idx) => Err(TcError::FreeBoundVariable { idx: *idx }),
      ExprData::Mvar(..) => Err(TcError::KernelException {
        msg: "cannot infer type of metavariable".into(),
      }),
    }
  }

  fn infer_const(&mut self, name: &Name, levels: &[Level]) -> TcResult<Expr> {
    let ci = self
      .get_const(name)
      .ok_or_else(|| TcError::UnknownConst { name: name.clone() })?;
    let params = ci.get_level_params();
    if levels.len() != params.len() {
      return Err(TcError::LevelCountMismatch {
        name: name.clone(),
        expected: params.len(),
        got: levels.len(),
      });
    }
    Ok(subst_expr_levels(ci.get_type(), params, levels))
  }

  fn infer_app(&mut self, e: &Expr) -> TcResult<Expr> {
    let (fun, args) = unfold_apps(e);
    let mut fun_ty = self.infer(&fun)?;
    for arg in &args {
      let pi = self.ensure_pi(&fun_ty)?;
      match pi.as_data() {
        ExprData::ForallE(_, binder_type, body, _) => {
          let arg_ty = self.infer(arg)?;
          self.assert_def_eq(&arg_ty, binder_type)?;
          fun_ty = inst(body, std::slice::from_ref(arg));
        },
        _ => {
          return Err(TcError::FunctionExpected { expr: fun.clone(), inferred: pi });
        },
      }
    }
    Ok(fun_ty)
  }

  fn infer_lambda(&mut self, e: &Expr) -> TcResult<Expr> {
    let mut cursor = e.clone();
    let mut locals = Vec::new();
    while let ExprData::Lam(name, binder_type, body, bi) = cursor.as_data() {
      let binder_type = inst(binder_type, &locals);
      self.infer_sort_of(&binder_type)?;
      let local = self.mk_local(name, binder_type, *bi);
      locals.push(local);
      cursor = body.clone();
    }
    let body_ty = self.infer(&inst(&cursor, &locals))?;
    self.mk_pi(&locals, &body_ty)
  }

  fn infer_pi(&mut self, e: &Expr) -> TcResult<Expr> {
    let mut cursor = e.clone();
    let mut locals = Vec::new();
    let mut universes = Vec::new();
    while let ExprData::ForallE(name, binder_type, body, bi) = cursor.as_data() {
      let binder_type = inst(binder_type, &locals);
      universes.push(self.infer_sort_of(&binder_type)?);
      let local = self.mk_local(name, binder_type, *bi);
      locals.push(local);
      cursor = body.clone();
    }
    let mut result_level = self.infer_sort_of(&inst(&cursor, &locals))?;
    for univ in universes.into_iter().rev() {
      result_level = Level::imax(univ, result_level);
    }
    Ok(Expr::sort(result_level))
  }

  fn infer_proj(&mut self, type_name: &Name, idx: u64, structure: &Expr) -> TcResult<Expr> {
    let structure_ty = self.infer(structure)?;
    let structure_ty = self.whnf(&structure_ty)?;
    let (head, params) = unfold_apps(&structure_ty);
    let levels = match head.as_data() {
      ExprData::Const(name, levels) if name == type_name => levels.clone(),
      _ => {
        return Err(TcError::KernelException {
          msg: format!("projection on {structure_ty}, expected {type_name}"),
        });
      },
    };
    let ctor_name = self
      .env
      .get_inductive(type_name)
      .and_then(|ind| ind.ctors.first())
      .ok_or_else(|| TcError::UnknownConst { name: type_name.clone() })?;
    let ctor = self
      .env
      .get(ctor_name)
      .ok_or_else(|| TcError::UnknownConst { name: ctor_name.clone() })?;
    let mut ctor_ty =
      subst_expr_levels(ctor.get_type(), ctor.get_level_params(), &levels);

    for param in &params {
      let pi = self.ensure_pi(&ctor_ty)?;
      if let ExprData::ForallE(_, _, body, _) = pi.as_data() {
        ctor_ty = inst(body, std::slice::from_ref(param));
      }
    }
    for i in 0..idx {
      let pi = self.ensure_pi(&ctor_ty)?;
      if let ExprData::ForallE(_, _, body, _) = pi.as_data() {
        let field = Expr::proj(type_name.clone(), i, structure.clone());
        ctor_ty = inst(body, &[field]);
      }
    }
    let pi = self.ensure_pi(&ctor_ty)?;
    match pi.as_data() {
      ExprData::ForallE(_, binder_type, _, _) => Ok(binder_type.clone()),
      _ => Err(TcError::KernelException {
        msg: format!("field {idx} out of range for {type_name}"),
      }),
    }
  }

  // ==========================================================================
  // Checking
  // ==========================================================================

  pub fn is_def_eq(&mut self, x: &Expr, y: &Expr) -> TcResult<bool> {
    def_eq(x, y, self)
  }

  pub fn assert_def_eq(&mut self, x: &Expr, y: &Expr) -> TcResult<()> {
    if self.is_def_eq(x, y)? {
      Ok(())
    } else {
      Err(TcError::DefEqFailure { lhs: x.clone(), rhs: y.clone() })
    }
  }

  /// Infer the type of `term` and require it to match `expected`.
  pub fn check(&mut self, term: &Expr, expected: &Expr) -> TcResult<()> {
    let ty = self.infer(term)?;
    self.assert_def_eq(&ty, expected)
  }

  /// Whether the type `ty` is a proposition.
  pub fn is_prop(&mut self, ty: &Expr) -> TcResult<bool> {
    let sort = self.infer(ty)?;
    let sort = self.whnf(&sort)?;
    Ok(matches!(sort.as_data(), ExprData::Sort(l) if level::is_zero(l)))
  }

  /// Whether `e` is a proof, i.e. its type is a proposition.
  pub fn is_proof(&mut self, e: &Expr) -> TcResult<bool> {
    let ty = self.infer(e)?;
    self.is_prop(&ty)
  }
}
