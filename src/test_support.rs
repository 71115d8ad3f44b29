//! Hand-built prelude environment, term builders and a reference
//! evaluator for lowered procedures.

use std::rc::Rc;

use num_bigint::BigUint;
use rustc_hash::FxHashMap;

use crate::compiler::procedure::{Declaration, Procedure};
use crate::env::*;
use crate::kernel::whnf::{abstr, foldl_apps, unfold_apps};
use crate::nat::Nat;

// ============================================================================
// Builders
// ============================================================================

pub fn n(s: &str) -> Name {
  Name::from(s)
}

pub fn cnst(s: &str) -> Expr {
  Expr::cnst(n(s), vec![])
}

pub fn cnst_l(s: &str, levels: Vec<Level>) -> Expr {
  Expr::cnst(n(s), levels)
}

pub fn fv(s: &str) -> Expr {
  Expr::fvar(n(s))
}

pub fn fvar_name(e: &Expr) -> Name {
  match e.as_data() {
    ExprData::Fvar(name) => name.clone(),
    _ => panic!("not a local: {e}"),
  }
}

pub fn app(f: Expr, args: impl IntoIterator<Item = Expr>) -> Expr {
  foldl_apps(f, args)
}

/// `fun (x1 : T1) .. (xn : Tn) => body`, binding the locals `fv(xi)`.
pub fn lam(binders: &[(&str, Expr)], body: Expr) -> Expr {
  bind(binders, body, true)
}

/// `(x1 : T1) -> .. -> (xn : Tn) -> body`, binding the locals `fv(xi)`.
pub fn pi(binders: &[(&str, Expr)], body: Expr) -> Expr {
  bind(binders, body, false)
}

fn bind(binders: &[(&str, Expr)], body: Expr, is_lam: bool) -> Expr {
  let fvars: Vec<Expr> = binders.iter().map(|(x, _)| fv(x)).collect();
  let mut result = abstr(&body, &fvars);
  for i in (0..binders.len()).rev() {
    let ty = abstr(&binders[i].1, &fvars[..i]);
    let name = n(binders[i].0);
    result = if is_lam {
      Expr::lam(name, ty, result, BinderInfo::Default)
    } else {
      Expr::all(name, ty, result, BinderInfo::Default)
    };
  }
  result
}

pub fn nat() -> Expr {
  cnst("Nat")
}

pub fn nat_lit(k: u64) -> Expr {
  Expr::nat_lit(Nat::from(k))
}

pub fn u() -> Level {
  Level::param(n("u"))
}

pub fn type0() -> Expr {
  Expr::sort(Level::one())
}

pub fn decl(name: &str, typ: Expr, value: Expr) -> Declaration {
  Declaration {
    name: n(name),
    level_params: vec![],
    typ,
    value,
    is_theorem: false,
  }
}

// ============================================================================
// Prelude
// ============================================================================

fn cval(name: &str, lps: &[&str], typ: Expr) -> ConstantVal {
  ConstantVal {
    name: n(name),
    level_params: lps.iter().map(|l| n(l)).collect(),
    typ,
  }
}

pub fn add_axiom(env: &mut Env, name: &str, lps: &[&str], typ: Expr) {
  env.insert(ConstantInfo::AxiomInfo(AxiomVal {
    cnst: cval(name, lps, typ),
    is_unsafe: false,
  }));
}

pub fn add_defn(
  env: &mut Env,
  name: &str,
  lps: &[&str],
  typ: Expr,
  value: Expr,
  hints: ReducibilityHints,
) {
  env.insert(ConstantInfo::DefnInfo(DefinitionVal {
    cnst: cval(name, lps, typ),
    value,
    hints,
    safety: DefinitionSafety::Safe,
    all: vec![n(name)],
  }));
}

fn add_induct(
  env: &mut Env,
  name: &str,
  lps: &[&str],
  typ: Expr,
  num_params: usize,
  ctors: &[&str],
  is_rec: bool,
) {
  env.insert(ConstantInfo::InductInfo(InductiveVal {
    cnst: cval(name, lps, typ),
    num_params,
    num_indices: 0,
    all: vec![n(name)],
    ctors: ctors.iter().map(|c| n(c)).collect(),
    num_nested: 0,
    is_rec,
    is_unsafe: false,
    is_reflexive: false,
  }));
}

#[allow(clippy::too_many_arguments)]
fn add_ctor(
  env: &mut Env,
  name: &str,
  lps: &[&str],
  typ: Expr,
  induct: &str,
  cidx: usize,
  num_params: usize,
  num_fields: usize,
) {
  env.insert(ConstantInfo::CtorInfo(ConstructorVal {
    cnst: cval(name, lps, typ),
    induct: n(induct),
    cidx,
    num_params,
    num_fields,
    is_unsafe: false,
  }));
}

fn add_rec(
  env: &mut Env,
  name: &str,
  lps: &[&str],
  typ: Expr,
  num_params: usize,
  num_minors: usize,
  rules: Vec<RecursorRule>,
) {
  env.insert(ConstantInfo::RecInfo(RecursorVal {
    cnst: cval(name, lps, typ),
    all: vec![n(name).prefix()],
    num_params,
    num_indices: 0,
    num_motives: 1,
    num_minors,
    rules,
    k: false,
    is_unsafe: false,
  }));
}

fn rule(ctor: &str, n_fields: usize, rhs: Expr) -> RecursorRule {
  RecursorRule { ctor: n(ctor), n_fields, rhs }
}

fn motive_app(args: impl IntoIterator<Item = Expr>) -> Expr {
  app(fv("motive"), args)
}

/// Nat, Bool, True, And, a `Pair` structure, their recursors and
/// `casesOn`s, a few arithmetic primitives and the reflection constants
/// used by `tactic.eval_expr`.
pub fn prelude() -> Env {
  let mut env = Env::new();
  let su = || Expr::sort(u());
  let lu: &[&str] = &["u"];

  // Nat
  add_induct(&mut env, "Nat", &[], type0(), 0, &["Nat.zero", "Nat.succ"], true);
  add_ctor(&mut env, "Nat.zero", &[], nat(), "Nat", 0, 0, 0);
  add_ctor(&mut env, "Nat.succ", &[], pi(&[("n", nat())], nat()), "Nat", 1, 0, 1);
  let nat_motive = pi(&[("t", nat())], su());
  let zero_ty = motive_app([cnst("Nat.zero")]);
  let succ_ty = pi(
    &[("n", nat()), ("ih", motive_app([fv("n")]))],
    motive_app([app(cnst("Nat.succ"), [fv("n")])]),
  );
  let rec_binders = [
    ("motive", nat_motive.clone()),
    ("zero", zero_ty.clone()),
    ("succ", succ_ty.clone()),
  ];
  let mut rec_ty_binders = rec_binders.to_vec();
  rec_ty_binders.push(("t", nat()));
  let nat_rec = |args: Vec<Expr>| app(cnst_l("Nat.rec", vec![u()]), args);
  let mut succ_rule_binders = rec_binders.to_vec();
  succ_rule_binders.push(("n", nat()));
  add_rec(
    &mut env,
    "Nat.rec",
    lu,
    pi(&rec_ty_binders, motive_app([fv("t")])),
    0,
    2,
    vec![
      rule("Nat.zero", 0, lam(&rec_binders, fv("zero"))),
      rule(
        "Nat.succ",
        1,
        lam(
          &succ_rule_binders,
          app(
            fv("succ"),
            [fv("n"), nat_rec(vec![fv("motive"), fv("zero"), fv("succ"), fv("n")])],
          ),
        ),
      ),
    ],
  );
  let cases_succ_ty =
    pi(&[("n", nat())], motive_app([app(cnst("Nat.succ"), [fv("n")])]));
  let cases_binders = [
    ("motive", nat_motive.clone()),
    ("t", nat()),
    ("zero", zero_ty.clone()),
    ("succ", cases_succ_ty),
  ];
  add_defn(
    &mut env,
    "Nat.casesOn",
    lu,
    pi(&cases_binders, motive_app([fv("t")])),
    lam(
      &cases_binders,
      nat_rec(vec![
        fv("motive"),
        fv("zero"),
        lam(
          &[("n", nat()), ("ih", motive_app([fv("n")]))],
          app(fv("succ"), [fv("n")]),
        ),
        fv("t"),
      ]),
    ),
    ReducibilityHints::Abbrev,
  );
  env.mark_aux_recursor(n("Nat.casesOn"));
  let rec_on_binders = [
    ("motive", nat_motive),
    ("t", nat()),
    ("zero", zero_ty),
    ("succ", succ_ty),
  ];
  add_defn(
    &mut env,
    "Nat.recOn",
    lu,
    pi(&rec_on_binders, motive_app([fv("t")])),
    lam(
      &rec_on_binders,
      nat_rec(vec![fv("motive"), fv("zero"), fv("succ"), fv("t")]),
    ),
    ReducibilityHints::Abbrev,
  );
  env.mark_aux_recursor(n("Nat.recOn"));

  let nat2 = pi(&[("a", nat()), ("b", nat())], nat());
  add_defn(
    &mut env,
    "Nat.add",
    &[],
    nat2.clone(),
    lam(
      &[("n", nat()), ("m", nat())],
      app(
        cnst_l("Nat.rec", vec![Level::one()]),
        [
          lam(&[("_t", nat())], nat()),
          fv("n"),
          lam(&[("k", nat()), ("ih", nat())], app(cnst("Nat.succ"), [fv("ih")])),
          fv("m"),
        ],
      ),
    ),
    ReducibilityHints::Regular(1),
  );
  add_axiom(&mut env, "Nat.sub", &[], nat2.clone());
  add_axiom(&mut env, "Nat.mul", &[], nat2);
  for prim in ["Nat.add", "Nat.sub", "Nat.mul"] {
    env.mark_vm_function(n(prim));
  }

  // Bool
  add_induct(&mut env, "Bool", &[], type0(), 0, &["Bool.false", "Bool.true"], false);
  add_ctor(&mut env, "Bool.false", &[], cnst("Bool"), "Bool", 0, 0, 0);
  add_ctor(&mut env, "Bool.true", &[], cnst("Bool"), "Bool", 1, 0, 0);
  let bool_minors = [
    ("motive", pi(&[("t", cnst("Bool"))], su())),
    ("false", motive_app([cnst("Bool.false")])),
    ("true", motive_app([cnst("Bool.true")])),
  ];
  let mut bool_rec_binders = bool_minors.to_vec();
  bool_rec_binders.push(("t", cnst("Bool")));
  add_rec(
    &mut env,
    "Bool.rec",
    lu,
    pi(&bool_rec_binders, motive_app([fv("t")])),
    0,
    2,
    vec![
      rule("Bool.false", 0, lam(&bool_minors, fv("false"))),
      rule("Bool.true", 0, lam(&bool_minors, fv("true"))),
    ],
  );
  let bool_cases_binders = [
    bool_minors[0].clone(),
    ("t", cnst("Bool")),
    bool_minors[1].clone(),
    bool_minors[2].clone(),
  ];
  add_defn(
    &mut env,
    "Bool.casesOn",
    lu,
    pi(&bool_cases_binders, motive_app([fv("t")])),
    lam(
      &bool_cases_binders,
      app(
        cnst_l("Bool.rec", vec![u()]),
        [fv("motive"), fv("false"), fv("true"), fv("t")],
      ),
    ),
    ReducibilityHints::Abbrev,
  );
  env.mark_aux_recursor(n("Bool.casesOn"));

  // True
  add_induct(&mut env, "True", &[], Expr::prop(), 0, &["True.intro"], false);
  add_ctor(&mut env, "True.intro", &[], cnst("True"), "True", 0, 0, 0);
  let true_minors = [
    ("motive", pi(&[("t", cnst("True"))], su())),
    ("intro", motive_app([cnst("True.intro")])),
  ];
  let mut true_rec_binders = true_minors.to_vec();
  true_rec_binders.push(("t", cnst("True")));
  add_rec(
    &mut env,
    "True.rec",
    lu,
    pi(&true_rec_binders, motive_app([fv("t")])),
    0,
    1,
    vec![rule("True.intro", 0, lam(&true_minors, fv("intro")))],
  );

  // And
  let prop = Expr::prop;
  let and_ab = || app(cnst("And"), [fv("a"), fv("b")]);
  add_induct(
    &mut env,
    "And",
    &[],
    pi(&[("a", prop()), ("b", prop())], prop()),
    2,
    &["And.intro"],
    false,
  );
  add_ctor(
    &mut env,
    "And.intro",
    &[],
    pi(
      &[("a", prop()), ("b", prop()), ("left", fv("a")), ("right", fv("b"))],
      and_ab(),
    ),
    "And",
    0,
    2,
    2,
  );
  let and_intro_app =
    app(cnst("And.intro"), [fv("a"), fv("b"), fv("left"), fv("right")]);
  let and_minors = [
    ("a", prop()),
    ("b", prop()),
    ("motive", pi(&[("t", and_ab())], su())),
    (
      "intro",
      pi(&[("left", fv("a")), ("right", fv("b"))], motive_app([and_intro_app])),
    ),
  ];
  let mut and_rec_binders = and_minors.to_vec();
  and_rec_binders.push(("t", and_ab()));
  let mut and_rule_binders = and_minors.to_vec();
  and_rule_binders.push(("left", fv("a")));
  and_rule_binders.push(("right", fv("b")));
  add_rec(
    &mut env,
    "And.rec",
    lu,
    pi(&and_rec_binders, motive_app([fv("t")])),
    2,
    1,
    vec![rule(
      "And.intro",
      2,
      lam(&and_rule_binders, app(fv("intro"), [fv("left"), fv("right")])),
    )],
  );
  let and_cases_binders = [
    and_minors[0].clone(),
    and_minors[1].clone(),
    and_minors[2].clone(),
    ("t", and_ab()),
    and_minors[3].clone(),
  ];
  add_defn(
    &mut env,
    "And.casesOn",
    lu,
    pi(&and_cases_binders, motive_app([fv("t")])),
    lam(
      &and_cases_binders,
      app(
        cnst_l("And.rec", vec![u()]),
        [fv("a"), fv("b"), fv("motive"), fv("intro"), fv("t")],
      ),
    ),
    ReducibilityHints::Abbrev,
  );
  env.mark_aux_recursor(n("And.casesOn"));

  // Pair: structure { fst : Nat, snd : Bool }
  let pair = || cnst("Pair");
  add_induct(&mut env, "Pair", &[], type0(), 0, &["Pair.mk"], false);
  add_ctor(
    &mut env,
    "Pair.mk",
    &[],
    pi(&[("fst", nat()), ("snd", cnst("Bool"))], pair()),
    "Pair",
    0,
    0,
    2,
  );
  let pair_mk_app = app(cnst("Pair.mk"), [fv("fst"), fv("snd")]);
  let pair_minors = [
    ("motive", pi(&[("t", pair())], su())),
    (
      "mk",
      pi(&[("fst", nat()), ("snd", cnst("Bool"))], motive_app([pair_mk_app])),
    ),
  ];
  let mut pair_rec_binders = pair_minors.to_vec();
  pair_rec_binders.push(("t", pair()));
  let mut pair_rule_binders = pair_minors.to_vec();
  pair_rule_binders.push(("fst", nat()));
  pair_rule_binders.push(("snd", cnst("Bool")));
  add_rec(
    &mut env,
    "Pair.rec",
    lu,
    pi(&pair_rec_binders, motive_app([fv("t")])),
    0,
    1,
    vec![rule(
      "Pair.mk",
      2,
      lam(&pair_rule_binders, app(fv("mk"), [fv("fst"), fv("snd")])),
    )],
  );
  let pair_cases_binders =
    [pair_minors[0].clone(), ("t", pair()), pair_minors[1].clone()];
  add_defn(
    &mut env,
    "Pair.casesOn",
    lu,
    pi(&pair_cases_binders, motive_app([fv("t")])),
    lam(
      &pair_cases_binders,
      app(cnst_l("Pair.rec", vec![u()]), [fv("motive"), fv("mk"), fv("t")]),
    ),
    ReducibilityHints::Abbrev,
  );
  env.mark_aux_recursor(n("Pair.casesOn"));
  for (i, (field, ty)) in [("fst", nat()), ("snd", cnst("Bool"))].into_iter().enumerate() {
    let name = format!("Pair.{field}");
    add_defn(
      &mut env,
      &name,
      &[],
      pi(&[("p", pair())], ty),
      lam(&[("p", pair())], Expr::proj(n("Pair"), i as u64, fv("p"))),
      ReducibilityHints::Abbrev,
    );
    env.add_projection(n(&name), ProjectionInfo {
      ctor: n("Pair.mk"),
      num_params: 0,
      idx: i,
    });
  }

  add_axiom(&mut env, "String", &[], type0());

  // OfNat
  let tu = Expr::sort(Level::succ(u()));
  add_axiom(&mut env, "OfNat", lu, pi(&[("α", tu.clone()), ("n", nat())], tu.clone()));
  add_axiom(
    &mut env,
    "OfNat.ofNat",
    lu,
    pi(
      &[
        ("α", tu),
        ("n", nat()),
        ("inst", app(cnst_l("OfNat", vec![u()]), [fv("α"), fv("n")])),
      ],
      fv("α"),
    ),
  );
  add_axiom(
    &mut env,
    "instOfNatNat",
    &[],
    pi(&[("n", nat())], app(cnst_l("OfNat", vec![Level::zero()]), [nat(), fv("n")])),
  );

  add_reflection(&mut env);
  env
}

fn add_reflection(env: &mut Env) {
  let ty = |s: &str| cnst(s);
  let arrow = |args: &[Expr], res: Expr| {
    let names = ["a0", "a1", "a2", "a3"];
    let binders: Vec<(&str, Expr)> =
      args.iter().cloned().enumerate().map(|(i, t)| (names[i], t)).collect();
    pi(&binders, res)
  };
  for t in ["name", "level", "binder_info", "expr"] {
    add_axiom(env, t, &[], type0());
  }
  add_axiom(env, "name.anonymous", &[], ty("name"));
  add_axiom(env, "name.mk_string", &[], arrow(&[ty("String"), ty("name")], ty("name")));
  add_axiom(env, "name.mk_numeral", &[], arrow(&[nat(), ty("name")], ty("name")));
  add_axiom(env, "level.zero", &[], ty("level"));
  add_axiom(env, "level.succ", &[], arrow(&[ty("level")], ty("level")));
  for l in ["level.max", "level.imax"] {
    add_axiom(env, l, &[], arrow(&[ty("level"), ty("level")], ty("level")));
  }
  for l in ["level.param", "level.mvar"] {
    add_axiom(env, l, &[], arrow(&[ty("name")], ty("level")));
  }
  for b in [
    "binder_info.default",
    "binder_info.implicit",
    "binder_info.strict_implicit",
    "binder_info.inst_implicit",
  ] {
    add_axiom(env, b, &[], ty("binder_info"));
  }
  let tu = Expr::sort(Level::succ(u()));
  let list_a = app(cnst_l("list", vec![u()]), [fv("α")]);
  add_axiom(env, "list", &["u"], pi(&[("α", tu.clone())], tu.clone()));
  add_axiom(env, "list.nil", &["u"], pi(&[("α", tu.clone())], list_a.clone()));
  add_axiom(
    env,
    "list.cons",
    &["u"],
    pi(&[("α", tu.clone()), ("hd", fv("α")), ("tl", list_a.clone())], list_a),
  );
  let list_level = app(cnst_l("list", vec![Level::zero()]), [ty("level")]);
  let e = || ty("expr");
  add_axiom(env, "expr.var", &[], arrow(&[nat()], e()));
  add_axiom(env, "expr.sort", &[], arrow(&[ty("level")], e()));
  add_axiom(env, "expr.const", &[], arrow(&[ty("name"), list_level], e()));
  add_axiom(env, "expr.mvar", &[], arrow(&[ty("name")], e()));
  add_axiom(env, "expr.app", &[], arrow(&[e(), e()], e()));
  for b in ["expr.lam", "expr.pi"] {
    add_axiom(env, b, &[], arrow(&[ty("name"), ty("binder_info"), e(), e()], e()));
  }
  add_axiom(env, "expr.elet", &[], arrow(&[ty("name"), e(), e(), e()], e()));
  add_axiom(env, "expr.lit_nat", &[], arrow(&[nat()], e()));
  add_axiom(env, "expr.lit_str", &[], arrow(&[ty("String")], e()));
  add_axiom(env, "expr.proj", &[], arrow(&[ty("name"), nat(), e()], e()));

  // reflected.{u} (α : Sort u) (a : α) : Type := expr
  let su = Expr::sort(u());
  add_defn(
    env,
    "reflected",
    &["u"],
    pi(&[("α", su.clone()), ("a", fv("α"))], type0()),
    lam(&[("α", su), ("a", fv("α"))], e()),
    ReducibilityHints::Abbrev,
  );
  let tu0 = Expr::sort(Level::succ(u()));
  add_axiom(env, "tactic", &["u"], pi(&[("α", tu0.clone())], tu0.clone()));
  let two_up = Level::succ(Level::succ(u()));
  add_axiom(
    env,
    "tactic.eval_expr",
    &["u"],
    pi(
      &[
        ("α", tu0.clone()),
        ("r", app(cnst_l("reflected", vec![two_up]), [tu0, fv("α")])),
        ("e", e()),
      ],
      app(cnst_l("tactic", vec![u()]), [fv("α")]),
    ),
  );
}

// ============================================================================
// Reference evaluator
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Nat(BigUint),
  Str(String),
  Ctor(usize, Vec<Value>),
  Neutral,
  Closure(Rc<Vec<Value>>, Expr),
  Partial(Name, Vec<Value>),
}

impl Value {
  pub fn nat(k: u64) -> Value {
    Value::Nat(BigUint::from(k))
  }
}

/// Strict evaluator for lowered code, with lazy case branches.
pub struct Machine<'a> {
  procs: FxHashMap<Name, &'a Expr>,
}

impl<'a> Machine<'a> {
  pub fn new(procs: &'a [Procedure]) -> Self {
    Machine { procs: procs.iter().map(|p| (p.name.clone(), &p.code)).collect() }
  }

  pub fn call(&self, name: &str, args: Vec<Value>) -> Value {
    self.call_const(&n(name), args)
  }

  fn eval(&self, e: &Expr, env: &[Value]) -> Value {
    match e.as_data() {
      ExprData::Bvar(i) => env[env.len() - 1 - *i as usize].clone(),
      ExprData::Lit(Literal::NatVal(k)) => Value::Nat(k.0.clone()),
      ExprData::Lit(Literal::StrVal(s)) => Value::Str(s.clone()),
      ExprData::Lam(_, _, body, _) => Value::Closure(Rc::new(env.to_vec()), body.clone()),
      ExprData::LetE(_, _, v, b, _) => {
        let mut inner = env.to_vec();
        inner.push(self.eval(v, env));
        self.eval(b, &inner)
      },
      ExprData::Mdata(_, x) => self.eval(x, env),
      ExprData::App(..) | ExprData::Const(..) => {
        let (head, args) = unfold_apps(e);
        match head.as_data() {
          ExprData::Const(name, _) => {
            let s = name.pretty();
            if s == "_nat_cases" || s.starts_with("_cases.") {
              return self.eval_cases(&s, &args, env);
            }
            let vals = args.iter().map(|a| self.eval(a, env)).collect();
            self.call_const(name, vals)
          },
          _ => {
            let f = self.eval(&head, env);
            args.iter().fold(f, |f, a| self.apply(f, self.eval(a, env)))
          },
        }
      },
      _ => panic!("cannot evaluate {e}"),
    }
  }

  fn eval_cases(&self, op: &str, args: &[Expr], env: &[Value]) -> Value {
    let major = self.eval(&args[0], env);
    let (branch, fields, used) = match (op, major) {
      ("_nat_cases", Value::Nat(k)) if k == BigUint::ZERO => (&args[1], vec![], 3),
      ("_nat_cases", Value::Nat(k)) => {
        (&args[2], vec![Value::Nat(k - BigUint::from(1u64))], 3)
      },
      (_, Value::Ctor(c, fields)) => {
        let arity: usize = op["_cases.".len()..].parse().unwrap();
        (&args[1 + c], fields, 1 + arity)
      },
      (_, other) => panic!("{op} on {other:?}"),
    };
    let f = self.eval(branch, env);
    let f = fields.into_iter().fold(f, |f, v| self.apply(f, v));
    args[used..].iter().fold(f, |f, a| self.apply(f, self.eval(a, env)))
  }

  fn apply(&self, f: Value, arg: Value) -> Value {
    match f {
      Value::Closure(env, body) => {
        let mut env = (*env).clone();
        env.push(arg);
        self.eval(&body, &env)
      },
      Value::Partial(name, mut args) => {
        args.push(arg);
        self.call_const(&name, args)
      },
      Value::Neutral => Value::Neutral,
      other => panic!("cannot apply {other:?}"),
    }
  }

  fn call_const(&self, name: &Name, args: Vec<Value>) -> Value {
    let s = name.pretty();
    let arity = match s.as_str() {
      "Nat.succ" | "_neutral" => 1,
      "Nat.add" | "Nat.sub" | "Nat.mul" => 2,
      _ if s.starts_with("_proj.") => 1,
      _ => 0,
    };
    if s == "_neutral" {
      return Value::Neutral;
    }
    if let Some(i) = s.strip_prefix("_cnstr.") {
      return Value::Ctor(i.parse().unwrap(), args);
    }
    if args.len() < arity {
      return Value::Partial(name.clone(), args);
    }
    let mut rest = args;
    let used: Vec<Value> = rest.drain(..arity).collect();
    let nat_of = |v: &Value| match v {
      Value::Nat(k) => k.clone(),
      other => panic!("expected a number, got {other:?}"),
    };
    let head = match s.as_str() {
      "Nat.succ" => Value::Nat(nat_of(&used[0]) + BigUint::from(1u64)),
      "Nat.add" => Value::Nat(nat_of(&used[0]) + nat_of(&used[1])),
      "Nat.mul" => Value::Nat(nat_of(&used[0]) * nat_of(&used[1])),
      "Nat.sub" => {
        let (a, b) = (nat_of(&used[0]), nat_of(&used[1]));
        Value::Nat(if a >= b { a - b } else { BigUint::ZERO })
      },
      _ if s.starts_with("_proj.") => {
        let i: usize = s["_proj.".len()..].parse().unwrap();
        match &used[0] {
          Value::Ctor(_, fields) => fields[i].clone(),
          other => panic!("projection of {other:?}"),
        }
      },
      _ => match self.procs.get(name) {
        Some(code) => self.eval(code, &[]),
        None => panic!("unknown procedure {name}"),
      },
    };
    rest.into_iter().fold(head, |f, a| self.apply(f, a))
  }
}
