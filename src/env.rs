use std::{
  fmt,
  hash::{Hash, Hasher},
  sync::Arc,
};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::nat::Nat;

// ============================================================================
// Names
// ============================================================================

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Name(pub Arc<NameData>);

#[derive(PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum NameData {
  Anonymous,
  Str(Name, String, u64),
  Num(Name, u64, u64),
}

impl Name {
  pub fn as_data(&self) -> &NameData {
    &self.0
  }

  pub fn get_hash(&self) -> u64 {
    match *self.0 {
      NameData::Anonymous => 0,
      NameData::Str(.., h) | NameData::Num(.., h) => h,
    }
  }

  pub fn anon() -> Self {
    Name(Arc::new(NameData::Anonymous))
  }

  pub fn str(pre: Name, s: String) -> Self {
    let hasher = &mut FxHasher::default();
    (7, pre.get_hash(), &s).hash(hasher);
    Name(Arc::new(NameData::Str(pre, s, hasher.finish())))
  }

  pub fn num(pre: Name, n: u64) -> Name {
    let hasher = &mut FxHasher::default();
    (11, pre.get_hash(), n).hash(hasher);
    Name(Arc::new(NameData::Num(pre, n, hasher.finish())))
  }

  pub fn is_anon(&self) -> bool {
    matches!(self.as_data(), NameData::Anonymous)
  }

  /// `self.s`
  pub fn append_str(&self, s: &str) -> Name {
    Name::str(self.clone(), s.to_owned())
  }

  /// `self.n`
  pub fn append_num(&self, n: u64) -> Name {
    Name::num(self.clone(), n)
  }

  pub fn prefix(&self) -> Name {
    match self.as_data() {
      NameData::Anonymous => self.clone(),
      NameData::Str(pre, ..) | NameData::Num(pre, ..) => pre.clone(),
    }
  }

  /// The last string component, if the name ends in one.
  pub fn last_str(&self) -> Option<&str> {
    match self.as_data() {
      NameData::Str(_, s, _) => Some(s),
      _ => None,
    }
  }

  /// The first component of the name.
  pub fn root(&self) -> Name {
    let mut cur = self.clone();
    loop {
      let pre = cur.prefix();
      if pre.is_anon() {
        return cur;
      }
      cur = pre;
    }
  }

  pub fn pretty(&self) -> String {
    let mut parts = Vec::new();
    let mut cur = self;
    loop {
      match cur.as_data() {
        NameData::Anonymous => break,
        NameData::Str(pre, s, _) => {
          parts.push(s.clone());
          cur = pre;
        },
        NameData::Num(pre, n, _) => {
          parts.push(n.to_string());
          cur = pre;
        },
      }
    }
    if parts.is_empty() {
      return "[anonymous]".to_owned();
    }
    parts.reverse();
    parts.join(".")
  }
}

impl Hash for Name {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.get_hash().hash(state);
  }
}

/// Parses dotted names; purely numeric components become numeric parts.
impl From<&str> for Name {
  fn from(s: &str) -> Self {
    s.split('.').fold(Name::anon(), |pre, part| match part.parse::<u64>() {
      Ok(n) => Name::num(pre, n),
      Err(_) => Name::str(pre, part.to_owned()),
    })
  }
}

impl fmt::Display for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.pretty())
  }
}

impl fmt::Debug for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "`{}", self.pretty())
  }
}

// ============================================================================
// Universe levels
// ============================================================================

#[derive(PartialEq, Eq, Debug, Hash, Clone)]
pub struct Level(pub Arc<LevelData>);

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum LevelData {
  Zero,
  Succ(Level),
  Max(Level, Level),
  Imax(Level, Level),
  Param(Name),
  Mvar(Name),
}

impl Level {
  pub fn as_data(&self) -> &LevelData {
    &self.0
  }
  pub fn zero() -> Self {
    Level(Arc::new(LevelData::Zero))
  }
  pub fn one() -> Self {
    Level::succ(Level::zero())
  }
  pub fn succ(x: Level) -> Self {
    Level(Arc::new(LevelData::Succ(x)))
  }
  pub fn max(x: Level, y: Level) -> Self {
    Level(Arc::new(LevelData::Max(x, y)))
  }
  pub fn imax(x: Level, y: Level) -> Self {
    Level(Arc::new(LevelData::Imax(x, y)))
  }
  pub fn param(x: Name) -> Self {
    Level(Arc::new(LevelData::Param(x)))
  }
  pub fn mvar(x: Name) -> Self {
    Level(Arc::new(LevelData::Mvar(x)))
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut offset = 0u64;
    let mut cur = self;
    while let LevelData::Succ(inner) = cur.as_data() {
      offset += 1;
      cur = inner;
    }
    match cur.as_data() {
      LevelData::Zero => return write!(f, "{offset}"),
      LevelData::Param(n) => write!(f, "{n}")?,
      LevelData::Mvar(n) => write!(f, "?{n}")?,
      LevelData::Max(a, b) => write!(f, "(max {a} {b})")?,
      LevelData::Imax(a, b) => write!(f, "(imax {a} {b})")?,
      LevelData::Succ(_) => unreachable!(),
    }
    if offset > 0 {
      write!(f, "+{offset}")?;
    }
    Ok(())
  }
}

// ============================================================================
// Literals, binder info, metadata, positions
// ============================================================================

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Literal {
  NatVal(Nat),
  StrVal(String),
}

impl PartialOrd for Literal {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Literal {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    match (self, other) {
      (Literal::NatVal(a), Literal::NatVal(b)) => a.cmp(b),
      (Literal::StrVal(a), Literal::StrVal(b)) => a.cmp(b),
      (Literal::NatVal(_), Literal::StrVal(_)) => std::cmp::Ordering::Less,
      (Literal::StrVal(_), Literal::NatVal(_)) => std::cmp::Ordering::Greater,
    }
  }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BinderInfo {
  Default,
  Implicit,
  StrictImplicit,
  InstImplicit,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum DataValue {
  OfString(String),
  OfBool(bool),
  OfName(Name),
  OfNat(Nat),
}

pub type KVMap = Vec<(Name, DataValue)>;

/// Source position attached to a term.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Pos {
  pub line: u32,
  pub column: u32,
}

impl fmt::Display for Pos {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

// ============================================================================
// Expressions
// ============================================================================

/// Immutable, reference-counted term. Structural equality ignores positions.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

struct ExprNode {
  data: ExprData,
  hash: u64,
  /// One more than the largest loose bound variable index, 0 if closed.
  loose_bvar_range: u64,
  has_fvar: bool,
  pos: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprData {
  Bvar(u64),
  Fvar(Name),
  Mvar(Name),
  Sort(Level),
  Const(Name, Vec<Level>),
  App(Expr, Expr),
  Lam(Name, Expr, Expr, BinderInfo),
  ForallE(Name, Expr, Expr, BinderInfo),
  LetE(Name, Expr, Expr, Expr, bool),
  Lit(Literal),
  Mdata(KVMap, Expr),
  Proj(Name, u64, Expr),
}

impl Expr {
  fn new(data: ExprData, pos: Option<Pos>) -> Self {
    let hasher = &mut FxHasher::default();
    let (loose_bvar_range, has_fvar) = match &data {
      ExprData::Bvar(i) => {
        (0u8, i).hash(hasher);
        (i.saturating_add(1), false)
      },
      ExprData::Fvar(n) => {
        (1u8, n.get_hash()).hash(hasher);
        (0, true)
      },
      ExprData::Mvar(n) => {
        (2u8, n.get_hash()).hash(hasher);
        (0, false)
      },
      ExprData::Sort(l) => {
        (3u8, l).hash(hasher);
        (0, false)
      },
      ExprData::Const(n, ls) => {
        (4u8, n.get_hash(), ls).hash(hasher);
        (0, false)
      },
      ExprData::App(g, a) => {
        (5u8, g.get_hash(), a.get_hash()).hash(hasher);
        (
          g.loose_bvar_range().max(a.loose_bvar_range()),
          g.has_fvar() || a.has_fvar(),
        )
      },
      ExprData::Lam(_, t, b, _) | ExprData::ForallE(_, t, b, _) => {
        let tag = if matches!(data, ExprData::Lam(..)) { 6u8 } else { 7u8 };
        (tag, t.get_hash(), b.get_hash()).hash(hasher);
        (
          t.loose_bvar_range().max(b.loose_bvar_range().saturating_sub(1)),
          t.has_fvar() || b.has_fvar(),
        )
      },
      ExprData::LetE(_, t, v, b, _) => {
        (8u8, t.get_hash(), v.get_hash(), b.get_hash()).hash(hasher);
        (
          t.loose_bvar_range()
            .max(v.loose_bvar_range())
            .max(b.loose_bvar_range().saturating_sub(1)),
          t.has_fvar() || v.has_fvar() || b.has_fvar(),
        )
      },
      ExprData::Lit(l) => {
        (9u8, l).hash(hasher);
        (0, false)
      },
      ExprData::Mdata(kvs, e) => {
        (10u8, kvs, e.get_hash()).hash(hasher);
        (e.loose_bvar_range(), e.has_fvar())
      },
      ExprData::Proj(n, i, e) => {
        (11u8, n.get_hash(), i, e.get_hash()).hash(hasher);
        (e.loose_bvar_range(), e.has_fvar())
      },
    };
    Expr(Arc::new(ExprNode {
      data,
      hash: hasher.finish(),
      loose_bvar_range,
      has_fvar,
      pos,
    }))
  }

  pub fn as_data(&self) -> &ExprData {
    &self.0.data
  }

  pub fn get_hash(&self) -> u64 {
    self.0.hash
  }

  pub fn loose_bvar_range(&self) -> u64 {
    self.0.loose_bvar_range
  }

  pub fn has_loose_bvars(&self) -> bool {
    self.0.loose_bvar_range > 0
  }

  pub fn has_fvar(&self) -> bool {
    self.0.has_fvar
  }

  /// No loose bound variables and no locals.
  pub fn is_ground(&self) -> bool {
    !self.has_loose_bvars() && !self.has_fvar()
  }

  pub fn pos(&self) -> Option<Pos> {
    self.0.pos
  }

  /// Physical identity of the two nodes.
  pub fn ptr_eq(a: &Expr, b: &Expr) -> bool {
    Arc::ptr_eq(&a.0, &b.0)
  }

  /// Address of the shared node, usable as a traversal cache key.
  pub fn ptr_key(&self) -> usize {
    Arc::as_ptr(&self.0) as usize
  }

  pub fn with_pos(&self, pos: Option<Pos>) -> Expr {
    if self.0.pos == pos {
      return self.clone();
    }
    Expr::new(self.0.data.clone(), pos)
  }

  /// `self`, tagged with `src`'s position when `self` has none.
  pub fn copy_pos(self, src: &Expr) -> Expr {
    match (self.pos(), src.pos()) {
      (None, Some(p)) => self.with_pos(Some(p)),
      _ => self,
    }
  }

  /// Rebuilds `self` with new payload, keeping its position.
  pub fn update(&self, data: ExprData) -> Expr {
    Expr::new(data, self.0.pos)
  }

  pub fn bvar(x: u64) -> Self {
    Expr::new(ExprData::Bvar(x), None)
  }
  pub fn fvar(x: Name) -> Self {
    Expr::new(ExprData::Fvar(x), None)
  }
  pub fn mvar(x: Name) -> Self {
    Expr::new(ExprData::Mvar(x), None)
  }
  pub fn sort(x: Level) -> Self {
    Expr::new(ExprData::Sort(x), None)
  }
  pub fn cnst(x: Name, us: Vec<Level>) -> Self {
    Expr::new(ExprData::Const(x, us), None)
  }
  pub fn app(x: Expr, y: Expr) -> Self {
    Expr::new(ExprData::App(x, y), None)
  }
  pub fn lam(n: Name, x: Expr, y: Expr, b: BinderInfo) -> Self {
    Expr::new(ExprData::Lam(n, x, y, b), None)
  }
  pub fn all(n: Name, x: Expr, y: Expr, b: BinderInfo) -> Self {
    Expr::new(ExprData::ForallE(n, x, y, b), None)
  }
  #[allow(non_snake_case)]
  pub fn letE(n: Name, x: Expr, y: Expr, z: Expr, b: bool) -> Self {
    Expr::new(ExprData::LetE(n, x, y, z, b), None)
  }
  pub fn lit(x: Literal) -> Self {
    Expr::new(ExprData::Lit(x), None)
  }
  pub fn mdata(xs: KVMap, x: Expr) -> Self {
    Expr::new(ExprData::Mdata(xs, x), None)
  }
  pub fn proj(n: Name, i: u64, x: Expr) -> Self {
    Expr::new(ExprData::Proj(n, i, x), None)
  }

  pub fn nat_lit(n: Nat) -> Self {
    Expr::lit(Literal::NatVal(n))
  }
  pub fn str_lit(s: &str) -> Self {
    Expr::lit(Literal::StrVal(s.to_owned()))
  }
  pub fn prop() -> Self {
    Expr::sort(Level::zero())
  }

  pub fn const_name(&self) -> Option<&Name> {
    match self.as_data() {
      ExprData::Const(n, _) => Some(n),
      _ => None,
    }
  }

  pub fn is_lambda(&self) -> bool {
    matches!(self.as_data(), ExprData::Lam(..))
  }

  /// The head of an application spine.
  pub fn get_app_fn(&self) -> &Expr {
    let mut cur = self;
    while let ExprData::App(f, _) = cur.as_data() {
      cur = f;
    }
    cur
  }

  pub fn get_app_num_args(&self) -> usize {
    let mut n = 0;
    let mut cur = self;
    while let ExprData::App(f, _) = cur.as_data() {
      n += 1;
      cur = f;
    }
    n
  }
}

impl PartialEq for Expr {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
      || (self.0.hash == other.0.hash && self.0.data == other.0.data)
  }
}

impl Eq for Expr {}

impl Hash for Expr {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.hash.hash(state);
  }
}

impl fmt::Debug for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "`({self})")
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_data() {
      ExprData::Bvar(i) => write!(f, "#{i}"),
      ExprData::Fvar(n) => write!(f, "{n}"),
      ExprData::Mvar(n) => write!(f, "?{n}"),
      ExprData::Sort(l) => match l.as_data() {
        LevelData::Zero => f.write_str("Prop"),
        LevelData::Succ(z) if *z.as_data() == LevelData::Zero => {
          f.write_str("Type")
        },
        _ => write!(f, "Sort {l}"),
      },
      ExprData::Const(n, ls) if ls.is_empty() => write!(f, "{n}"),
      ExprData::Const(n, ls) => {
        let ls: Vec<String> = ls.iter().map(ToString::to_string).collect();
        write!(f, "{n}.{{{}}}", ls.join(", "))
      },
      ExprData::App(..) => {
        let mut args = Vec::new();
        let mut cur = self;
        while let ExprData::App(g, a) = cur.as_data() {
          args.push(a);
          cur = g;
        }
        write!(f, "({cur}")?;
        for a in args.iter().rev() {
          write!(f, " {a}")?;
        }
        f.write_str(")")
      },
      ExprData::Lam(n, t, b, _) => write!(f, "(fun ({n} : {t}) => {b})"),
      ExprData::ForallE(n, t, b, _) => write!(f, "(({n} : {t}) -> {b})"),
      ExprData::LetE(n, t, v, b, _) => {
        write!(f, "(let {n} : {t} := {v}; {b})")
      },
      ExprData::Lit(Literal::NatVal(n)) => write!(f, "{n}"),
      ExprData::Lit(Literal::StrVal(s)) => write!(f, "{s:?}"),
      ExprData::Mdata(kvs, e) => {
        let keys: Vec<String> = kvs.iter().map(|(k, _)| k.pretty()).collect();
        write!(f, "@[{}] {e}", keys.join(", "))
      },
      ExprData::Proj(_, i, e) => write!(f, "{e}.{}", i + 1),
    }
  }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReducibilityHints {
  Opaque,
  Abbrev,
  Regular(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSafety {
  Unsafe,
  Safe,
  Partial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantVal {
  pub name: Name,
  pub level_params: Vec<Name>,
  pub typ: Expr,
}

#[derive(Debug, Clone)]
pub struct AxiomVal {
  pub cnst: ConstantVal,
  pub is_unsafe: bool,
}

#[derive(Debug, Clone)]
pub struct DefinitionVal {
  pub cnst: ConstantVal,
  pub value: Expr,
  pub hints: ReducibilityHints,
  pub safety: DefinitionSafety,
  pub all: Vec<Name>,
}

#[derive(Debug, Clone)]
pub struct TheoremVal {
  pub cnst: ConstantVal,
  pub value: Expr,
  pub all: Vec<Name>,
}

#[derive(Debug, Clone)]
pub struct OpaqueVal {
  pub cnst: ConstantVal,
  pub value: Expr,
  pub is_unsafe: bool,
  pub all: Vec<Name>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotKind {
  Type,
  Ctor,
  Lift,
  Ind,
}

#[derive(Debug, Clone)]
pub struct QuotVal {
  pub cnst: ConstantVal,
  pub kind: QuotKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InductiveVal {
  pub cnst: ConstantVal,
  pub num_params: usize,
  pub num_indices: usize,
  pub all: Vec<Name>,
  pub ctors: Vec<Name>,
  pub num_nested: usize,
  pub is_rec: bool,
  pub is_unsafe: bool,
  pub is_reflexive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorVal {
  pub cnst: ConstantVal,
  pub induct: Name,
  pub cidx: usize,
  pub num_params: usize,
  pub num_fields: usize,
  pub is_unsafe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursorRule {
  pub ctor: Name,
  pub n_fields: usize,
  pub rhs: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursorVal {
  pub cnst: ConstantVal,
  pub all: Vec<Name>,
  pub num_params: usize,
  pub num_indices: usize,
  pub num_motives: usize,
  pub num_minors: usize,
  pub rules: Vec<RecursorRule>,
  pub k: bool,
  pub is_unsafe: bool,
}

impl RecursorVal {
  /// Index of the major premise in a saturated application.
  pub fn major_idx(&self) -> usize {
    self.num_params + self.num_motives + self.num_minors + self.num_indices
  }

  /// The inductive type this recursor eliminates.
  pub fn induct(&self) -> Name {
    self.cnst.name.prefix()
  }
}

#[derive(Debug, Clone)]
pub enum ConstantInfo {
  AxiomInfo(AxiomVal),
  DefnInfo(DefinitionVal),
  ThmInfo(TheoremVal),
  OpaqueInfo(OpaqueVal),
  QuotInfo(QuotVal),
  InductInfo(InductiveVal),
  CtorInfo(ConstructorVal),
  RecInfo(RecursorVal),
}

impl ConstantInfo {
  pub fn cnst_val(&self) -> &ConstantVal {
    match self {
      ConstantInfo::AxiomInfo(v) => &v.cnst,
      ConstantInfo::DefnInfo(v) => &v.cnst,
      ConstantInfo::ThmInfo(v) => &v.cnst,
      ConstantInfo::OpaqueInfo(v) => &v.cnst,
      ConstantInfo::QuotInfo(v) => &v.cnst,
      ConstantInfo::InductInfo(v) => &v.cnst,
      ConstantInfo::CtorInfo(v) => &v.cnst,
      ConstantInfo::RecInfo(v) => &v.cnst,
    }
  }

  pub fn name(&self) -> &Name {
    &self.cnst_val().name
  }

  pub fn get_type(&self) -> &Expr {
    &self.cnst_val().typ
  }

  pub fn get_level_params(&self) -> &[Name] {
    &self.cnst_val().level_params
  }

  pub fn is_theorem(&self) -> bool {
    matches!(self, ConstantInfo::ThmInfo(_))
  }
}

/// A structure projection function `S.f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionInfo {
  pub ctor: Name,
  pub num_params: usize,
  pub idx: usize,
}

// ============================================================================
// Environment
// ============================================================================

/// Read-only snapshot of declarations plus the attributes the compiler
/// consults when classifying constants.
#[derive(Debug, Default, Clone)]
pub struct Env {
  constants: FxHashMap<Name, ConstantInfo>,
  aux_recursors: FxHashSet<Name>,
  user_recursors: FxHashSet<Name>,
  projections: FxHashMap<Name, ProjectionInfo>,
  no_confusion: FxHashSet<Name>,
  vm_functions: FxHashSet<Name>,
  inline: FxHashSet<Name>,
  positions: FxHashMap<Name, Pos>,
}

impl Env {
  pub fn new() -> Self {
    Env::default()
  }

  pub fn insert(&mut self, ci: ConstantInfo) -> Option<ConstantInfo> {
    self.constants.insert(ci.name().clone(), ci)
  }

  pub fn get(&self, name: &Name) -> Option<&ConstantInfo> {
    self.constants.get(name)
  }

  pub fn contains(&self, name: &Name) -> bool {
    self.constants.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.constants.len()
  }

  pub fn is_empty(&self) -> bool {
    self.constants.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Name, &ConstantInfo)> {
    self.constants.iter()
  }

  pub fn mark_aux_recursor(&mut self, name: Name) {
    self.aux_recursors.insert(name);
  }

  pub fn mark_user_recursor(&mut self, name: Name) {
    self.user_recursors.insert(name);
  }

  pub fn add_projection(&mut self, name: Name, info: ProjectionInfo) {
    self.projections.insert(name, info);
  }

  pub fn mark_no_confusion(&mut self, name: Name) {
    self.no_confusion.insert(name);
  }

  pub fn mark_vm_function(&mut self, name: Name) {
    self.vm_functions.insert(name);
  }

  pub fn mark_inline(&mut self, name: Name) {
    self.inline.insert(name);
  }

  pub fn set_decl_pos(&mut self, name: Name, pos: Pos) {
    self.positions.insert(name, pos);
  }

  pub fn is_aux_recursor(&self, name: &Name) -> bool {
    self.aux_recursors.contains(name)
  }

  pub fn is_user_recursor(&self, name: &Name) -> bool {
    self.user_recursors.contains(name)
  }

  /// Auxiliary recursors named `T.casesOn`.
  pub fn is_cases_on_recursor(&self, name: &Name) -> bool {
    self.is_aux_recursor(name) && name.last_str() == Some("casesOn")
  }

  pub fn is_projection(&self, name: &Name) -> bool {
    self.projections.contains_key(name)
  }

  pub fn get_projection(&self, name: &Name) -> Option<&ProjectionInfo> {
    self.projections.get(name)
  }

  pub fn is_no_confusion(&self, name: &Name) -> bool {
    self.no_confusion.contains(name)
  }

  /// Already compiled for (or built into) the VM.
  pub fn is_vm_function(&self, name: &Name) -> bool {
    self.vm_functions.contains(name)
  }

  pub fn has_inline_attribute(&self, name: &Name) -> bool {
    self.inline.contains(name)
  }

  pub fn decl_pos(&self, name: &Name) -> Option<Pos> {
    self.positions.get(name).copied()
  }

  pub fn get_inductive(&self, name: &Name) -> Option<&InductiveVal> {
    match self.get(name)? {
      ConstantInfo::InductInfo(v) => Some(v),
      _ => None,
    }
  }

  pub fn get_ctor(&self, name: &Name) -> Option<&ConstructorVal> {
    match self.get(name)? {
      ConstantInfo::CtorInfo(v) => Some(v),
      _ => None,
    }
  }

  pub fn get_rec(&self, name: &Name) -> Option<&RecursorVal> {
    match self.get(name)? {
      ConstantInfo::RecInfo(v) => Some(v),
      _ => None,
    }
  }

  /// Whether the inductive `name` lives in `Prop`, read off the sort at
  /// the end of its type telescope.
  pub fn is_prop_inductive(&self, name: &Name) -> bool {
    let Some(ind) = self.get_inductive(name) else {
      return false;
    };
    let mut ty = &ind.cnst.typ;
    while let ExprData::ForallE(_, _, body, _) = ty.as_data() {
      ty = body;
    }
    matches!(ty.as_data(), ExprData::Sort(l) if *l.as_data() == LevelData::Zero)
  }
}
