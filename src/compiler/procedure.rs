use std::fmt;

use crate::env::{ConstantInfo, Expr, Name, Pos};

/// A checked definition handed to the pipeline.
#[derive(Debug, Clone)]
pub struct Declaration {
  pub name: Name,
  pub level_params: Vec<Name>,
  pub typ: Expr,
  pub value: Expr,
  pub is_theorem: bool,
}

impl Declaration {
  /// Declarations with a body: definitions, theorems and opaque constants.
  pub fn from_constant(ci: &ConstantInfo) -> Option<Declaration> {
    let (value, is_theorem) = match ci {
      ConstantInfo::DefnInfo(d) => (&d.value, false),
      ConstantInfo::ThmInfo(t) => (&t.value, true),
      ConstantInfo::OpaqueInfo(o) => (&o.value, false),
      _ => return None,
    };
    let cnst = ci.cnst_val();
    Some(Declaration {
      name: cnst.name.clone(),
      level_params: cnst.level_params.clone(),
      typ: cnst.typ.clone(),
      value: value.clone(),
      is_theorem,
    })
  }
}

/// A named code unit ready for the bytecode emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
  pub name: Name,
  pub pos: Option<Pos>,
  pub code: Expr,
}

impl Procedure {
  pub fn new(name: Name, pos: Option<Pos>, code: Expr) -> Self {
    Procedure { name, pos, code }
  }
}

impl fmt::Display for Procedure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, ">> {}\n{}", self.name, self.code)
  }
}

/// One `>> name` block per procedure, as written to trace channels.
pub fn display_procs(procs: &[Procedure]) -> String {
  let mut out = String::new();
  for p in procs {
    out.push_str(&p.to_string());
    out.push('\n');
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::*;

  #[test]
  fn declaration_from_constant() {
    let env = prelude();
    let d = Declaration::from_constant(env.get(&n("Nat.add")).unwrap()).unwrap();
    assert_eq!(d.name, n("Nat.add"));
    assert!(!d.is_theorem);
    assert!(Declaration::from_constant(env.get(&n("Nat")).unwrap()).is_none());
  }

  #[test]
  fn procedure_display() {
    let p = Procedure::new(n("f"), None, nat_lit(1));
    assert_eq!(p.to_string(), ">> f\n1");
    assert_eq!(display_procs(&[p.clone(), p]), ">> f\n1\n>> f\n1\n");
  }
}
