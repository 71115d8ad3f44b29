//! Per-pass diagnostic channels.
//!
//! A channel that is switched on gets a textual dump of the pass output,
//! emitted as a `tracing` debug event. Nothing here feeds back into the
//! pipeline.

use std::fmt;

use crate::env::Expr;

use super::procedure::{Procedure, display_procs};

const TARGET: &str = "ix_lower::compiler";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
  Input,
  EvalExpr,
  Inline,
  ExpandAux,
  CompIrrelevant,
  NatValue,
  EtaExpansion,
  SimplifyProj,
  ElimRecursors,
  EraseIrrelevant,
  ReduceArity,
  LambdaLifting,
  SimplifyInductive,
  Preprocess,
}

impl Pass {
  pub const ALL: [Pass; 14] = [
    Pass::Input,
    Pass::EvalExpr,
    Pass::Inline,
    Pass::ExpandAux,
    Pass::CompIrrelevant,
    Pass::NatValue,
    Pass::EtaExpansion,
    Pass::SimplifyProj,
    Pass::ElimRecursors,
    Pass::EraseIrrelevant,
    Pass::ReduceArity,
    Pass::LambdaLifting,
    Pass::SimplifyInductive,
    Pass::Preprocess,
  ];

  pub fn channel(self) -> &'static str {
    match self {
      Pass::Input => "compiler.input",
      Pass::EvalExpr => "compiler.eval_expr",
      Pass::Inline => "compiler.inline",
      Pass::ExpandAux => "compiler.expand_aux",
      Pass::CompIrrelevant => "compiler.comp_irrelevant",
      Pass::NatValue => "compiler.nat_value",
      Pass::EtaExpansion => "compiler.eta_expansion",
      Pass::SimplifyProj => "compiler.simplify_proj",
      Pass::ElimRecursors => "compiler.elim_recursors",
      Pass::EraseIrrelevant => "compiler.erase_irrelevant",
      Pass::ReduceArity => "compiler.reduce_arity",
      Pass::LambdaLifting => "compiler.lambda_lifting",
      Pass::SimplifyInductive => "compiler.simplify_inductive",
      Pass::Preprocess => "compiler.preprocess",
    }
  }

  pub fn from_channel(s: &str) -> Option<Pass> {
    Pass::ALL.into_iter().find(|p| p.channel() == s)
  }

  fn bit(self) -> u32 {
    1 << (self as u32)
  }
}

impl fmt::Display for Pass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.channel())
  }
}

/// On/off switch per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceOptions {
  enabled: u32,
}

impl TraceOptions {
  pub fn none() -> Self {
    TraceOptions::default()
  }

  pub fn all() -> Self {
    Pass::ALL.into_iter().fold(Self::none(), |t, p| t.with(p))
  }

  pub fn with(mut self, pass: Pass) -> Self {
    self.enabled |= pass.bit();
    self
  }

  pub fn set(&mut self, pass: Pass, on: bool) {
    if on {
      self.enabled |= pass.bit();
    } else {
      self.enabled &= !pass.bit();
    }
  }

  pub fn is_enabled(&self, pass: Pass) -> bool {
    self.enabled & pass.bit() != 0
  }

  /// Comma-separated channel names; `compiler` or `all` turns every
  /// channel on. Unknown names are ignored with a warning.
  pub fn parse(channels: &str) -> Self {
    let mut opts = TraceOptions::none();
    for item in channels.split(',').map(str::trim).filter(|s| !s.is_empty()) {
      if item == "compiler" || item == "all" {
        return TraceOptions::all();
      }
      match Pass::from_channel(item) {
        Some(p) => opts.set(p, true),
        None => tracing::warn!(channel = item, "unknown trace channel"),
      }
    }
    opts
  }

  pub fn term(&self, pass: Pass, e: &Expr) {
    if self.is_enabled(pass) {
      tracing::debug!(target: TARGET, channel = pass.channel(), "\n{e}");
    }
  }

  pub fn procs(&self, pass: Pass, procs: &[Procedure]) {
    if self.is_enabled(pass) {
      tracing::debug!(
        target: TARGET,
        channel = pass.channel(),
        "\n{}",
        display_procs(procs)
      );
    }
  }
}
