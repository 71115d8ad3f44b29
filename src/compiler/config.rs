use std::env;

use super::trace::TraceOptions;

pub const SELF_CHECK_ENV: &str = "IX_LOWER_SELF_CHECK";
pub const TRACE_ENV: &str = "IX_LOWER_TRACE";

#[derive(Debug, Clone)]
pub struct CompilerConfig {
  /// Re-check the term against the declaration type after each typed pass.
  pub self_check: bool,
  /// Unfolding budget of the predicate-restricted normalizer.
  pub whnf_pred_limit: usize,
  /// Largest body, in nodes, the inliner treats as simple.
  pub inline_max_size: usize,
  pub trace: TraceOptions,
}

impl Default for CompilerConfig {
  fn default() -> Self {
    CompilerConfig {
      self_check: cfg!(debug_assertions),
      whnf_pred_limit: 10_000,
      inline_max_size: 8,
      trace: TraceOptions::none(),
    }
  }
}

impl CompilerConfig {
  /// Defaults, overridden by `IX_LOWER_SELF_CHECK` and `IX_LOWER_TRACE`.
  pub fn from_env() -> Self {
    let mut config = CompilerConfig::default();
    if let Ok(value) = env::var(SELF_CHECK_ENV) {
      match parse_flag(&value) {
        Some(flag) => config.self_check = flag,
        None => tracing::warn!(value, "ignoring {SELF_CHECK_ENV}"),
      }
    }
    if let Ok(value) = env::var(TRACE_ENV) {
      config.trace = TraceOptions::parse(&value);
    }
    config
  }

  pub fn with_self_check(mut self, on: bool) -> Self {
    self.self_check = on;
    self
  }

  pub fn with_trace(mut self, trace: TraceOptions) -> Self {
    self.trace = trace;
    self
  }
}

fn parse_flag(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}
