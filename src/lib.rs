//! Lowering pipeline from type-checked kernel declarations to closed,
//! non-dependent procedures for the bytecode VM.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

pub mod compiler;
pub mod env;
pub mod kernel;
pub mod names;
pub mod nat;

#[cfg(test)]
mod test_support;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;
pub type FxIndexSet<K> = IndexSet<K, FxBuildHasher>;
