//! Type-checking and reduction oracle consulted by the lowering passes.

pub mod def_eq;
pub mod error;
pub mod level;
pub mod tc;
pub mod whnf;
