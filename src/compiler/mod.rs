//! The lowering pipeline: a fixed sequence of term rewrites turning one
//! declaration into closed, non-dependent procedures.

pub mod comp_irrelevant;
pub mod config;
pub mod elim_recursors;
pub mod erase_irrelevant;
pub mod error;
pub mod eta_expand;
pub mod eval_expr;
pub mod expand_aux;
pub mod inline;
pub mod lambda_lifting;
pub mod nat_value;
pub mod preprocess;
pub mod procedure;
pub mod quote;
pub mod reduce_arity;
pub mod simp_inductive;
pub mod simp_proj;
pub mod trace;
pub mod util;
pub mod visitor;


pub use config::CompilerConfig;
pub use error::{CompileError, ErrorKind, PassResult};
pub use preprocess::{Preprocessor, compile_batch, compile_declaration};
pub use procedure::{Declaration, Procedure};
