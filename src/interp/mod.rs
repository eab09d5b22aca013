//! Tree-walking interpreter: values, environments, evaluator and builtins

pub mod builtins;
mod env;
mod error;
mod eval;
mod value;

pub use env::{child_env, new_root_env, EnvRef, Environment};
pub use error::{ErrorKind, EvalResult, RuntimeError};
pub use eval::{eval_binary_op, eval_comparison_op, Evaluator};
pub use value::{Builtin, BuiltinFn, Function, HashKey, HashTag, MapPair, Value};
