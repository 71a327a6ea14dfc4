//! Kaze interpreter: evaluates AST nodes with a tree-walking interpreter.
//!
//! This crate provides the runtime for the Kaze language: the value domain,
//! lexically scoped environments, the lvalue subsystem resolving compound
//! assignment targets, control-flow carriers, builtins, and the evaluator
//! itself.

pub mod builtins;
pub mod env;
pub mod flow;
pub mod interpreter;
pub mod lvalue;
pub mod value;

pub use env::Environment;
pub use interpreter::{Interpreter, MemoryStats};
pub use lvalue::LValue;
pub use value::Value;
