//! Control flow for the interpreter.

use crate::value::Value;

/// Result of evaluating a statement or expression. `Return`, `Break` and
/// `Continue` pass through statement lists and blocks unchanged; only loops,
/// function application and the program top level observe them.
#[derive(Debug)]
pub enum Flow {
    /// Continue normal evaluation with the given value.
    Value(Value),
    /// Unwind to the nearest function application (or the program top).
    Return(Value),
    /// Exit the nearest enclosing loop.
    Break,
    /// Jump to the next iteration of the nearest enclosing loop.
    Continue,
}
