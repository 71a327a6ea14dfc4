//! Runtime values for the Kaze interpreter.
//!
//! Arrays and hashes are shared by reference (`Rc<RefCell<..>>`): aliases
//! observe each other's mutations. Strings, integers and booleans are
//! by-value. `NaN` is the sentinel produced by failed numeric conversions;
//! arithmetic involving it yields it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

use fnv::FnvHasher;
use kaze_syntax::ast::Expr;
use kaze_syntax::error::Result;

use crate::env::Environment;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
    /// Failed numeric conversion sentinel.
    NaN,
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashMap<HashKey, HashPair>>>),
    Function(Rc<Function>),
    Builtin(&'static Builtin),
}

/// A user-defined function value: parameters, body, and the environment it
/// was defined in (lexical scoping).
pub struct Function {
    pub params: Vec<String>,
    /// Always an `Expr::Block`.
    pub body: Expr,
    pub env: Rc<Environment>,
}

/// A native function exposed to Kaze programs.
pub struct Builtin {
    pub name: &'static str,
    pub func: fn(&[Value]) -> Result<Value>,
}

/// A stored hash entry. The original key value is kept so hashes can be
/// displayed.
#[derive(Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Which kind of value a [`HashKey`] was derived from. The tag participates
/// in equality, so `4` and `true` never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    Int,
    Bool,
    Str,
}

/// Hash table key derived from an integer, boolean or string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: HashKind,
    pub value: u64,
}

fn fnv_hash(s: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(s.as_bytes());
    hasher.finish()
}

impl Value {
    /// Wrap a vector of elements into a fresh shared array.
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    /// Wrap a pair map into a fresh shared hash.
    pub fn hash(pairs: HashMap<HashKey, HashPair>) -> Value {
        Value::Hash(Rc::new(RefCell::new(pairs)))
    }

    /// The type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Null => "NULL",
            Value::NaN => "NAN",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// `null` and `false` are falsy; everything else (including `0` and `""`)
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Derive the hash table key for this value, if it is hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(n) => Some(HashKey {
                kind: HashKind::Int,
                value: *n as u64,
            }),
            Value::Bool(b) => Some(HashKey {
                kind: HashKind::Bool,
                value: u64::from(*b),
            }),
            Value::Str(s) => Some(HashKey {
                kind: HashKind::Str,
                value: fnv_hash(s),
            }),
            _ => None,
        }
    }

    /// Structural deep equality: arrays element-wise, hashes by key set and
    /// per-key values, functions and builtins by identity.
    pub fn deep_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::NaN, Value::NaN) => true,
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_eq(y))
            }
            (Value::Hash(a), Value::Hash(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(key, pair)| {
                        b.get(key).is_some_and(|other| pair.value.deep_eq(&other.value))
                    })
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }

    /// The REPL-facing rendering: like `Display`, but strings are quoted.
    pub fn inspect(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::NaN => f.write_str("NaN"),
            Value::Array(elements) => {
                let elements = elements.borrow();
                if elements.is_empty() {
                    return f.write_str("[ ]");
                }
                f.write_str("[ ")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&e.inspect())?;
                }
                f.write_str(" ]")
            }
            Value::Hash(pairs) => {
                let pairs = pairs.borrow();
                if pairs.is_empty() {
                    return f.write_str("#{ }");
                }
                f.write_str("#{ ")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", pair.key.inspect(), pair.value.inspect())?;
                }
                f.write_str(" }")
            }
            Value::Function(func) => {
                write!(f, "fun({}) {{\n{}\n}}", func.params.join(", "), func.body)
            }
            Value::Builtin(_) => f.write_str("builtin function"),
        }
    }
}

// A closure's captured environment can contain the closure itself, so the
// derived recursive Debug would not terminate.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_strings_share_a_hash_key() {
        let a = Value::Str("Hello World".into());
        let b = Value::Str("Hello World".into());
        let c = Value::Str("My name is johnny".into());
        assert_eq!(a.hash_key(), b.hash_key());
        assert_ne!(a.hash_key(), c.hash_key());
    }

    #[test]
    fn test_hash_key_tag_disambiguates() {
        // Integer 4 and boolean true must not collide even though a boolean
        // key also hashes to a small integer.
        assert_ne!(Value::Int(1).hash_key(), Value::Bool(true).hash_key());
        assert_ne!(Value::Int(0).hash_key(), Value::Bool(false).hash_key());
        assert_ne!(Value::Int(4).hash_key(), Value::Bool(true).hash_key());
    }

    #[test]
    fn test_unhashable_values() {
        assert!(Value::Null.hash_key().is_none());
        assert!(Value::NaN.hash_key().is_none());
        assert!(Value::array(vec![]).hash_key().is_none());
    }

    #[test]
    fn test_deep_equality() {
        let a = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let c = Value::array(vec![Value::Int(1), Value::Int(3)]);
        assert!(a.deep_eq(&b));
        assert!(!a.deep_eq(&c));
        assert!(Value::Null.deep_eq(&Value::Null));
        assert!(!Value::Null.deep_eq(&Value::Bool(false)));
        assert!(!Value::Int(1).deep_eq(&Value::Str("1".into())));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Str("hoge".into()).to_string(), "hoge");
        assert_eq!(Value::Str("hoge".into()).inspect(), "\"hoge\"");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::NaN.to_string(), "NaN");
        let arr = Value::array(vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(arr.to_string(), "[ 1, \"a\" ]");
    }
}
