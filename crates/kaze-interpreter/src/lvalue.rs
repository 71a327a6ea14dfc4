//! Assignable locations.
//!
//! An [`LValue`] answers "what does `a[b][c] = v` write to?" without tangling
//! the evaluator: a named binding reads and writes an environment slot, and an
//! index reference reads the container through its parent lvalue and mutates
//! the addressed element in place.
//!
//! Strings are the exception: they are by-value, so index assignment composes
//! a fresh string and writes it back through the *parent* lvalue. A string
//! aliased through a container keeps its old contents.

use std::rc::Rc;

use kaze_syntax::error::{error, Result};

use crate::env::Environment;
use crate::value::{HashPair, Value};

pub enum LValue {
    /// A name in a live environment.
    Binding {
        name: String,
        env: Rc<Environment>,
    },
    /// An index slot in the container read from `parent`.
    IndexRef {
        parent: Box<LValue>,
        index: Value,
    },
}

impl LValue {
    /// Read the current value of the location.
    pub fn get(&self) -> Result<Value> {
        match self {
            LValue::Binding { name, env } => env
                .get(name)
                .ok_or_else(|| format!("identifier not found: {}", name).into()),
            LValue::IndexRef { parent, index } => match parent.get()? {
                Value::Array(elements) => {
                    let elements = elements.borrow();
                    let idx = array_index(index, elements.len())?;
                    Ok(elements[idx].clone())
                }
                Value::Hash(pairs) => {
                    let key = index
                        .hash_key()
                        .ok_or_else(|| unusable_key(index))?;
                    match pairs.borrow().get(&key) {
                        Some(pair) => Ok(pair.value.clone()),
                        None => error(format!("key not found: {}", index.inspect())),
                    }
                }
                Value::Str(s) => {
                    let idx = array_index(index, s.len())?;
                    let b = s.as_bytes()[idx];
                    Ok(Value::Str(String::from_utf8_lossy(&[b]).into_owned()))
                }
                other => error(format!("index operator not supported: {}", other.type_name())),
            },
        }
    }

    /// Write `value` into the location; returns the written value.
    pub fn update(&self, value: Value) -> Result<Value> {
        match self {
            LValue::Binding { name, env } => {
                if env.update(name, value.clone()) {
                    Ok(value)
                } else {
                    error(format!("identifier not found: {}", name))
                }
            }
            LValue::IndexRef { parent, index } => match parent.get()? {
                Value::Array(elements) => {
                    let mut elements = elements.borrow_mut();
                    let idx = array_index(index, elements.len())?;
                    elements[idx] = value.clone();
                    Ok(value)
                }
                Value::Hash(pairs) => {
                    let key = index
                        .hash_key()
                        .ok_or_else(|| unusable_key(index))?;
                    pairs.borrow_mut().insert(
                        key,
                        HashPair {
                            key: index.clone(),
                            value: value.clone(),
                        },
                    );
                    Ok(value)
                }
                Value::Str(s) => {
                    let idx = array_index(index, s.len())?;
                    let ch = match &value {
                        Value::Str(ch) if ch.len() == 1 => ch,
                        _ => {
                            return error(
                                "string index assignment requires a single-character string",
                            )
                        }
                    };
                    let mut bytes = s.into_bytes();
                    bytes[idx] = ch.as_bytes()[0];
                    let composed = String::from_utf8_lossy(&bytes).into_owned();
                    parent.update(Value::Str(composed))?;
                    Ok(value)
                }
                other => error(format!("index operator not supported: {}", other.type_name())),
            },
        }
    }
}

fn array_index(index: &Value, len: usize) -> Result<usize> {
    match index {
        Value::Int(n) if *n >= 0 && (*n as usize) < len => Ok(*n as usize),
        Value::Int(n) => error(format!("index out of range: {}", n)),
        other => error(format!("index must be an INTEGER, got {}", other.type_name())),
    }
}

fn unusable_key(index: &Value) -> kaze_syntax::error::Error {
    format!("unusable as hash key: {}", index.type_name()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn binding(env: &Rc<Environment>, name: &str) -> LValue {
        LValue::Binding {
            name: name.to_string(),
            env: Rc::clone(env),
        }
    }

    #[test]
    fn test_binding_get_and_update() {
        let env = Environment::new();
        env.create("n", Value::Int(1));
        let lv = binding(&env, "n");
        assert!(matches!(lv.get(), Ok(Value::Int(1))));
        lv.update(Value::Int(5)).unwrap();
        assert!(matches!(lv.get(), Ok(Value::Int(5))));
    }

    #[test]
    fn test_binding_update_undefined_fails() {
        let env = Environment::new();
        let lv = binding(&env, "missing");
        assert!(lv.update(Value::Int(1)).is_err());
        assert!(lv.get().is_err());
    }

    #[test]
    fn test_array_index_round_trip() {
        let env = Environment::new();
        env.create("a", Value::array(vec![Value::Int(1), Value::Int(2)]));
        let lv = LValue::IndexRef {
            parent: Box::new(binding(&env, "a")),
            index: Value::Int(0),
        };
        lv.update(Value::Int(9)).unwrap();
        assert!(matches!(lv.get(), Ok(Value::Int(9))));
        // the sibling element is untouched
        let other = LValue::IndexRef {
            parent: Box::new(binding(&env, "a")),
            index: Value::Int(1),
        };
        assert!(matches!(other.get(), Ok(Value::Int(2))));
    }

    #[test]
    fn test_array_index_bounds() {
        let env = Environment::new();
        env.create("a", Value::array(vec![Value::Int(1)]));
        let lv = LValue::IndexRef {
            parent: Box::new(binding(&env, "a")),
            index: Value::Int(3),
        };
        assert!(lv.get().is_err());
        assert!(lv.update(Value::Int(9)).is_err());
    }

    #[test]
    fn test_hash_index_round_trip() {
        let env = Environment::new();
        env.create("h", Value::hash(HashMap::new()));
        let lv = LValue::IndexRef {
            parent: Box::new(binding(&env, "h")),
            index: Value::Str("key".into()),
        };
        // inserts a missing key, then replaces it
        lv.update(Value::Int(1)).unwrap();
        assert!(matches!(lv.get(), Ok(Value::Int(1))));
        lv.update(Value::Int(2)).unwrap();
        assert!(matches!(lv.get(), Ok(Value::Int(2))));
    }

    #[test]
    fn test_hash_rejects_unhashable_key() {
        let env = Environment::new();
        env.create("h", Value::hash(HashMap::new()));
        let lv = LValue::IndexRef {
            parent: Box::new(binding(&env, "h")),
            index: Value::array(vec![]),
        };
        assert!(lv.update(Value::Int(1)).is_err());
    }

    #[test]
    fn test_string_index_writes_through_binding() {
        let env = Environment::new();
        env.create("s", Value::Str("hoge".into()));
        let lv = LValue::IndexRef {
            parent: Box::new(binding(&env, "s")),
            index: Value::Int(0),
        };
        assert!(matches!(lv.get(), Ok(Value::Str(c)) if c == "h"));
        lv.update(Value::Str("m".into())).unwrap();
        assert!(matches!(env.get("s"), Some(Value::Str(s)) if s == "moge"));
    }

    #[test]
    fn test_string_index_requires_single_char() {
        let env = Environment::new();
        env.create("s", Value::Str("hoge".into()));
        let lv = LValue::IndexRef {
            parent: Box::new(binding(&env, "s")),
            index: Value::Int(0),
        };
        assert!(lv.update(Value::Str("xy".into())).is_err());
        assert!(lv.update(Value::Int(1)).is_err());
    }

    #[test]
    fn test_nested_index_reaches_inner_container() {
        let env = Environment::new();
        let inner = Value::array(vec![Value::Int(1), Value::Int(2)]);
        env.create("a", Value::array(vec![inner, Value::Int(3)]));
        let lv = LValue::IndexRef {
            parent: Box::new(LValue::IndexRef {
                parent: Box::new(binding(&env, "a")),
                index: Value::Int(0),
            }),
            index: Value::Int(1),
        };
        lv.update(Value::Int(9)).unwrap();
        assert!(matches!(lv.get(), Ok(Value::Int(9))));
    }

    #[test]
    fn test_string_inside_array_updates_the_slot() {
        let env = Environment::new();
        env.create("a", Value::array(vec![Value::Str("xx".into())]));
        let lv = LValue::IndexRef {
            parent: Box::new(LValue::IndexRef {
                parent: Box::new(binding(&env, "a")),
                index: Value::Int(0),
            }),
            index: Value::Int(0),
        };
        lv.update(Value::Str("y".into())).unwrap();
        let Some(Value::Array(elements)) = env.get("a") else {
            panic!("expected array binding");
        };
        assert!(matches!(&elements.borrow()[0], Value::Str(s) if s == "yx"));
    }
}
