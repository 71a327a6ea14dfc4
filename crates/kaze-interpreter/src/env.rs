//! Lexically scoped environments for the Kaze interpreter.
//!
//! An environment is a name->value frame with an optional parent link.
//! Environments are shared (`Rc`): every closure holds the environment it was
//! defined in, and sibling closures defined in the same frame observe each
//! other's updates.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub struct Environment {
    store: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// A fresh root environment.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// A child frame whose lookups fall back to `parent`.
    pub fn new_enclosed(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Unconditionally bind `name` in this frame, shadowing any outer
    /// binding of the same name.
    pub fn create(&self, name: impl Into<String>, value: Value) {
        self.store.borrow_mut().insert(name.into(), value);
    }

    /// Look `name` up along the parent chain; the innermost binding wins.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.store.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Overwrite the binding in the frame where `name` was defined. Returns
    /// false when no frame along the chain defines it.
    pub fn update(&self, name: &str, value: Value) -> bool {
        let mut store = self.store.borrow_mut();
        if let Some(slot) = store.get_mut(name) {
            *slot = value;
            return true;
        }
        drop(store);
        match &self.parent {
            Some(p) => p.update(name, value),
            None => false,
        }
    }

    /// The bindings of this frame only (the REPL's `:vars`).
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.store
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let env = Environment::new();
        env.create("a", Value::Int(1));
        assert!(matches!(env.get("a"), Some(Value::Int(1))));
        assert!(env.get("b").is_none());
    }

    #[test]
    fn test_get_walks_parents() {
        let root = Environment::new();
        root.create("a", Value::Int(1));
        let child = Environment::new_enclosed(&root);
        assert!(matches!(child.get("a"), Some(Value::Int(1))));
    }

    #[test]
    fn test_create_shadows_outer_binding() {
        let root = Environment::new();
        root.create("a", Value::Int(1));
        let child = Environment::new_enclosed(&root);
        child.create("a", Value::Int(2));
        assert!(matches!(child.get("a"), Some(Value::Int(2))));
        assert!(matches!(root.get("a"), Some(Value::Int(1))));
    }

    #[test]
    fn test_update_writes_defining_frame() {
        let root = Environment::new();
        root.create("a", Value::Int(1));
        let child = Environment::new_enclosed(&root);
        assert!(child.update("a", Value::Int(5)));
        assert!(matches!(root.get("a"), Some(Value::Int(5))));
        // the child frame itself stays empty
        assert!(child.snapshot().is_empty());
    }

    #[test]
    fn test_update_undefined_name_fails() {
        let env = Environment::new();
        assert!(!env.update("missing", Value::Int(1)));
    }
}
