//! Environments for variable bindings

use crate::interp::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared reference to an environment
///
/// Closures hold the environment they were defined in, so frames live as
/// long as any reachable closure references them.
pub type EnvRef = Rc<RefCell<Environment>>;

/// Environment holding variable bindings, with an optional parent for
/// lexical scoping
#[derive(Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

/// Create a fresh root environment with no parent
pub fn new_root_env() -> EnvRef {
    EnvRef::default()
}

/// Create an empty environment enclosed by `parent`
pub fn child_env(parent: &EnvRef) -> EnvRef {
    let child = Environment {
        bindings: HashMap::new(),
        parent: Some(Rc::clone(parent)),
    };
    Rc::new(RefCell::new(child))
}

impl Environment {
    /// Bind a name in this frame, shadowing any outer binding
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look up a name, innermost frame first.
    ///
    /// The chain is walked iteratively: closure capture can stack frames
    /// arbitrarily deep, and resolution must not be bounded by the host
    /// call stack.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }

        let mut next = self.parent.clone();
        while let Some(scope) = next {
            let scope = scope.borrow();
            if let Some(value) = scope.bindings.get(name) {
                return Some(value.clone());
            }
            next = scope.parent.clone();
        }

        None
    }

    /// Check whether a name resolves anywhere in the chain
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bound closures point back at their environment; print names only
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_get_and_redefine() {
        let env = new_root_env();
        env.borrow_mut().define("x".to_string(), Value::Int(1));
        env.borrow_mut().define("x".to_string(), Value::Int(9));

        assert_eq!(env.borrow().get("x"), Some(Value::Int(9)));
        assert_eq!(env.borrow().get("missing"), None);
        assert!(!env.borrow().contains("missing"));
    }

    #[test]
    fn test_sibling_call_frames_shadow_independently() {
        // Two calls of the same function enclose the same root; what one
        // frame shadows must stay invisible to the other and to the root
        let root = new_root_env();
        root.borrow_mut().define("base".to_string(), Value::Int(10));

        let left = child_env(&root);
        let right = child_env(&root);
        left.borrow_mut().define("base".to_string(), Value::Int(1));
        right.borrow_mut().define("arg".to_string(), Value::Bool(true));

        assert_eq!(left.borrow().get("base"), Some(Value::Int(1)));
        assert_eq!(right.borrow().get("base"), Some(Value::Int(10)));
        assert_eq!(root.borrow().get("base"), Some(Value::Int(10)));
        assert_eq!(left.borrow().get("arg"), None);
    }

    #[test]
    fn test_deep_chains_resolve_iteratively() {
        let root = new_root_env();
        root.borrow_mut().define("global".to_string(), Value::Int(42));

        let mut leaf = root;
        for i in 0..512i64 {
            leaf = child_env(&leaf);
            leaf.borrow_mut().define(format!("local{i}"), Value::Int(i));
        }

        // Resolution from the leaf reaches every frame up to the root
        let leaf = leaf.borrow();
        assert_eq!(leaf.get("global"), Some(Value::Int(42)));
        assert_eq!(leaf.get("local0"), Some(Value::Int(0)));
        assert_eq!(leaf.get("local511"), Some(Value::Int(511)));
        assert!(leaf.contains("local256"));
    }

    #[test]
    fn test_late_bindings_visible_through_captured_frames() {
        // Function declarations bind into the root after the capturing
        // frame already exists; lookups through the child see them anyway
        let root = new_root_env();
        let captured = child_env(&root);
        assert_eq!(captured.borrow().get("helper"), None);

        root.borrow_mut().define("helper".to_string(), Value::Int(7));
        assert_eq!(captured.borrow().get("helper"), Some(Value::Int(7)));
    }
}
