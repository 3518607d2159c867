use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::value::Value;

pub type ScopeHandle = Rc<RefCell<Environment>>;

/// A flat variable scope. There are exactly two tiers at runtime: the
/// long-lived global environment and per-call environments seeded from a
/// snapshot of the globals, so no scope chain is needed.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            store: HashMap::new(),
        }
    }

    pub fn handle(self) -> ScopeHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.store.get(name).cloned()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.store.insert(name.to_string(), value);
    }

    /// Copy of the whole store, used to seed call environments.
    pub fn snapshot(&self) -> Environment {
        self.clone()
    }

    /// Entries sorted by name, for `listvars`.
    pub fn sorted_entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .store
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Two-tier name resolution: the active scope first, then the globals.
/// When the active scope IS the global scope the second lookup is skipped.
pub fn lookup(env: &ScopeHandle, globals: &ScopeHandle, name: &str) -> Option<Value> {
    if let Some(value) = env.borrow().get(name) {
        return Some(value);
    }
    if Rc::ptr_eq(env, globals) {
        return None;
    }
    globals.borrow().get(name)
}

#[cfg(test)]
mod tests {
    use super::{lookup, Environment};
    use crate::value::Value;

    #[test]
    fn set_and_get() {
        let mut env = Environment::new();
        env.set("x", Value::Integer(5));
        assert_eq!(env.get("x"), Some(Value::Integer(5)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut env = Environment::new();
        env.set("x", Value::Integer(1));
        let mut copy = env.snapshot();
        copy.set("x", Value::Integer(2));
        assert_eq!(env.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn lookup_prefers_local_scope() {
        let globals = Environment::new().handle();
        globals.borrow_mut().set("x", Value::Integer(1));
        globals.borrow_mut().set("g", Value::Integer(9));

        let local = Environment::new().handle();
        local.borrow_mut().set("x", Value::Integer(2));

        assert_eq!(lookup(&local, &globals, "x"), Some(Value::Integer(2)));
        assert_eq!(lookup(&local, &globals, "g"), Some(Value::Integer(9)));
        assert_eq!(lookup(&local, &globals, "missing"), None);
    }

    #[test]
    fn sorted_entries_for_listing() {
        let mut env = Environment::new();
        env.set("b", Value::Integer(2));
        env.set("a", Value::Integer(1));
        let names: Vec<String> = env.sorted_entries().into_iter().map(|e| e.0).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
