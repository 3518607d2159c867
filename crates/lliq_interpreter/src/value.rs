use std::{cell::RefCell, collections::HashMap, fmt::Display, rc::Rc};

use lliq_parser::ast::Stmt;

/// A runtime value. Everything is dynamically tagged; there is no static
/// type system and operators check tags at evaluation time.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(String),
    Instance(Instance),
    Nil,
}

impl Value {
    pub fn typename(&self) -> String {
        use Value::*;

        match self {
            Integer(_) => "integer".into(),
            Float(_) => "float".into(),
            Boolean(_) => "boolean".into(),
            Str(_) => "string".into(),
            Instance(inst) => inst.class_name(),
            Nil => "nil".into(),
        }
    }

    /// Truthiness for conditionals and the `and`/`or` operators. Zero, the
    /// empty string and nil are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        use Value::*;

        match self {
            Boolean(value) => *value,
            Integer(value) => *value != 0,
            Float(value) => *value != 0.0,
            Str(value) => !value.is_empty(),
            Instance(_) => true,
            Nil => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Float(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;

        match (self, other) {
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            // numbers compare across the integer/float divide
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
            (Boolean(a), Boolean(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Instance(a), Instance(b)) => a.ptr_eq(b),
            (Nil, Nil) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Value::*;

        match self {
            Integer(value) => write!(f, "{}", value),
            Float(value) => write!(f, "{}", ryu::Buffer::new().format(*value)),
            Boolean(value) => write!(f, "{}", value),
            Str(value) => write!(f, "{}", value),
            Instance(inst) => write!(f, "{} instance", inst.class_name()),
            Nil => write!(f, "nil"),
        }
    }
}

#[derive(Debug)]
struct InstanceData {
    class_name: String,
    props: HashMap<String, Value>,
}

/// A shared handle to an object's mutable property map. Cloning the handle
/// aliases the same properties, which is what gives object assignment its
/// reference semantics.
#[derive(Debug, Clone)]
pub struct Instance {
    data: Rc<RefCell<InstanceData>>,
}

impl Instance {
    pub fn new(class_name: &str) -> Instance {
        Instance {
            data: Rc::new(RefCell::new(InstanceData {
                class_name: class_name.to_string(),
                props: HashMap::new(),
            })),
        }
    }

    pub fn class_name(&self) -> String {
        self.data.borrow().class_name.clone()
    }

    pub fn get_prop(&self, name: &str) -> Option<Value> {
        self.data.borrow().props.get(name).cloned()
    }

    pub fn set_prop(&self, name: &str, value: Value) {
        self.data.borrow_mut().props.insert(name.to_string(), value);
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.data.borrow().props.contains_key(name)
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

/// A user-defined function or method. The body is shared so that storing a
/// definition in both a function table and a class's method table costs no
/// copy.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub methods: HashMap<String, FunctionDef>,
}

#[cfg(test)]
mod tests {
    use super::{Instance, Value};

    #[test]
    fn display_forms() {
        let tests = vec![
            (Value::Integer(5), "5"),
            (Value::Float(2.0), "2.0"),
            (Value::Float(2.5), "2.5"),
            (Value::Boolean(true), "true"),
            (Value::Str("hi".to_string()), "hi"),
            (Value::Nil, "nil"),
        ];

        for (value, expected) in tests {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn truthiness() {
        let tests = vec![
            (Value::Integer(0), false),
            (Value::Integer(3), true),
            (Value::Str(String::new()), false),
            (Value::Str("x".to_string()), true),
            (Value::Boolean(false), false),
            (Value::Nil, false),
        ];

        for (value, expected) in tests {
            assert_eq!(value.is_truthy(), expected);
        }
    }

    #[test]
    fn numeric_equality_crosses_tags() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::Str("2".to_string()));
    }

    #[test]
    fn instance_handles_alias_properties() {
        let a = Instance::new("Counter");
        let b = a.clone();
        b.set_prop("n", Value::Integer(10));
        assert_eq!(a.get_prop("n"), Some(Value::Integer(10)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Instance::new("Counter")));
    }
}
