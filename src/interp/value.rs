//! Runtime values for the interpreter

use crate::ast::{Block, Span, Spanned};
use crate::interp::env::EnvRef;
use crate::interp::error::{EvalResult, RuntimeError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Signature of a native builtin: call span plus evaluated arguments
pub type BuiltinFn = fn(Span, &[Value]) -> EvalResult<Value>;

/// A native function exposed to user code
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// A user function value: parameters, body and the captured environment
///
/// The environment is captured by reference, not copied; calling the
/// function evaluates the body in a child of it (lexical closure).
pub struct Function {
    pub params: Vec<Spanned<String>>,
    pub body: Block,
    pub env: EnvRef,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured environment may point back at this function; print
        // the signature only
        let params: Vec<&str> = self.params.iter().map(|p| p.node.as_str()).collect();
        write!(f, "Function(fn({}))", params.join(", "))
    }
}

/// An entry in a map: the original key value alongside the stored value
///
/// The key value is kept so inspection can print `{k : v}`; the digest in
/// the surrounding table cannot be turned back into a key.
#[derive(Debug, Clone)]
pub struct MapPair {
    pub key: Value,
    pub value: Value,
}

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// Shared, mutable in place; aliases observe each other's mutations
    Array(Rc<RefCell<Vec<Value>>>),
    /// Shared, keyed by [`HashKey`]
    Map(Rc<RefCell<HashMap<HashKey, MapPair>>>),
    Function(Rc<Function>),
    Builtin(&'static Builtin),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn map(entries: HashMap<HashKey, MapPair>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Coerce to a boolean for conditionals and short-circuit operators
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Array(_) | Value::Map(_) | Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Function(_) => "fn",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Render the value the way the shell shows results
    ///
    /// Strings print raw at the top level but double-quoted inside arrays
    /// and maps; floats always carry six fractional digits.
    pub fn inspect(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.inspect_nested(),
        }
    }

    fn inspect_nested(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(x) => format!("{x:.6}"),
            Value::Str(s) => format!("\"{s}\""),
            Value::Bool(b) => b.to_string(),
            Value::Null => "Null".to_string(),
            Value::Array(elements) => {
                let elements: Vec<String> =
                    elements.borrow().iter().map(|e| e.inspect_nested()).collect();
                format!("[{}]", elements.join(", "))
            }
            Value::Map(entries) => {
                let entries: Vec<String> = entries
                    .borrow()
                    .values()
                    .map(|pair| {
                        format!("{} : {}", pair.key.inspect_nested(), pair.value.inspect_nested())
                    })
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Value::Function(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.node.as_str()).collect();
                format!("fn({}) {}", params.join(", "), func.body)
            }
            Value::Builtin(_) => "builtin function".to_string(),
        }
    }

    /// Canonical hash key, or an error for unhashable types
    pub fn hash_key(&self, span: Span) -> EvalResult<HashKey> {
        match self {
            Value::Int(n) => Ok(HashKey {
                tag: HashTag::Int,
                value: *n as u64,
            }),
            Value::Bool(b) => Ok(HashKey {
                tag: HashTag::Bool,
                value: *b as u64,
            }),
            Value::Str(s) => Ok(HashKey {
                tag: HashTag::Str,
                value: fnv1a(s.as_bytes()),
            }),
            other => Err(RuntimeError::unhashable_key(other.type_name(), span)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Type discriminant of a hashable value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashTag {
    Int,
    Bool,
    Str,
}

/// Canonical, comparable summary of a hashable value used to index maps
///
/// Integers and booleans map through their bit patterns; strings are
/// digested with 64-bit FNV-1a. Floats, arrays, maps and functions are
/// not hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub tag: HashTag,
    pub value: u64,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x1_0000_0001_b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
