//! Runtime values.
//!
//! Lists and maps are shared containers: cloning a [`Value::List`] or
//! [`Value::Map`] clones the reference, so writes through one holder are seen
//! by every other holder. Container locks are only ever held for a single
//! read or write, never while evaluating, so nested evaluation cannot
//! deadlock on them.

use crate::closure::Closure;
use crate::error::EvalError;
use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value as Json;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub type ListRef = Arc<Mutex<Vec<Value>>>;
pub type MapRef = Arc<Mutex<IndexMap<String, Value>>>;

/// A dynamically typed runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(ListRef),
    Map(MapRef),
    Closure(Arc<Closure>),
    Pattern(Arc<Regex>),
    Native(NativeHandle),
    Host(HostFn),
}

/// An opaque object handed out by a host collaborator (a database result, a
/// timer handle, ...). Members are reachable from programs through `do`.
pub trait NativeObject: Send + Sync + 'static {
    fn type_name(&self) -> &'static str;

    /// Looks up a named member. Callable members are returned as [`Value::Host`].
    fn member(&self, _name: &str) -> Option<Value> {
        None
    }

    fn to_json(&self) -> Json {
        Json::String(format!("<{}>", self.type_name()))
    }

    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone)]
pub struct NativeHandle(Arc<dyn NativeObject>);

impl NativeHandle {
    pub fn new<T: NativeObject>(object: T) -> Self {
        NativeHandle(Arc::new(object))
    }

    pub fn from_arc(object: Arc<dyn NativeObject>) -> Self {
        NativeHandle(object)
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn member(&self, name: &str) -> Option<Value> {
        self.0.member(name)
    }

    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &NativeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub type HostFnImpl = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A host-provided function callable from programs via `do`.
#[derive(Clone)]
pub struct HostFn {
    name: Arc<str>,
    func: Arc<HostFnImpl>,
}

impl HostFn {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        HostFn {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &HostFn) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Arc::new(Mutex::new(items)))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Value {
        Value::Map(Arc::new(Mutex::new(entries)))
    }

    pub fn empty_map() -> Value {
        Value::map(IndexMap::new())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Closure(_) => "closure",
            Value::Pattern(_) => "pattern",
            Value::Native(n) => n.type_name(),
            Value::Host(_) => "host function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Host(_))
    }

    /// Invokes a closure or host function. Other kinds are a type mismatch.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        match self {
            Value::Closure(closure) => closure.call(args),
            Value::Host(func) => func.call(&args),
            other => Err(EvalError::type_mismatch(format!(
                "{} is not callable",
                other.kind_name()
            ))),
        }
    }

    /// Integer coercion used by arithmetic and comparison: numeric strings
    /// parse, floats truncate toward zero.
    pub fn to_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(n);
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
                    _ => Err(EvalError::type_mismatch(format!(
                        "\"{s}\" is not an integer"
                    ))),
                }
            }
            other => Err(EvalError::type_mismatch(format!(
                "{} cannot be used as an integer",
                other.kind_name()
            ))),
        }
    }

    /// String coercion used by `format`, `in` and dedup keys.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => (f.trunc() as i64).to_string(),
            Value::Pattern(re) => re.as_str().to_string(),
            other => other.to_json().to_string(),
        }
    }

    /// Coerces to a sequence: lists yield their elements, null yields nothing,
    /// any other value is a one-element sequence.
    pub fn to_elements(&self) -> Vec<Value> {
        match self {
            Value::List(items) => items.lock().clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        }
    }

    /// Reads `self[key]`. `None` means the key is absent.
    pub fn member(&self, key: &Value) -> Option<Value> {
        match self {
            Value::List(items) => {
                let index = key.as_index()?;
                items.lock().get(index).cloned()
            }
            Value::Map(entries) => {
                let name = key.as_key()?;
                entries.lock().get(&name).cloned()
            }
            Value::Native(handle) => handle.member(key.as_str()?),
            _ => None,
        }
    }

    /// Writes `self[key] = value` in place. An out-of-range list index is
    /// ignored; writing into a scalar is a type mismatch.
    pub fn assign(&self, key: &Value, value: Value) -> Result<(), EvalError> {
        match self {
            Value::List(items) => {
                let index = key.as_index().ok_or_else(|| {
                    EvalError::type_mismatch(format!(
                        "list index must be an integer, got {}",
                        key.kind_name()
                    ))
                })?;
                let previous = {
                    let mut items = items.lock();
                    items
                        .get_mut(index)
                        .map(|slot| std::mem::replace(slot, value))
                };
                drop(previous);
                Ok(())
            }
            Value::Map(entries) => {
                let name = key.as_key().ok_or_else(|| {
                    EvalError::type_mismatch(format!(
                        "map key must be a string or integer, got {}",
                        key.kind_name()
                    ))
                })?;
                let previous = entries.lock().insert(name, value);
                drop(previous);
                Ok(())
            }
            other => Err(EvalError::type_mismatch(format!(
                "cannot assign into {}",
                other.kind_name()
            ))),
        }
    }

    fn as_index(&self) -> Option<usize> {
        match self {
            Value::Int(n) => usize::try_from(*n).ok(),
            Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as usize),
            Value::String(s) => s.parse::<usize>().ok(),
            _ => None,
        }
    }

    fn as_key(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) if f.fract() == 0.0 => Some((*f as i64).to_string()),
            _ => None,
        }
    }

    /// Structural equality: numbers compare numerically, containers deeply,
    /// callables and native handles by identity. A pair of containers met
    /// again while comparing (self-referencing data) counts as equal.
    pub fn structural_eq(&self, other: &Value) -> bool {
        let mut visiting = Vec::new();
        self.structural_eq_inner(other, &mut visiting)
    }

    fn structural_eq_inner(&self, other: &Value, visiting: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize);
                if visiting.contains(&pair) {
                    return true;
                }
                let left = a.lock().clone();
                let right = b.lock().clone();
                visiting.push(pair);
                let equal = left.len() == right.len()
                    && left
                        .iter()
                        .zip(&right)
                        .all(|(x, y)| x.structural_eq_inner(y, visiting));
                visiting.pop();
                equal
            }
            (Value::Map(a), Value::Map(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize);
                if visiting.contains(&pair) {
                    return true;
                }
                let left = a.lock().clone();
                let right = b.lock().clone();
                visiting.push(pair);
                let equal = left.len() == right.len()
                    && left.iter().all(|(k, x)| {
                        right
                            .get(k)
                            .is_some_and(|y| x.structural_eq_inner(y, visiting))
                    });
                visiting.pop();
                equal
            }
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            (Value::Pattern(a), Value::Pattern(b)) => a.as_str() == b.as_str(),
            (Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
            (Value::Host(a), Value::Host(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Hashable identity used for dedup-window membership. Keys of values
    /// that are [`Value::structural_eq`] coincide.
    pub fn identity_key(&self) -> String {
        match self {
            Value::Null => "z:".to_string(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Int(n) => format!("n:{n}"),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                format!("n:{}", *f as i64)
            }
            Value::Float(f) => format!("n:{f}"),
            Value::String(s) => format!("s:{s}"),
            Value::Pattern(re) => format!("r:{}", re.as_str()),
            Value::List(_) | Value::Map(_) => format!("j:{}", self.to_json()),
            Value::Closure(c) => format!("c:{:p}", Arc::as_ptr(c)),
            Value::Native(n) => format!("h:{:p}", Arc::as_ptr(&n.0) as *const ()),
            Value::Host(h) => format!("f:{:p}", Arc::as_ptr(&h.func) as *const ()),
        }
    }

    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::list(items.iter().map(Value::from_json).collect()),
            Json::Object(entries) => Value::map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts to JSON for host boundaries. Self-referencing containers
    /// render the repeated container as `"<cycle>"`.
    pub fn to_json(&self) -> Json {
        let mut seen = Vec::new();
        self.to_json_inner(&mut seen)
    }

    fn to_json_inner(&self, seen: &mut Vec<usize>) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => {
                let id = Arc::as_ptr(items) as usize;
                if seen.contains(&id) {
                    return Json::String("<cycle>".to_string());
                }
                seen.push(id);
                let snapshot = items.lock().clone();
                let out = snapshot.iter().map(|v| v.to_json_inner(seen)).collect();
                seen.pop();
                Json::Array(out)
            }
            Value::Map(entries) => {
                let id = Arc::as_ptr(entries) as usize;
                if seen.contains(&id) {
                    return Json::String("<cycle>".to_string());
                }
                seen.push(id);
                let snapshot = entries.lock().clone();
                let out = snapshot
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_inner(seen)))
                    .collect();
                seen.pop();
                Json::Object(out)
            }
            Value::Closure(c) => Json::String(format!("<function({})>", c.params().join(", "))),
            Value::Pattern(re) => Json::String(re.as_str().to_string()),
            Value::Native(n) => n.0.to_json(),
            Value::Host(h) => Json::String(format!("<host {}>", h.name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Pattern(re) => write!(f, "/{}/", re.as_str()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(_) => write!(f, "List({})", self.to_json()),
            Value::Map(_) => write!(f, "Map({})", self.to_json()),
            Value::Closure(c) => write!(f, "Closure({:?})", c.params()),
            Value::Pattern(re) => write!(f, "Pattern({:?})", re.as_str()),
            Value::Native(n) => write!(f, "Native({})", n.type_name()),
            Value::Host(h) => write!(f, "Host({})", h.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        Value::from_json(json)
    }
}
