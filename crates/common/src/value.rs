//! Values of the monitored page context.
//!
//! Arrays and objects are shared handles, so a value graph can contain
//! cycles exactly like page objects do. Object properties can be accessors
//! whose getter throws, and an object can refuse key enumeration entirely;
//! both are failure modes the formatters have to survive.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::limits::MAX_SERIALIZE_DEPTH;
use crate::time::iso_string;

/// An exception thrown inside the page context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thrown {
    pub message: String,
}

impl Thrown {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Thrown {}

/// Accessor property getter.
pub type Getter = Arc<dyn Fn() -> Result<Value, Thrown> + Send + Sync>;

/// An own property of an object.
#[derive(Clone)]
pub enum Property {
    Data(Value),
    Accessor(Getter),
}

impl Property {
    /// Read the property, running the getter for accessors.
    pub fn read(&self) -> Result<Value, Thrown> {
        match self {
            Property::Data(value) => Ok(value.clone()),
            Property::Accessor(getter) => getter(),
        }
    }
}

#[derive(Default)]
struct ObjectData {
    properties: IndexMap<String, Property>,
    /// Set for objects whose key enumeration throws (revoked proxies).
    keys_error: Option<String>,
}

/// Shared handle to a page object.
#[derive(Clone, Default)]
pub struct JsObject(Arc<RwLock<ObjectData>>);

impl JsObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// An object whose key enumeration always throws.
    pub fn revoked(reason: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(ObjectData {
            properties: IndexMap::new(),
            keys_error: Some(reason.into()),
        })))
    }

    /// Set a data property, keeping insertion order for new keys.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0
            .write()
            .properties
            .insert(key.into(), Property::Data(value.into()));
    }

    /// Define an accessor property.
    pub fn define_getter<F>(&self, key: impl Into<String>, getter: F)
    where
        F: Fn() -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        self.0
            .write()
            .properties
            .insert(key.into(), Property::Accessor(Arc::new(getter)));
    }

    /// Own enumerable keys in enumeration order.
    pub fn own_keys(&self) -> Result<Vec<String>, Thrown> {
        let data = self.0.read();
        if let Some(reason) = &data.keys_error {
            return Err(Thrown::new(reason.clone()));
        }
        Ok(data.properties.keys().cloned().collect())
    }

    /// Read a property. Missing keys read as `undefined`.
    pub fn get(&self, key: &str) -> Result<Value, Thrown> {
        // Clone the property out so a getter can touch this object again.
        let property = self.0.read().properties.get(key).cloned();
        match property {
            Some(property) => property.read(),
            None => Ok(Value::Undefined),
        }
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.0.read().properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never recurse: the graph may be cyclic.
        f.debug_struct("JsObject").field("keys", &self.len()).finish()
    }
}

/// Shared handle to a page array.
#[derive(Clone, Default)]
pub struct JsArray(Arc<RwLock<Vec<Value>>>);

impl JsArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, `undefined` when out of range.
    pub fn get(&self, index: usize) -> Value {
        self.0.read().get(index).cloned().unwrap_or(Value::Undefined)
    }

    /// Snapshot of the elements.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &JsArray) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for JsArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsArray").field("len", &self.len()).finish()
    }
}

/// A page value.
#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    /// Decimal digits of a big integer.
    BigInt(String),
    String(String),
    /// Symbol with optional description.
    Symbol(Option<String>),
    /// Function with its name (`None` for anonymous).
    Function(Option<String>),
    /// Date as epoch milliseconds (`NaN` for an invalid date).
    Date(f64),
    RegExp { source: String, flags: String },
    Error {
        name: String,
        message: String,
        stack: Option<String>,
    },
    Array(JsArray),
    Object(JsObject),
}

impl Value {
    /// Build an object from key/value pairs.
    pub fn object<K, V, I>(pairs: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let object = JsObject::new();
        for (key, value) in pairs {
            object.set(key, value);
        }
        Value::Object(object)
    }

    /// Build an array from values.
    pub fn array<V, I>(items: I) -> Value
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Array(JsArray::from_vec(items.into_iter().map(Into::into).collect()))
    }

    /// Build an error value.
    pub fn error(name: impl Into<String>, message: impl Into<String>, stack: Option<&str>) -> Value {
        Value::Error {
            name: name.into(),
            message: message.into(),
            stack: stack.map(str::to_string),
        }
    }

    /// The page's `typeof` for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Null
            | Value::Date(_)
            | Value::RegExp { .. }
            | Value::Error { .. }
            | Value::Array(_)
            | Value::Object(_) => "object",
        }
    }

    /// Non-null object (including arrays, dates, errors, regexps).
    pub fn is_object(&self) -> bool {
        self.type_of() == "object" && !matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The page's `String(value)` conversion.
    pub fn to_js_string(&self) -> String {
        self.to_js_string_at(0)
    }

    fn to_js_string_at(&self, depth: usize) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::BigInt(digits) => digits.clone(),
            Value::String(s) => s.clone(),
            Value::Symbol(desc) => format!("Symbol({})", desc.as_deref().unwrap_or("")),
            Value::Function(name) => {
                format!("function {}() {{ [native code] }}", name.as_deref().unwrap_or(""))
            }
            Value::Date(ms) => iso_string(*ms).unwrap_or_else(|| "Invalid Date".to_string()),
            Value::RegExp { source, flags } => format!("/{}/{}", source, flags),
            Value::Error { name, message, .. } => {
                if message.is_empty() {
                    name.clone()
                } else {
                    format!("{}: {}", name, message)
                }
            }
            Value::Array(array) => {
                // Cyclic arrays join to an empty string at the cut.
                if depth >= MAX_SERIALIZE_DEPTH {
                    return String::new();
                }
                array
                    .items()
                    .iter()
                    .map(|item| match item {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_js_string_at(depth + 1),
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
            Value::Object(_) => "[object Object]".to_string(),
        }
    }
}

/// Number to string the way the page prints numbers.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
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

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<JsObject> for Value {
    fn from(o: JsObject) -> Self {
        Value::Object(o)
    }
}

impl From<JsArray> for Value {
    fn from(a: JsArray) -> Self {
        Value::Array(a)
    }
}
