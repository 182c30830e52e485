//! Safe value serialization.
//!
//! Produces bounded human-readable text for any page value, including
//! cyclic graphs, throwing getters and values JSON cannot express. Output is
//! raw text; HTML escaping happens at render time.

use std::cell::Cell;

use common::limits::{MAX_OBJECT_KEYS, MAX_SERIALIZE_DEPTH};
use common::time::iso_string;
use common::value::number_to_string;
use common::{Thrown, Value};

pub const MAX_DEPTH_SENTINEL: &str = "[Max Depth Reached]";
pub const KEY_ERROR_SENTINEL: &str = "[Error serializing]";
pub const NON_SERIALIZABLE_SENTINEL: &str = "[Circular or Non-Serializable Object]";
pub const OBJECT_OVERFLOW_MARKER: &str = "...";

/// Nodes visited per top-level call. Wide cyclic graphs grow as
/// `keys^depth`, so the depth cap alone does not bound the work. Containers
/// cut short by the budget end with the overflow marker.
const NODE_BUDGET: usize = 50_000;

/// Serialize a value from the top level.
pub fn serialize(value: &Value) -> String {
    serialize_at(value, 0)
}

/// Serialize a value that sits `depth` levels below the top.
pub fn serialize_at(value: &Value, depth: usize) -> String {
    Serializer::new().value(value, depth)
}

struct Serializer {
    remaining: Cell<usize>,
}

impl Serializer {
    fn new() -> Self {
        Self {
            remaining: Cell::new(NODE_BUDGET),
        }
    }

    fn value(&self, value: &Value, depth: usize) -> String {
        if depth > MAX_SERIALIZE_DEPTH {
            return MAX_DEPTH_SENTINEL.to_string();
        }
        let remaining = self.remaining.get();
        if remaining == 0 {
            return MAX_DEPTH_SENTINEL.to_string();
        }
        self.remaining.set(remaining - 1);

        match self.try_value(value, depth) {
            Ok(text) => text,
            Err(thrown) => {
                tracing::trace!(error = %thrown, "value is not serializable");
                NON_SERIALIZABLE_SENTINEL.to_string()
            }
        }
    }

    fn exhausted(&self) -> bool {
        self.remaining.get() == 0
    }

    fn try_value(&self, value: &Value, depth: usize) -> Result<String, Thrown> {
        match value {
            Value::Null => Ok("null".to_string()),
            Value::Undefined => Ok("undefined".to_string()),
            Value::Function(name) => Ok(format!(
                "[Function: {}]",
                name.as_deref().filter(|n| !n.is_empty()).unwrap_or("anonymous")
            )),
            Value::Symbol(_) => Ok(value.to_js_string()),
            Value::Date(ms) => iso_string(*ms).ok_or_else(|| Thrown::new("Invalid time value")),
            Value::RegExp { .. } => Ok(value.to_js_string()),
            Value::Error {
                name,
                message,
                stack,
            } => {
                let mut fields = vec![
                    ("name", Value::String(name.clone())),
                    ("message", Value::String(message.clone())),
                ];
                if let Some(stack) = stack {
                    fields.push(("stack", Value::String(stack.clone())));
                }
                let pairs = fields
                    .iter()
                    .map(|(key, v)| format!("\"{}\": {}", key, self.value(v, depth + 1)))
                    .collect::<Vec<_>>();
                // Stack traces read better with real line breaks.
                Ok(format!("{{{}}}", pairs.join(", ")).replace("\\n", "\n"))
            }
            Value::Array(array) => {
                let items = array.items();
                let mut rendered = Vec::with_capacity(items.len());
                for item in &items {
                    if self.exhausted() {
                        rendered.push(OBJECT_OVERFLOW_MARKER.to_string());
                        break;
                    }
                    rendered.push(self.value(item, depth + 1));
                }
                Ok(format!("({}) [{}]", items.len(), rendered.join(", ")))
            }
            Value::Object(object) => {
                let keys = object.own_keys()?;
                let mut pairs = Vec::new();
                let mut cut_short = false;
                for key in keys.iter().take(MAX_OBJECT_KEYS) {
                    if self.exhausted() {
                        cut_short = true;
                        break;
                    }
                    let text = match object.get(key) {
                        Ok(v) => self.value(&v, depth + 1),
                        Err(_) => KEY_ERROR_SENTINEL.to_string(),
                    };
                    pairs.push(format!("\"{}\": {}", key, text));
                }
                let overflow = if cut_short || keys.len() > MAX_OBJECT_KEYS {
                    OBJECT_OVERFLOW_MARKER
                } else {
                    ""
                };
                Ok(format!("{{{}{}}}", pairs.join(", "), overflow))
            }
            Value::String(s) => {
                serde_json::to_string(s).map_err(|e| Thrown::new(e.to_string()))
            }
            Value::Number(n) if n.is_finite() => Ok(number_to_string(*n)),
            Value::Number(_) => Ok("null".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::BigInt(_) => Err(Thrown::new("Do not know how to serialize a BigInt")),
        }
    }
}
