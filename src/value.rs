use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Closed set of kinds a literal or sub-expression can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ValueKind {
    Boolean,
    Integer,
    Text,
}

/// A kind-tagged value, either from a literal in the expression or from the caller's variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

/// Variable environment consulted while parsing.
pub type Variables = HashMap<String, Value>;

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Text(_) => ValueKind::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Rejection of caller data that has no `Value` counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unsupported value for variable '{name}': {found}")]
    Unsupported { name: String, found: String },
    #[error("variables must be a JSON object, found: {0}")]
    NotAnObject(String),
}

/// Converts one JSON value. Only booleans, integers fitting an i64 and strings are accepted.
pub fn value_from_json(name: &str, json: &serde_json::Value) -> Result<Value, ValueError> {
    let unsupported =
        || ValueError::Unsupported { name: name.to_string(), found: json.to_string() };

    match json {
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Integer).ok_or_else(unsupported),
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        _ => Err(unsupported()),
    }
}

/// Builds a variable environment from a JSON object, failing on the first unsupported entry.
pub fn variables_from_json(json: &serde_json::Value) -> Result<Variables, ValueError> {
    let object = json.as_object().ok_or_else(|| ValueError::NotAnObject(json.to_string()))?;

    let mut variables = Variables::with_capacity(object.len());
    for (name, value) in object {
        variables.insert(name.clone(), value_from_json(name, value)?);
    }
    Ok(variables)
}
