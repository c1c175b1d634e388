//! Cache Key Module
//!
//! Key type checking and the reserved-character legality rule.

use serde_json::Value;

use crate::error::{CacheError, Result};

// == Reserved Characters ==
/// Characters that may never appear in a cache key.
pub const RESERVED_CHARACTERS: [char; 8] = ['{', '}', '(', ')', '/', '\\', '@', ':'];

// == Key Argument ==
/// An argument that may be used as a cache key.
///
/// String types always pass; a JSON value passes only when it is a string.
pub trait KeyArg {
    /// Returns the key text, or the name of the type actually given.
    fn as_key(&self) -> std::result::Result<&str, &'static str>;
}

impl KeyArg for str {
    fn as_key(&self) -> std::result::Result<&str, &'static str> {
        Ok(self)
    }
}

impl KeyArg for String {
    fn as_key(&self) -> std::result::Result<&str, &'static str> {
        Ok(self.as_str())
    }
}

impl<K: KeyArg + ?Sized> KeyArg for &K {
    fn as_key(&self) -> std::result::Result<&str, &'static str> {
        (**self).as_key()
    }
}

impl KeyArg for Value {
    fn as_key(&self) -> std::result::Result<&str, &'static str> {
        match self {
            Value::String(key) => Ok(key.as_str()),
            other => Err(json_type_name(other)),
        }
    }
}

// == Legality ==
/// Returns true if `key` contains none of the reserved characters.
///
/// Empty and very long keys are legal.
pub fn is_legal_key(key: &str) -> bool {
    !key.contains(RESERVED_CHARACTERS)
}

/// Fails with `InvalidArgument` if `key` contains a reserved character.
pub fn validate_key(key: &str) -> Result<()> {
    if is_legal_key(key) {
        Ok(())
    } else {
        Err(CacheError::InvalidArgument(format!(
            "{} is not a legal key",
            key
        )))
    }
}

/// Name of a JSON value's type as reported in type mismatch errors.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
