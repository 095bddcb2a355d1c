use std::fmt;
use super::{ContextError, Result};

/// A value handed to a write path.
///
/// Relation data and leader settings are textual configuration. Only
/// `Text` is stored; `Null` removes the key. Everything else, including
/// raw bytes that happen to be valid UTF-8, is rejected before the
/// environment is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BYTES",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Boolean(_) => "BOOLEAN",
        }
    }
}

/// Checks a value bound for `key` and returns what the environment
/// should receive: `Some(text)` to store, `None` as the removal sentinel.
pub fn validate_value(key: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Text(text) => Ok(Some(text)),
        Value::Null => Ok(None),
        other => Err(ContextError::InvalidValueType {
            key: key.to_string(),
            found: other.type_name(),
        }),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Text(s) => write!(f, "{}", s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_passes() {
        assert_eq!(
            validate_value("k", "value".into()).unwrap(),
            Some("value".to_string())
        );
        assert_eq!(
            validate_value("k", String::from("value").into()).unwrap(),
            Some("value".to_string())
        );
    }

    #[test]
    fn test_null_is_removal() {
        assert_eq!(validate_value("k", Value::Null).unwrap(), None);
        assert_eq!(validate_value("k", Option::<&str>::None.into()).unwrap(), None);
    }

    #[test]
    fn test_bytes_rejected_even_when_utf8() {
        let err = validate_value("k", b"value".into()).unwrap_err();
        assert!(matches!(
            err,
            ContextError::InvalidValueType { found: "BYTES", .. }
        ));
    }

    #[test]
    fn test_non_text_rejected() {
        assert!(validate_value("k", Value::Integer(42)).unwrap_err().is_invalid_value());
        assert!(validate_value("k", Value::Float(4.2)).unwrap_err().is_invalid_value());
        assert!(validate_value("k", true.into()).unwrap_err().is_invalid_value());
    }
}
