//! Column values
//!
//! [`Value`] is the tagged scalar used for record columns and for filter
//! operands. It is always sent to the database as a bound parameter.
//!
//! ```rust
//! use acton_store::Value;
//!
//! let name: Value = "alice".into();
//! let age: Value = 42_i64.into();
//! let missing: Value = None::<String>.into();
//!
//! assert_eq!(name.as_text(), Some("alice"));
//! assert_eq!(age, Value::Integer(42));
//! assert!(missing.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use crate::database::Db;

/// A single scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// SQL NULL
    Null,
    /// Text value
    Text(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Whether the value counts as "nothing given": NULL or empty text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Borrow the text if this is a text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Append this value to a query as a bound parameter
    pub(crate) fn push_bind(&self, qb: &mut QueryBuilder<'static, Db>) {
        match self {
            Self::Null => qb.push_bind(None::<String>),
            Self::Text(s) => qb.push_bind(s.clone()),
            Self::Integer(n) => qb.push_bind(*n),
            Self::Float(n) => qb.push_bind(*n),
            Self::Boolean(b) => qb.push_bind(*b),
            Self::Timestamp(t) => qb.push_bind(*t),
        };
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from("a"), Value::Text("a".to_string()));
        assert_eq!(Value::from(7_i32), Value::Integer(7));
        assert_eq!(Value::from(7_u32), Value::Integer(7));
        assert_eq!(Value::from(1.5_f64), Value::Float(1.5));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(Some(3_i64)), Value::Integer(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_is_empty() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(!Value::from(" ").is_empty());
        assert!(!Value::Integer(0).is_empty());
        assert!(!Value::Boolean(false).is_empty());
    }

    #[test]
    fn test_serde_is_tagged() {
        let json = serde_json::to_value(Value::Integer(3)).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "integer", "value": 3}));
        let back: Value = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, Value::Integer(3));
    }

    #[test]
    fn test_push_bind_uses_placeholders() {
        let mut qb: QueryBuilder<'static, Db> = QueryBuilder::new("SELECT ");
        Value::from("x").push_bind(&mut qb);
        qb.push(", ");
        Value::Null.push_bind(&mut qb);
        assert_eq!(qb.sql(), "SELECT ?, ?");
    }
}
