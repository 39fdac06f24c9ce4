//! Scalar values as they come out of hypercube cells and expression evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single normalized engine value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ScalarValue {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Display-text form used when sending values back to the engine
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Number(f64::from(value))
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text() {
        assert_eq!(ScalarValue::from(2020).display_text(), "2020");
        assert_eq!(ScalarValue::from(1.5).display_text(), "1.5");
        assert_eq!(ScalarValue::from("Sweden").display_text(), "Sweden");
        assert_eq!(ScalarValue::Null.display_text(), "");
    }

    #[test]
    fn test_untagged_serialization() {
        assert_eq!(serde_json::to_string(&ScalarValue::from(3)).unwrap(), "3.0");
        assert_eq!(serde_json::to_string(&ScalarValue::from("a")).unwrap(), "\"a\"");
        assert_eq!(serde_json::to_string(&ScalarValue::Null).unwrap(), "null");
    }
}
