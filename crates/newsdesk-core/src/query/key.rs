//! Cache keys.

use serde_json::Value;
use std::fmt;

/// Canonical cache key.
///
/// Keys built from the same procedure path and an equal JSON input compare equal
/// regardless of object field order (`serde_json` maps are ordered).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Key for a procedure call.
    pub fn procedure(path: &str, input: &Value) -> Self {
        Self(Value::Array(vec![Value::String(path.to_string()), input.clone()]).to_string())
    }

    /// Key from plain string parts, for data not tied to a procedure.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<Value> = parts.into_iter().map(|p| Value::String(p.into())).collect();
        Self(Value::Array(parts).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"search":"rust","limit":5}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"limit":5,"search":"rust"}"#).unwrap();
        assert_eq!(QueryKey::procedure("news.list", &a), QueryKey::procedure("news.list", &b));
    }

    #[test]
    fn test_input_distinguishes_keys() {
        assert_ne!(
            QueryKey::procedure("news.byId", &json!(1)),
            QueryKey::procedure("news.byId", &json!(2))
        );
        assert_eq!(QueryKey::from_parts(["a", "b"]).as_str(), r#"["a","b"]"#);
    }
}
