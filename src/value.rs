//! Value wrapper that can represent any YAML value type (scalar, sequence, mapping).

use crate::builder::BlockBuilder;
use crate::path::YamlPath;
use crate::scalar::{ScalarStyle, ScalarType, ScalarValue};
use indexmap::IndexMap;
use std::fmt;

/// Represents any YAML value - scalar, sequence, or mapping
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// A scalar value (string, number, boolean, null)
    Scalar(ScalarValue),
    /// A sequence of values (list/array)
    Sequence(Vec<YamlValue>),
    /// A mapping of key-value pairs, in insertion order
    Mapping(IndexMap<String, YamlValue>),
}

impl YamlValue {
    /// Create a scalar value
    pub fn scalar(value: impl Into<ScalarValue>) -> Self {
        YamlValue::Scalar(value.into())
    }

    /// Create a null value
    pub fn null() -> Self {
        YamlValue::Scalar(ScalarValue::null())
    }

    /// Create an empty sequence
    pub fn sequence() -> Self {
        YamlValue::Sequence(Vec::new())
    }

    /// Create an empty mapping
    pub fn mapping() -> Self {
        YamlValue::Mapping(IndexMap::new())
    }

    /// Create a mapping from key-value pairs, keeping their order
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<YamlValue>,
    {
        YamlValue::Mapping(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Check if this is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, YamlValue::Scalar(_))
    }

    /// Check if this is a null scalar
    pub fn is_null(&self) -> bool {
        matches!(self, YamlValue::Scalar(scalar) if scalar.is_null())
    }

    /// Check if this is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, YamlValue::Sequence(_))
    }

    /// Check if this is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, YamlValue::Mapping(_))
    }

    /// Get as scalar if this is a scalar
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            YamlValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Get as sequence if this is a sequence
    pub fn as_sequence(&self) -> Option<&Vec<YamlValue>> {
        match self {
            YamlValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Get as mapping if this is a mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, YamlValue>> {
        match self {
            YamlValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Get as mutable mapping if this is a mapping
    pub fn as_mapping_mut(&mut self) -> Option<&mut IndexMap<String, YamlValue>> {
        match self {
            YamlValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a descendant by path. Numeric keys select sequence items.
    pub fn get(&self, path: &YamlPath) -> Option<&YamlValue> {
        path.segments()
            .iter()
            .try_fold(self, |value, segment| match (value, segment) {
                (YamlValue::Mapping(map), segment) => map.get(&segment.as_key()),
                (YamlValue::Sequence(items), segment) => {
                    segment.as_index().and_then(|index| items.get(index))
                }
                (YamlValue::Scalar(_), _) => None,
            })
    }

    /// Convert to YAML block text with two-space indentation, starting at column `indent`
    pub fn to_yaml_string(&self, indent: usize) -> String {
        match self {
            YamlValue::Scalar(s) if s.is_block() => s.to_block_string(indent + 2),
            YamlValue::Scalar(s) => s.to_yaml_string(),
            YamlValue::Sequence(seq) if seq.is_empty() => "[]".to_string(),
            YamlValue::Mapping(map) if map.is_empty() => "{}".to_string(),
            YamlValue::Sequence(seq) => {
                let mut builder = BlockBuilder::new(2, &[]);
                builder.sequence_items(seq, indent, &YamlPath::root());
                builder.into_text().trim_end().to_string()
            }
            YamlValue::Mapping(map) => {
                let mut builder = BlockBuilder::new(2, &[]);
                builder.mapping_entries(map, indent, &YamlPath::root());
                builder.into_text().trim_end().to_string()
            }
        }
    }

    /// Convert to a single-line flow representation such as `{name: a, port: 1}`
    pub fn to_flow_string(&self) -> String {
        match self {
            YamlValue::Scalar(s) => flow_scalar(s),
            YamlValue::Sequence(seq) => {
                let items: Vec<String> = seq.iter().map(YamlValue::to_flow_string).collect();
                format!("[{}]", items.join(", "))
            }
            YamlValue::Mapping(map) => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(key, value)| {
                        format!("{}: {}", flow_scalar(&ScalarValue::new(key.as_str())), value.to_flow_string())
                    })
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
        }
    }

    /// Convert to a JSON value. Scalars keep their resolved type; integers
    /// that do not fit a JSON number and non-finite floats become strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            YamlValue::Scalar(s) => match s.scalar_type() {
                ScalarType::Null => Value::Null,
                ScalarType::Boolean => Value::Bool(s.value().eq_ignore_ascii_case("true")),
                ScalarType::Integer => parse_integer(s.value())
                    .map(Value::from)
                    .unwrap_or_else(|| Value::String(s.value().to_string())),
                ScalarType::Float => s
                    .value()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(s.value().to_string())),
                ScalarType::String => Value::String(s.value().to_string()),
            },
            YamlValue::Sequence(seq) => Value::Array(seq.iter().map(YamlValue::to_json).collect()),
            YamlValue::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = digits.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn flow_scalar(scalar: &ScalarValue) -> String {
    match scalar.style() {
        ScalarStyle::Literal | ScalarStyle::Folded => {
            ScalarValue::double_quoted(scalar.value()).to_yaml_string()
        }
        _ => {
            let text = scalar.to_yaml_string();
            let quoted = text.starts_with(['\'', '"']);
            if scalar.scalar_type() == ScalarType::String
                && !quoted
                && text.contains([',', '[', ']', '{', '}'])
            {
                ScalarValue::single_quoted(scalar.value()).to_yaml_string()
            } else {
                text
            }
        }
    }
}

impl fmt::Display for YamlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yaml_string(0))
    }
}

impl From<serde_json::Value> for YamlValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => YamlValue::null(),
            Value::Bool(b) => YamlValue::from(b),
            Value::Number(n) => {
                let scalar_type = if n.is_f64() {
                    ScalarType::Float
                } else {
                    ScalarType::Integer
                };
                YamlValue::Scalar(ScalarValue::typed(n.to_string(), scalar_type))
            }
            Value::String(s) => YamlValue::from(s),
            Value::Array(items) => YamlValue::Sequence(items.into_iter().map(YamlValue::from).collect()),
            Value::Object(map) => {
                YamlValue::Mapping(map.into_iter().map(|(k, v)| (k, YamlValue::from(v))).collect())
            }
        }
    }
}

// Convenience conversions from common types
impl From<String> for YamlValue {
    fn from(value: String) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<&str> for YamlValue {
    fn from(value: &str) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<i32> for YamlValue {
    fn from(value: i32) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<i64> for YamlValue {
    fn from(value: i64) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<f64> for YamlValue {
    fn from(value: f64) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<bool> for YamlValue {
    fn from(value: bool) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<ScalarValue> for YamlValue {
    fn from(value: ScalarValue) -> Self {
        YamlValue::Scalar(value)
    }
}

impl<T> From<Vec<T>> for YamlValue
where
    T: Into<YamlValue>,
{
    fn from(vec: Vec<T>) -> Self {
        YamlValue::Sequence(vec.into_iter().map(Into::into).collect())
    }
}

impl<K, V> From<IndexMap<K, V>> for YamlValue
where
    K: Into<String>,
    V: Into<YamlValue>,
{
    fn from(map: IndexMap<K, V>) -> Self {
        YamlValue::from_pairs(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_value() {
        let val = YamlValue::from("hello");
        assert!(val.is_scalar());
        assert_eq!(val.to_yaml_string(0), "hello");

        let val = YamlValue::from(42);
        assert_eq!(val.to_yaml_string(0), "42");

        let val = YamlValue::from(true);
        assert_eq!(val.to_yaml_string(0), "true");
    }

    #[test]
    fn test_sequence_value() {
        let val = YamlValue::from(vec!["item1", "item2"]);
        assert!(val.is_sequence());
        assert_eq!(val.to_yaml_string(0), "- item1\n- item2");

        assert_eq!(YamlValue::sequence().to_yaml_string(0), "[]");
    }

    #[test]
    fn test_mapping_keeps_insertion_order() {
        let val = YamlValue::from_pairs([("version", "1.0.0"), ("name", "project")]);
        assert_eq!(val.to_yaml_string(0), "version: 1.0.0\nname: project");

        assert_eq!(YamlValue::mapping().to_yaml_string(0), "{}");
    }

    #[test]
    fn test_nested_structure() {
        let val = YamlValue::from(json!({
            "name": "app",
            "database": {"host": "localhost", "port": 5432},
            "features": ["auth", "logging"]
        }));
        assert_eq!(
            val.to_yaml_string(0),
            "name: app\ndatabase:\n  host: localhost\n  port: 5432\nfeatures:\n  - auth\n  - logging"
        );
    }

    #[test]
    fn test_json_conversion_keeps_types() {
        let json = json!({"port": 35729, "ratio": 0.5, "on": true, "none": null, "path": "webapp"});
        let value = YamlValue::from(json.clone());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_to_json_resolves_yaml_integers() {
        let value = YamlValue::Scalar(ScalarValue::typed("0x1F", ScalarType::Integer));
        assert_eq!(value.to_json(), json!(31));
    }

    #[test]
    fn test_flow_string() {
        let value = YamlValue::from(json!({"name": "a,b", "list": [1, "x"]}));
        assert_eq!(value.to_flow_string(), "{name: 'a,b', list: [1, x]}");
    }

    #[test]
    fn test_get_by_path() {
        let value = YamlValue::from(json!({"backend": [{"url": "http://localhost"}]}));
        let path = YamlPath::parse("backend.0.url").unwrap();
        assert_eq!(value.get(&path), Some(&YamlValue::from("http://localhost")));
        assert_eq!(value.get(&YamlPath::parse("backend[1]").unwrap()), None);
    }
}
