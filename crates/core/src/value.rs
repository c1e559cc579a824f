//! The document value type.
//!
//! Every builder output is expressed as a [`Value`]: a closed union of
//! strings, arbitrary-precision numbers, booleans, sequences and ordered
//! mappings. There is no null; an absent attribute is an absent key.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Ordered string-keyed mapping. Insertion order is declaration order;
/// re-inserting an existing key replaces the value in place.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Integer(BigInt),
    Decimal(BigDecimal),
    Boolean(bool),
    Sequence(Vec<Value>),
    Mapping(Map),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Map> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Key lookup on a mapping; `None` for any other variant.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Walks a dotted path such as `flows.PaymentsFlow.whens.2.ifs.0`.
    /// Numeric segments index into sequences.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |current, segment| match current {
                Value::Mapping(map) => map.get(segment),
                Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Number of entries of a mapping or items of a sequence, zero otherwise.
    pub fn len(&self) -> usize {
        match self {
            Value::Mapping(map) => map.len(),
            Value::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence of strings as owned `String`s; non-string items are skipped.
    pub fn string_items(&self) -> Vec<String> {
        self.as_sequence()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert to a `serde_json::Value` through the `Serialize` impl.
    ///
    /// `serde_json::Map` sorts its keys, so declaration order is lost here.
    /// Serialize the `Value` itself when key order matters.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => match i.to_i64() {
                Some(n) => serializer.serialize_i64(n),
                None => serializer.serialize_str(&i.to_string()),
            },
            Value::Decimal(d) => match exact_f64(d) {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&d.to_string()),
            },
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

/// The `f64` for `d` if and only if it reads back as the same decimal.
fn exact_f64(d: &BigDecimal) -> Option<f64> {
    let f = d.to_f64()?;
    if !f.is_finite() {
        return None;
    }
    let back = BigDecimal::from_str(&f.to_string()).ok()?;
    (back == *d).then_some(f)
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(map: IndexMap<String, T>) -> Self {
        Value::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Record-building helpers used by the model's `Value` conversions.
pub(crate) trait MapExt {
    fn put(&mut self, key: &str, value: impl Into<Value>);
    fn put_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>);
}

impl MapExt for Map {
    fn put(&mut self, key: &str, value: impl Into<Value>) {
        self.insert(key.to_owned(), value.into());
    }

    fn put_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(v) = value {
            self.insert(key.to_owned(), v.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut when = Map::new();
        when.put("triggers", vec!["PaymentFailed"]);
        let mut flow = Map::new();
        flow.put("whens", vec![Value::Mapping(when)]);
        let mut flows = Map::new();
        flows.put("PaymentsFlow", flow);
        let mut root = Map::new();
        root.put("flows", flows);
        Value::Mapping(root)
    }

    #[test]
    fn lookup_walks_mappings_and_sequences() {
        let doc = sample();
        let triggers = doc.lookup("flows.PaymentsFlow.whens.0.triggers").unwrap();
        assert_eq!(triggers.string_items(), vec!["PaymentFailed"]);
        assert!(doc.lookup("flows.PaymentsFlow.whens.1").is_none());
        assert!(doc.lookup("flows.Missing").is_none());
    }

    #[test]
    fn mapping_preserves_insertion_order_and_overwrites_in_place() {
        let mut m = Map::new();
        m.put("b", 1i64);
        m.put("a", 2i64);
        m.put("b", 3i64);
        let keys: Vec<_> = m.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(m["b"], Value::from(3i64));
    }

    #[test]
    fn serializes_numbers_without_losing_precision() {
        let big = BigInt::from_str("123456789012345678901234567890").unwrap();
        let exact = BigDecimal::from_str("10.5").unwrap();
        let precise = BigDecimal::from_str("0.1000000000000000000000000001").unwrap();
        let v: Value = vec![
            Value::Integer(BigInt::from(42)),
            Value::Integer(big),
            Value::Decimal(exact),
            Value::Decimal(precise),
        ]
        .into();
        assert_eq!(
            v.to_json(),
            serde_json::json!([
                42,
                "123456789012345678901234567890",
                10.5,
                "0.1000000000000000000000000001"
            ])
        );
    }

    #[test]
    fn put_opt_omits_absent_values() {
        let mut m = Map::new();
        m.put_opt::<String>("tableName", None);
        m.put_opt("javadoc", Some("doc"));
        assert!(!m.contains_key("tableName"));
        assert_eq!(m.get("javadoc").and_then(Value::as_str), Some("doc"));
    }
}
