//! Dynamic record payload and key types.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dynamic structured value.
///
/// This type represents any payload a bucket can store. Floats are
/// intentionally not supported so that every value can serve as a record
/// key with a total, deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (supports full i64 range).
    Integer(i64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of key-value pairs (keys are kept sorted).
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with sorted keys.
    ///
    /// Keys are sorted by [`Value::cmp_ordered`] so that equal maps compare
    /// equal regardless of insertion order.
    #[must_use]
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_ordered(&b.0));
        Value::Map(pairs)
    }

    /// Compare two values in the engine-defined total order.
    ///
    /// Values of different variants order by type rank (`Null < Bool <
    /// Integer < Text < Bytes < Array < Map`); values of the same variant
    /// order by their natural content order, element-wise for arrays and
    /// maps.
    #[must_use]
    pub fn cmp_ordered(&self, other: &Self) -> Ordering {
        let rank = Self::type_rank(self).cmp(&Self::type_rank(other));
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => Self::cmp_seq(a, b),
            (Value::Map(a), Value::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let key_ord = ka.cmp_ordered(kb);
                    if key_ord != Ordering::Equal {
                        return key_ord;
                    }
                    let value_ord = va.cmp_ordered(vb);
                    if value_ord != Ordering::Equal {
                        return value_ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            // Variants already matched by type rank above.
            _ => unreachable!("mismatched variants with equal type rank"),
        }
    }

    fn cmp_seq(a: &[Value], b: &[Value]) -> Ordering {
        for (x, y) in a.iter().zip(b.iter()) {
            let ord = x.cmp_ordered(y);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    }

    const fn type_rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) => 2,
            Value::Text(_) => 3,
            Value::Bytes(_) => 4,
            Value::Array(_) => 5,
            Value::Map(_) => 6,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

/// A record primary key.
///
/// Any [`Value`] can serve as a key; the wrapper provides the total
/// ordering the engine uses for key uniqueness and `get_all` enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(Value);

impl Key {
    /// Creates a key from a value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Unwraps the key into its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_ordered(&other.0)
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Self(Value::Bool(v))
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self(Value::Integer(v))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self(Value::Text(v.to_string()))
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self(Value::Text(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_rank_separates_variants() {
        let ordered = [
            Value::Null,
            Value::Bool(true),
            Value::Integer(-5),
            Value::Text("a".into()),
            Value::Bytes(vec![0xff]),
            Value::Array(vec![]),
            Value::Map(vec![]),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].cmp_ordered(&pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn integer_ordering_is_numeric() {
        let a = Value::Integer(-10);
        let b = Value::Integer(2);
        assert_eq!(a.cmp_ordered(&b), Ordering::Less);
    }

    #[test]
    fn map_constructor_sorts_keys() {
        let m1 = Value::map(vec![
            (Value::from("b"), Value::Integer(2)),
            (Value::from("a"), Value::Integer(1)),
        ]);
        let m2 = Value::map(vec![
            (Value::from("a"), Value::Integer(1)),
            (Value::from("b"), Value::Integer(2)),
        ]);
        assert_eq!(m1, m2);
    }

    #[test]
    fn array_ordering_is_elementwise_then_length() {
        let short = Value::Array(vec![Value::Integer(1)]);
        let long = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(short.cmp_ordered(&long), Ordering::Less);
    }

    #[test]
    fn key_ordering_matches_value_ordering() {
        let a = Key::from("alpha");
        let b = Key::from("beta");
        assert!(a < b);
    }

    #[test]
    fn structured_key_roundtrips() {
        let key = Key::new(Value::Array(vec![Value::from("user"), Value::Integer(7)]));
        let value: Value = key.clone().into();
        assert_eq!(Key::from(value), key);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::Integer),
                "[a-z]{0,6}".prop_map(Value::Text),
                proptest::collection::vec(any::<u8>(), 0..6).prop_map(Value::Bytes),
            ];
            leaf.prop_recursive(2, 12, 3, |inner| {
                prop_oneof![
                    proptest::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
                    proptest::collection::vec((inner.clone(), inner), 0..3)
                        .prop_map(Value::map),
                ]
            })
        }

        proptest! {
            #[test]
            fn ordering_is_antisymmetric(a in arb_value(), b in arb_value()) {
                prop_assert_eq!(a.cmp_ordered(&b), b.cmp_ordered(&a).reverse());
            }

            #[test]
            fn ordering_is_consistent_with_equality(a in arb_value(), b in arb_value()) {
                prop_assert_eq!(a.cmp_ordered(&b) == Ordering::Equal, a == b);
            }

            #[test]
            fn ordering_is_reflexive(a in arb_value()) {
                prop_assert_eq!(a.cmp_ordered(&a), Ordering::Equal);
            }
        }
    }
}
