use anyhow::{anyhow, Result};
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{btree_map::Iter, BTreeMap},
    fmt,
};

/// Value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single number.
    Scalar(f64),

    /// A timestamp.
    DateTime(DateTime<Local>),

    /// A vector of numbers, e.g. a feature vector.
    Array1(Vec<f64>),

    /// A text value.
    String(String),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Scalar(v) => write!(f, "{}", v),
            RecordValue::DateTime(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            RecordValue::Array1(v) => write!(f, "{:?}", v),
            RecordValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Key-value pairs, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a record holding one scalar.
    pub fn from_scalar(name: impl Into<String>, value: f64) -> Self {
        Self(BTreeMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a value, replacing any value with the same key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns the scalar of the given key.
    pub fn get_scalar(&self, k: &str) -> Result<f64> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(anyhow!("Record value of {} is not a scalar", k)),
            None => Err(anyhow!("Record key not found: {}", k)),
        }
    }

    /// Iterates over key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Merges another record; its values win on duplicate keys.
    pub fn merge(mut self, record: Record) -> Self {
        self.0.extend(record.0);
        self
    }

    /// Returns `true` if the record holds nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let record = Record::from_scalar("return", 3.0).merge(Record::from_slice(&[
            ("generation", RecordValue::Scalar(1.0)),
            ("tag", RecordValue::String("eval".to_string())),
        ]));
        assert_eq!(record.get_scalar("return").unwrap(), 3.0);
        assert!(record.get_scalar("tag").is_err());
        assert!(record.get_scalar("missing").is_err());
        assert_eq!(record.to_string(), "generation=1, return=3, tag=eval");
    }
}
