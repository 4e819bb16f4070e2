//! Label sets identifying a series within a family.

use std::collections::BTreeMap;

use crate::error::{DoraError, Result};
use crate::metric::family::MetricFamily;

/// Unordered label name -> value mapping.
///
/// Stored sorted by name so equality, hashing and rendering are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check that the label names are exactly the family schema.
    pub fn conforms_to(&self, family: MetricFamily) -> Result<()> {
        let schema = family.label_names();
        let names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        if names == schema {
            return Ok(());
        }
        Err(DoraError::LabelSchema {
            family: family.name(),
            detail: format!("expected {schema:?}, got {names:?}"),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
