use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::placeholder::Placeholder;

/// Run-scoped key/value store that parameterizes a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap {
    values: BTreeMap<String, String>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value to type for a recorded `raw` value.
    ///
    /// A key equal to the whole string wins, then the placeholder key;
    /// otherwise `raw` is used verbatim.
    pub fn resolve(&self, raw: &str) -> String {
        if let Some(value) = self.get(raw) {
            return value.to_string();
        }
        if let Some(value) = Placeholder::parse(raw).and_then(|p| self.get(&p.key)) {
            return value.to_string();
        }
        raw.to_string()
    }

    pub fn merge(&mut self, other: impl IntoIterator<Item = (String, String)>) {
        self.values.extend(other);
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.values
    }
}

impl From<BTreeMap<String, String>> for DataMap {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, String)> for DataMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
