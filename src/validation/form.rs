//! Raw form input and its normalization

use std::collections::BTreeSet;

use indexmap::{map::Entry, IndexMap};
use serde::{Deserialize, Serialize};

/// A submitted form value: one string, or several when the key was repeated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Single(String),
    Multiple(Vec<String>),
}

/// String-keyed form submission, in submission order.
///
/// Deserializes from a JSON object whose values are strings or arrays of
/// strings, and can be built from url-encoded `(key, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormPayload {
    fields: IndexMap<String, FormValue>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; a repeated key turns the entry into a list
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.fields.entry(key.into()) {
            Entry::Vacant(entry) => {
                entry.insert(FormValue::Single(value));
            }
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                match slot {
                    FormValue::Multiple(values) => values.push(value),
                    FormValue::Single(first) => {
                        let first = std::mem::take(first);
                        *slot = FormValue::Multiple(vec![first, value]);
                    }
                }
            }
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a key to an explicit list of values
    pub fn with_many<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.fields.insert(
            key.into(),
            FormValue::Multiple(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.fields.get(key)
    }

    /// Trimmed text of a field; missing fields read as empty.
    /// When a key was repeated the first value is used.
    pub fn text(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(FormValue::Single(value)) => value.trim().to_string(),
            Some(FormValue::Multiple(values)) => values
                .first()
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Trimmed text, or `None` when missing or blank
    pub fn optional_text(&self, key: &str) -> Option<String> {
        let value = self.text(key);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Multi-valued reference field as a set.
    ///
    /// Missing → empty set, single value → one-element set, list → its members.
    /// Blank members are dropped.
    pub fn reference_set(&self, key: &str) -> BTreeSet<String> {
        let values: Vec<&String> = match self.fields.get(key) {
            None => Vec::new(),
            Some(FormValue::Single(value)) => vec![value],
            Some(FormValue::Multiple(values)) => values.iter().collect(),
        };
        values
            .into_iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for FormPayload
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut payload = FormPayload::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}
