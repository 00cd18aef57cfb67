//! Manifest identifiers, label sets and entry metadata.
//!
//! # Design
//! - Pure data carriers shared by every backend and by the picker.
//! - Identifiers are opaque strings; ordering is byte-wise on the string.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque identifier of a manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(String);

impl ManifestId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ManifestId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ManifestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ManifestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Key/value labels attached to a manifest entry and used to query the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Empty label set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insertion of a label.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a single label value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether every label in `query` is present here with an equal value.
    #[must_use]
    pub fn matches(&self, query: &Self) -> bool {
        query
            .0
            .iter()
            .all(|(key, value)| self.0.get(key) == Some(value))
    }

    /// Number of labels in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set carries no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Metadata describing a stored manifest entry, returned by label queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Identifier of the entry.
    pub id: ManifestId,
    /// Labels the entry was created with.
    pub labels: Labels,
    /// Time the entry was created.
    pub mod_time: DateTime<Utc>,
    /// Size of the serialized payload in bytes.
    pub length: usize,
}

/// A manifest entry together with its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Entry metadata.
    #[serde(flatten)]
    pub metadata: EntryMetadata,
    /// Stored payload.
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_on_subset_equality() {
        let stored = Labels::new()
            .with("type", "maintenance")
            .with("hostname", "box");
        let query = Labels::new().with("type", "maintenance");

        assert!(stored.matches(&query));
        assert!(stored.matches(&Labels::new()));
        assert!(!stored.matches(&Labels::new().with("type", "policy")));
        assert!(!query.matches(&stored));
    }

    #[test]
    fn labels_collect_from_pairs() {
        let labels: Labels = [("type", "maintenance")].into_iter().collect();
        assert_eq!(labels.get("type"), Some("maintenance"));
        assert_eq!(labels.len(), 1);
        assert!(!labels.is_empty());
    }

    #[test]
    fn generated_ids_are_distinct_hex() {
        let first = ManifestId::generate();
        let second = ManifestId::generate();
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
        assert!(first.as_str().chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn entry_serializes_metadata_inline() {
        let entry = ManifestEntry {
            metadata: EntryMetadata {
                id: ManifestId::from("abc"),
                labels: Labels::new().with("type", "maintenance"),
                mod_time: DateTime::<Utc>::UNIX_EPOCH,
                length: 2,
            },
            payload: serde_json::json!({}),
        };
        let value = serde_json::to_value(&entry).expect("entry should serialize");
        assert_eq!(value["id"], "abc");
        assert_eq!(value["labels"]["type"], "maintenance");
        let decoded: ManifestEntry = serde_json::from_value(value).expect("entry should decode");
        assert_eq!(decoded, entry);
    }
}
