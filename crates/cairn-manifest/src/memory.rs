//! In-process manifest index used by tests and embedded callers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ManifestError, ManifestResult};
use crate::index::ManifestIndex;
use crate::model::{EntryMetadata, Labels, ManifestEntry, ManifestId};

/// Manifest index that keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryManifestIndex {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<ManifestId, ManifestEntry>,
    last_mod_time: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Creation times handed out by one index never repeat or go backwards.
    fn next_mod_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_mod_time {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_mod_time = Some(next);
        next
    }
}

impl MemoryManifestIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully specified entry, replacing any entry with the same id.
    ///
    /// Lets callers reproduce entry sets left behind by racing writers.
    pub async fn insert(&self, entry: ManifestEntry) {
        let mut state = self.state.write().await;
        state.entries.insert(entry.metadata.id.clone(), entry);
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether the index holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

#[async_trait]
impl ManifestIndex for MemoryManifestIndex {
    async fn find_manifests(&self, labels: &Labels) -> ManifestResult<Vec<EntryMetadata>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .values()
            .filter(|entry| entry.metadata.labels.matches(labels))
            .map(|entry| entry.metadata.clone())
            .collect())
    }

    async fn get_manifest(&self, id: &ManifestId) -> ManifestResult<ManifestEntry> {
        let state = self.state.read().await;
        state
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| ManifestError::NotFound { id: id.clone() })
    }

    async fn put_manifest(&self, labels: Labels, payload: Value) -> ManifestResult<ManifestId> {
        let length = serde_json::to_vec(&payload)
            .map_err(|source| ManifestError::Json {
                operation: "memory.put_manifest",
                source,
            })?
            .len();
        let mut state = self.state.write().await;
        let id = ManifestId::generate();
        let mod_time = state.next_mod_time();
        state.entries.insert(
            id.clone(),
            ManifestEntry {
                metadata: EntryMetadata {
                    id: id.clone(),
                    labels,
                    mod_time,
                    length,
                },
                payload,
            },
        );
        debug!(manifest_id = %id, "stored manifest entry");
        Ok(id)
    }

    async fn delete_manifest(&self, id: &ManifestId) -> ManifestResult<()> {
        let removed = self.state.write().await.entries.remove(id);
        if removed.is_none() {
            debug!(manifest_id = %id, "manifest entry already absent");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn maintenance() -> Labels {
        Labels::new().with("type", "maintenance")
    }

    #[tokio::test]
    async fn put_find_get_delete_cycle() -> ManifestResult<()> {
        let index = MemoryManifestIndex::new();
        let id = index.put_manifest(maintenance(), json!({"a": 1})).await?;
        index
            .put_manifest(Labels::new().with("type", "policy"), json!({}))
            .await?;

        let found = index.find_manifests(&maintenance()).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].length, br#"{"a":1}"#.len());

        let entry = index.get_manifest(&id).await?;
        assert_eq!(entry.payload, json!({"a": 1}));

        index.delete_manifest(&id).await?;
        assert!(index.find_manifests(&maintenance()).await?.is_empty());
        assert_eq!(index.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_missing_entry_is_a_no_op() -> ManifestResult<()> {
        let index = MemoryManifestIndex::new();
        index.delete_manifest(&ManifestId::from("missing")).await?;
        assert!(index.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn get_missing_entry_reports_not_found() {
        let index = MemoryManifestIndex::new();
        let err = index
            .get_manifest(&ManifestId::from("missing"))
            .await
            .expect_err("missing entry should error");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn creation_times_strictly_increase() -> ManifestResult<()> {
        let index = MemoryManifestIndex::new();
        let mut previous = None;
        for _ in 0..16 {
            let id = index.put_manifest(maintenance(), json!(null)).await?;
            let mod_time = index.get_manifest(&id).await?.metadata.mod_time;
            if let Some(previous) = previous {
                assert!(mod_time > previous);
            }
            previous = Some(mod_time);
        }
        Ok(())
    }
}
