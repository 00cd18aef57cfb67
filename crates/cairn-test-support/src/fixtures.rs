//! Repository fixtures and seeded manifest entries.

use std::sync::Arc;

use cairn_manifest::{
    ClientIdentity, EntryMetadata, Labels, ManifestEntry, ManifestId, ManifestIndex,
    MemoryManifestIndex, Repository,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Identity used by fixtures unless a test needs a specific one.
#[must_use]
pub fn test_identity() -> ClientIdentity {
    ClientIdentity::new("tester", "ci-host")
}

/// Fresh in-memory index wrapped in a repository connected as `identity`.
#[must_use]
pub fn memory_repository(identity: ClientIdentity) -> (Arc<MemoryManifestIndex>, Repository) {
    let index = Arc::new(MemoryManifestIndex::new());
    let repo = Repository::new(index.clone(), identity);
    (index, repo)
}

/// Repository over an arbitrary index, connected as `identity`.
#[must_use]
pub fn repository_over(index: Arc<dyn ManifestIndex>, identity: ClientIdentity) -> Repository {
    Repository::new(index, identity)
}

/// Insert an entry with a chosen identifier and creation time.
///
/// `offset_secs` is relative to the Unix epoch so tests control ordering.
pub async fn seed_entry(
    index: &MemoryManifestIndex,
    id: &str,
    offset_secs: i64,
    labels: Labels,
    payload: Value,
) -> ManifestId {
    let id = ManifestId::from(id);
    let length = payload.to_string().len();
    index
        .insert(ManifestEntry {
            metadata: EntryMetadata {
                id: id.clone(),
                labels,
                mod_time: epoch_plus(offset_secs),
                length,
            },
            payload,
        })
        .await;
    id
}

/// Unix epoch shifted by `offset_secs`.
#[must_use]
pub fn epoch_plus(offset_secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(offset_secs)
}
