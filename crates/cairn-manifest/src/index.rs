//! The manifest index abstraction consumed by higher-level stores.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ManifestError, ManifestResult};
use crate::model::{EntryMetadata, Labels, ManifestEntry, ManifestId};

#[async_trait]
/// Append-only store of immutable, label-queryable manifest entries.
///
/// Every call may suspend on network or disk IO; implementations do not
/// impose their own timeouts.
pub trait ManifestIndex: Send + Sync {
    /// List metadata for every entry whose labels contain all of `labels`.
    /// No ordering is guaranteed.
    async fn find_manifests(&self, labels: &Labels) -> ManifestResult<Vec<EntryMetadata>>;
    /// Fetch a single entry including its payload.
    async fn get_manifest(&self, id: &ManifestId) -> ManifestResult<ManifestEntry>;
    /// Store a new immutable entry and return its identifier.
    async fn put_manifest(
        &self,
        labels: Labels,
        payload: serde_json::Value,
    ) -> ManifestResult<ManifestId>;
    /// Remove an entry. Removing an unknown identifier succeeds.
    async fn delete_manifest(&self, id: &ManifestId) -> ManifestResult<()>;
}

/// Load an entry and deserialize its payload into `T`.
///
/// # Errors
///
/// Returns an error if the entry cannot be fetched or the payload does not
/// match `T`.
pub async fn load_manifest<I, T>(
    index: &I,
    id: &ManifestId,
) -> ManifestResult<(EntryMetadata, T)>
where
    I: ManifestIndex + ?Sized,
    T: DeserializeOwned,
{
    let entry = index.get_manifest(id).await?;
    let value = serde_json::from_value(entry.payload).map_err(|source| ManifestError::Json {
        operation: "manifest.decode_payload",
        source,
    })?;
    Ok((entry.metadata, value))
}

/// Serialize `value` and store it as a new entry under `labels`.
///
/// # Errors
///
/// Returns an error if serialization fails or the backend rejects the entry.
pub async fn store_manifest<I, T>(
    index: &I,
    labels: Labels,
    value: &T,
) -> ManifestResult<ManifestId>
where
    I: ManifestIndex + ?Sized,
    T: Serialize + Sync + ?Sized,
{
    let payload = serde_json::to_value(value).map_err(|source| ManifestError::Json {
        operation: "manifest.encode_payload",
        source,
    })?;
    index.put_manifest(labels, payload).await
}
