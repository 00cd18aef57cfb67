//! Directory-backed manifest index shared by every process that can reach
//! the same path.
//!
//! # Design
//! - Each entry is two documents under `<root>/manifests/`: `<id>.entry.json`
//!   (id, labels, creation time, length) and `<id>.data.json` (payload).
//! - Listing reads metadata only, so a damaged payload still shows up and
//!   fails when loaded instead of vanishing from queries.
//! - Payload is written before metadata and deleted after it; an entry is
//!   visible exactly while its metadata document exists.
//! - Documents are written to a temporary sibling and renamed into place, so
//!   readers observe either the whole document or nothing.
//! - Deletes tolerate entries that another writer already removed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{ManifestError, ManifestResult};
use crate::index::ManifestIndex;
use crate::model::{EntryMetadata, Labels, ManifestEntry, ManifestId};

const MANIFEST_DIR: &str = "manifests";
const METADATA_SUFFIX: &str = ".entry.json";
const PAYLOAD_SUFFIX: &str = ".data.json";
const TEMP_PREFIX: &str = ".tmp-";

/// Manifest index persisted as individual files in a directory.
#[derive(Debug, Clone)]
pub struct FsManifestIndex {
    dir: PathBuf,
}

impl FsManifestIndex {
    /// Open (creating if needed) the manifest directory below `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> ManifestResult<Self> {
        let dir = root.as_ref().join(MANIFEST_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| ManifestError::Io {
                operation: "fs.open",
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    /// Directory holding the entry documents.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, id: &ManifestId, suffix: &str) -> ManifestResult<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(ManifestError::backend(
                "fs.entry_path",
                format!("invalid manifest identifier '{id}'"),
            ));
        }
        Ok(self.dir.join(format!("{id}{suffix}")))
    }

    async fn read_document<T: DeserializeOwned>(
        path: &Path,
        operation: &'static str,
    ) -> ManifestResult<T> {
        let bytes = fs::read(path)
            .await
            .map_err(|source| ManifestError::Io {
                operation,
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| ManifestError::Json { operation, source })
    }

    async fn write_document(&self, final_path: &Path, document: &[u8]) -> ManifestResult<()> {
        let file_name = final_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let temp_path = self.dir.join(format!("{TEMP_PREFIX}{file_name}"));
        fs::write(&temp_path, document)
            .await
            .map_err(|source| ManifestError::Io {
                operation: "fs.write_document",
                path: temp_path.clone(),
                source,
            })?;
        if let Err(source) = fs::rename(&temp_path, final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ManifestError::Io {
                operation: "fs.commit_document",
                path: final_path.to_path_buf(),
                source,
            });
        }
        Ok(())
    }

    async fn remove_document(path: PathBuf) -> ManifestResult<()> {
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ManifestError::Io {
                operation: "fs.delete_document",
                path,
                source,
            }),
        }
    }
}

fn is_missing(err: &ManifestError) -> bool {
    matches!(err, ManifestError::Io { source, .. } if source.kind() == ErrorKind::NotFound)
}

#[async_trait]
impl ManifestIndex for FsManifestIndex {
    async fn find_manifests(&self, labels: &Labels) -> ManifestResult<Vec<EntryMetadata>> {
        let mut reader = fs::read_dir(&self.dir)
            .await
            .map_err(|source| ManifestError::Io {
                operation: "fs.list_entries",
                path: self.dir.clone(),
                source,
            })?;

        let mut found = Vec::new();
        loop {
            let next = reader
                .next_entry()
                .await
                .map_err(|source| ManifestError::Io {
                    operation: "fs.list_entries",
                    path: self.dir.clone(),
                    source,
                })?;
            let Some(dir_entry) = next else {
                break;
            };
            let path = dir_entry.path();
            let is_metadata = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.ends_with(METADATA_SUFFIX) && !name.starts_with(TEMP_PREFIX)
                });
            if !is_metadata {
                continue;
            }

            match Self::read_document::<EntryMetadata>(&path, "fs.read_metadata").await {
                Ok(metadata) if metadata.labels.matches(labels) => found.push(metadata),
                Ok(_) => {}
                Err(err) if is_missing(&err) => {
                    debug!(path = %path.display(), "manifest entry removed while listing");
                }
                Err(err) => {
                    warn!(path = %path.display(), error = ?err, "unreadable manifest metadata");
                    return Err(err);
                }
            }
        }
        Ok(found)
    }

    async fn get_manifest(&self, id: &ManifestId) -> ManifestResult<ManifestEntry> {
        let not_found = |err: ManifestError| {
            if is_missing(&err) {
                ManifestError::NotFound { id: id.clone() }
            } else {
                err
            }
        };
        let metadata_path = self.document_path(id, METADATA_SUFFIX)?;
        let metadata = Self::read_document::<EntryMetadata>(&metadata_path, "fs.read_metadata")
            .await
            .map_err(not_found)?;
        let payload_path = self.document_path(id, PAYLOAD_SUFFIX)?;
        let payload = Self::read_document::<Value>(&payload_path, "fs.read_payload")
            .await
            .map_err(not_found)?;
        Ok(ManifestEntry { metadata, payload })
    }

    async fn put_manifest(&self, labels: Labels, payload: Value) -> ManifestResult<ManifestId> {
        let payload_document = serde_json::to_vec(&payload).map_err(|source| ManifestError::Json {
            operation: "fs.encode_payload",
            source,
        })?;
        let id = ManifestId::generate();
        let metadata = EntryMetadata {
            id: id.clone(),
            labels,
            mod_time: Utc::now(),
            length: payload_document.len(),
        };
        let metadata_document =
            serde_json::to_vec_pretty(&metadata).map_err(|source| ManifestError::Json {
                operation: "fs.encode_metadata",
                source,
            })?;

        let payload_path = self.document_path(&id, PAYLOAD_SUFFIX)?;
        let metadata_path = self.document_path(&id, METADATA_SUFFIX)?;
        self.write_document(&payload_path, &payload_document).await?;
        if let Err(err) = self.write_document(&metadata_path, &metadata_document).await {
            let _ = fs::remove_file(&payload_path).await;
            return Err(err);
        }

        debug!(manifest_id = %id, path = %metadata_path.display(), "stored manifest entry");
        Ok(id)
    }

    async fn delete_manifest(&self, id: &ManifestId) -> ManifestResult<()> {
        Self::remove_document(self.document_path(id, METADATA_SUFFIX)?).await?;
        Self::remove_document(self.document_path(id, PAYLOAD_SUFFIX)?).await?;
        debug!(manifest_id = %id, "deleted manifest entry");
        Ok(())
    }
}
