//! Manifest-backed maintenance parameter store.
//!
//! The parameters live in entries labelled `{type: "maintenance"}`. The
//! index offers no update-in-place and no locking, so:
//!
//! - reads find every labelled entry and pick one deterministically
//!   (`cairn_manifest::pick_latest_id`), falling back to defaults when none
//!   exist;
//! - writes first **commit** a new entry and only then **retire** the entries
//!   observed before the commit. At least one valid entry exists at every
//!   instant, and racing writers converge on whichever entry the picker
//!   selects.

use async_trait::async_trait;
use cairn_manifest::{
    EntryMetadata, Labels, ManifestId, Repository, load_manifest, pick_latest_id, store_manifest,
};
use tracing::{debug, info, instrument, warn};

use crate::defaults::{MAINTENANCE_MANIFEST_TYPE, MANIFEST_TYPE_LABEL};
use crate::error::{MaintenanceError, MaintenanceResult};
use crate::model::MaintenanceParams;

#[async_trait]
/// Read/write surface for repository maintenance parameters.
pub trait MaintenanceFacade: Send + Sync {
    /// Effective parameters, or the defaults when none are stored.
    async fn get_params(&self) -> MaintenanceResult<MaintenanceParams>;
    /// Whether any parameters entry exists, without loading it.
    async fn has_params(&self) -> MaintenanceResult<bool>;
    /// Replace the stored parameters.
    async fn set_params(&self, params: &MaintenanceParams) -> MaintenanceResult<()>;
    /// Whether the connected client is the recorded maintenance owner.
    async fn is_owned_by_this_user(&self) -> MaintenanceResult<bool>;
}

/// Label set identifying maintenance parameter entries.
#[must_use]
pub fn maintenance_labels() -> Labels {
    Labels::new().with(MANIFEST_TYPE_LABEL, MAINTENANCE_MANIFEST_TYPE)
}

/// Maintenance store bound to one repository connection.
#[derive(Debug, Clone)]
pub struct MaintenanceService {
    repo: Repository,
}

impl MaintenanceService {
    /// Bind the store to a repository.
    #[must_use]
    pub const fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Repository the store operates on.
    #[must_use]
    pub const fn repository(&self) -> &Repository {
        &self.repo
    }

    /// First phase of a write: store `params` as a new entry.
    ///
    /// Entries present before the commit are returned for retirement and are
    /// not touched here.
    ///
    /// # Errors
    ///
    /// Returns [`MaintenanceError::Lookup`] if existing entries cannot be
    /// listed and [`MaintenanceError::Commit`] if the new entry cannot be
    /// created. Existing entries are untouched in both cases.
    pub async fn commit(&self, params: &MaintenanceParams) -> MaintenanceResult<CommittedParams> {
        commit_params(&self.repo, params).await
    }
}

#[async_trait]
impl MaintenanceFacade for MaintenanceService {
    async fn get_params(&self) -> MaintenanceResult<MaintenanceParams> {
        fetch_params(&self.repo).await
    }

    #[instrument(name = "maintenance.has_params", skip_all)]
    async fn has_params(&self) -> MaintenanceResult<bool> {
        Ok(!find_params_entries(&self.repo).await?.is_empty())
    }

    #[instrument(name = "maintenance.set_params", skip_all)]
    async fn set_params(&self, params: &MaintenanceParams) -> MaintenanceResult<()> {
        commit_params(&self.repo, params)
            .await?
            .retire(&self.repo)
            .await
    }

    #[instrument(name = "maintenance.is_owned_by_this_user", skip(self))]
    async fn is_owned_by_this_user(&self) -> MaintenanceResult<bool> {
        let params = fetch_params(&self.repo)
            .await
            .map_err(|source| MaintenanceError::Ownership {
                source: Box::new(source),
            })?;
        let current = self.repo.identity().username_at_host();
        let owned = params.is_owned_by(&current);
        debug!(owner = %params.owner, current = %current, owned, "evaluated maintenance ownership");
        Ok(owned)
    }
}

/// Outcome of a successful commit whose superseded entries still exist.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "superseded entries remain until retired"]
pub struct CommittedParams {
    committed: ManifestId,
    stale: Vec<ManifestId>,
}

impl CommittedParams {
    /// Entry holding the newly committed parameters.
    pub const fn committed(&self) -> &ManifestId {
        &self.committed
    }

    /// Entries observed before the commit, pending deletion.
    pub fn stale(&self) -> &[ManifestId] {
        &self.stale
    }

    /// Second phase of a write: delete the superseded entries one at a time.
    ///
    /// Entries already removed by a concurrent writer are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`MaintenanceError::Retire`] for the first entry that cannot
    /// be deleted. The committed entry stays in place; leftovers are resolved
    /// by the picker on read and removed by a later write.
    #[instrument(name = "maintenance.retire", skip_all, fields(committed = %self.committed, stale = self.stale.len()))]
    pub async fn retire(self, repo: &Repository) -> MaintenanceResult<()> {
        for manifest_id in &self.stale {
            if let Err(source) = repo.manifests().delete_manifest(manifest_id).await {
                warn!(manifest_id = %manifest_id, error = ?source, "failed to delete stale maintenance manifest");
                return Err(MaintenanceError::Retire {
                    manifest_id: manifest_id.clone(),
                    committed: self.committed,
                    source,
                });
            }
        }
        info!("maintenance parameters updated");
        Ok(())
    }
}

#[instrument(name = "maintenance.find_entries", skip_all)]
async fn find_params_entries(repo: &Repository) -> MaintenanceResult<Vec<EntryMetadata>> {
    repo.manifests()
        .find_manifests(&maintenance_labels())
        .await
        .map_err(|source| MaintenanceError::Lookup { source })
}

#[instrument(name = "maintenance.get_params", skip_all)]
async fn fetch_params(repo: &Repository) -> MaintenanceResult<MaintenanceParams> {
    let entries = find_params_entries(repo).await?;

    // Several entries appear when clients write at about the same time; any
    // consistent choice is acceptable.
    let Some(manifest_id) = pick_latest_id(&entries) else {
        debug!("no maintenance manifest stored; using defaults");
        return Ok(MaintenanceParams::default());
    };
    if entries.len() > 1 {
        debug!(candidates = entries.len(), picked = %manifest_id, "multiple maintenance manifests found");
    }

    let (_, params) = load_manifest::<_, MaintenanceParams>(repo.manifests(), &manifest_id)
        .await
        .map_err(|source| MaintenanceError::Load {
            manifest_id: manifest_id.clone(),
            source,
        })?;
    Ok(params)
}

#[instrument(name = "maintenance.commit", skip_all)]
async fn commit_params(
    repo: &Repository,
    params: &MaintenanceParams,
) -> MaintenanceResult<CommittedParams> {
    let stale: Vec<ManifestId> = find_params_entries(repo)
        .await?
        .into_iter()
        .map(|entry| entry.id)
        .collect();

    let committed = store_manifest(repo.manifests(), maintenance_labels(), params)
        .await
        .map_err(|source| MaintenanceError::Commit { source })?;
    debug!(manifest_id = %committed, stale = stale.len(), "committed maintenance manifest");

    Ok(CommittedParams { committed, stale })
}
