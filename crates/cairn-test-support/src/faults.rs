//! Manifest index wrappers that inject failures or reorder query results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use cairn_manifest::{
    EntryMetadata, Labels, ManifestEntry, ManifestError, ManifestId, ManifestIndex, ManifestResult,
};
use serde_json::Value;

/// Manifest index operation targeted by a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `find_manifests`.
    Find,
    /// `get_manifest`.
    Get,
    /// `put_manifest`.
    Put,
    /// `delete_manifest`.
    Delete,
}

impl Operation {
    const fn label(self) -> &'static str {
        match self {
            Self::Find => "faulty.find_manifests",
            Self::Get => "faulty.get_manifest",
            Self::Put => "faulty.put_manifest",
            Self::Delete => "faulty.delete_manifest",
        }
    }
}

#[derive(Debug, Default)]
struct FaultPlan {
    /// Remaining successful calls before an operation starts failing.
    budgets: HashMap<Operation, usize>,
    calls: HashMap<Operation, usize>,
}

/// Wrapper that fails selected operations with [`ManifestError::Backend`].
pub struct FaultyManifestIndex {
    inner: Arc<dyn ManifestIndex>,
    plan: Mutex<FaultPlan>,
}

impl FaultyManifestIndex {
    /// Wrap `inner` with no faults configured.
    #[must_use]
    pub fn new(inner: Arc<dyn ManifestIndex>) -> Self {
        Self {
            inner,
            plan: Mutex::new(FaultPlan::default()),
        }
    }

    /// Fail every subsequent call of `operation`.
    pub fn fail(&self, operation: Operation) {
        self.fail_after(operation, 0);
    }

    /// Let `successes` calls of `operation` through, then fail the rest.
    pub fn fail_after(&self, operation: Operation, successes: usize) {
        self.lock().budgets.insert(operation, successes);
    }

    /// Stop failing `operation`.
    pub fn heal(&self, operation: Operation) {
        self.lock().budgets.remove(&operation);
    }

    /// Number of calls observed for `operation`, failed ones included.
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FaultPlan> {
        self.plan.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, operation: Operation) -> ManifestResult<()> {
        let mut plan = self.lock();
        *plan.calls.entry(operation).or_insert(0) += 1;
        match plan.budgets.get_mut(&operation) {
            Some(0) => Err(ManifestError::backend(operation.label(), "injected failure")),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ManifestIndex for FaultyManifestIndex {
    async fn find_manifests(&self, labels: &Labels) -> ManifestResult<Vec<EntryMetadata>> {
        self.check(Operation::Find)?;
        self.inner.find_manifests(labels).await
    }

    async fn get_manifest(&self, id: &ManifestId) -> ManifestResult<ManifestEntry> {
        self.check(Operation::Get)?;
        self.inner.get_manifest(id).await
    }

    async fn put_manifest(&self, labels: Labels, payload: Value) -> ManifestResult<ManifestId> {
        self.check(Operation::Put)?;
        self.inner.put_manifest(labels, payload).await
    }

    async fn delete_manifest(&self, id: &ManifestId) -> ManifestResult<()> {
        self.check(Operation::Delete)?;
        self.inner.delete_manifest(id).await
    }
}

/// Wrapper that permutes `find_manifests` results on every call, mimicking a
/// backend that lists entries in no particular order.
///
/// Any listing of two or more entries comes back in at least two distinct
/// orders over consecutive calls.
pub struct ShuffledManifestIndex {
    inner: Arc<dyn ManifestIndex>,
    calls: AtomicUsize,
}

impl ShuffledManifestIndex {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ManifestIndex>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ManifestIndex for ShuffledManifestIndex {
    async fn find_manifests(&self, labels: &Labels) -> ManifestResult<Vec<EntryMetadata>> {
        let mut found = self.inner.find_manifests(labels).await?;
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let len = found.len();
        if len > 1 {
            // Every rotation in forward order, then every rotation reversed.
            found.rotate_left(call % len);
            if (call / len) % 2 == 1 {
                found.reverse();
            }
        }
        Ok(found)
    }

    async fn get_manifest(&self, id: &ManifestId) -> ManifestResult<ManifestEntry> {
        self.inner.get_manifest(id).await
    }

    async fn put_manifest(&self, labels: Labels, payload: Value) -> ManifestResult<ManifestId> {
        self.inner.put_manifest(labels, payload).await
    }

    async fn delete_manifest(&self, id: &ManifestId) -> ManifestResult<()> {
        self.inner.delete_manifest(id).await
    }
}
