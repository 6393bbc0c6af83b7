//! Metadata repair over already-stored items
//!
//! Walks a collection, classifies each item with the same validator used
//! at intake, and re-resolves corrupt metadata through a title-keyed
//! discovery lookup. Only a fresh record that itself classifies as valid
//! is written back, under the usual version-conditioned update; anything
//! less leaves the stored item untouched.

use crate::domain::{classify, Author, PaperRecord};
use crate::pipeline::Discovery;
use crate::store::{ReferenceStore, StoreError, StoreItem, Synchronizer};
use serde::Serialize;
use tracing::{info, warn};

/// Terminal state for one item in a repair pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Already valid; left alone
    Skipped,
    /// Corrected and written back
    Synced,
    /// Discovery yielded nothing usable, or the write failed
    Failed,
}

/// Running totals for a repair pass; the sole aggregate output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub fixed: u32,
    pub already_ok: u32,
    pub failed: u32,
}

impl RepairSummary {
    fn record(&mut self, outcome: RepairOutcome) {
        match outcome {
            RepairOutcome::Synced => self.fixed += 1,
            RepairOutcome::Skipped => self.already_ok += 1,
            RepairOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct RepairRunner<S, D> {
    sync: Synchronizer<S>,
    discovery: D,
}

impl<S: ReferenceStore, D: Discovery> RepairRunner<S, D> {
    pub fn new(store: S, discovery: D) -> Self {
        Self {
            sync: Synchronizer::new(store),
            discovery,
        }
    }

    /// Repair every item in the target collection. Per-item failures are
    /// counted, never propagated; only the collection listing itself can
    /// fail the pass.
    pub async fn repair_collection(&self, collection: &str) -> Result<RepairSummary, StoreError> {
        let items = self.sync.store().collection_items(collection).await?;
        info!(collection = %collection, items = items.len(), "starting repair pass");

        let mut summary = RepairSummary::default();
        for item in &items {
            let outcome = self.repair_item(item).await;
            summary.record(outcome);
        }

        info!(
            fixed = summary.fixed,
            already_ok = summary.already_ok,
            failed = summary.failed,
            "repair pass complete"
        );
        Ok(summary)
    }

    async fn repair_item(&self, item: &StoreItem) -> RepairOutcome {
        let stored = item.as_record();
        let verdict = classify(&stored);
        if verdict.is_valid() {
            return RepairOutcome::Skipped;
        }

        let title = stored.title.trim();
        if title.is_empty() {
            warn!(key = %item.key, "corrupt item has no title to re-discover by");
            return RepairOutcome::Failed;
        }
        info!(key = %item.key, title = %title, "re-resolving corrupt metadata");

        let fresh = match self.rediscover(title).await {
            Some(fresh) => fresh,
            None => {
                warn!(key = %item.key, "discovery yielded no usable replacement");
                return RepairOutcome::Failed;
            }
        };

        // Corrected creators replace the stored ones; the rest of the
        // stored fields are kept as-is.
        match self.update_with_retry(item, fresh.authors.clone()).await {
            Ok(updated) => {
                info!(key = %item.key, version = updated.version, "repaired");
                RepairOutcome::Synced
            }
            Err(error) => {
                warn!(key = %item.key, error = %error, "repair write failed");
                RepairOutcome::Failed
            }
        }
    }

    /// Title-keyed lookup; the replacement must itself classify valid
    async fn rediscover(&self, title: &str) -> Option<PaperRecord> {
        let results = match self.discovery.search(title, 1).await {
            Ok(results) => results,
            Err(error) => {
                warn!(title = %title, error = %error, "discovery lookup failed");
                return None;
            }
        };

        let fresh = results.into_iter().next()?;
        classify(&fresh).is_valid().then_some(fresh)
    }

    /// One conflict is absorbed by re-reading and retrying against the
    /// current version; a second conflict is surfaced. The retried write
    /// rebases the creators onto the re-read fields, so a concurrent
    /// writer's changes to other fields are never reverted.
    async fn update_with_retry(
        &self,
        item: &StoreItem,
        creators: Vec<Author>,
    ) -> Result<StoreItem, StoreError> {
        let mut fields = item.fields.clone();
        fields.creators = creators.clone();

        match self.sync.update(item, fields).await {
            Err(StoreError::VersionConflict { key, .. }) => {
                let current = self.sync.store().item(&key).await?;
                let mut fields = current.fields.clone();
                fields.creators = creators;
                self.sync.update(&current, fields).await
            }
            other => other,
        }
    }
}
