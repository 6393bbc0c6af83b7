//! Attachment backfill over already-stored items
//!
//! Provider exhaustion at intake leaves a bibliographic entry with no
//! PDF. This pass walks a collection later, finds items that carry an
//! identifier but no attachment, and runs the provider chain again. The
//! stored fields are never touched; only an attachment is added.

use crate::providers::Resolver;
use crate::store::{safe_filename, ReferenceStore, StoreError, StoreItem, Synchronizer};
use serde::Serialize;
use tracing::{info, warn};

/// Terminal state for one item in a backfill pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BackfillOutcome {
    /// No identifier, or an attachment already present
    Skipped,
    /// A validated PDF was fetched and attached
    Fetched,
    /// Providers exhausted, or the attachment write failed
    Failed,
}

/// Running totals for a backfill pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    pub fetched: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl BackfillSummary {
    fn record(&mut self, outcome: BackfillOutcome) {
        match outcome {
            BackfillOutcome::Fetched => self.fetched += 1,
            BackfillOutcome::Skipped => self.skipped += 1,
            BackfillOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct BackfillRunner<S> {
    sync: Synchronizer<S>,
    resolver: Resolver,
}

impl<S: ReferenceStore> BackfillRunner<S> {
    pub fn new(store: S, resolver: Resolver) -> Self {
        Self {
            sync: Synchronizer::new(store),
            resolver,
        }
    }

    /// Backfill every item in the target collection. Per-item failures
    /// are counted, never propagated; only the collection listing itself
    /// can fail the pass.
    pub async fn backfill_collection(
        &self,
        collection: &str,
    ) -> Result<BackfillSummary, StoreError> {
        let items = self.sync.store().collection_items(collection).await?;
        info!(collection = %collection, items = items.len(), "starting backfill pass");

        let mut summary = BackfillSummary::default();
        for item in &items {
            let outcome = self.backfill_item(item).await;
            summary.record(outcome);
        }

        info!(
            fetched = summary.fetched,
            skipped = summary.skipped,
            failed = summary.failed,
            "backfill pass complete"
        );
        Ok(summary)
    }

    async fn backfill_item(&self, item: &StoreItem) -> BackfillOutcome {
        let Some(doi) = item.fields.doi.clone() else {
            return BackfillOutcome::Skipped;
        };

        match self.sync.store().has_artifact(&item.key).await {
            Ok(true) => return BackfillOutcome::Skipped,
            Ok(false) => {}
            Err(error) => {
                warn!(key = %item.key, error = %error, "attachment lookup failed");
                return BackfillOutcome::Failed;
            }
        }

        info!(key = %item.key, doi = %doi, "re-running provider chain");
        let resolution = self.resolver.resolve(&item.as_record()).await;
        let Some(artifact) = resolution.artifact else {
            info!(
                key = %item.key,
                attempts = resolution.attempts.len(),
                "providers exhausted"
            );
            return BackfillOutcome::Failed;
        };

        let filename = safe_filename(&item.fields.title, &doi);
        match self
            .sync
            .store()
            .attach_artifact(&item.key, &filename, &artifact.bytes)
            .await
        {
            Ok(()) => {
                info!(key = %item.key, provider = %artifact.provider, "attachment backfilled");
                BackfillOutcome::Fetched
            }
            Err(error) => {
                warn!(key = %item.key, error = %error, "attachment write failed");
                BackfillOutcome::Failed
            }
        }
    }
}
