//! Intake pipeline: discovery, resolution, synchronization
//!
//! Each record is processed to completion before the next begins. No
//! shared mutable state crosses items; the run summary is an explicit
//! accumulator, so per-record processing stays independently testable.

use crate::domain::{classify, FetchAttempt, PaperRecord};
use crate::providers::{ProviderError, Resolver};
use crate::store::{ReferenceStore, StoreError, Synchronizer};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

/// External collaborator producing candidate records from a free-text
/// query. Also consumed by repair for title-keyed lookups.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<PaperRecord>, ProviderError>;
}

#[async_trait]
impl<T: Discovery + ?Sized> Discovery for std::sync::Arc<T> {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<PaperRecord>, ProviderError> {
        (**self).search(query, max_results).await
    }
}

/// One structured outcome record per paper; these fields are the
/// contractual log output of a run.
#[derive(Clone, Debug, Serialize)]
pub struct PaperOutcome {
    pub title: String,
    pub doi: Option<String>,
    pub metadata_valid: bool,
    pub provider: Option<String>,
    pub artifact_fetched: bool,
    pub synced: bool,
    pub sync_error: Option<String>,
    pub attempts: Vec<FetchAttempt>,
}

/// Run-level accumulator; the user-visible outcome of a pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub found: u32,
    pub fetched: u32,
    pub added: u32,
    pub failed: u32,
}

/// Full report of an intake run
#[derive(Debug, Default)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcomes: Vec<PaperOutcome>,
}

pub struct Pipeline<S, D> {
    discovery: D,
    resolver: Resolver,
    sync: Synchronizer<S>,
    collection: Option<String>,
}

impl<S: ReferenceStore, D: Discovery> Pipeline<S, D> {
    pub fn new(discovery: D, resolver: Resolver, store: S, collection: Option<String>) -> Self {
        Self {
            discovery,
            resolver,
            sync: Synchronizer::new(store),
            collection,
        }
    }

    /// Discover records for `query` and synchronize each one. A failed
    /// discovery query fails the run; anything after that is per-item
    /// and only ever moves counters.
    pub async fn run(&self, query: &str, max_papers: u32) -> Result<RunReport, ProviderError> {
        let records = self.discovery.search(query, max_papers).await?;
        info!(query = %query, found = records.len(), "discovery complete");

        let mut report = RunReport::default();
        for record in &records {
            let outcome = self.process(record).await;
            report.summary.found += 1;
            if outcome.artifact_fetched {
                report.summary.fetched += 1;
            }
            if outcome.synced {
                report.summary.added += 1;
            } else {
                report.summary.failed += 1;
            }
            report.outcomes.push(outcome);
        }

        info!(
            found = report.summary.found,
            fetched = report.summary.fetched,
            added = report.summary.added,
            failed = report.summary.failed,
            "run complete"
        );
        Ok(report)
    }

    /// Validate, resolve, and sync a single record. Total provider
    /// exhaustion is not a failure; the record is synchronized without an
    /// attachment.
    async fn process(&self, record: &PaperRecord) -> PaperOutcome {
        let verdict = classify(record);
        if !verdict.is_valid() {
            warn!(
                title = %record.title,
                issues = verdict.issues().len(),
                "record has corrupt metadata; syncing anyway for later repair"
            );
        }

        let resolution = self.resolver.resolve(record).await;
        let provider = resolution.provider().map(str::to_string);

        let sync_result = self
            .sync
            .upsert(
                None,
                record,
                resolution.artifact.as_ref(),
                self.collection.as_deref(),
            )
            .await;

        let (synced, sync_error) = match &sync_result {
            Ok(item) => {
                info!(
                    title = %record.title,
                    key = %item.key,
                    provider = provider.as_deref().unwrap_or("none"),
                    artifact = resolution.artifact.is_some(),
                    "synchronized"
                );
                (true, None)
            }
            Err(error) => {
                warn!(title = %record.title, error = %error, "sync failed");
                (false, Some(describe_sync_error(error)))
            }
        };

        PaperOutcome {
            title: record.title.clone(),
            doi: record.doi.clone(),
            metadata_valid: verdict.is_valid(),
            provider,
            artifact_fetched: resolution.artifact.is_some(),
            synced,
            sync_error,
            attempts: resolution.attempts,
        }
    }
}

fn describe_sync_error(error: &StoreError) -> String {
    match error {
        StoreError::VersionConflict { key, .. } => format!("version conflict on {}", key),
        other => other.to_string(),
    }
}
