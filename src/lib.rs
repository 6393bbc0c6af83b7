//! litsync-core: acquisition and synchronization engine for the litsync
//! literature pipeline
//!
//! This library provides:
//! - Metadata validation (one definition of "bad metadata" for intake and
//!   repair)
//! - DOI cleaning and validation
//! - A multi-provider PDF fallback chain (open-access lookup, then mirror
//!   rotation) with an append-only attempt log
//! - Synchronization into an external reference store under optimistic
//!   concurrency
//! - A repair pass that re-resolves corrupt stored metadata through
//!   discovery, and a backfill pass that re-fetches missing attachments
//!
//! Discovery itself (result scraping, query syntax) and the user-facing
//! command surface live outside this crate; they plug in through the
//! [`pipeline::Discovery`] trait and [`config::SyncConfig`].

pub mod backfill;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod pipeline;
pub mod providers;
pub mod repair;
pub mod store;

pub use backfill::{BackfillRunner, BackfillSummary};
pub use config::{StoreConfig, SyncConfig};
pub use domain::{
    classify, Artifact, AttemptOutcome, Author, FetchAttempt, FieldIssue, PaperRecord, Resolution,
    ValidationVerdict,
};
pub use error::Error;
pub use pipeline::{Discovery, PaperOutcome, Pipeline, RunReport, RunSummary};
pub use providers::{
    ArtifactProvider, MirrorProvider, ProviderError, ProviderFetch, Resolver, UnpaywallProvider,
};
pub use repair::{RepairOutcome, RepairRunner, RepairSummary};
pub use store::{
    ItemFields, ReferenceStore, StoreError, StoreItem, Synchronizer, ZoteroStore,
};
