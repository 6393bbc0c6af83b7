//! External reference-management store
//!
//! The store owns every [`StoreItem`]; this crate only ever holds a local,
//! possibly-stale copy. All updates are conditioned on the version read
//! alongside the copy, and a failed precondition surfaces as
//! [`StoreError::VersionConflict`] which every mutation call site must
//! handle explicitly.

pub mod sync;
pub mod zotero;

pub use sync::{safe_filename, Synchronizer};
pub use zotero::ZoteroStore;

use crate::domain::{Author, PaperRecord};
use crate::http::HttpError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The item changed since it was read; retry by re-reading, never by
    /// overwriting.
    #[error("version conflict on item {key}: stale version {version}")]
    VersionConflict { key: String, version: u64 },
    #[error("item not found: {key}")]
    ItemNotFound { key: String },
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("unexpected store response: {detail}")]
    Protocol { detail: String },
}

/// Bibliographic fields as persisted in the store
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemFields {
    pub title: String,
    pub creators: Vec<Author>,
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
    pub extra: Option<String>,
}

impl ItemFields {
    /// Map a discovery record onto store fields
    pub fn from_record(record: &PaperRecord, extra: Option<String>) -> Self {
        Self {
            title: record.title.clone(),
            creators: record.authors.clone(),
            abstract_text: record.snippet.clone(),
            doi: record.doi.clone(),
            url: record.url.clone(),
            date: record.year.map(|y| y.to_string()),
            extra,
        }
    }
}

/// Local copy of a stored item. `version` is monotonic and assigned by
/// the store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreItem {
    pub key: String,
    pub version: u64,
    pub fields: ItemFields,
    pub collections: Vec<String>,
}

impl StoreItem {
    /// View the stored fields as a record, so the same validator covers
    /// both intake and repair
    pub fn as_record(&self) -> PaperRecord {
        PaperRecord {
            doi: self.fields.doi.clone(),
            title: self.fields.title.clone(),
            authors: self.fields.creators.clone(),
            year: self.fields.date.as_deref().and_then(|d| d.parse().ok()),
            url: self.fields.url.clone(),
            citation_count: None,
            snippet: self.fields.abstract_text.clone(),
        }
    }
}

/// External store API. Implementations confine all side effects to the
/// store itself.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn item(&self, key: &str) -> Result<StoreItem, StoreError>;

    async fn collection_items(&self, collection: &str) -> Result<Vec<StoreItem>, StoreError>;

    async fn create_item(
        &self,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError>;

    /// Version-conditioned write: must fail with
    /// [`StoreError::VersionConflict`] when the store's current version
    /// differs from `version`, leaving the item unmodified.
    async fn update_item(
        &self,
        key: &str,
        version: u64,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError>;

    async fn attach_artifact(
        &self,
        key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError>;

    /// Whether the item already has a file attachment
    async fn has_artifact(&self, key: &str) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T: ReferenceStore + ?Sized> ReferenceStore for std::sync::Arc<T> {
    async fn item(&self, key: &str) -> Result<StoreItem, StoreError> {
        (**self).item(key).await
    }

    async fn collection_items(&self, collection: &str) -> Result<Vec<StoreItem>, StoreError> {
        (**self).collection_items(collection).await
    }

    async fn create_item(
        &self,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError> {
        (**self).create_item(fields, collections).await
    }

    async fn update_item(
        &self,
        key: &str,
        version: u64,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError> {
        (**self).update_item(key, version, fields, collections).await
    }

    async fn attach_artifact(
        &self,
        key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        (**self).attach_artifact(key, filename, bytes).await
    }

    async fn has_artifact(&self, key: &str) -> Result<bool, StoreError> {
        (**self).has_artifact(key).await
    }
}
