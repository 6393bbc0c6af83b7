//! Store synchronization: create and conditioned-update paths

use super::{ItemFields, ReferenceStore, StoreError, StoreItem};
use crate::domain::{Artifact, PaperRecord};
use tracing::{debug, warn};

/// Synchronizes records and artifacts into a reference store. Holds no
/// local state; every operation round-trips through the store API.
pub struct Synchronizer<S> {
    store: S,
}

impl<S: ReferenceStore> Synchronizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or update depending on whether a current copy of the item
    /// is in hand. The create path needs no version check; the update
    /// path is conditioned on the copy's version and surfaces
    /// [`StoreError::VersionConflict`] for the caller to decide on.
    pub async fn upsert(
        &self,
        existing: Option<&StoreItem>,
        record: &PaperRecord,
        artifact: Option<&Artifact>,
        collection: Option<&str>,
    ) -> Result<StoreItem, StoreError> {
        match existing {
            None => self.create(record, artifact, collection).await,
            Some(current) => {
                let extra = artifact
                    .map(|a| format!("PDF source: {}", a.provider))
                    .or_else(|| current.fields.extra.clone());
                let fields = ItemFields::from_record(record, extra);
                self.update(current, fields).await
            }
        }
    }

    async fn create(
        &self,
        record: &PaperRecord,
        artifact: Option<&Artifact>,
        collection: Option<&str>,
    ) -> Result<StoreItem, StoreError> {
        let extra = artifact.map(|a| format!("PDF source: {}", a.provider));
        let fields = ItemFields::from_record(record, extra);
        let collections: Vec<String> = collection.map(str::to_string).into_iter().collect();

        let item = self.store.create_item(&fields, &collections).await?;
        debug!(key = %item.key, title = %record.title, "created item");

        if let Some(artifact) = artifact {
            let filename = safe_filename(&record.title, record.doi.as_deref().unwrap_or(""));
            // A failed attachment leaves a valid bibliographic entry
            // behind; it is reported but does not undo the create.
            if let Err(error) = self
                .store
                .attach_artifact(&item.key, &filename, &artifact.bytes)
                .await
            {
                warn!(key = %item.key, error = %error, "attachment failed");
            }
        }

        Ok(item)
    }

    /// Version-conditioned update of an existing item
    pub async fn update(
        &self,
        current: &StoreItem,
        fields: ItemFields,
    ) -> Result<StoreItem, StoreError> {
        self.store
            .update_item(&current.key, current.version, &fields, &current.collections)
            .await
    }

    /// Add an item to a collection as a read-modify-write under the same
    /// version discipline as any other update
    pub async fn add_to_collection(
        &self,
        key: &str,
        collection: &str,
    ) -> Result<StoreItem, StoreError> {
        let current = self.store.item(key).await?;
        if current.collections.iter().any(|c| c == collection) {
            return Ok(current);
        }

        let mut collections = current.collections.clone();
        collections.push(collection.to_string());
        self.store
            .update_item(&current.key, current.version, &current.fields, &collections)
            .await
    }
}

/// Compact a title and DOI into a filesystem- and store-safe attachment
/// name
pub fn safe_filename(title: &str, doi: &str) -> String {
    let compact = |input: &str, limit: usize| -> String {
        let mut out = String::new();
        let mut last_was_sep = false;
        for c in input.trim().chars() {
            if out.len() >= limit {
                break;
            }
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                out.push(c);
                last_was_sep = false;
            } else if !last_was_sep && !out.is_empty() {
                out.push('_');
                last_was_sep = true;
            }
        }
        out.trim_end_matches('_').to_string()
    };

    let title_part = compact(title, 100);
    let title_part = if title_part.is_empty() {
        "paper".to_string()
    } else {
        title_part
    };
    let doi_part = compact(doi, 50);

    if doi_part.is_empty() {
        format!("{}.pdf", title_part)
    } else {
        format!("{}_{}.pdf", title_part, doi_part)
    }
}
