//! Shared fakes for integration tests: scripted providers, an in-memory
//! reference store, and a scripted discovery collaborator.

#![allow(dead_code)]

use async_trait::async_trait;
use litsync_core::pipeline::Discovery;
use litsync_core::providers::{single_attempt, ArtifactProvider, ProviderError, ProviderFetch};
use litsync_core::store::{ItemFields, ReferenceStore, StoreError, StoreItem};
use litsync_core::{Author, PaperRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A well-formed record used as the default fixture
pub fn valid_record() -> PaperRecord {
    PaperRecord::new("Attention Is All You Need")
        .with_doi("10.1234/test")
        .with_authors(vec![
            Author::new("Vaswani").with_given_name("A"),
            Author::new("Shazeer").with_given_name("N"),
        ])
        .with_year(2017)
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4 fixture body".to_vec()
}

/// Provider that replays a scripted result and counts its calls
pub struct ScriptedProvider {
    name: String,
    result: Mutex<Option<Result<Vec<u8>, ProviderError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn succeeding(name: &str, bytes: Vec<u8>) -> Self {
        Self::new(name, Ok(bytes))
    }

    pub fn failing(name: &str) -> Self {
        Self::new(
            name,
            Err(ProviderError::Unavailable {
                detail: "scripted failure".to_string(),
            }),
        )
    }

    pub fn blocked(name: &str) -> Self {
        Self::new(
            name,
            Err(ProviderError::Blocked {
                detail: "status 403".to_string(),
            }),
        )
    }

    pub fn new(name: &str, result: Result<Vec<u8>, ProviderError>) -> Self {
        Self {
            name: name.to_string(),
            result: Mutex::new(Some(result)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _doi: &str, _record: &PaperRecord) -> ProviderFetch {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(ProviderError::NotFound));
        single_attempt(&self.name, result)
    }
}

#[derive(Default)]
struct MemoryStoreState {
    items: HashMap<String, StoreItem>,
    next_key: usize,
    next_version: u64,
}

/// In-memory reference store with real version discipline: updates with a
/// stale version are rejected without mutation, successful writes bump
/// the item version monotonically.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryStoreState>,
    pub attachments: Mutex<Vec<(String, String, usize)>>,
    fail_next_update: AtomicBool,
    racing_write: Mutex<Option<(String, ItemFields)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item directly, returning its key
    pub fn seed(&self, fields: ItemFields, collections: &[&str]) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_key += 1;
        state.next_version += 1;
        let key = format!("ITEM{}", state.next_key);
        let item = StoreItem {
            key: key.clone(),
            version: state.next_version,
            fields,
            collections: collections.iter().map(|c| c.to_string()).collect(),
        };
        state.items.insert(key.clone(), item);
        key
    }

    pub fn snapshot(&self, key: &str) -> Option<StoreItem> {
        self.state.lock().unwrap().items.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    /// Make the next update fail with a version conflict, as if another
    /// writer got there first
    pub fn inject_conflict(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Stage a write that lands just before the next conditioned update,
    /// bumping the item version so that update conflicts for real
    pub fn inject_racing_write(&self, key: &str, fields: ItemFields) {
        *self.racing_write.lock().unwrap() = Some((key.to_string(), fields));
    }

    fn apply_racing_write(&self) {
        if let Some((key, fields)) = self.racing_write.lock().unwrap().take() {
            let mut state = self.state.lock().unwrap();
            state.next_version += 1;
            let version = state.next_version;
            if let Some(item) = state.items.get_mut(&key) {
                item.version = version;
                item.fields = fields;
            }
        }
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn item(&self, key: &str) -> Result<StoreItem, StoreError> {
        self.snapshot(key).ok_or_else(|| StoreError::ItemNotFound {
            key: key.to_string(),
        })
    }

    async fn collection_items(&self, collection: &str) -> Result<Vec<StoreItem>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<StoreItem> = state
            .items
            .values()
            .filter(|item| item.collections.iter().any(|c| c == collection))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }

    async fn create_item(
        &self,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_key += 1;
        state.next_version += 1;
        let key = format!("ITEM{}", state.next_key);
        let item = StoreItem {
            key: key.clone(),
            version: state.next_version,
            fields: fields.clone(),
            collections: collections.to_vec(),
        };
        state.items.insert(key, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        key: &str,
        version: u64,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError> {
        self.apply_racing_write();
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                version,
            });
        }

        let mut state = self.state.lock().unwrap();
        state.next_version += 1;
        let new_version = state.next_version;
        let item = state
            .items
            .get_mut(key)
            .ok_or_else(|| StoreError::ItemNotFound {
                key: key.to_string(),
            })?;
        if item.version != version {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                version,
            });
        }
        item.version = new_version;
        item.fields = fields.clone();
        item.collections = collections.to_vec();
        Ok(item.clone())
    }

    async fn attach_artifact(
        &self,
        key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        if self.snapshot(key).is_none() {
            return Err(StoreError::ItemNotFound {
                key: key.to_string(),
            });
        }
        self.attachments
            .lock()
            .unwrap()
            .push((key.to_string(), filename.to_string(), bytes.len()));
        Ok(())
    }

    async fn has_artifact(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .attachments
            .lock()
            .unwrap()
            .iter()
            .any(|(attached, _, _)| attached == key))
    }
}

/// Discovery collaborator that replays scripted result lists and records
/// the queries it saw
#[derive(Default)]
pub struct ScriptedDiscovery {
    results: Mutex<Vec<Vec<PaperRecord>>>,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedDiscovery {
    pub fn returning(batches: Vec<Vec<PaperRecord>>) -> Self {
        Self {
            results: Mutex::new(batches),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Discovery for ScriptedDiscovery {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<PaperRecord>, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            return Ok(Vec::new());
        }
        let mut batch = results.remove(0);
        batch.truncate(max_results as usize);
        Ok(batch)
    }
}
