//! Zotero Web API client
//!
//! API docs: https://www.zotero.org/support/dev/web_api/v3/basics
//! Writes are conditioned with `If-Unmodified-Since-Version`; the server
//! answers 412 when the item moved on, which maps to
//! [`StoreError::VersionConflict`].

use super::{ItemFields, ReferenceStore, StoreError, StoreItem};
use crate::config::StoreConfig;
use crate::domain::author::parse_single_author;
use crate::domain::Author;
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ZoteroItem {
    key: String,
    version: u64,
    data: ZoteroItemData,
}

#[derive(Debug, Deserialize)]
struct ZoteroItemData {
    #[serde(rename = "itemType", default)]
    item_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    creators: Vec<ZoteroCreator>,
    #[serde(rename = "abstractNote")]
    abstract_note: Option<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    url: Option<String>,
    date: Option<String>,
    extra: Option<String>,
    #[serde(default)]
    collections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ZoteroCreator {
    #[serde(rename = "firstName")]
    first_name: Option<String>,
    #[serde(rename = "lastName")]
    last_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZoteroWriteResponse {
    #[serde(default)]
    successful: std::collections::HashMap<String, ZoteroItem>,
}

pub struct ZoteroStore {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl ZoteroStore {
    pub fn new(config: &StoreConfig, user_agent: &str, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(user_agent, timeout),
            base_url: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.library_prefix()
            ),
            api_key: config.api_key.clone(),
        }
    }

    fn auth_headers(&self) -> [(&str, &str); 1] {
        [("Zotero-API-Key", self.api_key.as_str())]
    }

    fn item_from_wire(item: ZoteroItem) -> StoreItem {
        let creators = item.data.creators.into_iter().map(author_from_creator);
        StoreItem {
            key: item.key,
            version: item.version,
            fields: ItemFields {
                title: item.data.title,
                creators: creators.collect(),
                abstract_text: item.data.abstract_note,
                doi: item.data.doi.filter(|d| !d.is_empty()),
                url: item.data.url.filter(|u| !u.is_empty()),
                date: item.data.date.filter(|d| !d.is_empty()),
                extra: item.data.extra.filter(|e| !e.is_empty()),
            },
            collections: item.data.collections,
        }
    }

    fn item_payload(fields: &ItemFields, collections: &[String]) -> serde_json::Value {
        json!({
            "itemType": "journalArticle",
            "title": fields.title,
            "creators": fields.creators.iter().map(creator_from_author).collect::<Vec<_>>(),
            "abstractNote": fields.abstract_text.clone().unwrap_or_default(),
            "DOI": fields.doi.clone().unwrap_or_default(),
            "url": fields.url.clone().unwrap_or_default(),
            "date": fields.date.clone().unwrap_or_default(),
            "extra": fields.extra.clone().unwrap_or_default(),
            "collections": collections,
        })
    }
}

#[async_trait]
impl ReferenceStore for ZoteroStore {
    async fn item(&self, key: &str) -> Result<StoreItem, StoreError> {
        let url = format!("{}/items/{}", self.base_url, key);
        let response = self.client.get_with_headers(&url, &self.auth_headers()).await?;

        if response.status == 404 {
            return Err(StoreError::ItemNotFound { key: key.to_string() });
        }
        if !response.is_success() {
            return Err(StoreError::Protocol {
                detail: format!("read of {} returned status {}", key, response.status),
            });
        }

        let item: ZoteroItem =
            serde_json::from_str(&response.text()).map_err(|e| StoreError::Protocol {
                detail: format!("invalid item JSON: {}", e),
            })?;
        Ok(Self::item_from_wire(item))
    }

    async fn collection_items(&self, collection: &str) -> Result<Vec<StoreItem>, StoreError> {
        let url = format!("{}/collections/{}/items?limit=100", self.base_url, collection);
        let response = self.client.get_with_headers(&url, &self.auth_headers()).await?;

        if !response.is_success() {
            return Err(StoreError::Protocol {
                detail: format!(
                    "collection listing returned status {}",
                    response.status
                ),
            });
        }

        let items: Vec<ZoteroItem> =
            serde_json::from_str(&response.text()).map_err(|e| StoreError::Protocol {
                detail: format!("invalid collection JSON: {}", e),
            })?;
        Ok(items.into_iter().map(Self::item_from_wire).collect())
    }

    async fn create_item(
        &self,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError> {
        let url = format!("{}/items", self.base_url);
        let payload = json!([Self::item_payload(fields, collections)]);
        let response = self
            .client
            .post_json(&url, &self.auth_headers(), &payload)
            .await?;

        if !response.is_success() {
            return Err(StoreError::Protocol {
                detail: format!("create returned status {}", response.status),
            });
        }

        let write: ZoteroWriteResponse =
            serde_json::from_str(&response.text()).map_err(|e| StoreError::Protocol {
                detail: format!("invalid write response: {}", e),
            })?;
        let created = write
            .successful
            .into_values()
            .next()
            .ok_or_else(|| StoreError::Protocol {
                detail: "create reported no successful item".to_string(),
            })?;

        debug!(key = %created.key, "created store item");
        Ok(Self::item_from_wire(created))
    }

    async fn update_item(
        &self,
        key: &str,
        version: u64,
        fields: &ItemFields,
        collections: &[String],
    ) -> Result<StoreItem, StoreError> {
        let url = format!("{}/items/{}", self.base_url, key);
        let version_header = version.to_string();
        let headers = [
            ("Zotero-API-Key", self.api_key.as_str()),
            ("If-Unmodified-Since-Version", version_header.as_str()),
        ];
        let payload = Self::item_payload(fields, collections);
        let response = self.client.patch_json(&url, &headers, &payload).await?;

        match response.status {
            412 => Err(StoreError::VersionConflict {
                key: key.to_string(),
                version,
            }),
            404 => Err(StoreError::ItemNotFound { key: key.to_string() }),
            status if (200..300).contains(&status) => {
                // 204 carries the new version in a response header
                let new_version = response
                    .header("last-modified-version")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(version + 1);
                Ok(StoreItem {
                    key: key.to_string(),
                    version: new_version,
                    fields: fields.clone(),
                    collections: collections.to_vec(),
                })
            }
            status => Err(StoreError::Protocol {
                detail: format!("update of {} returned status {}", key, status),
            }),
        }
    }

    async fn attach_artifact(
        &self,
        key: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        // Two requests: register the attachment item, then push the file
        // content for it.
        let url = format!("{}/items", self.base_url);
        let payload = json!([{
            "itemType": "attachment",
            "parentItem": key,
            "linkMode": "imported_file",
            "title": format!("PDF - {}", filename),
            "filename": filename,
            "contentType": "application/pdf",
        }]);
        let response = self
            .client
            .post_json(&url, &self.auth_headers(), &payload)
            .await?;

        if !response.is_success() {
            return Err(StoreError::Protocol {
                detail: format!("attachment create returned status {}", response.status),
            });
        }

        let write: ZoteroWriteResponse =
            serde_json::from_str(&response.text()).map_err(|e| StoreError::Protocol {
                detail: format!("invalid write response: {}", e),
            })?;
        let Some(attachment) = write.successful.into_values().next() else {
            return Err(StoreError::Protocol {
                detail: "attachment create reported no successful item".to_string(),
            });
        };

        let file_url = format!("{}/items/{}/file", self.base_url, attachment.key);
        let headers = [
            ("Zotero-API-Key", self.api_key.as_str()),
            ("If-None-Match", "*"),
            ("Content-Type", "application/pdf"),
        ];
        let upload = self
            .client
            .post_bytes(&file_url, &headers, bytes.to_vec())
            .await?;

        if !upload.is_success() {
            warn!(key = %key, status = upload.status, "file upload rejected");
            return Err(StoreError::Protocol {
                detail: format!("file upload returned status {}", upload.status),
            });
        }
        Ok(())
    }

    async fn has_artifact(&self, key: &str) -> Result<bool, StoreError> {
        let url = format!("{}/items/{}/children", self.base_url, key);
        let response = self.client.get_with_headers(&url, &self.auth_headers()).await?;

        if response.status == 404 {
            return Err(StoreError::ItemNotFound { key: key.to_string() });
        }
        if !response.is_success() {
            return Err(StoreError::Protocol {
                detail: format!("children listing returned status {}", response.status),
            });
        }

        let children: Vec<ZoteroItem> =
            serde_json::from_str(&response.text()).map_err(|e| StoreError::Protocol {
                detail: format!("invalid children JSON: {}", e),
            })?;
        Ok(children.iter().any(|c| c.data.item_type == "attachment"))
    }
}

/// Zotero splits single-token names into a bare `name` field; two-part
/// names use firstName/lastName
fn author_from_creator(creator: ZoteroCreator) -> Author {
    match (creator.last_name, creator.name) {
        (Some(last), _) => Author {
            given_name: creator.first_name.filter(|f| !f.is_empty()),
            family_name: last,
        },
        (None, Some(name)) => parse_single_author(&name),
        (None, None) => Author::new(""),
    }
}

fn creator_from_author(author: &Author) -> serde_json::Value {
    match &author.given_name {
        Some(given) => json!({
            "creatorType": "author",
            "firstName": given,
            "lastName": author.family_name,
        }),
        None => json!({
            "creatorType": "author",
            "name": author.family_name,
        }),
    }
}
