//! Unpaywall open-access lookup provider
//!
//! API docs: https://unpaywall.org/products/api
//! Requires a contact email (not a key, just identification). The lookup
//! returns candidate open-access locations; each is tried in order until
//! one yields a validated PDF.

use super::{looks_like_pdf, single_attempt, ArtifactProvider, ProviderError, ProviderFetch};
use crate::domain::PaperRecord;
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.unpaywall.org/v2";

/// Cap on candidate downloads per lookup; keeps the fetch budget bounded
const MAX_CANDIDATE_DOWNLOADS: usize = 5;

#[derive(Debug, Deserialize)]
struct UnpaywallResponse {
    best_oa_location: Option<OaLocation>,
    oa_locations: Option<Vec<OaLocation>>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    url: Option<String>,
    url_for_pdf: Option<String>,
}

pub struct UnpaywallProvider {
    client: HttpClient,
    email: String,
}

impl UnpaywallProvider {
    pub fn new(email: &str, user_agent: &str, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(user_agent, timeout),
            email: email.to_string(),
        }
    }

    async fn try_fetch(&self, doi: &str) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/{}", API_BASE, urlencoding::encode(doi));
        let response = self
            .client
            .get_with_params(&url, &[("email", &self.email)])
            .await?;

        if response.status == 404 {
            return Err(ProviderError::NotFound);
        }
        if !response.is_success() {
            return Err(ProviderError::Unavailable {
                detail: format!("lookup returned status {}", response.status),
            });
        }

        let candidates = parse_candidate_urls(&response.text())?;
        if candidates.is_empty() {
            return Err(ProviderError::NotFound);
        }

        let tried = candidates.len().min(MAX_CANDIDATE_DOWNLOADS);
        for candidate in candidates.iter().take(MAX_CANDIDATE_DOWNLOADS) {
            debug!(doi = %doi, url = %candidate, "trying open-access location");
            match self.client.get(candidate).await {
                Ok(resp)
                    if resp.is_success() && looks_like_pdf(resp.content_type(), &resp.body) =>
                {
                    return Ok(resp.body);
                }
                Ok(resp) => {
                    debug!(url = %candidate, status = resp.status, "location rejected");
                }
                Err(error) => {
                    debug!(url = %candidate, error = %error, "location unreachable");
                }
            }
        }

        Err(ProviderError::Unavailable {
            detail: format!("no usable PDF among {} open-access locations", tried),
        })
    }
}

#[async_trait]
impl ArtifactProvider for UnpaywallProvider {
    fn name(&self) -> &str {
        "unpaywall"
    }

    fn call_allowance(&self) -> u32 {
        // one lookup plus the capped candidate downloads
        1 + MAX_CANDIDATE_DOWNLOADS as u32
    }

    async fn fetch(&self, doi: &str, _record: &PaperRecord) -> ProviderFetch {
        single_attempt(self.name(), self.try_fetch(doi).await)
    }
}

/// Extract candidate PDF URLs from an Unpaywall lookup response, best
/// location first, deduplicated in order
fn parse_candidate_urls(json: &str) -> Result<Vec<String>, ProviderError> {
    let response: UnpaywallResponse =
        serde_json::from_str(json).map_err(|e| ProviderError::Unavailable {
            detail: format!("invalid Unpaywall JSON: {}", e),
        })?;

    let mut candidates = Vec::new();
    let mut push = |url: Option<String>| {
        if let Some(url) = url {
            if !url.is_empty() && !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    };

    if let Some(best) = response.best_oa_location {
        push(best.url_for_pdf);
        push(best.url);
    }
    for location in response.oa_locations.unwrap_or_default() {
        push(location.url_for_pdf);
        push(location.url);
    }

    Ok(candidates)
}
