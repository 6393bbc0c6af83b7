//! Mirror rotation over an ordered endpoint list
//!
//! Mirror identity and ordering live in configuration; operators curate
//! ranked lists because availability shifts week to week. This component
//! is generic rotation: try each endpoint in order, classify the outcome,
//! continue on failure, stop on the first validated PDF.

use super::{looks_like_pdf, ArtifactProvider, ProviderFetch};
use crate::domain::{Artifact, AttemptOutcome, FetchAttempt, PaperRecord};
use crate::http::{HttpClient, HttpError, HttpResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub struct MirrorProvider {
    client: HttpClient,
    mirrors: Vec<String>,
}

impl MirrorProvider {
    pub fn new(mirrors: Vec<String>, user_agent: &str, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(user_agent, timeout),
            mirrors,
        }
    }
}

#[async_trait]
impl ArtifactProvider for MirrorProvider {
    fn name(&self) -> &str {
        "mirrors"
    }

    fn call_allowance(&self) -> u32 {
        self.mirrors.len().max(1) as u32
    }

    /// Rotate through the configured list. An empty list yields an empty
    /// result with no attempt records.
    async fn fetch(&self, doi: &str, _record: &PaperRecord) -> ProviderFetch {
        let mut fetched = ProviderFetch::default();

        for mirror in &self.mirrors {
            let url = mirror_url(mirror, doi);
            debug!(mirror = %mirror, url = %url, "trying mirror");

            let attempt = match self.client.get(&url).await {
                Err(HttpError::RateLimited) => {
                    FetchAttempt::new(mirror, AttemptOutcome::Blocked).with_detail("rate limited")
                }
                Err(error) => FetchAttempt::new(mirror, AttemptOutcome::Failed)
                    .with_detail(error.to_string()),
                Ok(response) => match classify_response(&response) {
                    MirrorOutcome::Pdf => {
                        fetched
                            .attempts
                            .push(FetchAttempt::new(mirror, AttemptOutcome::Success));
                        fetched.artifact = Some(Artifact {
                            bytes: response.body,
                            provider: mirror.clone(),
                        });
                        return fetched;
                    }
                    MirrorOutcome::NotFound => FetchAttempt::new(mirror, AttemptOutcome::NotFound),
                    MirrorOutcome::Blocked => FetchAttempt::new(mirror, AttemptOutcome::Blocked)
                        .with_detail(format!("status {}", response.status)),
                    MirrorOutcome::Failed(detail) => {
                        FetchAttempt::new(mirror, AttemptOutcome::Failed).with_detail(detail)
                    }
                },
            };
            fetched.attempts.push(attempt);
        }

        fetched
    }
}

enum MirrorOutcome {
    Pdf,
    NotFound,
    Blocked,
    Failed(String),
}

fn classify_response(response: &HttpResponse) -> MirrorOutcome {
    match response.status {
        404 | 410 => MirrorOutcome::NotFound,
        401 | 403 | 451 => MirrorOutcome::Blocked,
        status if !(200..300).contains(&status) => {
            MirrorOutcome::Failed(format!("status {}", status))
        }
        _ if looks_like_pdf(response.content_type(), &response.body) => MirrorOutcome::Pdf,
        _ => MirrorOutcome::Failed("no direct PDF in response".to_string()),
    }
}

/// Build the lookup URL for one mirror: templated as {base}/{encoded doi},
/// with an https scheme assumed for bare hostnames
pub fn mirror_url(mirror: &str, doi: &str) -> String {
    let base = if mirror.starts_with("http://") || mirror.starts_with("https://") {
        mirror.to_string()
    } else {
        format!("https://{}", mirror)
    };
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(doi)
    )
}
