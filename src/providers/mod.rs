//! Artifact providers and the fallback resolver
//!
//! Providers are tried in a fixed, operator-configured priority order.
//! Each provider failure is recorded as a [`FetchAttempt`] and resolution
//! moves on; the first validated PDF wins and resolution stops. Exhausting
//! every provider is not an error — the record is still synchronized
//! without an attachment.

pub mod mirrors;
pub mod unpaywall;

pub use mirrors::MirrorProvider;
pub use unpaywall::UnpaywallProvider;

use crate::config::SyncConfig;
use crate::domain::{Artifact, AttemptOutcome, FetchAttempt, PaperRecord, Resolution};
use crate::http::HttpError;
use crate::identifiers::normalize_doi;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of a single provider attempt. Never fatal to the run; the
/// resolver records it and tries the next candidate.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no artifact for this identifier")]
    NotFound,
    #[error("request refused: {detail}")]
    Blocked { detail: String },
    #[error("provider unavailable: {detail}")]
    Unavailable { detail: String },
}

impl From<HttpError> for ProviderError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::RateLimited => ProviderError::Blocked {
                detail: "rate limited".to_string(),
            },
            other => ProviderError::Unavailable {
                detail: other.to_string(),
            },
        }
    }
}

/// Payload plus attempt log from one provider. Multi-endpoint providers
/// (mirror rotation) append one attempt per endpoint tried.
#[derive(Debug, Default)]
pub struct ProviderFetch {
    pub artifact: Option<Artifact>,
    pub attempts: Vec<FetchAttempt>,
}

/// A source of PDF artifacts, keyed by DOI
#[async_trait]
pub trait ArtifactProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Upper bound on the endpoint requests one fetch may make. The
    /// resolver scales its overall ceiling by this, so a hung endpoint
    /// burns its own per-call budget without cancelling the rest of a
    /// rotation.
    fn call_allowance(&self) -> u32 {
        1
    }

    async fn fetch(&self, doi: &str, record: &PaperRecord) -> ProviderFetch;
}

#[async_trait]
impl<T: ArtifactProvider + ?Sized> ArtifactProvider for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn call_allowance(&self) -> u32 {
        (**self).call_allowance()
    }

    async fn fetch(&self, doi: &str, record: &PaperRecord) -> ProviderFetch {
        (**self).fetch(doi, record).await
    }
}

/// Wrap a single-shot fetch result into a [`ProviderFetch`] with one
/// attempt record
pub fn single_attempt(provider: &str, result: Result<Vec<u8>, ProviderError>) -> ProviderFetch {
    match result {
        Ok(bytes) => ProviderFetch {
            artifact: Some(Artifact {
                bytes,
                provider: provider.to_string(),
            }),
            attempts: vec![FetchAttempt::new(provider, AttemptOutcome::Success)],
        },
        Err(error) => {
            let outcome = match &error {
                ProviderError::NotFound => AttemptOutcome::NotFound,
                ProviderError::Blocked { .. } => AttemptOutcome::Blocked,
                ProviderError::Unavailable { .. } => AttemptOutcome::Failed,
            };
            ProviderFetch {
                artifact: None,
                attempts: vec![FetchAttempt::new(provider, outcome).with_detail(error.to_string())],
            }
        }
    }
}

/// Check that a response plausibly carries a PDF: non-empty body and
/// either a pdf content type or the PDF magic prefix
pub fn looks_like_pdf(content_type: Option<&str>, body: &[u8]) -> bool {
    if body.is_empty() {
        return false;
    }
    if content_type
        .map(|ct| ct.to_ascii_lowercase().contains("pdf"))
        .unwrap_or(false)
    {
        return true;
    }
    body.starts_with(b"%PDF-")
}

/// Drives the provider chain for one record at a time
pub struct Resolver {
    providers: Vec<Box<dyn ArtifactProvider>>,
    call_timeout: Duration,
}

impl Resolver {
    pub fn new(providers: Vec<Box<dyn ArtifactProvider>>, call_timeout: Duration) -> Self {
        Self {
            providers,
            call_timeout,
        }
    }

    /// Build the standard chain from configuration: open-access lookup
    /// first (when a contact email is configured), then mirror rotation
    /// (when any mirrors are configured).
    pub fn from_config(config: &SyncConfig) -> Self {
        let mut providers: Vec<Box<dyn ArtifactProvider>> = Vec::new();
        if let Some(email) = &config.unpaywall_email {
            providers.push(Box::new(UnpaywallProvider::new(
                email,
                &config.user_agent,
                config.call_timeout(),
            )));
        }
        if !config.mirrors.is_empty() {
            providers.push(Box::new(MirrorProvider::new(
                config.mirrors.clone(),
                &config.user_agent,
                config.call_timeout(),
            )));
        }
        Self::new(providers, config.call_timeout())
    }

    /// Try providers in priority order, stopping at the first validated
    /// PDF. A missing or malformed DOI short-circuits the whole chain
    /// with a single skipped attempt, since every configured provider is
    /// DOI-keyed.
    pub async fn resolve(&self, record: &PaperRecord) -> Resolution {
        let mut resolution = Resolution::default();

        let doi = record.doi.as_deref().and_then(normalize_doi);
        let Some(doi) = doi else {
            debug!(title = %record.title, "no usable identifier, skipping providers");
            resolution.attempts.push(
                FetchAttempt::new("resolver", AttemptOutcome::Skipped)
                    .with_detail("skipped: no identifier"),
            );
            return resolution;
        };

        for provider in &self.providers {
            // Per-request timeouts live in the providers' HTTP clients;
            // this ceiling only catches a provider that stops making
            // progress entirely.
            let ceiling = self
                .call_timeout
                .saturating_mul(provider.call_allowance().max(1));
            let fetched = match tokio::time::timeout(ceiling, provider.fetch(&doi, record)).await {
                Ok(fetched) => fetched,
                Err(_) => ProviderFetch {
                    artifact: None,
                    attempts: vec![FetchAttempt::new(provider.name(), AttemptOutcome::Failed)
                        .with_detail("timed out")],
                },
            };

            resolution.attempts.extend(fetched.attempts);
            if let Some(artifact) = fetched.artifact {
                info!(doi = %doi, provider = %artifact.provider, "artifact resolved");
                resolution.artifact = Some(artifact);
                return resolution;
            }
        }

        info!(doi = %doi, attempts = resolution.attempts.len(), "all providers exhausted");
        resolution
    }
}
