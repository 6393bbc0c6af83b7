//! Fetch attempts and resolved artifacts

use serde::{Deserialize, Serialize};

/// Outcome of a single provider or mirror attempt
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failed,
    NotFound,
    Blocked,
    Skipped,
}

impl AttemptOutcome {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failed => "failed",
            AttemptOutcome::NotFound => "not-found",
            AttemptOutcome::Blocked => "blocked",
            AttemptOutcome::Skipped => "skipped",
        }
    }
}

/// One entry in the append-only attempt log, recorded per provider or
/// mirror tried for a record. Never mutated after being written.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FetchAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
    pub detail: Option<String>,
}

impl FetchAttempt {
    pub fn new(provider: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            provider: provider.into(),
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A fetched PDF payload and the provider that produced it
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub provider: String,
}

/// Result of running a record through the provider chain. At most one
/// artifact per record; first success wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub artifact: Option<Artifact>,
    pub attempts: Vec<FetchAttempt>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.artifact.is_none()
    }

    /// Name of the winning provider, if any
    pub fn provider(&self) -> Option<&str> {
        self.artifact.as_ref().map(|a| a.provider.as_str())
    }
}
