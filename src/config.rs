//! Configuration consumed by the engine
//!
//! No CLI surface here; callers hand over parsed fields. Validation is
//! deliberately strict and runs before any processing begins: a bad
//! mirror list or missing credentials aborts the run instead of failing
//! item by item.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_STORE_BASE: &str = "https://api.zotero.org";
const DEFAULT_USER_AGENT: &str = "litsync/0.1 (literature research pipeline)";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid mirror entry '{0}'")]
    InvalidMirror(String),
    #[error("per-call timeout must be positive")]
    ZeroTimeout,
    #[error("contact email '{0}' is not plausible")]
    InvalidEmail(String),
    #[error("store credentials incomplete: {0}")]
    IncompleteStore(String),
}

/// Store credentials and addressing. Exactly one of `group_id` and
/// `user_id` selects the library.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreConfig {
    pub api_key: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_store_base")]
    pub base_url: String,
}

impl StoreConfig {
    /// Library path segment of every API URL
    pub fn library_prefix(&self) -> String {
        match (&self.group_id, &self.user_id) {
            (Some(group), _) => format!("groups/{}", group),
            (None, Some(user)) => format!("users/{}", user),
            (None, None) => String::new(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::IncompleteStore("api_key is empty".into()));
        }
        match (&self.group_id, &self.user_id) {
            (None, None) => Err(ConfigError::IncompleteStore(
                "neither group_id nor user_id is set".into(),
            )),
            (Some(_), Some(_)) => Err(ConfigError::IncompleteStore(
                "group_id and user_id are mutually exclusive".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SyncConfig {
    /// Contact identity for the open-access lookup; lookup is skipped
    /// entirely when absent
    #[serde(default)]
    pub unpaywall_email: Option<String>,
    /// Ordered, operator-curated mirror list
    #[serde(default)]
    pub mirrors: Vec<String>,
    /// Target collection for newly created items
    #[serde(default)]
    pub collection_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub store: StoreConfig,
}

impl SyncConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(email) = &self.unpaywall_email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidEmail(email.clone()));
            }
        }
        for mirror in &self.mirrors {
            let candidate = if mirror.starts_with("http://") || mirror.starts_with("https://") {
                mirror.clone()
            } else {
                format!("https://{}", mirror)
            };
            let parsed = Url::parse(&candidate)
                .map_err(|_| ConfigError::InvalidMirror(mirror.clone()))?;
            if parsed.host_str().is_none() {
                return Err(ConfigError::InvalidMirror(mirror.clone()));
            }
        }
        self.store.validate()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_store_base() -> String {
    DEFAULT_STORE_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        unpaywall_email = "research@example.org"
        mirrors = ["mirror-a.example", "https://mirror-b.example"]
        collection_key = "UV4I5VWV"

        [store]
        api_key = "k123"
        group_id = "5120604"
    "#;

    #[test]
    fn test_parse_minimal() {
        let config = SyncConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.unpaywall_email.as_deref(), Some("research@example.org"));
        assert_eq!(config.mirrors.len(), 2);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.store.library_prefix(), "groups/5120604");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", MINIMAL).unwrap();
        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.collection_key.as_deref(), Some("UV4I5VWV"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SyncConfig::load(std::path::Path::new("/nonexistent/litsync.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_defaults_applied() {
        let config = SyncConfig::from_toml_str(
            r#"
            [store]
            api_key = "k"
            user_id = "42"
            "#,
        )
        .unwrap();
        assert!(config.unpaywall_email.is_none());
        assert!(config.mirrors.is_empty());
        assert_eq!(config.store.base_url, DEFAULT_STORE_BASE);
        assert_eq!(config.store.library_prefix(), "users/42");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = SyncConfig::from_toml_str(
            r#"
            timeout_secs = 0
            [store]
            api_key = "k"
            group_id = "1"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_bad_email_rejected() {
        let result = SyncConfig::from_toml_str(
            r#"
            unpaywall_email = "not-an-email"
            [store]
            api_key = "k"
            group_id = "1"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidEmail(_))));
    }

    #[test]
    fn test_malformed_mirror_rejected() {
        let result = SyncConfig::from_toml_str(
            r#"
            mirrors = ["not a url"]
            [store]
            api_key = "k"
            group_id = "1"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidMirror(_))));
    }

    #[test]
    fn test_store_requires_exactly_one_library() {
        let neither = SyncConfig::from_toml_str(
            r#"
            [store]
            api_key = "k"
            "#,
        );
        assert!(matches!(neither, Err(ConfigError::IncompleteStore(_))));

        let both = SyncConfig::from_toml_str(
            r#"
            [store]
            api_key = "k"
            group_id = "1"
            user_id = "2"
            "#,
        );
        assert!(matches!(both, Err(ConfigError::IncompleteStore(_))));
    }
}
