//! Crate-level error umbrella
//!
//! Specific taxonomies live next to their components: [`ProviderError`]
//! with the providers (retryable by moving to the next candidate),
//! [`StoreError`] with the store (version conflicts retryable by
//! re-reading), [`ConfigError`] with configuration (fatal before
//! processing begins).

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::http::HttpError;
pub use crate::providers::ProviderError;
pub use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Http(#[from] HttpError),
}
