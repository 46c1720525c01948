use thiserror::Error;

use crate::validation::ValidationError;

/// Failures that stop a provider request. Soft outcomes (an insert the engine
/// refused, zero rows affected) are ordinary return values, not errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The URI is not one this provider serves.
    #[error("unknown URI: {0}")]
    InvalidUri(String),

    /// The URI is valid but the operation does not apply to it.
    #[error("{operation} is not supported for {uri}")]
    UnsupportedUri { operation: &'static str, uri: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unexpected engine failure, carrying the storage layer's context chain.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
