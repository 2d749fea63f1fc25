//! Error taxonomy shared by the credential store, the authorization session and the
//! extraction pipeline.

use std::path::PathBuf;

/// Convenience alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between loading a cached credential and assembling the
/// channel tree.
///
/// None of these are recovered from inside the library, with one exception: a
/// [`Error::CorruptToken`] seen while loading the cache makes the session fall back to the
/// consent flow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token cache location could not be resolved, created, read or written.
    #[error("token cache unavailable: {reason}")]
    StorageUnavailable {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A token file exists but does not parse.
    #[error("cached token at {} is corrupt", path.display())]
    CorruptToken {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The user's authorization code was rejected or could not be obtained.
    #[error("authorization consent failed: {0}")]
    ConsentFailed(String),

    /// The access token expired and the refresh credential is missing or no longer valid.
    #[error("stored credential can no longer be refreshed, re-authorization required")]
    ReauthorizationRequired,

    /// Transport failure, non-success status, or undecodable body from the API.
    #[error("{endpoint} request failed: {reason}")]
    ApiRequestFailed { endpoint: String, reason: String },

    /// The account name resolved to no channel.
    #[error("no channel found for account {0:?}")]
    NotFound(String),

    /// The extraction query names no account or no field groups.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The OAuth client configuration is missing fields or carries malformed endpoints.
    #[error("invalid authorization configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn storage(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            reason: reason.into(),
            source: Some(source),
        }
    }

    pub(crate) fn api(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::ApiRequestFailed {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}
