//! OAuth client configuration, read from a Google "client secrets" JSON document.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Read-only access to the YouTube Data API.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Client identity and endpoints needed to run the consent flow and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

/// The on-disk layout as downloaded from the Google Cloud console.
///
/// Desktop clients are stored under `installed`, web clients under `web`.
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<ClientSecretsEntry>,
    web: Option<ClientSecretsEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsEntry {
    client_id: String,
    client_secret: Option<String>,
    auth_uri: String,
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl AuthConfig {
    /// Parses a client secrets document, requesting the given scopes.
    pub fn from_json(json: &str, scopes: &[&str]) -> Result<Self> {
        let secrets: ClientSecrets = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("parse client secrets: {e}")))?;
        let entry = secrets
            .installed
            .or(secrets.web)
            .ok_or_else(|| Error::InvalidConfig("neither `installed` nor `web` present".into()))?;
        let redirect_uri = entry
            .redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidConfig("no redirect URI configured".into()))?;

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret.filter(|s| !s.is_empty()),
            auth_uri: entry.auth_uri,
            token_uri: entry.token_uri,
            redirect_uri,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Reads and parses a client secrets file with the read-only YouTube scope.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("read client secrets {}: {e}", path.display()))
        })?;
        Self::from_json(&json, &[YOUTUBE_READONLY_SCOPE])
    }
}
