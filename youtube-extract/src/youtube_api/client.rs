//! Core YouTube API client functionality and access token management.

use crate::credentials::{CredentialStore, Token};
use crate::error::{Error, Result};
use crate::oauth::{AuthorizationServer, OAuthManager};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Root of the YouTube Data API v3.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The ability to issue an authenticated `GET` against a YouTube API resource.
///
/// This is what the extraction pipeline consumes; [`YouTubeClient`] is the production
/// implementation.
pub trait AuthenticatedRequest {
    /// Requests `resource` (e.g. `"channels"`) with the given query parameters and decodes
    /// the JSON response body.
    fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<T>>;
}

/// Client for interacting with the YouTube Data API v3.
///
/// The client wraps an OAuth2 token and refreshes it before a request whenever the access
/// credential has expired. Refreshed tokens are written back to the [`CredentialStore`] so the
/// next run starts from them. If the token cannot be refreshed every request fails with
/// [`Error::ReauthorizationRequired`]; the client never starts a consent flow on its own.
#[derive(Debug)]
pub struct YouTubeClient<A = OAuthManager> {
    /// The current OAuth2 token, behind a mutex so that refreshes are serialized.
    token: Arc<Mutex<Token>>,
    /// Authorization server used for refreshing tokens.
    auth: Arc<A>,
    /// Where refreshed tokens are persisted.
    store: CredentialStore,
    /// HTTP client for API requests.
    client: reqwest::Client,
    base_url: String,
}

impl<A> Clone for YouTubeClient<A> {
    fn clone(&self) -> Self {
        Self {
            token: Arc::clone(&self.token),
            auth: Arc::clone(&self.auth),
            store: self.store.clone(),
            client: self.client.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<A: AuthorizationServer> YouTubeClient<A> {
    /// Creates a new YouTube API client from a token, the server to refresh it with, and the
    /// store to persist refreshed tokens to.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built, which only happens when the TLS backend
    /// fails to initialize.
    pub fn new(token: Token, auth: Arc<A>, store: CredentialStore) -> Self {
        let client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("building reqwest client should not fail");
        Self {
            token: Arc::new(Mutex::new(token)),
            auth,
            store,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the HTTP client used for API requests.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns a clone of the current token.
    pub async fn token(&self) -> Token {
        self.token.lock().await.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    ///
    /// A refreshed token keeps the previous refresh credential when the server does not issue
    /// a new one, and is saved to the credential store before it is used.
    #[instrument(skip(self))]
    pub(crate) async fn fresh_access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        tracing::debug!("access token expired, attempting refresh");
        let Some(refresh_token) = token.refresh_token.clone() else {
            // nothing to refresh with, so use it for as long as the server still accepts it
            if !token.has_lapsed() {
                return Ok(token.access_token.clone());
            }
            tracing::warn!("access token expired and no refresh token is available");
            return Err(Error::ReauthorizationRequired);
        };
        let Some(mut refreshed) = self.auth.refresh(&refresh_token).await? else {
            tracing::error!("access token refresh failed, client is unusable");
            return Err(Error::ReauthorizationRequired);
        };
        if refreshed.refresh_token.is_none() {
            tracing::trace!("new token lacks refresh token, preserving original");
            refreshed.refresh_token = Some(refresh_token);
        }

        self.store.save(&refreshed)?;
        *token = refreshed;
        tracing::debug!("access token successfully refreshed");
        Ok(token.access_token.clone())
    }

    /// Makes an authenticated `GET` request to the YouTube API.
    ///
    /// Non-success statuses are turned into [`Error::ApiRequestFailed`] carrying the status
    /// and the response body.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;
        let url = format!("{}/{}", self.base_url, resource);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::api(resource, format!("send request to {url}: {e}")))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::api(
                resource,
                format!("status {status_code}: {error_text}"),
            ));
        }

        Ok(response)
    }
}

impl<A: AuthorizationServer> AuthenticatedRequest for YouTubeClient<A> {
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.make_authenticated_request(resource, query).await?;
        response
            .json()
            .await
            .map_err(|e| Error::api(resource, format!("parse response as JSON: {e}")))
    }
}
