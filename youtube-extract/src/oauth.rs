//! OAuth 2.0 authorization-server access for YouTube API authentication.
//!
//! [`AuthorizationServer`] is the seam between the session logic and the network: it builds
//! consent URLs, exchanges authorization codes and refreshes tokens. [`OAuthManager`] is the
//! production implementation on top of the `oauth2` crate.

use crate::config::AuthConfig;
use crate::credentials::Token;
use crate::error::{Error, Result};
use jiff::{SignedDuration, Timestamp};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use std::future::Future;

/// A consent URL together with the PKCE verifier that must accompany the code exchange.
#[derive(Debug, Clone)]
pub struct ConsentRequest {
    pub url: String,
    pub pkce_verifier: String,
}

/// The operations the session needs from an OAuth authorization server.
pub trait AuthorizationServer {
    /// Builds the URL the user must visit to grant access, embedding `state` verbatim.
    fn consent_url(&self, state: &str) -> Result<ConsentRequest>;

    /// Exchanges an authorization code for a token.
    ///
    /// Fails with [`Error::ConsentFailed`] if the server rejects the code.
    fn exchange_code(
        &self,
        code: String,
        pkce_verifier: String,
    ) -> impl Future<Output = Result<Token>>;

    /// Obtains a new access token using a refresh credential.
    ///
    /// * `Ok(Some(token))` - refresh succeeded
    /// * `Ok(None)` - the refresh credential is no longer valid
    /// * `Err(_)` - network or other error occurred
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<Option<Token>>>;
}

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Manages OAuth 2.0 flows against the endpoints named in an [`AuthConfig`].
#[derive(Debug, Clone)]
pub struct OAuthManager {
    config: AuthConfig,
    http_client: reqwest::Client,
}

impl OAuthManager {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built, which only happens when the TLS backend
    /// fails to initialize.
    pub fn new(config: AuthConfig) -> Self {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("building reqwest client should not fail");
        Self {
            config,
            http_client,
        }
    }

    fn client(&self) -> Result<ConfiguredClient> {
        let auth_url = AuthUrl::new(self.config.auth_uri.clone())
            .map_err(|e| Error::InvalidConfig(format!("authorization endpoint: {e}")))?;
        let token_url = TokenUrl::new(self.config.token_uri.clone())
            .map_err(|e| Error::InvalidConfig(format!("token endpoint: {e}")))?;
        let redirect_url = RedirectUrl::new(self.config.redirect_uri.clone())
            .map_err(|e| Error::InvalidConfig(format!("redirect URI: {e}")))?;

        let mut client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);
        if let Some(secret) = &self.config.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }
        Ok(client)
    }
}

impl AuthorizationServer for OAuthManager {
    fn consent_url(&self, state: &str) -> Result<ConsentRequest> {
        let client = self.client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let state = CsrfToken::new(state.to_string());
        let (url, _state) = client
            .authorize_url(move || state)
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            // Without offline access Google issues no refresh token.
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(ConsentRequest {
            url: url.to_string(),
            pkce_verifier: pkce_verifier.secret().clone(),
        })
    }

    async fn exchange_code(&self, code: String, pkce_verifier: String) -> Result<Token> {
        let client = self.client()?;
        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(sr) => Error::ConsentFailed(format!(
                    "authorization server rejected code: {}{}",
                    sr.error(),
                    sr.error_description()
                        .map(|d| format!(" ({d})"))
                        .unwrap_or_default()
                )),
                e => Error::ConsentFailed(format!("exchange authorization code: {e}")),
            })?;

        tracing::debug!("exchanged authorization code for token");
        Ok(token_from_response(&response))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<Token>> {
        tracing::debug!("attempting to refresh OAuth token");

        let client = self.client()?;
        let refresh_token = RefreshToken::new(refresh_token.to_string());
        match client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(token_from_response(&new_token)))
            }
            Err(ref e @ RequestTokenError::ServerResponse(ref sr))
                if matches!(sr.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(Error::api("token refresh", e)),
        }
    }
}

/// Converts a token endpoint response into a storable [`Token`], anchoring `expires_in` to now.
pub(crate) fn token_from_response(response: &BasicTokenResponse) -> Token {
    let expiry = response
        .expires_in()
        .and_then(|d| SignedDuration::try_from(d).ok())
        .and_then(|d| Timestamp::now().checked_add(d).ok());
    Token {
        access_token: response.access_token().secret().clone(),
        refresh_token: response.refresh_token().map(|t| t.secret().clone()),
        expiry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YOUTUBE_READONLY_SCOPE;
    use crate::test_support::serve_api;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn manager() -> OAuthManager {
        OAuthManager::new(AuthConfig {
            client_id: "client-123".into(),
            client_secret: Some("secret".into()),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".into(),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            redirect_uri: "http://localhost".into(),
            scopes: vec![YOUTUBE_READONLY_SCOPE.into()],
        })
    }

    /// A manager whose token endpoint is served locally by `handler`.
    async fn manager_against<F>(handler: F) -> OAuthManager
    where
        F: Fn(&crate::test_support::MockRequest) -> (u16, serde_json::Value)
            + Send
            + Sync
            + 'static,
    {
        let base = serve_api(move |request| {
            assert_eq!(request.path, "/token");
            handler(request)
        })
        .await;
        let mut manager = manager();
        manager.config.token_uri = format!("{base}/token");
        manager.http_client = reqwest::Client::builder().no_proxy().build().unwrap();
        manager
    }

    fn invalid_grant() -> (u16, serde_json::Value) {
        (
            400,
            json!({"error": "invalid_grant", "error_description": "Bad Request"}),
        )
    }

    #[tokio::test]
    async fn rejected_code_is_a_consent_failure() {
        let manager = manager_against(|_| invalid_grant()).await;
        let err = manager
            .exchange_code("4/expired".into(), "verifier".into())
            .await
            .unwrap_err();
        match err {
            Error::ConsentFailed(msg) => assert!(msg.contains("invalid_grant"), "{msg}"),
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[tokio::test]
    async fn accepted_code_yields_token() {
        let manager = manager_against(|_| {
            (
                200,
                json!({
                    "access_token": "granted",
                    "token_type": "Bearer",
                    "expires_in": 3599,
                    "refresh_token": "1//refresh"
                }),
            )
        })
        .await;
        let token = manager
            .exchange_code("4/0Ab".into(), "verifier".into())
            .await
            .unwrap();
        assert_eq!(token.access_token, "granted");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        assert!(token.expiry.is_some());
    }

    #[tokio::test]
    async fn refresh_with_revoked_grant_is_none() {
        let manager = manager_against(|_| invalid_grant()).await;
        assert_eq!(manager.refresh("1//revoked").await.unwrap(), None);
    }

    #[tokio::test]
    async fn refresh_server_error_is_an_api_failure() {
        let manager =
            manager_against(|_| (500, json!({"error": "temporarily_unavailable"}))).await;
        let err = manager.refresh("1//refresh").await.unwrap_err();
        match err {
            Error::ApiRequestFailed { endpoint, .. } => assert_eq!(endpoint, "token refresh"),
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_returns_new_token() {
        let manager = manager_against(|_| {
            (
                200,
                json!({"access_token": "new", "token_type": "Bearer", "expires_in": 3600}),
            )
        })
        .await;
        let token = manager.refresh("1//refresh").await.unwrap().unwrap();
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token, None);
        assert!(!token.is_expired());
    }

    #[test]
    fn consent_url_carries_state_scope_and_offline_access() {
        let request = manager().consent_url("state-token").unwrap();
        let url = reqwest::Url::parse(&request.url).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["state"], "state-token");
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["redirect_uri"], "http://localhost");
        assert_eq!(params["scope"], YOUTUBE_READONLY_SCOPE);
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["code_challenge_method"], "S256");
        assert!(!request.pkce_verifier.is_empty());
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        let mut broken = manager();
        broken.config.token_uri = "not a url".into();
        let err = broken.consent_url("s").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "{err:?}");
    }

    #[test]
    fn converts_token_response() {
        let response: BasicTokenResponse = serde_json::from_str(
            r#"{
                "access_token": "ya29.a0",
                "token_type": "Bearer",
                "expires_in": 3599,
                "refresh_token": "1//0g"
            }"#,
        )
        .unwrap();
        let before = Timestamp::now();
        let token = token_from_response(&response);
        assert_eq!(token.access_token, "ya29.a0");
        assert_eq!(token.refresh_token.as_deref(), Some("1//0g"));
        let expiry = token.expiry.unwrap();
        assert!(expiry > before);
        assert!(!token.is_expired());
    }

    #[test]
    fn token_response_without_expiry_or_refresh() {
        let response: BasicTokenResponse =
            serde_json::from_str(r#"{"access_token": "abc", "token_type": "Bearer"}"#).unwrap();
        let token = token_from_response(&response);
        assert_eq!(
            token,
            Token {
                access_token: "abc".into(),
                refresh_token: None,
                expiry: None,
            }
        );
    }
}
