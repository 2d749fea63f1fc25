//! Turning a cached or freshly granted credential into an authenticated client.
//!
//! [`AuthorizationSession::acquire_client`] reuses the token in the [`CredentialStore`] when
//! there is one and otherwise walks the user through the consent flow: a URL is presented, the
//! user grants access in their browser, and the resulting authorization code is typed back in.
//! Presenting the URL and reading the code go through [`ConsentPrompt`] so that the terminal
//! can be swapped out.

use crate::credentials::{CredentialStore, Token};
use crate::error::{Error, Result};
use crate::oauth::AuthorizationServer;
use crate::youtube_api::YouTubeClient;
use std::future::Future;
use std::sync::Arc;

/// Opaque `state` value embedded in the consent URL and expected back with the code.
pub const CONSENT_STATE: &str = "state-token";

/// The user-facing half of the consent flow.
pub trait ConsentPrompt {
    /// Shows the consent URL to the user.
    fn present(&mut self, url: &str) -> Result<()>;

    /// Waits for the user to supply the authorization code.
    fn await_code(&mut self) -> impl Future<Output = Result<String>>;
}

/// Prompts on the terminal: prints the URL to stderr and reads the code from stdin.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    open_browser: bool,
}

impl TerminalPrompt {
    /// If `open_browser` is set, the consent URL is also opened in the user's browser.
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl ConsentPrompt for TerminalPrompt {
    fn present(&mut self, url: &str) -> Result<()> {
        tracing::info!(%url, "asking user to follow OAuth flow");
        eprintln!(
            "Go to the following link in your browser, then type the authorization code \
             (or paste the address you were redirected to):\n{url}"
        );
        if self.open_browser {
            if let Err(e) = webbrowser::open(url) {
                tracing::warn!("could not open browser: {e}");
            }
        }
        Ok(())
    }

    async fn await_code(&mut self) -> Result<String> {
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| Error::ConsentFailed(format!("read authorization code: {e}")))?
        .map_err(|e| Error::ConsentFailed(format!("read authorization code: {e}")))?;
        extract_code(&line, CONSENT_STATE)
    }
}

/// Pulls the authorization code out of what the user typed.
///
/// Accepts either the bare code or the full redirect URL. For a URL, the `state` parameter must
/// match `expected_state` and an `error` parameter is reported as a failed consent.
pub(crate) fn extract_code(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::ConsentFailed("no authorization code entered".into()));
    }
    let Some((_, query)) = input.split_once('?') else {
        return Ok(input.to_string());
    };
    let query = query.split_once('#').map_or(query, |(q, _)| q);

    let mut presented_state = None;
    let mut presented_code = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "error" => {
                return Err(Error::ConsentFailed(format!(
                    "authorization server returned error: {v}"
                )));
            }
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(expected_state) {
        return Err(Error::ConsentFailed("invalid state in redirect".into()));
    }
    let Some(code) = presented_code else {
        return Err(Error::ConsentFailed("no authorization code found".into()));
    };
    Ok(code.into_owned())
}

/// Produces authenticated clients, prompting for consent only when no usable cache exists.
#[derive(Debug)]
pub struct AuthorizationSession<A, P> {
    server: Arc<A>,
    store: CredentialStore,
    prompt: P,
}

impl<A: AuthorizationServer, P: ConsentPrompt> AuthorizationSession<A, P> {
    pub fn new(server: A, store: CredentialStore, prompt: P) -> Self {
        Self {
            server: Arc::new(server),
            store,
            prompt,
        }
    }

    /// Returns a client backed by the cached token, or by a newly granted one.
    ///
    /// A missing or corrupt cache triggers the consent flow. A token that fails to exchange is
    /// never cached. Once cached, a token is used as-is: if it turns out to be unrefreshable the
    /// client reports [`Error::ReauthorizationRequired`] rather than prompting again.
    #[tracing::instrument(skip(self))]
    pub async fn acquire_client(&mut self) -> Result<YouTubeClient<A>> {
        let token = match self.store.load() {
            Ok(Some(token)) => {
                tracing::debug!("reusing cached credential");
                token
            }
            Ok(None) => {
                tracing::debug!("no cached credential");
                self.consent().await?
            }
            Err(e @ Error::CorruptToken { .. }) => {
                tracing::warn!("ignoring unusable cached credential: {e}");
                self.consent().await?
            }
            Err(e) => return Err(e),
        };
        Ok(YouTubeClient::new(
            token,
            Arc::clone(&self.server),
            self.store.clone(),
        ))
    }

    async fn consent(&mut self) -> Result<Token> {
        let request = self.server.consent_url(CONSENT_STATE)?;
        self.prompt.present(&request.url)?;
        let code = self.prompt.await_code().await?;
        let token = self
            .server
            .exchange_code(code, request.pkce_verifier)
            .await?;
        self.store.save(&token)?;
        Ok(token)
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn server(&self) -> &A {
        &self.server
    }
}
