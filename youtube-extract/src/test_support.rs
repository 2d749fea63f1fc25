//! Scripted collaborators shared by the unit tests.

use crate::credentials::Token;
use crate::error::{Error, Result};
use crate::oauth::{AuthorizationServer, ConsentRequest};
use crate::session::ConsentPrompt;
use crate::youtube_api::AuthenticatedRequest;
use http_body_util::Full;
use hyper::body::{self, Bytes};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Authorization server that issues canned tokens and records what it was asked.
#[derive(Debug, Default)]
pub(crate) struct ScriptedServer {
    /// Token handed out for any authorization code; `None` rejects every code.
    exchange_with: Option<Token>,
    /// Token handed out on refresh; `None` reports an invalid grant.
    refresh_with: Option<Token>,
    exchanges: Mutex<Vec<(String, String)>>,
    refreshes: Mutex<Vec<String>>,
}

impl ScriptedServer {
    pub(crate) fn issuing(token: Token) -> Self {
        Self {
            exchange_with: Some(token),
            ..Self::default()
        }
    }

    pub(crate) fn refreshing_to(token: Token) -> Self {
        Self {
            refresh_with: Some(token),
            ..Self::default()
        }
    }

    pub(crate) fn exchanges(&self) -> Vec<(String, String)> {
        self.exchanges.lock().unwrap().clone()
    }

    pub(crate) fn refreshes(&self) -> Vec<String> {
        self.refreshes.lock().unwrap().clone()
    }

    pub(crate) fn exchange_count(&self) -> usize {
        self.exchanges.lock().unwrap().len()
    }

    pub(crate) fn refresh_count(&self) -> usize {
        self.refreshes.lock().unwrap().len()
    }
}

impl AuthorizationServer for ScriptedServer {
    fn consent_url(&self, state: &str) -> Result<ConsentRequest> {
        Ok(ConsentRequest {
            url: format!("https://auth.example/consent?state={state}"),
            pkce_verifier: "verifier".into(),
        })
    }

    async fn exchange_code(&self, code: String, pkce_verifier: String) -> Result<Token> {
        self.exchanges.lock().unwrap().push((code, pkce_verifier));
        self.exchange_with
            .clone()
            .ok_or_else(|| Error::ConsentFailed("invalid_grant".into()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<Token>> {
        self.refreshes.lock().unwrap().push(refresh_token.to_string());
        Ok(self.refresh_with.clone())
    }
}

/// Consent prompt that answers with a fixed code and remembers the URLs it was shown.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompt {
    pub(crate) code: String,
    pub(crate) presented: Vec<String>,
}

impl ScriptedPrompt {
    pub(crate) fn answering(code: &str) -> Self {
        Self {
            code: code.to_string(),
            presented: Vec::new(),
        }
    }
}

impl ConsentPrompt for ScriptedPrompt {
    fn present(&mut self, url: &str) -> Result<()> {
        self.presented.push(url.to_string());
        Ok(())
    }

    async fn await_code(&mut self) -> Result<String> {
        Ok(self.code.clone())
    }
}

/// An [`AuthenticatedRequest`] that replays canned JSON bodies in order and records every
/// request it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingApi {
    responses: Mutex<VecDeque<(String, serde_json::Value)>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl RecordingApi {
    /// Queues `body` as the answer to the next request, which must target `resource`.
    pub(crate) fn respond(self, resource: &str, body: serde_json::Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((resource.to_string(), body));
        self
    }

    pub(crate) fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }

    /// Resources requested so far, in order.
    pub(crate) fn resources(&self) -> Vec<String> {
        self.requests().into_iter().map(|(r, _)| r).collect()
    }
}

impl AuthenticatedRequest for RecordingApi {
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.requests.lock().unwrap().push((
            resource.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        let (expected, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request for {resource}"));
        assert_eq!(expected, resource, "requests issued out of order");
        serde_json::from_value(body).map_err(|e| Error::api(resource, e))
    }
}

/// What the mock API server saw of an incoming request.
#[derive(Debug)]
pub(crate) struct MockRequest {
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) authorization: Option<String>,
}

/// Serves `handler` over HTTP on a random local port and returns the base URL.
///
/// The handler returns a status code and a JSON body.
pub(crate) async fn serve_api<F>(handler: F) -> String
where
    F: Fn(&MockRequest) -> (u16, serde_json::Value) + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to localhost");
    let addr = listener.local_addr().expect("get local address");
    let handler = Arc::new(handler);
    tokio::spawn(async move {
        while let Ok((conn, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let conn = hyper_util::rt::TokioIo::new(conn);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let handler = Arc::clone(&handler);
                    async move {
                        let seen = MockRequest {
                            path: req.uri().path().to_string(),
                            query: req.uri().query().map(String::from),
                            authorization: req
                                .headers()
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(String::from),
                        };
                        let (status, body) = handler(&seen);
                        let mut response = Response::new(Full::<Bytes>::from(body.to_string()));
                        *response.status_mut() =
                            StatusCode::from_u16(status).expect("valid status code");
                        response.headers_mut().insert(
                            "content-type",
                            hyper::header::HeaderValue::from_static("application/json"),
                        );
                        Ok::<_, std::convert::Infallible>(response)
                    }
                });
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(conn, service)
                    .await;
            });
        }
    });
    format!("http://{addr}")
}
