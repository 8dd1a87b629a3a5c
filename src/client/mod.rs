mod transport;

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::core::errors::EngineError;

pub(crate) use transport::{
    HttpTransport, RawResponse, RequestBody, Transport, TransportFailure, TransportRequest,
};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

struct Session {
    transport: Box<dyn Transport>,
    token: Option<String>,
    cookies: BTreeMap<String, String>,
}

/// HTTP client for the remote service. Owns the mutable session (auth token +
/// cookie jar) shared by all concurrently issued requests, and the retry
/// budget for connection-level failures.
///
/// Every request holds the session read lock for the duration of the
/// exchange, so [`RemoteClient::rotate_session`] (which takes the write lock)
/// acts as a rotation barrier: it waits for in-flight requests to drain and
/// then swaps transport, token and cookies in one step. No request can
/// observe a half-rotated session.
pub(crate) struct RemoteClient {
    session: RwLock<Session>,
    timeout: Duration,
}

impl RemoteClient {
    pub(crate) fn new(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        Self {
            session: RwLock::new(Session {
                transport,
                token: None,
                cookies: BTreeMap::new(),
            }),
            timeout,
        }
    }

    pub(crate) async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, EngineError> {
        self.request(Method::GET, url, params, RequestBody::Empty, self.timeout).await
    }

    pub(crate) async fn get_with_timeout(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, EngineError> {
        self.request(Method::GET, url, params, RequestBody::Empty, timeout).await
    }

    pub(crate) async fn post_json(
        &self,
        url: &str,
        params: &[(String, String)],
        body: Value,
    ) -> Result<RawResponse, EngineError> {
        self.request(Method::POST, url, params, RequestBody::Json(body), self.timeout).await
    }

    pub(crate) async fn post_form(
        &self,
        url: &str,
        fields: Vec<(String, String)>,
    ) -> Result<RawResponse, EngineError> {
        self.request(Method::POST, url, &[], RequestBody::Form(fields), self.timeout).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: RequestBody,
        timeout: Duration,
    ) -> Result<RawResponse, EngineError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let outcome = {
                let session = self.session.read().await;
                let request = TransportRequest {
                    method: method.clone(),
                    url: url.to_string(),
                    params: params.to_vec(),
                    body: body.clone(),
                    token: session.token.clone(),
                    cookie_header: cookie_header(&session.cookies),
                    timeout,
                };
                tracing::debug!(method = %request.method, url = %masked_url(url), "remote request");
                session.transport.execute(request).await
            };

            match outcome {
                Ok(response) => {
                    if !response.set_cookies.is_empty() {
                        let mut session = self.session.write().await;
                        for (name, value) in &response.set_cookies {
                            session.cookies.insert(name.clone(), value.clone());
                        }
                    }
                    return Ok(response);
                }
                Err(failure) => {
                    tracing::error!(url = %masked_url(url), error = %failure, "transport failure");
                    if attempts > MAX_RETRIES {
                        return Err(EngineError::Transport {
                            attempts,
                            message: failure.to_string(),
                        });
                    }
                    sleep(RETRY_DELAY).await;
                    tracing::info!(url = %masked_url(url), attempt = attempts, "retrying request");
                }
            }
        }
    }

    pub(crate) async fn set_token(&self, token: String) {
        self.session.write().await.token = Some(token);
    }

    pub(crate) async fn set_cookies(&self, cookies: BTreeMap<String, String>) {
        self.session.write().await.cookies.extend(cookies);
    }

    pub(crate) async fn cookies(&self) -> BTreeMap<String, String> {
        self.session.read().await.cookies.clone()
    }

    /// Replace the transport and its auth/cookie state in one step, after all
    /// in-flight requests have completed.
    pub(crate) async fn rotate_session(
        &self,
        transport: Box<dyn Transport>,
        token: Option<String>,
        cookies: BTreeMap<String, String>,
    ) {
        let mut session = self.session.write().await;
        session.transport = transport;
        session.token = token;
        session.cookies = cookies;
        tracing::debug!("session rotated");
    }
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

// Token-bearing URLs are masked in logs.
fn masked_url(url: &str) -> String {
    match url.rsplit_once("/isValidToken/") {
        Some((prefix, token)) => format!("{prefix}/isValidToken/{}", "*".repeat(token.len())),
        None => url.to_string(),
    }
}
