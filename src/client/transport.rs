use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use serde_json::Value;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/142.0.0.0 Safari/537.36 Edg/142.0.0.0";

/// One fully prepared HTTP exchange. The client layer owns auth and cookie
/// state; the transport only ships what it is handed.
#[derive(Debug, Clone)]
pub(crate) struct TransportRequest {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) token: Option<String>,
    pub(crate) cookie_header: Option<String>,
    pub(crate) timeout: Duration,
}

#[derive(Debug, Clone)]
pub(crate) enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub(crate) status: u16,
    pub(crate) body: String,
    /// Name/value pairs from `Set-Cookie` headers, in response order.
    pub(crate) set_cookies: Vec<(String, String)>,
}

/// Connection-level failure (connect, timeout, broken transfer). Anything the
/// retry budget applies to.
#[derive(Debug)]
pub(crate) struct TransportFailure(pub(crate) String);

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportFailure>;
}

/// reqwest-backed transport. Redirects are disabled: the login endpoint
/// answers 302 and the caller must observe it rather than follow it.
pub(crate) struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub(crate) fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .query(&request.params)
            .timeout(request.timeout);

        if let Some(token) = &request.token {
            builder = builder.header(AUTHORIZATION, token);
        }
        if let Some(cookie) = &request.cookie_header {
            builder = builder.header(COOKIE, cookie);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(|err| TransportFailure(err.to_string()))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(parse_set_cookie)
            .collect();

        let body = response.text().await.map_err(|err| TransportFailure(err.to_string()))?;

        Ok(RawResponse { status, body, set_cookies })
    }
}

fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_keeps_first_segment_only() {
        let parsed = parse_set_cookie("USERINFO=%7B%22a%22%3A1%7D; Path=/; HttpOnly");
        assert_eq!(parsed, Some(("USERINFO".to_string(), "%7B%22a%22%3A1%7D".to_string())));
    }

    #[test]
    fn set_cookie_rejects_nameless() {
        assert_eq!(parse_set_cookie("=value; Path=/"), None);
        assert_eq!(parse_set_cookie("no-equals-sign"), None);
    }
}
