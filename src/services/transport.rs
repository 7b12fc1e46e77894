//! Authenticated request primitive shared by every adapter.
//!
//! [`ApiClient`] resolves paths against a base URL, attaches the bearer
//! token and JSON content type, and turns non-2xx statuses into typed
//! errors. It never retries; retry policy belongs to the caller.
//! The wire is abstracted behind [`Transport`] so the same adapters run
//! against a real server ([`HttpTransport`]) or the in-process
//! [`MockServer`](crate::services::mock::MockServer).

use crate::services::session::SessionProvider;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

pub use reqwest::Method;

/// A fully resolved request, ready for the wire.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub base_url: String,
    /// Path relative to the base URL, always starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl PreparedRequest {
    /// Absolute URL including the percent-encoded query string.
    pub fn url(&self) -> String {
        let mut url = format!("{}{}", self.base_url, self.path);
        if !self.query.is_empty() {
            let query: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First query parameter with the given name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `METHOD /path`, used in logs and errors. Never includes the body.
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Status and body of a response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends prepared requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse>;
}

/// Transport backed by a real HTTP client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse> {
        let mut builder = self.client.request(request.method.clone(), request.url());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse::new(status, body))
    }
}

/// A request relative to an adapter's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    public: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
            public: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without the bearer token (login, setup, health).
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Authenticated client for one backend base URL.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            session,
        }
    }

    /// Same transport and session against another base URL.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self::new(
            base_url,
            Arc::clone(&self.transport),
            Arc::clone(&self.session),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session the client reads its token from.
    pub fn session(&self) -> &dyn SessionProvider {
        self.session.as_ref()
    }

    /// Absolute URL for a relative path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Resolve a request against the base URL and attach headers.
    pub fn prepare(&self, request: ApiRequest) -> PreparedRequest {
        let mut headers = vec![(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )];
        if !request.public {
            if let Some(token) = self.session.access_token() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        PreparedRequest {
            method: request.method,
            base_url: self.base_url.clone(),
            path: request.path,
            query: request.query,
            headers,
            body: request.body,
        }
    }

    /// Send a request; non-2xx statuses become errors.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse> {
        let prepared = self.prepare(request);
        let endpoint = prepared.endpoint();
        debug!("Sending request");

        let response = self.transport.send(prepared).await?;
        if !response.is_success() {
            debug!("Request failed with status: {}", response.status);
            return Err(Error::from_status(&endpoint, response.status));
        }
        Ok(response)
    }

    /// Send a request and decode its JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.execute(request).await?.json()
    }

    /// Send a request whose body is irrelevant.
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::BackendKind;
    use crate::services::session::{Session, SessionData};

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send(&self, _request: PreparedRequest) -> Result<RawResponse> {
            Ok(RawResponse::new(204, Vec::new()))
        }
    }

    fn client(session: Session) -> ApiClient {
        ApiClient::new(
            "http://host/api/v1/",
            Arc::new(NullTransport),
            Arc::new(session),
        )
    }

    #[test]
    fn test_prepare_attaches_bearer_token() {
        let session = Session::with_data(SessionData {
            backend: BackendKind::BitHarbor,
            access_token: "abc".to_string(),
            user_id: "u".to_string(),
            user_name: "n".to_string(),
        });
        let prepared = client(session).prepare(
            ApiRequest::get("movies/catalog/search")
                .query("query", "the matrix")
                .query("limit", 10),
        );

        assert_eq!(prepared.path, "/movies/catalog/search");
        assert_eq!(prepared.header("authorization"), Some("Bearer abc"));
        assert_eq!(prepared.header("content-type"), Some("application/json"));
        assert_eq!(
            prepared.url(),
            "http://host/api/v1/movies/catalog/search?query=the%20matrix&limit=10"
        );
    }

    #[test]
    fn test_public_request_has_no_token() {
        let session = Session::with_data(SessionData {
            backend: BackendKind::BitHarbor,
            access_token: "abc".to_string(),
            user_id: "u".to_string(),
            user_name: "n".to_string(),
        });
        let prepared = client(session).prepare(ApiRequest::post("/auth/login").public());
        assert!(prepared.header("Authorization").is_none());
    }

    #[test]
    fn test_url_for_joins_cleanly() {
        let client = client(Session::new());
        assert_eq!(client.url_for("/tv/all"), "http://host/api/v1/tv/all");
        assert_eq!(client.base_url(), "http://host/api/v1");
    }
}
