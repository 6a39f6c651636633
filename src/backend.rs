//! The network side of the chat client.
//!
//! [`Backend`] is the seam the chat client talks through; [`HttpBackend`] is
//! the implementation that speaks to a real `/chat` endpoint over HTTP.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, header};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{BACKEND_REQUEST_DURATION, BACKEND_REQUESTS, BACKEND_TRANSPORT_ERRORS};
use crate::wire::{ChatReply, ChatRequest};

/// Default location of the backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Path every question is posted to.
pub const CHAT_PATH: &str = "/chat";

/// Answers questions.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one round trip for `request`.
    ///
    /// A reply that carries an `error` field is still `Ok`; only transport
    /// and decoding failures are errors.
    async fn ask(&self, request: ChatRequest) -> Result<ChatReply>;
}

/// A [`Backend`] that posts JSON to `<base_url>/chat`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a backend for the given base URL with no transport timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a backend with custom settings.
    pub fn with_options(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(base_url)?.join(CHAT_PATH)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::validation(
                format!("unsupported scheme {:?}", endpoint.scheme()),
                Some("url".to_string()),
            ));
        }

        let mut builder = ReqwestClient::builder().default_headers(Self::default_headers());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The full URL questions are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn ask(&self, request: ChatRequest) -> Result<ChatReply> {
        BACKEND_REQUESTS.click();
        let start = Instant::now();
        let result = self.round_trip(&request).await;
        BACKEND_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            BACKEND_TRANSPORT_ERRORS.click();
        }
        result
    }
}

impl HttpBackend {
    async fn round_trip(&self, request: &ChatRequest) -> Result<ChatReply> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        // Error replies arrive with 4xx/5xx statuses but still carry a JSON
        // body, so the status alone decides nothing.
        let status = response.status();
        log::debug!("POST {} -> {}", self.endpoint, status);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        ChatReply::from_slice(&body)
    }
}
