//! HTTP client implementation using reqwest

use crate::config::{ClientConfig, ConnectionConfig};
use crate::http::error::map_http_error;
use crate::http::{ByteStream, CallKind, CallOptions, ClientError, ClientResult, ProcessTransport};
use crate::protocol::RequestOptions;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::Form;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Maximum size of a JSON (non-streamed) response body
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("ragchat/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Base URL every endpoint path is appended to
    base_url: Url,

    /// Maximum JSON response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client for the default local service
    pub fn new() -> ClientResult<Self> {
        Self::from_config(&ClientConfig::default())
    }

    /// Create a new HTTP client from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::build(&config.endpoint.base_url, &config.connection)
    }

    /// Create a new HTTP client with custom timeouts
    pub fn with_config(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> ClientResult<Self> {
        let connection = ConnectionConfig {
            connect_timeout_ms: saturating_millis(connect_timeout),
            request_timeout_ms: saturating_millis(request_timeout),
            max_idle_per_host,
            ..Default::default()
        };
        Self::build(base_url, &connection)
    }

    fn build(base_url: &str, connection: &ConnectionConfig) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Configuration(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let client = ClientBuilder::new()
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .pool_idle_timeout(connection.keepalive())
            .connect_timeout(connection.connect_timeout())
            .timeout(connection.request_timeout())
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Base URL of the service
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for a call kind, followed by extra path segments
    ///
    /// Segments are percent-encoded, so a file name cannot escape its path slot.
    pub fn build_url(&self, call_kind: CallKind, extra_segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ClientError::Configuration(format!("Base URL cannot carry a path: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(call_kind.endpoint().split('/').filter(|s| !s.is_empty()));
            segments.extend(extra_segments);
        }
        Ok(url)
    }

    /// Apply the per-call headers and timeout
    fn prepare(&self, builder: RequestBuilder, options: &CallOptions) -> RequestBuilder {
        let builder = builder.header("X-Request-ID", options.request_id.to_string());
        match options.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Send a request and turn transport failures and non-success statuses into errors
    async fn send(&self, builder: RequestBuilder, options: &CallOptions) -> ClientResult<Response> {
        let request_id = options.request_id;

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Request timeout [request_id: {}]", request_id);
                ClientError::Timeout
            } else if e.is_connect() {
                error!("Connection error [request_id: {}]: {}", request_id, e);
                ClientError::Connection {
                    message: format!("{} [request_id: {}]", e, request_id),
                }
            } else {
                error!("Request error [request_id: {}]: {}", request_id, e);
                ClientError::Connection {
                    message: format!("{} [request_id: {}]", e, request_id),
                }
            }
        })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            // Try to get response body for error details
            let body = response.text().await.ok();

            warn!(
                "Request failed with status {} [request_id: {}]",
                status, request_id
            );

            return Err(map_http_error(status, body, request_id));
        }

        Ok(response)
    }

    /// Validate response content type
    fn validate_content_type(response: &Response) -> ClientResult<()> {
        if let Some(content_type) = response.headers().get("content-type") {
            let content_type_str = content_type.to_str().unwrap_or("").to_lowercase();

            if !content_type_str.contains("application/json") {
                return Err(ClientError::Parse(format!(
                    "Expected application/json, got: {}",
                    content_type_str
                )));
            }
        }

        Ok(())
    }

    /// Read and parse a JSON response body with a size cap
    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        options: &CallOptions,
    ) -> ClientResult<T> {
        let request_id = options.request_id;

        Self::validate_content_type(&response)?;

        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(ClientError::Parse(format!(
                    "Response size {} exceeds maximum {} [request_id: {}]",
                    content_length, self.max_response_size, request_id
                )));
            }
        }

        let bytes = response.bytes().await.map_err(|e| ClientError::StreamRead {
            message: format!("Failed to read response body: {} [request_id: {}]", e, request_id),
        })?;

        if bytes.len() > self.max_response_size {
            return Err(ClientError::Parse(format!(
                "Response size {} exceeds maximum {} [request_id: {}]",
                bytes.len(),
                self.max_response_size,
                request_id
            )));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            error!("Failed to parse response [request_id: {}]: {}", request_id, e);
            ClientError::Parse(format!("Invalid response format: {} [request_id: {}]", e, request_id))
        })
    }

    /// `GET` a JSON document
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        options: &CallOptions,
    ) -> ClientResult<T> {
        debug!("GET {} [request_id: {}]", url, options.request_id);
        let builder = self.prepare(self.client.get(url), options);
        let response = self.send(builder, options).await?;
        self.read_json(response, options).await
    }

    /// `DELETE` a resource and parse the JSON answer
    pub(crate) async fn delete_json<T: DeserializeOwned>(
        &self,
        url: Url,
        options: &CallOptions,
    ) -> ClientResult<T> {
        debug!("DELETE {} [request_id: {}]", url, options.request_id);
        let builder = self.prepare(self.client.delete(url), options);
        let response = self.send(builder, options).await?;
        self.read_json(response, options).await
    }

    /// `POST` a multipart form and parse the JSON answer
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: Form,
        options: &CallOptions,
    ) -> ClientResult<T> {
        debug!("POST multipart {} [request_id: {}]", url, options.request_id);
        let builder = self.prepare(self.client.post(url).multipart(form), options);
        let response = self.send(builder, options).await?;
        self.read_json(response, options).await
    }
}

/// Whole milliseconds of `duration`, capped at `u64::MAX`
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ProcessTransport for HttpClient {
    async fn open_stream(
        &self,
        request: &RequestOptions,
        options: &CallOptions,
    ) -> ClientResult<ByteStream> {
        let request_id = options.request_id;
        let url = self.build_url(options.call_kind, &[])?;

        info!(
            "Opening response stream to {} [request_id: {}]",
            url, request_id
        );
        debug!(
            "Conversation of {} messages, useRAG={}, useMCP={} [request_id: {}]",
            request.messages.len(),
            request.use_rag,
            request.use_mcp,
            request_id
        );

        let body = serde_json::to_vec(request).map_err(|e| {
            ClientError::Serialization(format!("{} [request_id: {}]", e, request_id))
        })?;

        let builder = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let builder = self.prepare(builder, options);

        let response = self.send(builder, options).await?;

        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| {
                warn!("Response body read failed [request_id: {}]: {}", request_id, e);
                ClientError::StreamRead {
                    message: format!("{} [request_id: {}]", e, request_id),
                }
            })
        });

        Ok(stream.boxed())
    }
}
