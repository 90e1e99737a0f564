//! HTTP layer for talking to the text-generation service
//!
//! This module implements the transport side of the client, handling:
//! - Connection pooling and client management
//! - Opening the streamed `/api/process` response body
//! - The plain JSON/multipart calls used by the knowledge base
//! - Error mapping and request ID correlation

pub mod client;
pub mod error;

pub use client::HttpClient;
pub use error::{map_http_error, ClientError, ClientResult};

use crate::protocol::RequestOptions;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Response body of a streaming call, one item per transport chunk
pub type ByteStream = BoxStream<'static, ClientResult<Bytes>>;

/// Type of API call being made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// Streamed text generation
    Process,
    /// Multipart upload into the knowledge base
    Upload,
    /// Knowledge base listing
    ListKnowledgeBase,
    /// Removal of one knowledge base file (the file name is appended)
    DeleteKnowledgeFile,
}

impl CallKind {
    /// Get the endpoint path for this call kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            CallKind::Process => "/api/process",
            CallKind::Upload => "/api/upload",
            CallKind::ListKnowledgeBase | CallKind::DeleteKnowledgeFile => "/api/knowledge-base",
        }
    }
}

/// Per-call transport options
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Type of API call
    pub call_kind: CallKind,

    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Overrides the client-wide request timeout when set
    pub timeout: Option<Duration>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new(CallKind::Process)
    }
}

impl CallOptions {
    /// Create new call options with a generated request ID
    pub fn new(call_kind: CallKind) -> Self {
        Self {
            call_kind,
            request_id: Uuid::new_v4(),
            timeout: None,
        }
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reuse a caller-provided request ID
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Opens the streamed response body of a `/api/process` call
///
/// Implementations issue exactly one request per call and return the body
/// undecoded. A returned stream is owned by the caller; dropping it must
/// release the connection.
#[async_trait]
pub trait ProcessTransport: Send + Sync {
    /// Send the conversation and hand back the response body
    async fn open_stream(
        &self,
        request: &RequestOptions,
        options: &CallOptions,
    ) -> ClientResult<ByteStream>;
}
