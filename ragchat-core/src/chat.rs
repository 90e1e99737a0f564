//! Streamed conversation requests
//!
//! [`ChatClient`] ties the transport and the stream session together: one call
//! sends the conversation, opens the response body and feeds the decoded
//! fragments to the caller.

use crate::config::ClientConfig;
use crate::http::{CallKind, CallOptions, ClientResult, HttpClient, ProcessTransport};
use crate::protocol::RequestOptions;
use crate::stream::{DecodeMode, StreamSession, StreamSummary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for the streaming `/api/process` endpoint
///
/// Holds no per-request state, so one client can drive any number of
/// concurrent sessions.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn ProcessTransport>,
    decode_mode: DecodeMode,
}

impl ChatClient {
    /// Create a chat client over an HTTP client
    pub fn new(http: HttpClient) -> Self {
        Self::with_transport(Arc::new(http))
    }

    /// Create a chat client from configuration
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::from_config(config)?;
        Ok(Self::new(http).with_decode_mode(config.stream.decode_mode))
    }

    /// Create a chat client over any transport
    pub fn with_transport(transport: Arc<dyn ProcessTransport>) -> Self {
        Self {
            transport,
            decode_mode: DecodeMode::default(),
        }
    }

    /// Set how undecodable response bytes are handled
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Send the conversation and return the open session
    pub async fn open_session(&self, request: &RequestOptions) -> ClientResult<StreamSession> {
        self.open_session_with(request, CallOptions::new(CallKind::Process))
            .await
    }

    /// Send the conversation with explicit call options
    pub async fn open_session_with(
        &self,
        request: &RequestOptions,
        options: CallOptions,
    ) -> ClientResult<StreamSession> {
        let body = self.transport.open_stream(request, &options).await?;
        debug!("Response body open [request_id: {}]", options.request_id);
        Ok(StreamSession::new(body, options.request_id, self.decode_mode))
    }

    /// Send the conversation and feed each decoded fragment to `on_fragment`
    ///
    /// Resolves once the response body has been read to the end.
    pub async fn process_text<F>(
        &self,
        request: &RequestOptions,
        on_fragment: F,
    ) -> ClientResult<StreamSummary>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        self.process_text_with_cancel(request, &CancellationToken::new(), on_fragment)
            .await
    }

    /// Like [`ChatClient::process_text`], stopping early when `cancel` fires
    ///
    /// Cancellation is not an error: the summary reports
    /// [`crate::stream::StreamOutcome::Cancelled`].
    pub async fn process_text_with_cancel<F>(
        &self,
        request: &RequestOptions,
        cancel: &CancellationToken,
        on_fragment: F,
    ) -> ClientResult<StreamSummary>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        let options = CallOptions::new(CallKind::Process);
        let request_id = options.request_id;

        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            session = self.open_session_with(request, options) => Some(session?),
        };

        match session {
            Some(session) => session.drain(cancel, on_fragment).await,
            None => {
                info!("Request cancelled before the response opened [request_id: {}]", request_id);
                Ok(StreamSummary::cancelled_before_open(request_id))
            }
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("decode_mode", &self.decode_mode)
            .finish_non_exhaustive()
    }
}
