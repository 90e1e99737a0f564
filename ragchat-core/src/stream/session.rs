//! One in-flight streamed response

use super::decoder::{DecodeError, DecodeMode, Utf8StreamDecoder};
use crate::http::{ByteStream, ClientError, ClientResult};
use futures::stream::FusedStream;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        ClientError::Decode {
            message: err.to_string(),
        }
    }
}

/// How a drained session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOutcome {
    /// The body was read to the end
    Completed,
    /// The caller cancelled before the end of the body
    Cancelled,
}

/// Counters for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Request the session belonged to
    pub request_id: Uuid,
    /// Chunks pulled from the body
    pub chunks: u64,
    /// Fragments handed to the consumer
    pub fragments: u64,
    /// Body bytes received
    pub bytes: u64,
    /// How the session ended
    pub outcome: StreamOutcome,
}

impl StreamSummary {
    /// Summary of a request cancelled before its body was opened
    pub fn cancelled_before_open(request_id: Uuid) -> Self {
        Self {
            request_id,
            chunks: 0,
            fragments: 0,
            bytes: 0,
            outcome: StreamOutcome::Cancelled,
        }
    }
}

/// Decoded view of one response body
///
/// Yields exactly one fragment per body chunk, in arrival order; a fragment
/// is empty when its chunk only carried part of a character. A body that
/// ends inside a character yields one extra trailing fragment in
/// [`DecodeMode::Replace`]. After the first error, or once the body is
/// exhausted, the session yields nothing more.
///
/// Dropping the session, or calling [`StreamSession::cancel`], closes the
/// body and releases its connection.
pub struct StreamSession {
    /// `None` once the body has ended, failed or been cancelled
    body: Option<ByteStream>,
    decoder: Utf8StreamDecoder,
    request_id: Uuid,
    chunks: u64,
    fragments: u64,
    bytes: u64,
    /// Set once the end-of-body flush has run
    flushed: bool,
}

impl StreamSession {
    /// Wrap an opened response body
    pub fn new(body: ByteStream, request_id: Uuid, mode: DecodeMode) -> Self {
        Self {
            body: Some(body),
            decoder: Utf8StreamDecoder::new(mode),
            request_id,
            chunks: 0,
            fragments: 0,
            bytes: 0,
            flushed: false,
        }
    }

    /// Request the session belongs to
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Whether the session can still produce fragments
    pub fn is_open(&self) -> bool {
        self.body.is_some() || (!self.flushed && !self.decoder.pending().is_empty())
    }

    /// Pull the next fragment
    ///
    /// `None` means the session is over, normally or not.
    pub async fn next_fragment(&mut self) -> Option<ClientResult<String>> {
        self.next().await
    }

    /// Stop reading and release the body
    pub fn cancel(mut self) -> StreamSummary {
        self.close();
        self.summary(StreamOutcome::Cancelled)
    }

    /// Deliver every fragment to `on_fragment` until the body ends
    ///
    /// The consumer is invoked at most once per chunk and never after an
    /// error. When `on_fragment` fails, the body is released and the failure
    /// comes back as [`ClientError::Consumer`]. When `cancel` fires the
    /// session stops between two pulls and returns a summary with
    /// [`StreamOutcome::Cancelled`].
    pub async fn drain<F>(
        mut self,
        cancel: &CancellationToken,
        mut on_fragment: F,
    ) -> ClientResult<StreamSummary>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = self.next() => Some(next),
            };

            match next {
                None => {
                    info!(
                        "Stream cancelled after {} chunks [request_id: {}]",
                        self.chunks, self.request_id
                    );
                    return Ok(self.cancel());
                }
                Some(None) => {
                    let summary = self.summary(StreamOutcome::Completed);
                    info!(
                        "Stream completed: {} chunks, {} bytes [request_id: {}]",
                        summary.chunks, summary.bytes, summary.request_id
                    );
                    return Ok(summary);
                }
                Some(Some(Ok(fragment))) => {
                    if let Err(e) = on_fragment(&fragment) {
                        warn!(
                            "Fragment consumer failed, aborting stream [request_id: {}]: {:#}",
                            self.request_id, e
                        );
                        self.close();
                        return Err(ClientError::Consumer(e));
                    }
                }
                Some(Some(Err(e))) => {
                    warn!(
                        "Stream aborted after {} fragments [request_id: {}]: {}",
                        self.fragments, self.request_id, e
                    );
                    return Err(e);
                }
            }
        }
    }

    fn summary(&self, outcome: StreamOutcome) -> StreamSummary {
        StreamSummary {
            request_id: self.request_id,
            chunks: self.chunks,
            fragments: self.fragments,
            bytes: self.bytes,
            outcome,
        }
    }

    /// Drop the body and any carried bytes
    fn close(&mut self) {
        if self.body.take().is_some() {
            debug!("Releasing response body [request_id: {}]", self.request_id);
        }
        self.flushed = true;
    }

    /// End-of-body handling: flush the decoder once
    fn flush(&mut self) -> Option<ClientResult<String>> {
        if self.flushed {
            return None;
        }
        self.flushed = true;

        match self.decoder.finish() {
            Ok(Some(tail)) => {
                self.fragments += 1;
                Some(Ok(tail))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

impl Stream for StreamSession {
    type Item = ClientResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let Some(body) = this.body.as_mut() else {
            return Poll::Ready(this.flush());
        };

        match body.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                this.chunks += 1;
                this.bytes += chunk.len() as u64;
                debug!(
                    "Chunk {} of {} bytes [request_id: {}]",
                    this.chunks,
                    chunk.len(),
                    this.request_id
                );

                match this.decoder.decode(&chunk) {
                    Ok(fragment) => {
                        this.fragments += 1;
                        Poll::Ready(Some(Ok(fragment)))
                    }
                    Err(e) => {
                        this.close();
                        Poll::Ready(Some(Err(e.into())))
                    }
                }
            }
            Poll::Ready(Some(Err(e))) => {
                this.close();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.body = None;
                Poll::Ready(this.flush())
            }
        }
    }
}

impl FusedStream for StreamSession {
    fn is_terminated(&self) -> bool {
        !self.is_open()
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.body.is_some() {
            debug!(
                "Session dropped before end of body [request_id: {}]",
                self.request_id
            );
        }
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("request_id", &self.request_id)
            .field("open", &self.is_open())
            .field("chunks", &self.chunks)
            .field("fragments", &self.fragments)
            .field("bytes", &self.bytes)
            .finish()
    }
}
