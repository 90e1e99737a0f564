//! Ragchat Core Library
//!
//! Client for a retrieval-augmented text generation service: streams replies
//! to a conversation as decoded text fragments while they arrive, and manages
//! the service's file-backed knowledge base.
//!
//! ```no_run
//! use ragchat_core::{ChatClient, ClientConfig, Message, RequestOptions};
//!
//! # async fn run() -> Result<(), ragchat_core::ClientError> {
//! let chat = ChatClient::from_config(&ClientConfig::default())?;
//! let request = RequestOptions::new(vec![Message::user("What is in my notes?")]).with_rag(true);
//!
//! chat.process_text(&request, |fragment| {
//!     print!("{fragment}");
//!     Ok(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod http;
pub mod knowledge;
pub mod notify;
pub mod protocol;
pub mod stream;

pub use chat::ChatClient;
pub use config::ClientConfig;
pub use http::{ClientError, ClientResult, HttpClient};
pub use knowledge::KnowledgeBaseClient;
pub use protocol::{Message, MessageRole, RequestOptions};
pub use stream::{StreamOutcome, StreamSession, StreamSummary};

/// Returns the version of the Ragchat Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
