//! Protocol module for request/response structures
//!
//! This module defines the payloads exchanged with the service:
//! - The conversation and feature flags sent to the streaming endpoint
//! - The JSON bodies returned by the knowledge-base endpoints

pub mod types;

pub use types::{
    IntoMessage, KnowledgeBaseListing, KnowledgeFile, Message, MessageRole, RequestOptions,
    ServerMessage, UploadReceipt,
};
