//! Wire types for the text-generation and knowledge-base endpoints
//!
//! The field names here are the ones the service expects on the wire. The
//! conversation payload is sent as JSON; everything that comes back from the
//! streaming endpoint is opaque text and has no type in this module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Trait for converting types into messages
pub trait IntoMessage {
    /// Convert self into a Message
    fn into_message(self) -> Message;
}

impl IntoMessage for Message {
    fn into_message(self) -> Message {
        self
    }
}

impl IntoMessage for String {
    fn into_message(self) -> Message {
        Message::user(self)
    }
}

impl IntoMessage for &str {
    fn into_message(self) -> Message {
        Message::user(self)
    }
}

/// Body of a `POST /api/process` request
///
/// `use_rag` and `use_mcp` are forwarded untouched; what they switch on is
/// decided by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Conversation in the order it must be replayed to the model
    pub messages: Vec<Message>,

    /// Enable retrieval augmentation against the knowledge base
    #[serde(rename = "useRAG", default)]
    pub use_rag: bool,

    /// Enable the tool/protocol extension
    #[serde(rename = "useMCP", default)]
    pub use_mcp: bool,
}

impl RequestOptions {
    /// Create options for a conversation with both flags off
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            use_rag: false,
            use_mcp: false,
        }
    }

    /// Build options from anything convertible into messages
    pub fn from_messages<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoMessage,
    {
        Self::new(messages.into_iter().map(IntoMessage::into_message).collect())
    }

    /// Toggle retrieval augmentation
    pub fn with_rag(mut self, enabled: bool) -> Self {
        self.use_rag = enabled;
        self
    }

    /// Toggle the tool/protocol extension
    pub fn with_mcp(mut self, enabled: bool) -> Self {
        self.use_mcp = enabled;
        self
    }

    /// Append a message to the conversation
    pub fn push(mut self, message: impl IntoMessage) -> Self {
        self.messages.push(message.into_message());
        self
    }

    /// Check whether the conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ============================================================================
// Knowledge base payloads
// ============================================================================

/// A file stored in the knowledge base, as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeFile {
    /// File name on the server
    pub name: String,

    /// Human readable size, formatted by the server (e.g. `"1.23 KB"`)
    pub size: String,
}

/// Response body of `GET /api/knowledge-base`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseListing {
    /// Files currently in the knowledge base
    #[serde(default)]
    pub files: Vec<KnowledgeFile>,
}

/// Response body of a successful `POST /api/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Server confirmation text, absent from some server versions
    #[serde(default)]
    pub message: String,

    /// Name the file was stored under (the server may sanitize it)
    pub filename: String,

    /// Stored size in bytes
    pub size: u64,
}

/// Plain `{"message": ...}` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Server confirmation text
    pub message: String,
}
