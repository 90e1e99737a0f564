//! Streaming response consumption
//!
//! A response body arrives as raw chunks whose boundaries carry no meaning.
//! [`Utf8StreamDecoder`] turns them into text without splitting characters and
//! [`StreamSession`] pairs it with one open body, exposing the decoded
//! fragments either as a `Stream` or through a callback drain.

pub mod decoder;
pub mod session;

pub use decoder::{DecodeError, DecodeMode, Utf8StreamDecoder};
pub use session::{StreamOutcome, StreamSession, StreamSummary};
