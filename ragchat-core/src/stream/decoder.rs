//! Incremental UTF-8 decoding of a chunked response body
//!
//! Chunk boundaries are decided by the transport and can fall inside a
//! multi-byte character. The decoder keeps the bytes of such a partial
//! character (at most three) and prepends them to the next chunk, so every
//! character is emitted whole, in exactly one fragment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest possible prefix of an incomplete UTF-8 sequence
const MAX_PENDING: usize = 3;

/// How bytes that can never form valid UTF-8 are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Substitute U+FFFD for each maximal invalid subsequence
    #[default]
    Replace,
    /// Fail the session on the first invalid sequence
    Strict,
}

/// Failure to decode the body in [`DecodeMode::Strict`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Bytes that are not a valid UTF-8 sequence
    #[error("invalid UTF-8 sequence {bytes:02x?} at body offset {offset}")]
    InvalidSequence { bytes: Vec<u8>, offset: u64 },

    /// The body ended in the middle of a character
    #[error("body ended inside a UTF-8 sequence {bytes:02x?}")]
    TruncatedSequence { bytes: Vec<u8> },
}

/// Stateful UTF-8 decoder for one response body
#[derive(Debug, Clone, Default)]
pub struct Utf8StreamDecoder {
    mode: DecodeMode,
    pending: [u8; MAX_PENDING],
    pending_len: usize,
    /// Body bytes consumed before the current input, pending bytes excluded
    consumed: u64,
}

impl Utf8StreamDecoder {
    /// Create a decoder in the given mode
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Decoding mode
    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Bytes of an incomplete character waiting for the next chunk
    pub fn pending(&self) -> &[u8] {
        &self.pending[..self.pending_len]
    }

    /// Decode one chunk
    ///
    /// Returns every complete character available so far. The result is
    /// empty when the chunk only carried part of a character.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        if self.pending_len == 0 {
            return self.decode_input(chunk);
        }

        let mut joined = Vec::with_capacity(self.pending_len + chunk.len());
        joined.extend_from_slice(self.pending());
        joined.extend_from_slice(chunk);
        self.pending_len = 0;
        self.decode_input(&joined)
    }

    /// Flush at end of body
    ///
    /// A dangling partial character becomes one U+FFFD in replace mode and
    /// an error in strict mode. Returns `None` when nothing was pending.
    pub fn finish(&mut self) -> Result<Option<String>, DecodeError> {
        if self.pending_len == 0 {
            return Ok(None);
        }

        let bytes = self.pending().to_vec();
        self.consumed += bytes.len() as u64;
        self.pending_len = 0;

        match self.mode {
            DecodeMode::Replace => Ok(Some(char::REPLACEMENT_CHARACTER.to_string())),
            DecodeMode::Strict => Err(DecodeError::TruncatedSequence { bytes }),
        }
    }

    fn decode_input(&mut self, input: &[u8]) -> Result<String, DecodeError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    self.consumed += rest.len() as u64;
                    return Ok(out);
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    self.consumed += valid as u64;

                    match e.error_len() {
                        // Valid prefix cut off by the end of the input
                        None => {
                            let tail = &rest[valid..];
                            self.pending[..tail.len()].copy_from_slice(tail);
                            self.pending_len = tail.len();
                            return Ok(out);
                        }
                        Some(len) => {
                            if self.mode == DecodeMode::Strict {
                                return Err(DecodeError::InvalidSequence {
                                    bytes: rest[valid..valid + len].to_vec(),
                                    offset: self.consumed,
                                });
                            }
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.consumed += len as u64;
                            rest = &rest[valid + len..];
                        }
                    }
                }
            }
        }
    }
}
