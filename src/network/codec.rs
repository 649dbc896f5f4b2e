//! Wire codec for session protocol messages.
//!
//! Centralizes encoding and decoding of [`Message`] records so the rest of
//! the crate never touches `serde_json` directly. The wire format is one
//! newline-free UTF-8 JSON object per message, with a `type` field
//! selecting the variant.
//!
//! Forward compatibility: records whose `type` is unknown decode to
//! `Ok(None)` and must be ignored by the receiver. Records with a known
//! `type` but missing required fields are a [`CodecError`]; the receiver
//! drops and logs them — decoding never panics and never crashes the
//! session.

use std::error::Error;
use std::fmt;

use crate::network::messages::Message;

/// The wire names of every message type this codec understands. A record
/// whose `type` is not in this list is a forward-compatible no-op.
const KNOWN_TYPES: [&str; 10] = [
    "Handshake",
    "Handshake-Ack",
    "PlayerName",
    "IsReady",
    "RequestPieces",
    "RequestPieces-Reply",
    "MovePiece",
    "AttackPiece",
    "AttackResult",
    "GameOver",
];

/// Errors that can occur during encoding or decoding.
///
/// The underlying `serde_json` errors are opaque, so the diagnostic is
/// preserved as a string. Codec errors are exceptional (malformed peer
/// data), not hot-path conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The encoding operation failed.
    Encode {
        /// The underlying serializer diagnostic.
        message: String,
    },
    /// The record was not valid JSON, lacked a string `type` field, or had
    /// a known `type` with missing or ill-typed fields.
    Decode {
        /// The underlying deserializer diagnostic.
        message: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode { message } => write!(f, "error encoding message: {}", message),
            CodecError::Decode { message } => write!(f, "error decoding message: {}", message),
        }
    }
}

impl Error for CodecError {}

/// Encodes a message as a single newline-free UTF-8 JSON record.
pub fn encode(message: &Message) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|err| CodecError::Encode {
        message: err.to_string(),
    })
}

/// Decodes one wire record.
///
/// Returns `Ok(None)` for a structurally valid record whose `type` is
/// unknown (the caller ignores it), `Ok(Some(_))` for a recognized
/// message, and `Err` for anything malformed (the caller drops and logs).
pub fn decode(text: &str) -> Result<Option<Message>, CodecError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|err| CodecError::Decode {
        message: err.to_string(),
    })?;
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CodecError::Decode {
            message: "record has no string `type` field".to_owned(),
        })?;
    if !KNOWN_TYPES.contains(&kind) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| CodecError::Decode {
            message: err.to_string(),
        })
}
