//! Conversation model and transcript normalization.
//!
//! Transcripts arrive as decoded JSON in one of two shapes:
//!
//! 1. **Turn records**: `{"conversation_turns": [{"role": "User", "message": "Hi"}, ...]}`.
//!    Roles are matched case-insensitively against `user`; anything else,
//!    including a missing role, becomes `assistant`.
//! 2. **Chat messages**: `{"messages": [{"role": "user", "content": "Hi"}, ...]}`
//!    (or under `chat_history`), passed through as-is. A `null` list is
//!    skipped in favour of the next key; if every list is `null` the
//!    conversation is empty.
//!
//! Shapes are tried in that order. Anything else is rejected with
//! [`EvalError::UnsupportedFormat`].

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding turn records in the first transcript shape.
pub const TURN_RECORDS_KEY: &str = "conversation_turns";

/// Keys that may hold pre-built chat messages, in lookup order.
pub const MESSAGE_LIST_KEYS: [&str; 2] = ["messages", "chat_history"];

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a free-form role label onto a role.
    ///
    /// Only `user` (any case) is a user; every other label is the assistant.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chronologically ordered turns.
pub type Conversation = Vec<ConversationTurn>;

/// The recognized transcript shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// `conversation_turns` with `role`/`message` records.
    TurnRecords,
    /// `messages` or `chat_history` with `role`/`content` turns.
    MessageList,
}

impl TranscriptFormat {
    /// Detect which shape a transcript object has, if any.
    pub fn detect(object: &Map<String, Value>) -> Option<Self> {
        if object.contains_key(TURN_RECORDS_KEY) {
            Some(TranscriptFormat::TurnRecords)
        } else if MESSAGE_LIST_KEYS.iter().any(|k| object.contains_key(*k)) {
            Some(TranscriptFormat::MessageList)
        } else {
            None
        }
    }
}

/// Convert a raw transcript into a canonical conversation.
pub fn normalize(raw: &Value) -> Result<Conversation> {
    let object = match raw {
        Value::Object(object) => object,
        _ => return Err(EvalError::UnsupportedFormat { keys: Vec::new() }),
    };

    match TranscriptFormat::detect(object) {
        Some(TranscriptFormat::TurnRecords) => parse_turn_records(&object[TURN_RECORDS_KEY]),
        Some(TranscriptFormat::MessageList) => {
            let list = MESSAGE_LIST_KEYS
                .iter()
                .find_map(|k| object.get(*k).filter(|v| !v.is_null()));
            match list {
                Some(list) => parse_message_list(list),
                None => Ok(Vec::new()),
            }
        }
        None => Err(EvalError::unsupported_format(object.keys())),
    }
}

fn parse_turn_records(records: &Value) -> Result<Conversation> {
    let records = records.as_array().ok_or_else(|| {
        EvalError::MalformedTranscript(format!("'{}' must be a list", TURN_RECORDS_KEY))
    })?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let role = record.get("role").and_then(Value::as_str).unwrap_or("");
            let message = record
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    EvalError::MalformedTranscript(format!(
                        "turn {} has no string 'message' field",
                        i
                    ))
                })?;

            Ok(ConversationTurn {
                role: Role::from_label(role),
                content: message.to_string(),
            })
        })
        .collect()
}

fn parse_message_list(list: &Value) -> Result<Conversation> {
    Conversation::deserialize(list)
        .map_err(|e| EvalError::MalformedTranscript(format!("invalid message list: {}", e)))
}
