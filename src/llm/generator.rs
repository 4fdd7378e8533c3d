//! The text-generation capability under evaluation.

use crate::conversation::Conversation;
use crate::error::Result;
use async_trait::async_trait;

/// Output of a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The generated reply.
    pub text: String,
    /// Total tokens billed for the call, when the provider reports it.
    pub token_count: Option<u64>,
}

impl Generation {
    pub fn new(text: impl Into<String>, token_count: Option<u64>) -> Self {
        Self {
            text: text.into(),
            token_count,
        }
    }
}

/// Produces a reply for a conversation.
///
/// Implementations report provider failures as [`EvalError::Generation`](crate::EvalError::Generation).
/// Callers do not retry.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, conversation: &Conversation) -> Result<Generation>;
}
