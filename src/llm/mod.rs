//! LLM integration module.
//!
//! Provides the [`Generator`] capability the evaluator measures, and an
//! OpenAI-compatible client implementing it.

mod client;
mod generator;

pub use client::{LlmClient, LlmResponse, TokenUsage};
pub use generator::{Generation, Generator};
