//! RAG Response Eval - scores a generated reply against its retrieved context.
//!
//! For each conversation and its context passages the evaluator asks a
//! generator for the next reply and reports:
//! 1. Relevance: best embedding similarity between the reply and any passage
//! 2. Groundedness: whether every sentence of the reply appears in the context
//! 3. Latency of the generator call
//! 4. Estimated cost from the reported token usage
//!
//! # Quick Start
//!
//! ```no_run
//! use rag_response_eval::{
//!     config::Config,
//!     eval::{EmbeddingModel, ResponseEvaluator},
//!     llm::LlmClient,
//!     sources::{load_context_set, load_transcript},
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     // Loaded once, shared by every evaluation
//!     let embedder = Arc::new(EmbeddingModel::load(&config.eval.embedding_model)?);
//!     let evaluator = ResponseEvaluator::from_config(embedder, &config.eval);
//!     let client = LlmClient::new(config.llm.clone());
//!
//!     let transcript = load_transcript(Path::new("data/chat1.json"))?;
//!     let contexts = load_context_set(Path::new("data/vector1.json"))?;
//!
//!     let report = evaluator.evaluate(&transcript, &contexts, &client).await?;
//!     println!("relevance {:.4}, {}", report.relevance_score, report.hallucination_label());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **conversation**: normalizes transcript JSON into role-tagged turns
//! - **RelevanceScorer**: embedding similarity against the context passages
//! - **HallucinationDetector**: literal sentence grounding check
//! - **CostEstimator**: token count times a per-token price
//! - **ResponseEvaluator**: runs the pipeline for one pair
//! - **LlmClient**: OpenAI-compatible generator under test

pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod eval;
pub mod llm;
pub mod sources;

// Re-export commonly used types
pub use config::Config;
pub use context::{ContextPassage, ContextSet};
pub use conversation::{Conversation, ConversationTurn, Role, normalize};
pub use error::{EvalError, Result};
pub use eval::{EvaluationReport, ResponseEvaluator};
pub use llm::{Generator, LlmClient};
