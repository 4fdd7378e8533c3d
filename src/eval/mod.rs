//! Response scoring.
//!
//! This module provides:
//! - Relevance scoring via embedding cosine similarity (local candle model)
//! - Lexical hallucination detection against the context passages
//! - Token cost estimation
//! - The single-pair pipeline and a sequential batch runner

pub mod batch;
pub mod cost;
pub mod embeddings;
pub mod evaluator;
pub mod grounding;
pub mod relevance;

pub use batch::{BatchConfig, BatchResults, BatchRunner, ItemResult};
pub use cost::{CostEstimator, estimate_cost};
pub use embeddings::{Embedder, cosine_similarity};
#[cfg(feature = "embeddings")]
pub use embeddings::EmbeddingModel;
pub use evaluator::{EvaluationReport, GeneratedResponse, ResponseEvaluator};
pub use grounding::{HallucinationDetector, groundedness};
pub use relevance::RelevanceScorer;
