//! Single-pair evaluation pipeline.
//!
//! normalize transcript → generate reply (timed) → relevance → groundedness
//! → cost → report. Any step failing aborts the evaluation; no partial
//! report is ever produced.

use super::cost::CostEstimator;
use super::embeddings::Embedder;
use super::grounding::{GROUNDED, HallucinationDetector};
use super::relevance::RelevanceScorer;
use crate::config::EvalConfig;
use crate::context::ContextSet;
use crate::conversation::{self, Conversation};
use crate::error::{EvalError, Result};
use crate::llm::Generator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A reply from the generator with its measured latency.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResponse {
    pub text: String,
    pub latency_seconds: f64,
    pub token_count: Option<u64>,
}

/// Scores for one evaluated response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Best cosine similarity to any context passage, in `[0, 1]`.
    pub relevance_score: f64,
    /// `1.0` if every sentence is grounded in the context, else `0.0`.
    pub groundedness_score: f64,
    /// Wall-clock time spent in the generator.
    pub latency_seconds: f64,
    /// Present iff the generator reported a token count.
    pub estimated_cost_usd: Option<f64>,
    pub token_count: Option<u64>,
    pub response_text: String,
    /// Sentences that caused a `0.0` groundedness score.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ungrounded_sentences: Vec<String>,
}

impl EvaluationReport {
    pub fn is_grounded(&self) -> bool {
        self.groundedness_score == GROUNDED
    }

    pub fn hallucination_label(&self) -> &'static str {
        if self.is_grounded() {
            "grounded"
        } else {
            "hallucinated"
        }
    }
}

/// Runs the evaluation pipeline against a shared embedding model.
#[derive(Clone)]
pub struct ResponseEvaluator {
    embedder: Arc<dyn Embedder>,
    cost: CostEstimator,
    generation_timeout: Option<Duration>,
}

impl ResponseEvaluator {
    /// Create an evaluator with the default price and no generation timeout.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            cost: CostEstimator::default(),
            generation_timeout: None,
        }
    }

    /// Create an evaluator from scoring configuration.
    pub fn from_config(embedder: Arc<dyn Embedder>, config: &EvalConfig) -> Self {
        let evaluator = Self::new(embedder).with_price_per_token(config.price_per_token);
        match config.generation_timeout_secs {
            Some(secs) => evaluator.with_generation_timeout(Duration::from_secs(secs)),
            None => evaluator,
        }
    }

    pub fn with_price_per_token(mut self, price_per_token: f64) -> Self {
        self.cost = CostEstimator::new(price_per_token);
        self
    }

    /// Bound each generator call. Without this the call may block indefinitely.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }

    pub fn price_per_token(&self) -> f64 {
        self.cost.price_per_token
    }

    /// Evaluate one transcript against its context passages.
    pub async fn evaluate(
        &self,
        raw_transcript: &Value,
        contexts: &ContextSet,
        generator: &dyn Generator,
    ) -> Result<EvaluationReport> {
        let conversation = conversation::normalize(raw_transcript)?;
        debug!(turns = conversation.len(), "normalized transcript");

        let response = self.generate(generator, &conversation).await?;
        debug!(
            latency_seconds = response.latency_seconds,
            tokens = ?response.token_count,
            "generator returned"
        );

        self.score(response, contexts)
    }

    /// Call the generator, measuring wall-clock latency around the call.
    pub async fn generate(
        &self,
        generator: &dyn Generator,
        conversation: &Conversation,
    ) -> Result<GeneratedResponse> {
        let start = Instant::now();

        let generation = match self.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, generator.generate(conversation))
                .await
                .map_err(|_| EvalError::GenerationTimeout(limit))??,
            None => generator.generate(conversation).await?,
        };

        Ok(GeneratedResponse {
            text: generation.text,
            latency_seconds: start.elapsed().as_secs_f64(),
            token_count: generation.token_count,
        })
    }

    /// Score an already generated response.
    pub fn score(
        &self,
        response: GeneratedResponse,
        contexts: &ContextSet,
    ) -> Result<EvaluationReport> {
        let relevance_score =
            RelevanceScorer::new(self.embedder.as_ref()).relevance(&response.text, contexts)?;

        let detector = HallucinationDetector::new(contexts);
        let groundedness_score = detector.groundedness(&response.text);
        let ungrounded_sentences = detector.ungrounded_sentences(&response.text);

        let estimated_cost_usd = self.cost.estimate(response.token_count);

        debug!(
            relevance_score,
            groundedness_score,
            cost = ?estimated_cost_usd,
            "scored response"
        );

        Ok(EvaluationReport {
            relevance_score,
            groundedness_score,
            latency_seconds: response.latency_seconds,
            estimated_cost_usd,
            token_count: response.token_count,
            response_text: response.text,
            ungrounded_sentences,
        })
    }
}
