//! Sequential evaluation of many transcript/context pairs.

use super::evaluator::{EvaluationReport, ResponseEvaluator};
use crate::error::Result;
use crate::llm::Generator;
use crate::sources::{EvalPair, load_context_set, load_transcript};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Configuration for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Abort the whole batch on the first failing pair.
    pub fail_fast: bool,
}

/// Outcome for one pair. Exactly one of `report` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    pub transcript: String,
    pub contexts: String,
    pub report: Option<EvaluationReport>,
    pub error: Option<String>,
}

/// Aggregated batch results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Total pairs attempted.
    pub total_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean relevance over successful pairs.
    pub avg_relevance: f64,
    /// Fraction of successful pairs judged grounded.
    pub grounded_rate: f64,
    pub avg_latency_seconds: f64,
    /// Sum of known costs; `None` when no pair reported tokens.
    pub total_cost_usd: Option<f64>,
    pub item_results: Vec<ItemResult>,
    /// Total batch time (seconds).
    pub total_time_secs: f64,
}

impl BatchResults {
    /// Create empty results.
    pub fn new() -> Self {
        Self {
            total_items: 0,
            succeeded: 0,
            failed: 0,
            avg_relevance: 0.0,
            grounded_rate: 0.0,
            avg_latency_seconds: 0.0,
            total_cost_usd: None,
            item_results: Vec::new(),
            total_time_secs: 0.0,
        }
    }

    /// Calculate summary statistics from item results.
    pub fn calculate_summary(&mut self) {
        self.total_items = self.item_results.len();

        let reports: Vec<&EvaluationReport> = self
            .item_results
            .iter()
            .filter_map(|r| r.report.as_ref())
            .collect();

        self.succeeded = reports.len();
        self.failed = self.total_items - self.succeeded;

        if reports.is_empty() {
            return;
        }

        let n = reports.len() as f64;
        self.avg_relevance = reports.iter().map(|r| r.relevance_score).sum::<f64>() / n;
        self.grounded_rate = reports.iter().filter(|r| r.is_grounded()).count() as f64 / n;
        self.avg_latency_seconds = reports.iter().map(|r| r.latency_seconds).sum::<f64>() / n;

        self.total_cost_usd = reports
            .iter()
            .filter_map(|r| r.estimated_cost_usd)
            .fold(None, |acc, cost| Some(acc.unwrap_or(0.0) + cost));
    }

    /// Print summary to stdout.
    pub fn print_summary(&self) {
        println!("\n========== Evaluation Summary ==========");
        println!("Pairs:          {}", self.total_items);
        println!("Succeeded:      {}", self.succeeded);
        println!("Failed:         {}", self.failed);
        println!("----------------------------------------");
        println!("Avg relevance:  {:.4}", self.avg_relevance);
        println!("Grounded:       {:.1}%", self.grounded_rate * 100.0);
        println!("Avg latency:    {:.2}s", self.avg_latency_seconds);
        match self.total_cost_usd {
            Some(cost) => println!("Total cost:     ${:.6}", cost),
            None => println!("Total cost:     unknown"),
        }
        println!("----------------------------------------");
        println!("Total time: {:.1}s", self.total_time_secs);
        println!("========================================\n");
    }
}

impl Default for BatchResults {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch runner.
pub struct BatchRunner<'a> {
    evaluator: &'a ResponseEvaluator,
    config: BatchConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(evaluator: &'a ResponseEvaluator, config: BatchConfig) -> Self {
        Self { evaluator, config }
    }

    /// Evaluate every pair in order, one at a time.
    ///
    /// With `fail_fast` the first error is returned; otherwise it is recorded
    /// on the pair and the run continues.
    pub async fn run(&self, pairs: &[EvalPair], generator: &dyn Generator) -> Result<BatchResults> {
        let start_time = Instant::now();
        let mut results = BatchResults::new();

        for (idx, pair) in pairs.iter().enumerate() {
            info!(
                "[{}/{}] evaluating {} + {}",
                idx + 1,
                pairs.len(),
                pair.transcript.display(),
                pair.contexts.display()
            );

            let outcome = self.process_pair(pair, generator).await;

            let item = match outcome {
                Ok(report) => ItemResult {
                    transcript: pair.transcript.display().to_string(),
                    contexts: pair.contexts.display().to_string(),
                    report: Some(report),
                    error: None,
                },
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    warn!(transcript = %pair.transcript.display(), error = %e, "pair failed");
                    ItemResult {
                        transcript: pair.transcript.display().to_string(),
                        contexts: pair.contexts.display().to_string(),
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            results.item_results.push(item);
        }

        results.total_time_secs = start_time.elapsed().as_secs_f64();
        results.calculate_summary();

        Ok(results)
    }

    async fn process_pair(
        &self,
        pair: &EvalPair,
        generator: &dyn Generator,
    ) -> Result<EvaluationReport> {
        let transcript = load_transcript(&pair.transcript)?;
        let contexts = load_context_set(&pair.contexts)?;
        self.evaluator.evaluate(&transcript, &contexts, generator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::eval::evaluator::tests::{
        FailingGenerator, FixedGenerator, PARIS_CONTEXT, PARIS_REPLY, paris_embedder, transcript,
    };
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn report(relevance: f64, grounded: bool, cost: Option<f64>) -> EvaluationReport {
        EvaluationReport {
            relevance_score: relevance,
            groundedness_score: if grounded { 1.0 } else { 0.0 },
            latency_seconds: 1.0,
            estimated_cost_usd: cost,
            token_count: None,
            response_text: String::new(),
            ungrounded_sentences: Vec::new(),
        }
    }

    fn item(report: Option<EvaluationReport>) -> ItemResult {
        ItemResult {
            transcript: "chat.json".to_string(),
            contexts: "vector.json".to_string(),
            error: report.is_none().then(|| "boom".to_string()),
            report,
        }
    }

    fn write_pair(dir: &TempDir, name: &str, contexts: serde_json::Value) -> EvalPair {
        let transcript_path = dir.path().join(format!("{}_chat.json", name));
        let contexts_path = dir.path().join(format!("{}_vector.json", name));
        fs::write(&transcript_path, transcript().to_string()).unwrap();
        fs::write(&contexts_path, contexts.to_string()).unwrap();
        EvalPair {
            transcript: transcript_path,
            contexts: contexts_path,
        }
    }

    #[test]
    fn test_batch_results_summary() {
        let mut results = BatchResults::new();
        results.item_results.push(item(Some(report(0.8, true, Some(0.01)))));
        results.item_results.push(item(Some(report(0.4, false, None))));
        results.item_results.push(item(None));

        results.calculate_summary();

        assert_eq!(results.total_items, 3);
        assert_eq!(results.succeeded, 2);
        assert_eq!(results.failed, 1);
        assert!((results.avg_relevance - 0.6).abs() < 1e-9);
        assert!((results.grounded_rate - 0.5).abs() < 1e-9);
        assert_eq!(results.total_cost_usd, Some(0.01));
    }

    #[test]
    fn test_total_cost_unknown_without_tokens() {
        let mut results = BatchResults::new();
        results.item_results.push(item(Some(report(0.8, true, None))));
        results.calculate_summary();
        assert_eq!(results.total_cost_usd, None);
    }

    #[tokio::test]
    async fn test_failed_pair_recorded_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let good = write_pair(
            &dir,
            "good",
            json!({"data": {"vector_data": [{"text": PARIS_CONTEXT}]}}),
        );
        let empty = write_pair(&dir, "empty", json!({"data": {"vector_data": []}}));

        let evaluator = ResponseEvaluator::new(paris_embedder());
        let runner = BatchRunner::new(&evaluator, BatchConfig::default());
        let generator = FixedGenerator::new(PARIS_REPLY, Some(5));

        let results = runner.run(&[empty, good], &generator).await.unwrap();

        assert_eq!(results.total_items, 2);
        assert_eq!(results.failed, 1);
        assert_eq!(results.succeeded, 1);
        assert!(results.item_results[0].error.is_some());
        assert!(results.item_results[1].report.as_ref().unwrap().is_grounded());
    }

    #[tokio::test]
    async fn test_fail_fast_returns_first_error() {
        let dir = TempDir::new().unwrap();
        let pair = write_pair(&dir, "p", json!([{"text": PARIS_CONTEXT}]));

        let evaluator = ResponseEvaluator::new(paris_embedder());
        let runner = BatchRunner::new(&evaluator, BatchConfig { fail_fast: true });

        let result = runner.run(&[pair], &FailingGenerator).await;
        assert!(matches!(result, Err(EvalError::Generation(_))));
    }
}
