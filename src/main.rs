//! RAG Response Eval CLI
//!
//! Generates a reply for each transcript and scores it against the
//! retrieved context passages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rag_response_eval::{
    config::Config,
    eval::{BatchConfig, BatchRunner, EmbeddingModel, EvaluationReport, ResponseEvaluator},
    llm::LlmClient,
    sources::{load_context_set, load_manifest, load_transcript, save_json},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// RAG Response Eval - relevance, groundedness, latency and cost of LLM replies
#[derive(Parser)]
#[command(name = "rag-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single transcript against its context passages
    Evaluate {
        /// Path to the transcript JSON file
        #[arg(short, long)]
        transcript: PathBuf,

        /// Path to the context (vector store export) JSON file
        #[arg(short, long)]
        contexts: PathBuf,

        /// Override the configured USD price per token
        #[arg(long)]
        price_per_token: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate every pair listed in a manifest file
    Batch {
        /// Path to the manifest JSON file ({"pairs": [{"transcript", "contexts"}]})
        manifest: PathBuf,

        /// Stop at the first failing pair
        #[arg(long)]
        fail_fast: bool,

        /// Save results to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured USD price per token
        #[arg(long)]
        price_per_token: Option<f64>,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Evaluate {
            transcript,
            contexts,
            price_per_token,
            json,
        } => cmd_evaluate(transcript, contexts, price_per_token, json).await,
        Commands::Batch {
            manifest,
            fail_fast,
            output,
            price_per_token,
        } => cmd_batch(manifest, fail_fast, output, price_per_token).await,
        Commands::Test => cmd_test().await,
    }
}

/// Load config, the embedding model and the LLM client once for the run.
fn setup(price_per_token: Option<f64>) -> Result<(ResponseEvaluator, LlmClient)> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(price) = price_per_token {
        config.eval.price_per_token = price;
    }
    config.validate().context("Invalid configuration")?;

    println!("Using model: {}", config.llm.model);
    println!("Loading embedding model: {}", config.eval.embedding_model);

    let embedder = EmbeddingModel::load(&config.eval.embedding_model)
        .context("Failed to load embedding model")?;

    let evaluator = ResponseEvaluator::from_config(Arc::new(embedder), &config.eval);
    let client = LlmClient::new(config.llm);

    Ok((evaluator, client))
}

fn print_report(label: &str, report: &EvaluationReport) {
    println!("\n--- Evaluating: {} ---", label);
    println!("AI Response:\n {}", report.response_text);
    println!("Relevance Score: {:.4}", report.relevance_score);
    println!(
        "Hallucination Score: {:.1} ({})",
        report.groundedness_score,
        report.hallucination_label()
    );
    for sentence in &report.ungrounded_sentences {
        println!("  ungrounded: {}", sentence);
    }
    println!("Latency (s): {:.2}", report.latency_seconds);
    match report.estimated_cost_usd {
        Some(cost) => println!("Estimated Cost ($): {}", cost),
        None => println!("Estimated Cost ($): unknown"),
    }
}

async fn cmd_evaluate(
    transcript_path: PathBuf,
    contexts_path: PathBuf,
    price_per_token: Option<f64>,
    json: bool,
) -> Result<()> {
    let transcript = load_transcript(&transcript_path).context("Failed to load transcript")?;
    let contexts = load_context_set(&contexts_path).context("Failed to load contexts")?;

    let (evaluator, client) = setup(price_per_token)?;

    let report = evaluator
        .evaluate(&transcript, &contexts, &client)
        .await
        .context("Evaluation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let label = format!("{} + {}", transcript_path.display(), contexts_path.display());
        print_report(&label, &report);
    }

    Ok(())
}

async fn cmd_batch(
    manifest_path: PathBuf,
    fail_fast: bool,
    output: Option<PathBuf>,
    price_per_token: Option<f64>,
) -> Result<()> {
    let manifest = load_manifest(&manifest_path).context("Failed to load manifest")?;
    if manifest.pairs.is_empty() {
        anyhow::bail!("Manifest '{}' lists no pairs", manifest_path.display());
    }

    let (evaluator, client) = setup(price_per_token)?;

    println!("Running evaluation on {} pairs...", manifest.pairs.len());

    let runner = BatchRunner::new(&evaluator, BatchConfig { fail_fast });
    let results = runner
        .run(&manifest.pairs, &client)
        .await
        .context("Batch evaluation failed")?;

    for item in &results.item_results {
        let label = format!("{} + {}", item.transcript, item.contexts);
        match (&item.report, &item.error) {
            (Some(report), _) => print_report(&label, report),
            (None, Some(error)) => {
                println!("\n--- Evaluating: {} ---", label);
                println!("FAILED: {}", error);
            }
            (None, None) => {}
        }
    }

    results.print_summary();

    if let Some(output_path) = output {
        save_json(&results, &output_path).context("Failed to save results")?;
        println!("Results saved to {}", output_path.display());
    }

    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    println!(
        "  API Key:   {}...",
        config.llm.api_key.chars().take(8).collect::<String>()
    );
    println!("  Price/tok: {}", config.eval.price_per_token);
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(response) => {
            println!("Connection successful!");
            println!(
                "  Finish reason: {}",
                response.finish_reason.as_deref().unwrap_or("unknown")
            );
            match response.usage {
                Some(usage) => {
                    println!("  Prompt tokens:     {}", usage.prompt_tokens);
                    println!("  Completion tokens: {}", usage.completion_tokens);
                    match usage.total_tokens {
                        Some(total) => println!("  Total tokens:      {}", total),
                        None => println!("  Total tokens:      unknown"),
                    }
                }
                None => println!("  Token usage: not reported"),
            }
        }
        Err(e) => {
            println!("Connection failed: {}", e);
        }
    }

    Ok(())
}
