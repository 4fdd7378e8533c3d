//! Embedding capability and the local sentence-transformers model.

use crate::error::{EvalError, Result};

/// Maps texts into a shared fixed-dimension vector space.
///
/// Must be deterministic for identical input. Loaded once and shared
/// read-only across evaluations.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EvalError::Embedding("no vector returned".to_string()))
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(feature = "embeddings")]
pub use local::EmbeddingModel;

#[cfg(feature = "embeddings")]
mod local {
    use super::Embedder;
    use crate::error::EvalError;
    use anyhow::{Context, Result};
    use candle_core::{Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
    use hf_hub::{Repo, RepoType, api::sync::Api};
    use tokenizers::Tokenizer;
    use tracing::info;

    /// Local BERT embedding model (mean pooled, L2 normalised).
    pub struct EmbeddingModel {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
    }

    impl EmbeddingModel {
        /// Load a sentence-transformers model by name.
        pub fn load(model_id: &str) -> Result<Self> {
            let device = Device::Cpu; // Use CPU for portability

            info!(model = model_id, "loading embedding model");

            let api = Api::new().context("Failed to create HF Hub API")?;
            let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

            let config_path = repo
                .get("config.json")
                .context("Failed to get config.json")?;
            let tokenizer_path = repo
                .get("tokenizer.json")
                .context("Failed to get tokenizer.json")?;
            let weights_path = repo
                .get("model.safetensors")
                .context("Failed to get model weights")?;

            let config: BertConfig =
                serde_json::from_str(&std::fs::read_to_string(&config_path)?)
                    .context("Failed to parse config")?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                    .context("Failed to load model weights")?
            };

            let model = BertModel::load(vb, &config).context("Failed to load BERT model")?;

            Ok(Self {
                model,
                tokenizer,
                device,
            })
        }

        fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let max_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0);

            let mut input_ids_vec = Vec::new();
            let mut attention_mask_vec = Vec::new();

            for encoding in &encodings {
                let mut padded_ids = encoding.get_ids().to_vec();
                let mut padded_mask = encoding.get_attention_mask().to_vec();
                padded_ids.resize(max_len, 0);
                padded_mask.resize(max_len, 0);

                input_ids_vec.extend(padded_ids);
                attention_mask_vec.extend(padded_mask);
            }

            let batch_size = texts.len();

            let input_ids = Tensor::from_vec(input_ids_vec, (batch_size, max_len), &self.device)?;
            let attention_mask =
                Tensor::from_vec(attention_mask_vec, (batch_size, max_len), &self.device)?;
            let token_type_ids = input_ids.zeros_like()?;

            let output = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

            // Mean pooling over the sequence, ignoring padding
            let mask = attention_mask
                .unsqueeze(2)?
                .to_dtype(output.dtype())?
                .broadcast_as(output.shape())?;

            let summed = (output * &mask)?.sum(1)?;
            let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
            let pooled = (summed / counts)?;

            let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
            let normalized = pooled.broadcast_div(&norms)?;

            Ok(normalized.to_vec2::<f32>()?)
        }
    }

    impl Embedder for EmbeddingModel {
        fn embed_batch(&self, texts: &[&str]) -> crate::error::Result<Vec<Vec<f32>>> {
            self.encode(texts)
                .map_err(|e| EvalError::Embedding(format!("{:#}", e)))
        }
    }
}
