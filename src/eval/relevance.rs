//! Semantic relevance of a response to its retrieved context.

use super::embeddings::{Embedder, cosine_similarity};
use crate::context::ContextSet;
use crate::error::{EvalError, Result};
use tracing::debug;

/// Scores a response by its best-matching context passage.
pub struct RelevanceScorer<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> RelevanceScorer<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    /// Maximum cosine similarity between the response and any passage, in `[0, 1]`.
    ///
    /// The response and all passages are embedded in one batch call.
    pub fn relevance(&self, response: &str, contexts: &ContextSet) -> Result<f64> {
        if contexts.is_empty() {
            return Err(EvalError::EmptyContext);
        }

        let mut texts = Vec::with_capacity(contexts.len() + 1);
        texts.push(response);
        texts.extend(contexts.texts());

        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(EvalError::Embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        let (response_vec, passage_vecs) = vectors.split_first().ok_or_else(|| {
            EvalError::Embedding("embedder returned no vectors".to_string())
        })?;

        if let Some((i, v)) = passage_vecs
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != response_vec.len())
        {
            return Err(EvalError::Embedding(format!(
                "dimension mismatch: response has {} dims, passage {} has {}",
                response_vec.len(),
                i,
                v.len()
            )));
        }

        let best = passage_vecs
            .iter()
            .map(|v| cosine_similarity(response_vec, v))
            .fold(f32::NEG_INFINITY, f32::max);

        debug!(passages = contexts.len(), best, "scored relevance");

        Ok(f64::from(best).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Embedder backed by a fixed lookup table; unknown texts map to the zero vector.
    pub(crate) struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        dimension: usize,
    }

    impl TableEmbedder {
        pub(crate) fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            let dimension = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
            Self {
                table: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                dimension,
            }
        }
    }

    impl Embedder for TableEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    self.table
                        .get(*t)
                        .cloned()
                        .unwrap_or_else(|| vec![0.0; self.dimension])
                })
                .collect())
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]])
        }
    }

    fn embedder() -> TableEmbedder {
        TableEmbedder::new(&[
            ("response", vec![1.0, 0.0]),
            ("same", vec![2.0, 0.0]),
            ("close", vec![0.8, 0.6]),
            ("orthogonal", vec![0.0, 1.0]),
            ("opposite", vec![-1.0, 0.0]),
        ])
    }

    #[test]
    fn test_empty_context_is_error() {
        let embedder = embedder();
        let scorer = RelevanceScorer::new(&embedder);
        assert!(matches!(
            scorer.relevance("response", &ContextSet::default()),
            Err(EvalError::EmptyContext)
        ));
    }

    #[test]
    fn test_relevance_is_best_match() {
        let embedder = embedder();
        let scorer = RelevanceScorer::new(&embedder);

        let contexts = ContextSet::from_texts(["orthogonal", "close"]);
        let score = scorer.relevance("response", &contexts).unwrap();
        assert!((score - 0.8).abs() < 1e-6);

        let contexts = ContextSet::from_texts(["close", "same", "orthogonal"]);
        let score = scorer.relevance("response", &contexts).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_relevance_is_order_independent() {
        let embedder = embedder();
        let scorer = RelevanceScorer::new(&embedder);

        let forward = ContextSet::from_texts(["orthogonal", "close", "opposite"]);
        let reversed = ContextSet::from_texts(["opposite", "close", "orthogonal"]);

        assert_eq!(
            scorer.relevance("response", &forward).unwrap(),
            scorer.relevance("response", &reversed).unwrap()
        );
    }

    #[test]
    fn test_relevance_is_clamped_to_unit_interval() {
        let embedder = embedder();
        let scorer = RelevanceScorer::new(&embedder);

        let contexts = ContextSet::from_texts(["opposite"]);
        assert_eq!(scorer.relevance("response", &contexts).unwrap(), 0.0);
    }

    #[test]
    fn test_single_passage_equals_its_similarity() {
        let embedder = embedder();
        let scorer = RelevanceScorer::new(&embedder);

        let contexts = ContextSet::from_texts(["close"]);
        let score = scorer.relevance("response", &contexts).unwrap();
        let direct = cosine_similarity(&[1.0, 0.0], &[0.8, 0.6]) as f64;
        assert!((score - direct).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_vector_count_is_embedding_error() {
        let scorer = RelevanceScorer::new(&ShortEmbedder);
        let contexts = ContextSet::from_texts(["a", "b"]);
        assert!(matches!(
            scorer.relevance("response", &contexts),
            Err(EvalError::Embedding(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_embedding_error() {
        let embedder = TableEmbedder::new(&[
            ("response", vec![1.0, 0.0]),
            ("wide", vec![1.0, 0.0, 0.0]),
        ]);
        let scorer = RelevanceScorer::new(&embedder);
        let contexts = ContextSet::from_texts(["wide"]);

        match scorer.relevance("response", &contexts) {
            Err(EvalError::Embedding(msg)) => assert!(msg.contains("dimension mismatch")),
            other => panic!("expected Embedding error, got {:?}", other),
        }
    }
}
