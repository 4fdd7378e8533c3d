//! Lexical hallucination check.
//!
//! A response is split on `.` into sentences; each trimmed, non-empty
//! sentence must appear verbatim (ignoring case) inside at least one context
//! passage. The match is literal, so a faithful paraphrase still counts as
//! ungrounded.

use crate::context::ContextSet;

/// Score for a response whose every sentence is grounded.
pub const GROUNDED: f64 = 1.0;

/// Score for a response with at least one ungrounded sentence.
pub const HALLUCINATED: f64 = 0.0;

/// Split text into trimmed, non-empty, period-delimited sentences.
pub fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split('.').map(str::trim).filter(|s| !s.is_empty())
}

/// Checks response sentences against the context text.
pub struct HallucinationDetector {
    passages: Vec<String>,
}

impl HallucinationDetector {
    pub fn new(contexts: &ContextSet) -> Self {
        Self {
            passages: contexts.texts().map(str::to_lowercase).collect(),
        }
    }

    /// Whether some passage contains the sentence, ignoring case.
    pub fn is_grounded(&self, sentence: &str) -> bool {
        let needle = sentence.to_lowercase();
        self.passages.iter().any(|p| p.contains(&needle))
    }

    /// Sentences of `response` that no passage contains, in order.
    pub fn ungrounded_sentences(&self, response: &str) -> Vec<String> {
        sentences(response)
            .filter(|s| !self.is_grounded(s))
            .map(str::to_string)
            .collect()
    }

    /// [`GROUNDED`] if every sentence is grounded, else [`HALLUCINATED`].
    pub fn groundedness(&self, response: &str) -> f64 {
        if sentences(response).all(|s| self.is_grounded(s)) {
            GROUNDED
        } else {
            HALLUCINATED
        }
    }
}

/// Convenience wrapper around [`HallucinationDetector::groundedness`].
///
/// An empty context set is not an error here: any sentence is then ungrounded.
pub fn groundedness(response: &str, contexts: &ContextSet) -> f64 {
    HallucinationDetector::new(contexts).groundedness(response)
}
