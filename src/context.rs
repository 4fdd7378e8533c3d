//! Retrieved context passages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved document fragment.
///
/// Any fields besides `text` are kept as opaque metadata and never scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPassage {
    pub text: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ContextPassage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }
}

/// Candidate passages for one evaluation. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSet {
    passages: Vec<ContextPassage>,
}

impl ContextSet {
    pub fn new(passages: Vec<ContextPassage>) -> Self {
        Self { passages }
    }

    /// Build a set from bare passage texts.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ContextPassage::new).collect())
    }

    pub fn passages(&self) -> &[ContextPassage] {
        &self.passages
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.passages.iter().map(|p| p.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}
