//! Capability interfaces for external collaborators.
//!
//! The pipeline core only sees these three narrow traits; the concrete
//! backend (Gemini over REST) is selected at configuration time.

pub mod gemini;
pub mod generator;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the concrete implementations
pub use gemini::{GeminiClient, GeminiScorer, GeminiTranslator};
pub use generator::GeminiSentenceSource;

/// Failure from an external transformation, generation or scoring call.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The HTTP request itself failed (connect, timeout, decode)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but returned no usable content
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The provider reported an error of its own
    #[error("provider error: {0}")]
    Provider(String),
}

/// One fallible transformation step: text in, text out.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TransformError>;
}

/// Semantic distance between two sentences.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Cosine distance in `[0, 2]`: 0 = identical meaning, 2 = maximally
    /// dissimilar. Identical inputs score exactly 0.
    async fn distance(&self, a: &str, b: &str) -> Result<f64, TransformError>;
}

/// Produces candidate input sentences within a word-count range.
#[async_trait]
pub trait SentenceSource: Send + Sync {
    async fn generate(
        &self,
        count: usize,
        min_words: usize,
        max_words: usize,
    ) -> Result<Vec<String>, TransformError>;
}
