//! Gemini REST client: text generation, translation and embeddings.
//!
//! Endpoints:
//! - POST /v1beta/models/{model}:generateContent
//! - POST /v1beta/models/{embedding_model}:embedContent
//!
//! Auth: API key via the `key` query parameter.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Scorer, TransformError, Translator};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Output token cap for a single translation response
const TRANSLATION_MAX_TOKENS: u32 = 500;

/// Shared client for all Gemini calls in a run
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f64>,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(api_key: String, model: String, embedding_model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            embedding_model,
        }
    }

    /// Override the base URL (for tests against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate text from a prompt
    pub async fn generate_text(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, TransformError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        };

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::Provider(format!(
                "generateContent returned {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: GenerateResponse = response.json().await?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(TransformError::EmptyResponse);
        }

        Ok(text.trim().to_string())
    }

    /// Embed a sentence into a vector
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>, TransformError> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.embedding_model, self.api_key
        );

        let request = EmbedRequest {
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::Provider(format!(
                "embedContent returned {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: EmbedResponse = response.json().await?;

        if parsed.embedding.values.is_empty() {
            return Err(TransformError::EmptyResponse);
        }

        Ok(parsed.embedding.values)
    }
}

/// One translation hop backed by the Gemini client.
pub struct GeminiTranslator {
    client: Arc<GeminiClient>,
    source_lang: String,
    target_lang: String,
}

impl GeminiTranslator {
    /// Create a translator for one language pair
    pub fn new(client: Arc<GeminiClient>, source_lang: String, target_lang: String) -> Self {
        Self {
            client,
            source_lang,
            target_lang,
        }
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "You are a professional translator specializing in {source} to {target} translation.\n\
             Provide accurate, natural translations that preserve the meaning and tone of the original text.\n\
             Return ONLY the translated text without any explanations, quotes, or additional commentary.\n\n\
             Translate the following {source} text to {target}:\n\n{text}",
            source = self.source_lang,
            target = self.target_lang,
        )
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str) -> Result<String, TransformError> {
        let raw = self
            .client
            // Temperature 0 keeps translations deterministic
            .generate_text(&self.prompt(text), 0.0, TRANSLATION_MAX_TOKENS)
            .await?;

        Ok(clean_translation(&raw, &self.target_lang))
    }
}

/// Strip wrapping quotes and commentary prefixes models sometimes add.
pub fn clean_translation(raw: &str, target_lang: &str) -> String {
    let mut text = raw.trim();

    if (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
        || (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
    {
        text = &text[1..text.len() - 1];
    }

    let prefixes = [
        "Translation: ".to_string(),
        "Here is the translation: ".to_string(),
        "The translation is: ".to_string(),
        format!("{}: ", target_lang),
    ];

    let mut cleaned = text.trim();
    for prefix in &prefixes {
        if let Some(rest) = cleaned.strip_prefix(prefix.as_str()) {
            cleaned = rest.trim();
        }
    }

    cleaned.to_string()
}

/// Embedding-backed cosine distance scorer.
pub struct GeminiScorer {
    client: Arc<GeminiClient>,
}

impl GeminiScorer {
    /// Create a scorer over the shared client
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scorer for GeminiScorer {
    async fn distance(&self, a: &str, b: &str) -> Result<f64, TransformError> {
        // Identical inputs score exactly zero, without an embedding call
        if a == b {
            return Ok(0.0);
        }

        let embedding_a = self.client.embed(a).await?;
        let embedding_b = self.client.embed(b).await?;

        Ok(cosine_distance(&embedding_a, &embedding_b))
    }
}

/// Cosine distance between two vectors: `1 - cos(a, b)`, in `[0, 2]`.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        // Degenerate embedding; treat as unrelated
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> Arc<GeminiClient> {
        Arc::new(GeminiClient::new(
            "test-key".to_string(),
            "test-model".to_string(),
            "test-embedding".to_string(),
        ))
    }

    #[tokio::test]
    async fn test_identical_inputs_score_exactly_zero() {
        let scorer = GeminiScorer::new(test_client());

        let d = scorer.distance("the sky is blue", "the sky is blue").await;
        assert_eq!(d.unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_distance_orthogonal_vectors() {
        let d = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_distance_opposite_vectors() {
        let d = cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_distance_parallel_vectors() {
        let d = cosine_distance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn test_cosine_distance_zero_norm() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_clean_translation_strips_quotes() {
        assert_eq!(clean_translation("\"Привет, мир\"", "Russian"), "Привет, мир");
        assert_eq!(clean_translation("'hello'", "English"), "hello");
    }

    #[test]
    fn test_clean_translation_strips_prefixes() {
        assert_eq!(
            clean_translation("Translation: bonjour", "French"),
            "bonjour"
        );
        assert_eq!(clean_translation("French: bonjour", "French"), "bonjour");
        assert_eq!(
            clean_translation("Here is the translation: bonjour", "French"),
            "bonjour"
        );
    }

    #[test]
    fn test_clean_translation_plain_text_untouched() {
        assert_eq!(clean_translation("  bonjour  ", "French"), "bonjour");
    }

    #[test]
    fn test_translation_prompt_names_both_languages() {
        let translator =
            GeminiTranslator::new(test_client(), "English".to_string(), "Russian".to_string());

        let prompt = translator.prompt("hello");
        assert!(prompt.contains("English to Russian"));
        assert!(prompt.ends_with("hello"));
    }
}
