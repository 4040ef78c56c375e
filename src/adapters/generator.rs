//! Sentence generation for drift measurement inputs.
//!
//! Prompts the provider for a numbered list, validates word counts,
//! tops up when too few valid sentences parse, and falls back to
//! template-based generation when the provider is unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::warn;

use super::gemini::GeminiClient;
use super::{SentenceSource, TransformError};

const GENERATION_MAX_TOKENS: u32 = 4000;
const TOP_UP_MAX_TOKENS: u32 = 2000;

/// Provider-backed sentence source with an offline fallback.
pub struct GeminiSentenceSource {
    client: Arc<GeminiClient>,
}

impl GeminiSentenceSource {
    /// Create a sentence source over the shared client
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    async fn top_up(
        &self,
        count: usize,
        min_words: usize,
        max_words: usize,
    ) -> Result<Vec<String>, TransformError> {
        let prompt = format!(
            "Generate {count} more diverse, grammatically correct English sentences.\n\
             Each sentence should be between {min_words} and {max_words} words long.\n\
             Return ONLY the sentences, one per line, without numbering."
        );

        let content = self
            .client
            .generate_text(&prompt, 0.8, TOP_UP_MAX_TOKENS)
            .await?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| within_word_bounds(line, min_words, max_words))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl SentenceSource for GeminiSentenceSource {
    async fn generate(
        &self,
        count: usize,
        min_words: usize,
        max_words: usize,
    ) -> Result<Vec<String>, TransformError> {
        let prompt = format!(
            "Generate {count} diverse, grammatically correct English sentences.\n\
             Each sentence should be between {min_words} and {max_words} words long.\n\
             The sentences should cover various topics: technology, nature, daily life, \
             science, culture, history, etc.\n\
             Make them interesting and varied in structure.\n\n\
             Return ONLY the sentences, one per line, numbered from 1 to {count}.\n\
             Format: \"1. [sentence]\" on each line."
        );

        let content = match self
            .client
            .generate_text(&prompt, 0.7, GENERATION_MAX_TOKENS)
            .await
        {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "sentence generation failed, using template fallback");
                return Ok(template_sentences(count, min_words, max_words));
            }
        };

        let mut sentences = parse_numbered(&content, min_words, max_words);

        if sentences.len() < count {
            warn!(
                parsed = sentences.len(),
                requested = count,
                "too few valid sentences, requesting more"
            );
            match self.top_up(count - sentences.len(), min_words, max_words).await {
                Ok(extra) => sentences.extend(extra),
                Err(err) => warn!(error = %err, "top-up generation failed"),
            }
        }

        if sentences.len() < count {
            let missing = count - sentences.len();
            warn!(missing, "filling remainder from templates");
            sentences.extend(template_sentences(missing, min_words, max_words));
        }

        sentences.truncate(count);
        Ok(sentences)
    }
}

fn within_word_bounds(sentence: &str, min_words: usize, max_words: usize) -> bool {
    let words = sentence.split_whitespace().count();
    (min_words..=max_words).contains(&words)
}

/// Parse a numbered list ("1. sentence"), keeping only lines inside the
/// word-count bounds.
pub fn parse_numbered(content: &str, min_words: usize, max_words: usize) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let (prefix, rest) = line.split_once('.')?;
            if prefix.parse::<usize>().is_err() {
                return None;
            }
            let sentence = rest.trim();
            if sentence.is_empty() {
                return None;
            }
            Some(sentence.to_string())
        })
        .filter(|sentence| within_word_bounds(sentence, min_words, max_words))
        .collect()
}

/// Offline fallback: fill templates with random word choices.
///
/// Every template lands inside the default 10-20 word range.
pub fn template_sentences(count: usize, min_words: usize, max_words: usize) -> Vec<String> {
    const TEMPLATES: &[&str] = &[
        "The {adj} {noun} slowly transformed the {place} while curious visitors watched from a safe distance nearby.",
        "Scientists have discovered that {noun} can change in unexpected ways when exposed to {condition} over time.",
        "Every morning the {profession} would carefully prepare before heading to the {place} to start the day.",
        "Technology has revolutionized how people study {noun} and interact with the {place} in modern society today.",
        "Historical records suggest that every {profession} once approached the {noun} far differently than they do today.",
        "Researchers believe that understanding the {adj} {noun} could help communities plan more effectively for the future.",
    ];

    const ADJECTIVES: &[&str] = &[
        "ancient", "modern", "mysterious", "vibrant", "quiet", "massive",
    ];
    const NOUNS: &[&str] = &[
        "mountain", "river", "marketplace", "tradition", "discovery", "innovation",
    ];
    const PLACES: &[&str] = &["valley", "harbor", "forest", "library", "countryside"];
    const CONDITIONS: &[&str] = &["sunlight", "pressure", "temperature", "darkness"];
    const PROFESSIONS: &[&str] = &["teacher", "doctor", "engineer", "artist", "scientist"];

    let mut rng = rand::thread_rng();
    let mut sentences = Vec::with_capacity(count);
    let mut attempts = 0usize;

    while sentences.len() < count {
        attempts += 1;
        let template = TEMPLATES.choose(&mut rng).unwrap_or(&TEMPLATES[0]);
        let sentence = template
            .replace("{adj}", ADJECTIVES.choose(&mut rng).unwrap_or(&ADJECTIVES[0]))
            .replace("{noun}", NOUNS.choose(&mut rng).unwrap_or(&NOUNS[0]))
            .replace("{place}", PLACES.choose(&mut rng).unwrap_or(&PLACES[0]))
            .replace(
                "{condition}",
                CONDITIONS.choose(&mut rng).unwrap_or(&CONDITIONS[0]),
            )
            .replace(
                "{profession}",
                PROFESSIONS.choose(&mut rng).unwrap_or(&PROFESSIONS[0]),
            );

        // Give up on the bounds filter if the requested range excludes
        // every template
        if within_word_bounds(&sentence, min_words, max_words)
            || attempts > count.saturating_mul(20)
        {
            sentences.push(sentence);
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbered_list() {
        let content = "\
1. The quick brown fox jumped over the lazy dog near the river today.
2. Short one.
not a numbered line
3. Ancient libraries preserved countless manuscripts that scholars still study with great care today.";

        let sentences = parse_numbered(content, 10, 20);

        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("The quick brown fox"));
        assert!(sentences[1].starts_with("Ancient libraries"));
    }

    #[test]
    fn test_parse_numbered_rejects_out_of_bounds() {
        let content = "1. Way too short.\n2. one two three four five six seven eight nine ten";

        let sentences = parse_numbered(content, 10, 20);
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_parse_numbered_empty_content() {
        assert!(parse_numbered("", 10, 20).is_empty());
    }

    #[test]
    fn test_template_sentences_respect_bounds() {
        let sentences = template_sentences(8, 10, 20);

        assert_eq!(sentences.len(), 8);
        for sentence in &sentences {
            let words = sentence.split_whitespace().count();
            assert!(
                (10..=20).contains(&words),
                "'{sentence}' has {words} words"
            );
        }
    }
}
