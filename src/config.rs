//! Run configuration.
//!
//! Loaded from a YAML file; every field has a default so an empty (or
//! missing) file yields a working five-sentence run. The API key is
//! taken from the environment only and never appears in the file or in
//! result metadata.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::RetryPolicy;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "semdrift.yaml";

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of sentences to generate and process
    #[serde(default = "default_num_sentences")]
    pub num_sentences: usize,

    /// Minimum words per generated sentence
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Maximum words per generated sentence
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Wall-clock deadline per translation attempt, in seconds
    #[serde(default = "default_agent_timeout")]
    pub agent_timeout_seconds: u64,

    /// Attempts per stage call, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts, in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    /// Write a checkpoint every N completed sentences
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Fixed pause after each sentence, in seconds (0 disables)
    #[serde(default)]
    pub inter_item_delay_seconds: u64,

    /// Where checkpoint and result files go
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Name of the final result file
    #[serde(default = "default_results_filename")]
    pub results_filename: String,

    /// Model used for translation and sentence generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// The translation hops, in order
    #[serde(default = "default_chain")]
    pub chain: Vec<StageConfig>,
}

/// One hop of the translation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Result-field key, e.g. "russian" -> "russian_translation"
    pub name: String,

    /// Source language name
    pub source: String,

    /// Target language name
    pub target: String,
}

impl StageConfig {
    /// Log label for this hop
    pub fn label(&self) -> String {
        format!("{} → {}", self.source, self.target)
    }
}

fn default_num_sentences() -> usize {
    5
}
fn default_min_words() -> usize {
    10
}
fn default_max_words() -> usize {
    20
}
fn default_agent_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    2
}
fn default_checkpoint_interval() -> usize {
    10
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}
fn default_results_filename() -> String {
    "translation_results.json".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_chain() -> Vec<StageConfig> {
    vec![
        StageConfig {
            name: "russian".to_string(),
            source: "English".to_string(),
            target: "Russian".to_string(),
        },
        StageConfig {
            name: "hebrew".to_string(),
            source: "Russian".to_string(),
            target: "Hebrew".to_string(),
        },
        StageConfig {
            name: "english".to_string(),
            source: "Hebrew".to_string(),
            target: "English".to_string(),
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_sentences: default_num_sentences(),
            min_words: default_min_words(),
            max_words: default_max_words(),
            agent_timeout_seconds: default_agent_timeout(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            checkpoint_interval: default_checkpoint_interval(),
            inter_item_delay_seconds: 0,
            output_dir: default_output_dir(),
            results_filename: default_results_filename(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            chain: default_chain(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist; otherwise
    /// `semdrift.yaml` in the working directory is used when present,
    /// and defaults apply when it is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config YAML")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_sentences == 0 {
            anyhow::bail!("num_sentences must be at least 1");
        }
        if self.min_words == 0 || self.min_words > self.max_words {
            anyhow::bail!(
                "invalid word bounds: min_words {} must be in 1..=max_words {}",
                self.min_words,
                self.max_words
            );
        }
        if self.max_retries == 0 {
            anyhow::bail!("max_retries must be at least 1");
        }
        if self.checkpoint_interval == 0 {
            anyhow::bail!("checkpoint_interval must be at least 1");
        }
        if self.chain.is_empty() {
            anyhow::bail!("chain must have at least one stage");
        }
        for (i, stage) in self.chain.iter().enumerate() {
            if stage.name.is_empty() {
                anyhow::bail!("chain stage {} has an empty name", i);
            }
        }
        Ok(())
    }

    /// Retry policy derived from the timeout and retry fields
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            timeout: Duration::from_secs(self.agent_timeout_seconds),
            retry_delay: Duration::from_secs(self.retry_delay_seconds),
        }
    }

    /// Pause between sentences
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_secs(self.inter_item_delay_seconds)
    }

    /// Provider API key from the environment
    /// (`GOOGLE_API_KEY`, falling back to `GEMINI_API_KEY`)
    pub fn api_key() -> Result<String> {
        std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .context("Missing API key: set GOOGLE_API_KEY (or GEMINI_API_KEY)")
    }
}
