//! Command-line interface for semdrift.
//!
//! Provides commands for executing a drift measurement run and
//! inspecting the resolved configuration.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{
    GeminiClient, GeminiScorer, GeminiSentenceSource, GeminiTranslator, SentenceSource,
};
use crate::config::Config;
use crate::core::{
    CheckpointWriter, Orchestrator, RunCompletion, RunSettings, Stage, StageChain,
};

/// semdrift - measures semantic drift across chained translation hops
#[derive(Parser, Debug)]
#[command(name = "semdrift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a drift measurement run
    Run {
        /// Config file (default: ./semdrift.yaml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show resolved configuration
    Config {
        /// Config file (default: ./semdrift.yaml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                config,
                output,
                yes,
            } => run_measurement(config, output, yes).await,
            Commands::Config { config } => show_config(config),
        }
    }
}

/// Execute a full drift measurement run
async fn run_measurement(
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    yes: bool,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    config.validate()?;

    let api_key = Config::api_key()?;

    // Prerequisite: the output directory must be creatable before any
    // provider call is made
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Cannot create output directory: {}",
            config.output_dir.display()
        )
    })?;

    print_plan(&config);

    if !yes && !confirm("Do you want to proceed? (yes/no): ")? {
        println!("Execution cancelled.");
        return Ok(());
    }

    let client = Arc::new(GeminiClient::new(
        api_key,
        config.model.clone(),
        config.embedding_model.clone(),
    ));

    println!(
        "\nGenerating {} sentences ({}-{} words)...",
        config.num_sentences, config.min_words, config.max_words
    );
    let source = GeminiSentenceSource::new(Arc::clone(&client));
    let sentences = source
        .generate(config.num_sentences, config.min_words, config.max_words)
        .await
        .context("Sentence generation failed")?;

    for (i, sentence) in sentences.iter().take(3).enumerate() {
        println!("  {}. {}", i + 1, sentence);
    }
    println!("  ... ({} total)", sentences.len());

    let stages: Vec<Stage> = config
        .chain
        .iter()
        .map(|hop| Stage {
            name: hop.name.clone(),
            label: hop.label(),
            translator: Arc::new(GeminiTranslator::new(
                Arc::clone(&client),
                hop.source.clone(),
                hop.target.clone(),
            )),
        })
        .collect();
    let chain = StageChain::new(stages);

    let writer = CheckpointWriter::new(
        config.output_dir.clone(),
        chain.stage_names(),
        config.results_filename.clone(),
        serde_json::to_value(&config).context("Failed to snapshot config")?,
    );

    let orchestrator = Orchestrator::new(
        chain,
        Arc::new(GeminiScorer::new(client)),
        config.retry_policy(),
        RunSettings {
            checkpoint_interval: config.checkpoint_interval,
            inter_item_delay: config.inter_item_delay(),
        },
        writer,
    );

    match orchestrator.run(sentences).await? {
        RunCompletion::Completed { statistics, results } => {
            println!("\nProcessed {} sentences.", results.len());
            println!("\nStatistics:");
            println!("  Average cosine distance: {:.4}", statistics.mean);
            println!("  Variance:                {:.4}", statistics.variance);
            println!("  Standard deviation:      {:.4}", statistics.std);
            println!("  Min distance:            {:.4}", statistics.min);
            println!("  Max distance:            {:.4}", statistics.max);
            println!("  Median distance:         {:.4}", statistics.median);
            println!(
                "\nResults saved to: {}",
                config.output_dir.join(&config.results_filename).display()
            );
            Ok(())
        }
        RunCompletion::Aborted { results, reason } => {
            eprintln!("\nRun stopped: {reason}");
            eprintln!("Processed {} sentences before stopping.", results.len());
            std::process::exit(1);
        }
    }
}

fn print_plan(config: &Config) {
    let hops: Vec<String> = config.chain.iter().map(|hop| hop.label()).collect();

    println!("Drift measurement plan:");
    println!("  Sentences:       {}", config.num_sentences);
    println!(
        "  Words/sentence:  {}-{}",
        config.min_words, config.max_words
    );
    println!("  Chain:           {}", hops.join(", "));
    println!("  Model:           {}", config.model);
    println!("  Embedding model: {}", config.embedding_model);
    println!(
        "  Per-call timeout: {}s, retries: {}, retry delay: {}s",
        config.agent_timeout_seconds, config.max_retries, config.retry_delay_seconds
    );
    if config.inter_item_delay_seconds > 0 {
        println!(
            "  Inter-item delay: {}s",
            config.inter_item_delay_seconds
        );
    }
    println!("  Output dir:      {}", config.output_dir.display());
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .context("Failed to read confirmation")?;

    Ok(matches!(response.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Show the resolved configuration
fn show_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    config.validate()?;

    println!("{}", serde_yaml::to_string(&config)?);

    match Config::api_key() {
        Ok(_) => println!("API key: configured"),
        Err(_) => println!("API key: NOT SET (export GOOGLE_API_KEY)"),
    }

    Ok(())
}
