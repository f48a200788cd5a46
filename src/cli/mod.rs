// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::search::{HttpConfig, SearchConfig, SearchCoordinator};

/// Resolve Niconico sm numbers to Bilibili av numbers
#[derive(Parser, Debug)]
#[command(name = "sm2av")]
#[command(version)]
#[command(about = "Search Bilibili for reuploads of Niconico videos", long_about = None)]
pub struct Cli {
    /// sm numbers to search for
    pub sources: Vec<String>,

    /// File with sm numbers separated by whitespace or newlines
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Concurrent workers for the Bilibili search
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Maximum pause between DogeDoge searches in seconds (0 disables)
    #[arg(long)]
    pub max_delay: Option<u64>,

    /// Pause before each Bilibili search request in milliseconds
    #[arg(long)]
    pub internal_delay_ms: Option<u64>,

    /// Cap on Bilibili search requests per minute
    #[arg(long)]
    pub rate_limit_per_minute: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Count a video found by both searches only once
    #[arg(long)]
    pub dedup_across_phases: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Search configuration from the environment, overridden by flags
    pub fn search_config(&self) -> SearchConfig {
        let mut config = SearchConfig::from_env();
        if let Some(concurrency) = self.concurrency {
            config.internal_concurrency = concurrency;
        }
        if let Some(max_delay) = self.max_delay {
            config.external_max_delay_secs = max_delay;
        }
        if let Some(delay) = self.internal_delay_ms {
            config.internal_delay_ms = delay;
        }
        if self.rate_limit_per_minute.is_some() {
            config.internal_rate_limit_per_minute = self.rate_limit_per_minute;
        }
        if self.dedup_across_phases {
            config.dedup_across_phases = true;
        }
        config
    }

    /// HTTP configuration from the environment, overridden by flags
    pub fn http_config(&self) -> HttpConfig {
        let mut config = HttpConfig::from_env();
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        config
    }

    /// All sm numbers from arguments and the input file
    pub fn collect_source_args(&self) -> Result<Vec<String>> {
        let mut sources = self.sources.clone();
        if let Some(path) = &self.input {
            sources.extend(read_source_file(path)?);
        }
        Ok(sources)
    }
}

/// Split a source list into tokens
pub fn parse_source_list(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Read sm numbers from a file
pub fn read_source_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    Ok(parse_source_list(&text))
}

/// Execute a search from parsed arguments
pub async fn execute(cli: Cli) -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let sources = cli.collect_source_args()?;
    if sources.iter().all(|s| s.trim().is_empty()) {
        bail!("No sm numbers given. Pass them as arguments or with --input");
    }

    let mut coordinator = SearchCoordinator::connect(cli.search_config(), &cli.http_config())?;

    if !cli.json {
        println!("Searching... the DogeDoge search may take a while.\n");
    }
    info!(inputs = sources.len(), "Starting search");

    let report = coordinator.run(&sources).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::render_text(&report));
    }
    Ok(())
}
