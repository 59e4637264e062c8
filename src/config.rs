use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::error::TailError;
use crate::manager::{SourceSpec, DEFAULT_MAX_LOGS};
use crate::render::DEFAULT_TIMESTAMP_FORMAT;

#[derive(Parser, Debug)]
#[clap(name = "streamtail", version, about)]
pub struct Cli {
    /// Path to configuration file
    #[clap(long, default_value = "./config.toml")]
    pub config: PathBuf,

    /// Override log server base URL
    #[clap(long)]
    pub server_url: Option<String>,

    /// Follow this log source; repeat the flag to merge several feeds
    #[clap(long)]
    pub source: Vec<String>,

    /// Override timestamp display format
    #[clap(long)]
    pub timestamp_format: Option<String>,

    /// Override retained record count
    #[clap(long)]
    pub max_logs: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default)]
    pub two_columns: bool,
}

fn default_max_logs() -> usize {
    DEFAULT_MAX_LOGS
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let config_content = fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config file: {:?}", cli.config))?;

    let mut config: Config =
        toml::from_str(&config_content).context("Failed to parse config file")?;

    apply_overrides(&mut config, cli);
    config.validate()?;

    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref server_url) = cli.server_url {
        config.server_url = server_url.clone();
    }

    // One --source selects single mode; several merge into combined mode.
    match cli.source.len() {
        0 => {}
        1 => {
            config.source = Some(cli.source[0].clone());
            config.sources = Vec::new();
        }
        _ => {
            config.source = None;
            config.sources = cli.source.clone();
        }
    }

    if let Some(ref timestamp_format) = cli.timestamp_format {
        config.timestamp_format = timestamp_format.clone();
    }

    if let Some(max_logs) = cli.max_logs {
        config.max_logs = max_logs;
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), TailError> {
        if self.server_url.is_empty() {
            return Err(TailError::Config(
                "server_url must not be empty".to_string(),
            ));
        }
        if self.max_logs == 0 {
            return Err(TailError::Config("max_logs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolves which feeds to follow: a non-empty source list selects
    /// combined mode even when a single name is also set; otherwise the
    /// single source, then the instance id.
    pub fn source_spec(&self) -> Result<SourceSpec, TailError> {
        if !self.sources.is_empty() {
            return Ok(SourceSpec::Combined(self.sources.clone()));
        }
        if let Some(ref source) = self.source {
            if !source.is_empty() {
                return Ok(SourceSpec::Single(source.clone()));
            }
        }
        if let Some(ref id) = self.id {
            if !id.is_empty() {
                return Ok(SourceSpec::Single(id.clone()));
            }
        }
        Err(TailError::Config(
            "no log source configured; set 'source', 'sources' or 'id'".to_string(),
        ))
    }
}
