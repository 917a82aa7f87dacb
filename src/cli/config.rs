use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::browser::webdriver::WebDriverConfig;
use crate::replay::options::ReplayOptions;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "event-replay",
    version,
    about = "Replay recorded browser events against a WebDriver session"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: event-replay.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// WebDriver server URL
    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    /// Chat-completion endpoint used to derive missing placeholder values
    #[arg(long, global = true)]
    pub enrichment_endpoint: Option<String>,

    /// Model name sent to the enrichment endpoint
    #[arg(long, global = true)]
    pub enrichment_model: Option<String>,

    /// Never call the enrichment endpoint
    #[arg(long, global = true)]
    pub no_enrichment: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay events from a local JSON or YAML file
    Replay {
        /// Event file: a list of events or of stored event chains
        #[arg(long)]
        events: PathBuf,

        /// Initial data map (JSON or YAML object of strings)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Leave the browser open after the replay
        #[arg(long)]
        keep_open: bool,
    },

    /// Work with tasks kept in task storage
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List stored tasks
    List,

    /// Fetch a task's events and replay them
    Replay {
        /// Task id
        #[arg(long)]
        id: String,

        /// Initial data map (JSON or YAML object of strings)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Leave the browser open after the replay
        #[arg(long)]
        keep_open: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `event-replay.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub replay: ReplayOptions,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    pub endpoint: Option<String>,

    pub model: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            model: None,
            api_key_env: default_api_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_tasks_url")]
    pub base_url: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            base_url: default_tasks_url(),
        }
    }
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_tasks_url() -> String { "http://localhost:8080".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("event-replay.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content),
        Err(_) => AppConfig::default(),
    }
}

/// Parse config YAML, falling back to defaults when it is malformed.
pub fn parse_config(content: &str) -> AppConfig {
    match serde_yaml::from_str(content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed config file");
            AppConfig::default()
        }
    }
}

// ============================================================================
// Resolution (CLI > config file > env > defaults)
// ============================================================================

/// Enrichment settings after layering CLI flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnrichment {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

pub fn resolve_enrichment(cli: &Cli, config: &EnrichmentConfig) -> ResolvedEnrichment {
    ResolvedEnrichment {
        enabled: config.enabled && !cli.no_enrichment,
        endpoint: cli.enrichment_endpoint.clone().or_else(|| config.endpoint.clone()),
        model: cli.enrichment_model.clone().or_else(|| config.model.clone()),
        api_key: std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty()),
    }
}

pub fn resolve_webdriver(cli: &Cli, config: &WebDriverConfig) -> WebDriverConfig {
    let mut resolved = config.clone();
    if let Some(url) = &cli.webdriver_url {
        resolved.server_url = url.clone();
    }
    resolved
}
