use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::browser::webdriver::{WebDriverConfig, WebDriverSession};
use crate::cli::config::ResolvedEnrichment;
use crate::data::data_map::DataMap;
use crate::data::enrichment::{ChatCompletionGateway, EnrichmentGateway, NoopGateway};
use crate::replay::engine::{ReplayOutcome, Replayer};
use crate::replay::event::RecordedEvent;
use crate::replay::options::{ReplayOptions, SessionPolicy};
use crate::task::client::TaskStoreClient;
use crate::task::task_model::{StoredEvent, to_replay_events};

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// replay subcommand
// ============================================================================

/// Replay a local event file. Returns whether the replay completed.
pub fn cmd_replay(
    events_path: &Path,
    data_path: Option<&Path>,
    keep_open: bool,
    webdriver: &WebDriverConfig,
    options: &ReplayOptions,
    enrichment: &ResolvedEnrichment,
) -> CmdResult<bool> {
    let events = load_events(events_path)?;
    let data = load_data(data_path)?;
    info!(path = %events_path.display(), events = events.len(), "Loaded event file");

    run_replay(&events, data, keep_open, webdriver, options, enrichment)
}

// ============================================================================
// task subcommands
// ============================================================================

pub fn cmd_task_list(base_url: &str) -> CmdResult<()> {
    let client = TaskStoreClient::new(base_url);
    let tasks = client.list_tasks()?;

    if tasks.is_empty() {
        println!("No tasks found at {}", client.base_url());
        return Ok(());
    }

    for task in &tasks {
        println!("{}  {}  (updated {})", task.task_id, task.task_name, task.updated_at);
    }
    Ok(())
}

/// Fetch a stored task and replay it. Returns whether the replay completed.
pub fn cmd_task_replay(
    base_url: &str,
    task_id: &str,
    data_path: Option<&Path>,
    keep_open: bool,
    webdriver: &WebDriverConfig,
    options: &ReplayOptions,
    enrichment: &ResolvedEnrichment,
) -> CmdResult<bool> {
    let client = TaskStoreClient::new(base_url);
    let events = client.load_replay_events(task_id)?;
    let data = load_data(data_path)?;
    info!(task_id, events = events.len(), "Loaded task");

    run_replay(&events, data, keep_open, webdriver, options, enrichment)
}

// ============================================================================
// Shared helpers
// ============================================================================

fn run_replay(
    events: &[RecordedEvent],
    data: DataMap,
    keep_open: bool,
    webdriver: &WebDriverConfig,
    options: &ReplayOptions,
    enrichment: &ResolvedEnrichment,
) -> CmdResult<bool> {
    let mut options = options.clone();
    if keep_open {
        options.session_policy = SessionPolicy::LeaveOpen;
    }

    let session = WebDriverSession::start(webdriver)?;
    let mut replayer = Replayer::new(session, build_gateway(enrichment), options);
    let outcome = replayer.run(events, data);

    print_outcome(&outcome)?;
    Ok(outcome.succeeded())
}

fn print_outcome(outcome: &ReplayOutcome) -> CmdResult<()> {
    for shot in &outcome.screenshots {
        eprintln!("Screenshot {} -> {} (sha1 {})", shot.event_id, shot.path.display(), shot.sha1);
    }
    if let Some(error) = &outcome.error {
        eprintln!("Replay failed after {} events: {}", outcome.events_run, error);
    } else {
        eprintln!("Replay completed: {} events", outcome.events_run);
    }

    println!("{}", serde_json::to_string_pretty(&outcome.data)?);
    Ok(())
}

/// Build the enrichment gateway for the resolved settings.
pub fn build_gateway(enrichment: &ResolvedEnrichment) -> Box<dyn EnrichmentGateway> {
    if !enrichment.enabled {
        return Box::new(NoopGateway);
    }

    let mut gateway = ChatCompletionGateway::default();
    if let Some(endpoint) = &enrichment.endpoint {
        gateway.endpoint = endpoint.clone();
    }
    if let Some(model) = &enrichment.model {
        gateway.model = model.clone();
    }
    gateway.api_key = enrichment.api_key.clone();
    Box::new(gateway)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventFile {
    Recorded(Vec<RecordedEvent>),
    Stored(Vec<StoredEvent>),
}

/// Load events from a JSON or YAML file holding either replay-ready events
/// or stored event chains.
pub fn load_events(path: &Path) -> CmdResult<Vec<RecordedEvent>> {
    match read_structured::<EventFile>(path)? {
        EventFile::Recorded(events) => Ok(events),
        EventFile::Stored(roots) => Ok(to_replay_events(roots)?),
    }
}

/// Load the initial data map, or an empty one when no file is given.
pub fn load_data(path: Option<&Path>) -> CmdResult<DataMap> {
    match path {
        Some(path) => read_structured(path),
        None => Ok(DataMap::new()),
    }
}

fn read_structured<T: DeserializeOwned>(path: &Path) -> CmdResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(parsed)
}
