use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::replay::event::{EventAction, RecordedEvent};

/// Errors raised at the task-storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task storage request failed ({context}): {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Task storage returned HTTP {status} for {context}")]
    Status { context: String, status: u16 },

    #[error("Could not decode task storage response ({context}): {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Event '{uid}' of kind '{kind}' is missing '{field}'")]
    MissingField {
        uid: String,
        kind: String,
        field: &'static str,
    },

    #[error("Event '{uid}' has unknown kind '{kind}'")]
    UnknownKind { uid: String, kind: String },

    #[error("Invalid task storage URL '{base_url}': {detail}")]
    InvalidUrl { base_url: String, detail: String },
}

/// Task summary as listed by the task-storage API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub task_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A task with its recorded event chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvents {
    #[serde(flatten)]
    pub task: Task,
    pub events: Vec<StoredEvent>,
}

/// Event record as stored, possibly linked to the next event of its chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub target_id: String,
    #[serde(default)]
    pub url: String,
    pub tab_id: i64,
    pub window_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_event: Option<Box<StoredEvent>>,
}

impl StoredEvent {
    /// Input and extract events recorded without a value carry nothing to
    /// replay and are dropped rather than failing the task.
    pub fn is_empty_value_event(&self) -> bool {
        matches!(self.kind.as_str(), "input" | "extract")
            && self.input_value.as_deref().is_none_or(str::is_empty)
    }
}

/// Walk each root's `nextEvent` chain depth-first into one ordered list.
/// The link field is dropped from every returned event.
pub fn flatten_events(roots: Vec<StoredEvent>) -> Vec<StoredEvent> {
    let mut flat = Vec::new();
    for root in roots {
        let mut current = Some(Box::new(root));
        while let Some(mut event) = current {
            current = event.next_event.take();
            flat.push(*event);
        }
    }
    flat
}

impl TryFrom<StoredEvent> for RecordedEvent {
    type Error = TaskError;

    fn try_from(stored: StoredEvent) -> Result<Self, Self::Error> {
        let StoredEvent {
            uid,
            kind,
            target_id,
            url,
            tab_id,
            window_id,
            input_value,
            ..
        } = stored;

        let require_value = |field: &'static str| {
            input_value.clone().ok_or_else(|| TaskError::MissingField {
                uid: uid.clone(),
                kind: kind.clone(),
                field,
            })
        };

        let action = match kind.as_str() {
            "click" => EventAction::Click { target_id },
            "input" => EventAction::Input {
                value: require_value("inputValue")?,
                target_id,
            },
            "select-option" => EventAction::SelectOption {
                value: require_value("inputValue")?,
                target_id,
            },
            "extract" => EventAction::Extract {
                key: require_value("inputValue")?,
                target_id,
            },
            "enter-press" => EventAction::EnterPress,
            "input-cert" => EventAction::InputCert {
                value: require_value("inputValue")?,
                target_id,
            },
            "screenshot" => EventAction::Screenshot {
                name: input_value.clone(),
                target_id,
            },
            "accept-popup" => EventAction::AcceptPopup,
            "window-created" => EventAction::WindowCreated { url },
            "tab-removed" => EventAction::TabRemoved,
            "navigation-url" => EventAction::NavigationUrl { url },
            "navigation-back-forward" => EventAction::NavigationBackForward,
            "tab-created" => EventAction::TabCreated,
            "window-removed" => EventAction::WindowRemoved,
            _ => {
                return Err(TaskError::UnknownKind {
                    uid: uid.clone(),
                    kind: kind.clone(),
                });
            }
        };

        Ok(RecordedEvent {
            id: uid,
            window_id,
            tab_id,
            action,
        })
    }
}

/// Flatten stored chains and convert them into replayable events.
/// Input and extract events without a value are skipped.
pub fn to_replay_events(roots: Vec<StoredEvent>) -> Result<Vec<RecordedEvent>, TaskError> {
    flatten_events(roots)
        .into_iter()
        .filter(|event| {
            let skip = event.is_empty_value_event();
            if skip {
                warn!(uid = %event.uid, kind = %event.kind, "Skipping event without inputValue");
            }
            !skip
        })
        .map(RecordedEvent::try_from)
        .collect()
}
