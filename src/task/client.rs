use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::replay::event::RecordedEvent;
use crate::task::task_model::{Task, TaskError, TaskEvents, to_replay_events};

/// Blocking client for the task-storage HTTP API.
pub struct TaskStoreClient {
    client: Client,
    base_url: String,
}

impl TaskStoreClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/tasks`
    pub fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        self.get_json(self.endpoint(&["api", "tasks"])?)
    }

    /// `GET /api/tasks/{id}`
    pub fn fetch_task(&self, task_id: &str) -> Result<TaskEvents, TaskError> {
        self.get_json(self.endpoint(&["api", "tasks", task_id])?)
    }

    /// API URL under the base URL, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, TaskError> {
        let invalid = |detail: String| TaskError::InvalidUrl {
            base_url: self.base_url.clone(),
            detail,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch a task and turn its event chains into a replayable sequence.
    pub fn load_replay_events(&self, task_id: &str) -> Result<Vec<RecordedEvent>, TaskError> {
        let task = self.fetch_task(task_id)?;
        debug!(task_id, roots = task.events.len(), "Loaded task events");
        to_replay_events(task.events)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TaskError> {
        let path = url.path().to_string();
        let http_error = |source| TaskError::Http {
            context: path.clone(),
            source,
        };

        let response = self.client.get(url).send().map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TaskError::Status {
                context: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(http_error)?;
        serde_json::from_str(&body).map_err(|source| TaskError::Decode {
            context: path.to_string(),
            source,
        })
    }
}
