use std::cell::RefCell;
use std::collections::BTreeMap;

use event_replay::data::enrichment::{EnrichmentGateway, EnrichmentRequest};
use event_replay::error::ReplayError;

/// Enrichment double that answers from a fixed table and records requests.
#[derive(Default)]
pub struct RecordingGateway {
    answers: BTreeMap<String, String>,
    offline: bool,
    requests: RefCell<Vec<EnrichmentRequest>>,
}

impl RecordingGateway {
    pub fn answering(pairs: &[(&str, &str)]) -> Self {
        Self {
            answers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<EnrichmentRequest> {
        self.requests.borrow().clone()
    }
}

impl EnrichmentGateway for RecordingGateway {
    fn complete(&self, request: &EnrichmentRequest) -> Result<BTreeMap<String, String>, ReplayError> {
        self.requests.borrow_mut().push(request.clone());
        if self.offline {
            return Err(ReplayError::GatewayUnavailable("offline".into()));
        }
        Ok(request
            .targets
            .iter()
            .filter_map(|t| self.answers.get(&t.key).map(|v| (t.key.clone(), v.clone())))
            .collect())
    }
}
