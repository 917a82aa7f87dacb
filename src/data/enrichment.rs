use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::data::data_map::DataMap;
use crate::data::placeholder::Placeholder;
use crate::error::ReplayError;

// ============================================================================
// Request model
// ============================================================================

/// A key the gateway is asked to derive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnrichmentTarget {
    pub key: String,
    pub example: Option<String>,
}

/// One completion request: known context values and the keys to derive from them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnrichmentRequest {
    pub context: Vec<(String, String)>,
    pub targets: Vec<EnrichmentTarget>,
}

/// Derives missing data-map values. Results are best effort: a gateway may
/// return any subset of the requested keys, including none.
pub trait EnrichmentGateway {
    fn complete(&self, request: &EnrichmentRequest) -> Result<BTreeMap<String, String>, ReplayError>;
}

impl<G: EnrichmentGateway + ?Sized> EnrichmentGateway for Box<G> {
    fn complete(&self, request: &EnrichmentRequest) -> Result<BTreeMap<String, String>, ReplayError> {
        (**self).complete(request)
    }
}

/// Group placeholders by their base keys and build one request per group
/// whose base keys are all known and which still has a missing target.
///
/// Groups keep the order in which they first appear.
pub fn plan_requests(data: &DataMap, placeholders: &[Placeholder]) -> Vec<EnrichmentRequest> {
    let mut groups: Vec<(String, Vec<&Placeholder>)> = Vec::new();
    for placeholder in placeholders {
        let group_key = placeholder.group_key();
        match groups.iter_mut().find(|(k, _)| *k == group_key) {
            Some((_, members)) => members.push(placeholder),
            None => groups.push((group_key, vec![placeholder])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(_, members)| {
            let base_keys = &members[0].base_keys;
            let context = base_keys
                .iter()
                .map(|k| data.get(k).map(|v| (k.clone(), v.to_string())))
                .collect::<Option<Vec<_>>>()?;

            let mut targets: Vec<EnrichmentTarget> = Vec::new();
            for member in members {
                if data.contains(&member.key) || targets.iter().any(|t| t.key == member.key) {
                    continue;
                }
                targets.push(EnrichmentTarget {
                    key: member.key.clone(),
                    example: member.example.clone(),
                });
            }

            (!targets.is_empty()).then_some(EnrichmentRequest { context, targets })
        })
        .collect()
}

/// Runs enrichment before each event. A request the gateway answered is
/// not sent again; a failed one is retried on the next pass.
pub struct Enricher<G> {
    gateway: G,
    answered: HashSet<EnrichmentRequest>,
}

impl<G: EnrichmentGateway> Enricher<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            answered: HashSet::new(),
        }
    }

    /// Forget answered requests, so a new run asks again.
    pub fn reset(&mut self) {
        self.answered.clear();
    }

    /// Fill what the gateway can derive into `data`. Returns the number of
    /// keys merged. Gateway failures are logged, never propagated.
    pub fn enrich(&mut self, data: &mut DataMap, placeholders: &[Placeholder]) -> usize {
        let mut merged = 0;
        for request in plan_requests(data, placeholders) {
            if self.answered.contains(&request) {
                continue;
            }

            let keys: Vec<&str> = request.targets.iter().map(|t| t.key.as_str()).collect();
            debug!(?keys, "Requesting enrichment");

            match self.gateway.complete(&request) {
                Ok(values) => {
                    self.answered.insert(request.clone());
                    let values: Vec<(String, String)> =
                        values.into_iter().filter(|(_, v)| !v.is_empty()).collect();
                    merged += values.len();
                    info!(requested = keys.len(), received = values.len(), "Enrichment merged");
                    data.merge(values);
                }
                Err(e) => warn!(error = %e, ?keys, "Enrichment failed, placeholders left unresolved"),
            }
        }
        merged
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

// ============================================================================
// Gateways
// ============================================================================

/// Gateway that never derives anything.
pub struct NoopGateway;

impl EnrichmentGateway for NoopGateway {
    fn complete(&self, _request: &EnrichmentRequest) -> Result<BTreeMap<String, String>, ReplayError> {
        Ok(BTreeMap::new())
    }
}

/// Gateway backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatCompletionGateway {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl Default for ChatCompletionGateway {
    fn default() -> Self {
        Self::new("https://api.openai.com/v1/chat/completions", "gpt-3.5-turbo", None)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionGateway {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn build_prompt(request: &EnrichmentRequest) -> String {
        let input = request
            .context
            .iter()
            .map(|(k, v)| format!("  {}: {}", json!(k), json!(v)))
            .collect::<Vec<_>>()
            .join(",\n");

        let output = request
            .targets
            .iter()
            .map(|t| match &t.example {
                Some(example) => format!("  {}: <value of {} ({})>", json!(t.key), t.key, example),
                None => format!("  {}: <value of {}>", json!(t.key), t.key),
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
r#"Extract the requested information from the input JSON and answer with a single JSON object.
Use "" for any value that cannot be derived.

<input>
{{
{}
}}

<output>
{{
{}
}}"#,
            input, output
        )
    }

    /// Turn the model's JSON answer into string pairs.
    pub fn parse_completion(content: &str) -> Result<BTreeMap<String, String>, ReplayError> {
        let parsed: Value = serde_json::from_str(content.trim())
            .map_err(|e| ReplayError::GatewayUnavailable(format!("invalid JSON answer: {}", e)))?;
        let object = parsed.as_object().ok_or_else(|| {
            ReplayError::GatewayUnavailable("answer is not a JSON object".into())
        })?;

        Ok(object
            .iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((k.clone(), value))
            })
            .collect())
    }
}

impl EnrichmentGateway for ChatCompletionGateway {
    fn complete(&self, request: &EnrichmentRequest) -> Result<BTreeMap<String, String>, ReplayError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [{ "role": "system", "content": Self::build_prompt(request) }],
        });

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ReplayError::GatewayUnavailable(e.to_string()))?;
        let chat: ChatResponse = response
            .json()
            .map_err(|e| ReplayError::GatewayUnavailable(format!("invalid response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReplayError::GatewayUnavailable("empty completion".into()))?;

        Self::parse_completion(&content)
    }
}
