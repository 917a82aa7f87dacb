use crate::browser::driver::DriverError;

/// Failures raised while replaying recorded events.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Target identifier carries no recognized locator attribute.
    #[error("Unsupported target identifier format: '{0}'")]
    UnsupportedTargetFormat(String),

    #[error("Element '{locator}' not found within {timeout_ms}ms")]
    ElementNotFound { locator: String, timeout_ms: u64 },

    #[error("Element '{locator}' found but not visible within {timeout_ms}ms")]
    ElementNotVisible { locator: String, timeout_ms: u64 },

    /// The element's center never hit-tested to the element itself.
    #[error("Element '{locator}' stayed covered by an overlay for {timeout_ms}ms")]
    OverlayTimeout { locator: String, timeout_ms: u64 },

    #[error("Element '{locator}' could not be clicked, broadened search exhausted")]
    ElementNotClickable { locator: String },

    #[error("Option '{value}' not found for '{locator}'")]
    OptionNotFound { locator: String, value: String },

    #[error("Iframe '{frame}' not found within {timeout_ms}ms")]
    FrameNotFound { frame: String, timeout_ms: u64 },

    /// Enrichment request failed; callers treat this as non-fatal.
    #[error("Enrichment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Page '{url}' did not finish loading within {timeout_ms}ms")]
    PageLoadTimeout { url: String, timeout_ms: u64 },

    #[error("Failed to write artifact '{path}': {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Event #{index} ({kind}, id {event_id}) failed: {source}")]
    Event {
        index: usize,
        event_id: String,
        kind: String,
        #[source]
        source: Box<ReplayError>,
    },
}

impl ReplayError {
    /// Locate failures are the ones the broadening retry may recover from.
    pub fn is_locate_failure(&self) -> bool {
        matches!(
            self,
            ReplayError::ElementNotFound { .. }
                | ReplayError::ElementNotVisible { .. }
                | ReplayError::OverlayTimeout { .. }
        )
    }

    /// The error underneath any event wrapper.
    pub fn root(&self) -> &ReplayError {
        match self {
            ReplayError::Event { source, .. } => source.root(),
            other => other,
        }
    }
}
