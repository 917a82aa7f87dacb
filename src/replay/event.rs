use serde::{Deserialize, Serialize};

/// A recorded browser interaction, ready for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    pub id: String,
    pub window_id: i64,
    pub tab_id: i64,
    #[serde(flatten)]
    pub action: EventAction,
}

/// What a recorded event does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EventAction {
    Click {
        target_id: String,
    },

    /// Type a value (literal, data-map key or placeholder) into a field.
    Input {
        target_id: String,
        value: String,
    },

    SelectOption {
        target_id: String,
        value: String,
    },

    /// Store the element's text in the data map under `key`.
    Extract {
        target_id: String,
        key: String,
    },

    EnterPress,

    /// Type a value through an on-screen keyboard.
    InputCert {
        target_id: String,
        value: String,
    },

    Screenshot {
        target_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    AcceptPopup,

    WindowCreated {
        url: String,
    },

    TabRemoved,

    // Recorded but not interpreted during replay.
    NavigationUrl {
        #[serde(default)]
        url: String,
    },
    NavigationBackForward,
    TabCreated,
    WindowRemoved,
}

impl EventAction {
    pub fn kind(&self) -> &'static str {
        match self {
            EventAction::Click { .. } => "click",
            EventAction::Input { .. } => "input",
            EventAction::SelectOption { .. } => "select-option",
            EventAction::Extract { .. } => "extract",
            EventAction::EnterPress => "enter-press",
            EventAction::InputCert { .. } => "input-cert",
            EventAction::Screenshot { .. } => "screenshot",
            EventAction::AcceptPopup => "accept-popup",
            EventAction::WindowCreated { .. } => "window-created",
            EventAction::TabRemoved => "tab-removed",
            EventAction::NavigationUrl { .. } => "navigation-url",
            EventAction::NavigationBackForward => "navigation-back-forward",
            EventAction::TabCreated => "tab-created",
            EventAction::WindowRemoved => "window-removed",
        }
    }

    /// Recorded value that may reference the data map.
    pub fn input_value(&self) -> Option<&str> {
        match self {
            EventAction::Input { value, .. }
            | EventAction::SelectOption { value, .. }
            | EventAction::InputCert { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl RecordedEvent {
    /// Composite `{windowId}:{tabId}` key of the tab this event belongs to.
    pub fn window_key(&self) -> String {
        format!("{}:{}", self.window_id, self.tab_id)
    }

    pub fn kind(&self) -> &'static str {
        self.action.kind()
    }
}
