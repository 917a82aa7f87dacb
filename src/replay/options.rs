use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to the browser session once a replay reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPolicy {
    #[default]
    Close,
    LeaveOpen,
}

/// Timing and behavior knobs for one replay. All waits are bounded by these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOptions {
    /// Presence, visibility and overlay wait for a target element.
    #[serde(default = "default_ten_seconds")]
    pub locate_timeout_ms: u64,

    /// Wait for each iframe in a frame chain.
    #[serde(default = "default_ten_seconds")]
    pub frame_timeout_ms: u64,

    /// Interval between overlay hit-tests and other polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_popup_timeout")]
    pub popup_timeout_ms: u64,

    #[serde(default = "default_ten_seconds")]
    pub page_load_timeout_ms: u64,

    /// Pause after every event so client-rendered UIs can rerender.
    #[serde(default = "default_settle")]
    pub settle_delay_ms: u64,

    /// Search budget for each CSS prefix during the broadening retry.
    #[serde(default = "default_prefix_timeout")]
    pub broaden_prefix_timeout_ms: u64,

    /// Budget for re-locating the original target after a hover.
    #[serde(default = "default_relocate_timeout")]
    pub broaden_relocate_timeout_ms: u64,

    #[serde(default = "default_hover_pause")]
    pub hover_pause_ms: u64,

    /// Pause between on-screen keyboard clicks.
    #[serde(default = "default_poll_interval")]
    pub key_pause_ms: u64,

    #[serde(default = "default_key_locate_timeout")]
    pub key_locate_timeout_ms: u64,

    /// Switch into the only `body > iframe` when a target has no frame chain.
    #[serde(default = "default_true")]
    pub auto_detect_iframe: bool,

    /// Directory element screenshots are written to.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// JSONL trace of dispatched events, disabled when unset.
    #[serde(default)]
    pub trace_path: Option<PathBuf>,

    #[serde(default)]
    pub session_policy: SessionPolicy,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            locate_timeout_ms: default_ten_seconds(),
            frame_timeout_ms: default_ten_seconds(),
            poll_interval_ms: default_poll_interval(),
            popup_timeout_ms: default_popup_timeout(),
            page_load_timeout_ms: default_ten_seconds(),
            settle_delay_ms: default_settle(),
            broaden_prefix_timeout_ms: default_prefix_timeout(),
            broaden_relocate_timeout_ms: default_relocate_timeout(),
            hover_pause_ms: default_hover_pause(),
            key_pause_ms: default_poll_interval(),
            key_locate_timeout_ms: default_key_locate_timeout(),
            auto_detect_iframe: true,
            artifact_dir: default_artifact_dir(),
            trace_path: None,
            session_policy: SessionPolicy::Close,
        }
    }
}

impl ReplayOptions {
    pub fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.locate_timeout_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_millis(self.popup_timeout_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn broaden_prefix_timeout(&self) -> Duration {
        Duration::from_millis(self.broaden_prefix_timeout_ms)
    }

    pub fn broaden_relocate_timeout(&self) -> Duration {
        Duration::from_millis(self.broaden_relocate_timeout_ms)
    }

    pub fn hover_pause(&self) -> Duration {
        Duration::from_millis(self.hover_pause_ms)
    }

    pub fn key_pause(&self) -> Duration {
        Duration::from_millis(self.key_pause_ms)
    }

    pub fn key_locate_timeout(&self) -> Duration {
        Duration::from_millis(self.key_locate_timeout_ms)
    }
}

// Serde default helpers
fn default_ten_seconds() -> u64 { 10_000 }
fn default_poll_interval() -> u64 { 100 }
fn default_popup_timeout() -> u64 { 2_000 }
fn default_settle() -> u64 { 500 }
fn default_prefix_timeout() -> u64 { 1_000 }
fn default_relocate_timeout() -> u64 { 300 }
fn default_hover_pause() -> u64 { 200 }
fn default_key_locate_timeout() -> u64 { 2_000 }
fn default_true() -> bool { true }
fn default_artifact_dir() -> PathBuf { PathBuf::from("artifacts") }
