//! Replays recorded browser events against a live WebDriver session.
//!
//! Events are replayed strictly in order. Each event's target is located
//! through its iframe chain, waited on until it is present, visible and
//! not covered, then acted on. Values may reference a data map which is
//! filled in ahead of time by an enrichment gateway.

pub mod browser;
pub mod cli;
pub mod data;
pub mod error;
pub mod keyboard;
pub mod replay;
pub mod target;
pub mod task;
pub mod trace;

use crate::browser::driver::WebDriver;
use crate::data::data_map::DataMap;
use crate::data::enrichment::EnrichmentGateway;
use crate::replay::engine::{ReplayOutcome, Replayer};
use crate::replay::event::RecordedEvent;
use crate::replay::options::ReplayOptions;

/// Replay `events` once with a fresh engine and return the outcome.
pub fn replay_events<D: WebDriver, G: EnrichmentGateway>(
    driver: D,
    gateway: G,
    options: ReplayOptions,
    events: &[RecordedEvent],
    initial: DataMap,
) -> ReplayOutcome {
    Replayer::new(driver, gateway, options).run(events, initial)
}
