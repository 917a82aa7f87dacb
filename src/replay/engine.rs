use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::browser::broaden::BroadenSearch;
use crate::browser::driver::{ElementRef, WebDriver};
use crate::browser::frames::{FrameContext, FrameResolver, restore};
use crate::browser::locator::locate;
use crate::browser::wait::{millis, poll_until};
use crate::data::data_map::DataMap;
use crate::data::enrichment::{Enricher, EnrichmentGateway};
use crate::data::placeholder::Placeholder;
use crate::error::ReplayError;
use crate::keyboard::emulator::VirtualKeyboard;
use crate::replay::actions::{ScreenshotArtifact, select_option, write_screenshot};
use crate::replay::event::{EventAction, RecordedEvent};
use crate::replay::options::{ReplayOptions, SessionPolicy};
use crate::replay::windows::WindowRegistry;
use crate::target::parser::TargetIdentifier;
use crate::trace::logger::ReplayTraceLogger;
use crate::trace::trace::ReplayTraceEvent;

const BLANK_PAGE: &str = "about:blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Result of one replay run.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub state: ReplayState,

    /// Data map as it stood when the run stopped.
    pub data: DataMap,

    /// Events attempted, including the one that failed.
    pub events_run: usize,

    pub error: Option<ReplayError>,

    pub screenshots: Vec<ScreenshotArtifact>,
}

impl ReplayOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == ReplayState::Completed
    }
}

/// Replays recorded events against a browser session it owns.
///
/// Events run strictly in order; the first failing event stops the run.
pub struct Replayer<D, G> {
    driver: D,
    enricher: Enricher<G>,
    options: ReplayOptions,
    windows: WindowRegistry,
    data: DataMap,
    state: ReplayState,
    screenshots: Vec<ScreenshotArtifact>,
    tracer: ReplayTraceLogger,
}

impl<D: WebDriver, G: EnrichmentGateway> Replayer<D, G> {
    pub fn new(driver: D, gateway: G, options: ReplayOptions) -> Self {
        let tracer = match &options.trace_path {
            Some(path) => ReplayTraceLogger::new(path),
            None => ReplayTraceLogger::disabled(),
        };
        Self {
            driver,
            enricher: Enricher::new(gateway),
            options,
            windows: WindowRegistry::new(),
            data: DataMap::new(),
            state: ReplayState::Idle,
            screenshots: Vec::new(),
            tracer,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn gateway(&self) -> &G {
        self.enricher.gateway()
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Replay `events` in order starting from `initial` data.
    ///
    /// Always returns the accumulated data map, also when an event fails.
    /// The session is closed or left open according to the session policy.
    pub fn run(&mut self, events: &[RecordedEvent], initial: DataMap) -> ReplayOutcome {
        self.state = ReplayState::Running;
        self.data = initial;
        self.windows.clear();
        self.screenshots.clear();
        self.enricher.reset();

        let placeholders: Vec<Placeholder> = events
            .iter()
            .filter_map(|e| e.action.input_value())
            .filter_map(Placeholder::parse)
            .collect();

        info!(events = events.len(), placeholders = placeholders.len(), "Replay started");

        let mut events_run = 0;
        let mut failure = None;

        for (index, event) in events.iter().enumerate() {
            self.enricher.enrich(&mut self.data, &placeholders);

            let started = Instant::now();
            info!(index, id = %event.id, kind = event.kind(), key = %event.window_key(), "Dispatching event");
            let result = self.dispatch(event);
            events_run = index + 1;

            let trace = ReplayTraceEvent::now(index, event)
                .with_duration(started.elapsed().as_millis())
                .with_data_keys(self.data.len());

            match result {
                Ok(()) => {
                    self.tracer.log(&trace);
                    thread::sleep(self.options.settle_delay());
                }
                Err(e) => {
                    self.tracer.log(&trace.with_error(&e));
                    error!(index, id = %event.id, kind = event.kind(), error = %e, "Event failed, stopping replay");
                    failure = Some(ReplayError::Event {
                        index,
                        event_id: event.id.clone(),
                        kind: event.kind().to_string(),
                        source: Box::new(e),
                    });
                    break;
                }
            }
        }

        self.state = if failure.is_some() {
            ReplayState::Failed
        } else {
            ReplayState::Completed
        };
        info!(state = ?self.state, events_run, "Replay finished");

        self.finish_session();

        ReplayOutcome {
            state: self.state,
            data: std::mem::take(&mut self.data),
            events_run,
            error: failure,
            screenshots: std::mem::take(&mut self.screenshots),
        }
    }

    fn finish_session(&mut self) {
        if self.options.session_policy == SessionPolicy::Close {
            if let Err(e) = self.driver.quit() {
                warn!(error = %e, "Failed to close browser session");
            }
        }
    }

    fn dispatch(&mut self, event: &RecordedEvent) -> Result<(), ReplayError> {
        let key = event.window_key();
        match &event.action {
            EventAction::WindowCreated { url } => self.open_window(&key, url),
            EventAction::TabRemoved => self.close_tab(&key),
            action => {
                self.activate(&key)?;
                self.perform(&event.id, action)
            }
        }
    }

    /// Switch to the window bound to `key` unless it is already active.
    /// Unbound keys leave the active window as it is.
    fn activate(&mut self, key: &str) -> Result<(), ReplayError> {
        if let Some(handle) = self.windows.switch_target(key).cloned() {
            debug!(key, handle = %handle.as_str(), "Switching window");
            self.driver.switch_to_window(&handle)?;
            self.windows.set_active(handle);
        }
        Ok(())
    }

    fn open_window(&mut self, key: &str, url: &str) -> Result<(), ReplayError> {
        let handle = self.driver.new_tab()?;
        self.driver.navigate(url)?;

        let driver = &mut self.driver;
        let loaded = poll_until(
            self.options.page_load_timeout(),
            self.options.poll_interval(),
            || Ok((driver.ready_state()? == "complete").then_some(())),
        )?;
        if loaded.is_none() {
            return Err(ReplayError::PageLoadTimeout {
                url: url.to_string(),
                timeout_ms: self.options.page_load_timeout_ms,
            });
        }

        debug!(key, url, handle = %handle.as_str(), "Window opened");
        self.windows.bind(key, handle.clone());
        self.windows.set_active(handle);
        Ok(())
    }

    fn close_tab(&mut self, key: &str) -> Result<(), ReplayError> {
        let Some(handle) = self.windows.unbind(key) else {
            debug!(key, "Tab removed for unbound key, nothing to close");
            return Ok(());
        };

        self.driver.switch_to_window(&handle)?;
        self.driver.close_window()?;

        let remaining = self.driver.window_handles()?;
        let next = match remaining.into_iter().next() {
            Some(next) => {
                self.driver.switch_to_window(&next)?;
                next
            }
            None => {
                let blank = self.driver.new_tab()?;
                self.driver.navigate(BLANK_PAGE)?;
                blank
            }
        };
        debug!(key, active = %next.as_str(), "Tab closed");
        self.windows.set_active(next);
        Ok(())
    }

    fn perform(&mut self, event_id: &str, action: &EventAction) -> Result<(), ReplayError> {
        match action {
            EventAction::Click { target_id } => self.act_with_fallback(
                target_id,
                |driver, element| Ok(driver.click(element)?),
                |target| ReplayError::ElementNotClickable {
                    locator: target.locator.to_string(),
                },
            ),

            EventAction::Input { target_id, value } => {
                let value = self.data.resolve(value);
                self.with_target(target_id, |driver, element| {
                    Ok(driver.send_keys(element, &value)?)
                })
            }

            EventAction::SelectOption { target_id, value } => {
                let value = self.data.resolve(value);
                let locator = TargetIdentifier::parse(target_id)?.locator;
                self.act_with_fallback(
                    target_id,
                    |driver, element| select_option(driver, element, &value, &locator),
                    |target| ReplayError::OptionNotFound {
                        locator: target.locator.to_string(),
                        value: value.clone(),
                    },
                )
            }

            EventAction::Extract { target_id, key } => {
                let text = self.with_target(target_id, |driver, element| Ok(driver.text(element)?))?;
                debug!(key = %key, "Extracted value");
                self.data.insert(key.clone(), text);
                Ok(())
            }

            EventAction::EnterPress => Ok(self.driver.press_enter()?),

            EventAction::InputCert { target_id, value } => {
                let value = self.data.resolve(value);
                let keyboard = VirtualKeyboard {
                    key_timeout: self.options.key_locate_timeout(),
                    key_pause: self.options.key_pause(),
                    poll_interval: self.options.poll_interval(),
                };
                self.with_target(target_id, |driver, element| {
                    driver.click(element)?;
                    let clicked = keyboard.type_text(driver, &value);
                    debug!(clicked, "On-screen keyboard input done");
                    Ok(())
                })
            }

            EventAction::Screenshot { target_id, name } => {
                let png = self.with_target(target_id, |driver, element| {
                    Ok(driver.element_screenshot(element)?)
                })?;
                let name = name.as_deref().unwrap_or(event_id);
                let artifact = write_screenshot(&self.options.artifact_dir, name, event_id, &png)?;
                info!(path = %artifact.path.display(), "Screenshot saved");
                self.screenshots.push(artifact);
                Ok(())
            }

            EventAction::AcceptPopup => {
                let driver = &mut self.driver;
                let accepted = poll_until(
                    self.options.popup_timeout(),
                    self.options.poll_interval(),
                    || Ok(driver.accept_alert()?.then_some(())),
                )?;
                if accepted.is_none() {
                    debug!(
                        timeout_ms = millis(self.options.popup_timeout()),
                        "No popup appeared"
                    );
                }
                Ok(())
            }

            EventAction::WindowCreated { .. } | EventAction::TabRemoved => Ok(()),

            EventAction::NavigationUrl { .. }
            | EventAction::NavigationBackForward
            | EventAction::TabCreated
            | EventAction::WindowRemoved => {
                debug!(kind = action.kind(), "Event kind not replayed");
                Ok(())
            }
        }
    }

    fn frame_resolver(&self) -> FrameResolver {
        FrameResolver {
            timeout: self.options.frame_timeout(),
            poll_interval: self.options.poll_interval(),
            auto_detect: self.options.auto_detect_iframe,
        }
    }

    /// Enter the target's frames, locate it overlay-safely, run `action`,
    /// and return to the top-level document.
    fn with_target<T>(
        &mut self,
        raw_target: &str,
        action: impl FnOnce(&mut D, &ElementRef) -> Result<T, ReplayError>,
    ) -> Result<T, ReplayError> {
        let target = TargetIdentifier::parse(raw_target)?;
        let context = self
            .frame_resolver()
            .enter_frames(&mut self.driver, &target.iframe_chain, &target.locator)?;

        let result = locate(
            &mut self.driver,
            &target.locator,
            self.options.locate_timeout(),
            self.options.poll_interval(),
        )
        .and_then(|element| action(&mut self.driver, &element));

        Self::restore_then(&mut self.driver, context, result)
    }

    /// Like [`Self::with_target`], but a locate failure falls back to the
    /// broadening retry when the target carries a CSS path.
    fn act_with_fallback(
        &mut self,
        raw_target: &str,
        mut action: impl FnMut(&mut D, &ElementRef) -> Result<(), ReplayError>,
        exhausted: impl FnOnce(&TargetIdentifier) -> ReplayError,
    ) -> Result<(), ReplayError> {
        let target = TargetIdentifier::parse(raw_target)?;
        let context = self
            .frame_resolver()
            .enter_frames(&mut self.driver, &target.iframe_chain, &target.locator)?;

        let located = locate(
            &mut self.driver,
            &target.locator,
            self.options.locate_timeout(),
            self.options.poll_interval(),
        );

        let result = match (located, &target.css_path) {
            (Ok(element), _) => action(&mut self.driver, &element),
            (Err(e), Some(css_path)) if e.is_locate_failure() => {
                warn!(target = %target.locator, error = %e, "Direct locate failed, broadening search");
                let search = BroadenSearch {
                    prefix_timeout: self.options.broaden_prefix_timeout(),
                    relocate_timeout: self.options.broaden_relocate_timeout(),
                    hover_pause: self.options.hover_pause(),
                    poll_interval: self.options.poll_interval(),
                };
                match search.broaden_and_act(&mut self.driver, css_path, &target.locator, &mut action) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(exhausted(&target)),
                    Err(e) => Err(e),
                }
            }
            (Err(e), _) => Err(e),
        };

        Self::restore_then(&mut self.driver, context, result)
    }

    fn restore_then<T>(
        driver: &mut D,
        context: FrameContext,
        result: Result<T, ReplayError>,
    ) -> Result<T, ReplayError> {
        match (restore(driver, context), result) {
            (Ok(()), result) => result,
            (Err(restore_error), Ok(_)) => Err(restore_error),
            (Err(restore_error), Err(e)) => {
                warn!(error = %restore_error, "Failed to restore default content");
                Err(e)
            }
        }
    }
}
