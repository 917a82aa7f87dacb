use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::browser::driver::{DriverError, ElementRef, Locator, WebDriver};
use crate::browser::locator::wait_present;
use crate::browser::wait::poll_until;
use crate::error::ReplayError;

/// Child-combinator prefixes of `css_path`, longest first.
///
/// `"a > b > c"` yields `["a > b > c", "a > b", "a"]`. A `>` inside
/// `[...]`, `(...)` or a quoted string is not a combinator.
pub fn prefixes(css_path: &str) -> Vec<String> {
    let segments: Vec<&str> = split_child_combinators(css_path)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    (1..=segments.len())
        .rev()
        .map(|len| segments[..len].join(" > "))
        .collect()
}

fn split_child_combinators(css_path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in css_path.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => {
                segments.push(&css_path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&css_path[start..]);
    segments
}

/// Fallback search that widens a CSS path until hovering some interactive
/// descendant makes the original target appear.
pub struct BroadenSearch {
    pub prefix_timeout: Duration,
    pub relocate_timeout: Duration,
    pub hover_pause: Duration,
    pub poll_interval: Duration,
}

impl BroadenSearch {
    /// Try `action` on the re-located `target` after hovering each
    /// pointer-cursor descendant of each element matching each prefix.
    ///
    /// Returns `Ok(true)` on the first successful action and `Ok(false)`
    /// once every prefix is exhausted. Errors on individual candidates are
    /// logged and skipped.
    pub fn broaden_and_act<D, F>(
        &self,
        driver: &mut D,
        css_path: &str,
        target: &Locator,
        mut action: F,
    ) -> Result<bool, ReplayError>
    where
        D: WebDriver + ?Sized,
        F: FnMut(&mut D, &ElementRef) -> Result<(), ReplayError>,
    {
        for prefix in prefixes(css_path) {
            let prefix_locator = Locator::Css(prefix.clone());
            let candidates = match poll_until(self.prefix_timeout, self.poll_interval, || {
                let found = driver.find_elements(&prefix_locator)?;
                Ok((!found.is_empty()).then_some(found))
            }) {
                Ok(found) => found.unwrap_or_default(),
                Err(e) => {
                    debug!(prefix = %prefix, error = %e, "Prefix search failed");
                    continue;
                }
            };
            debug!(prefix = %prefix, candidates = candidates.len(), "Broadening search");

            for candidate in &candidates {
                if self.try_candidate(driver, candidate, target, &mut action)? {
                    info!(prefix = %prefix, target = %target, "Broadened retry succeeded");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn try_candidate<D, F>(
        &self,
        driver: &mut D,
        candidate: &ElementRef,
        target: &Locator,
        action: &mut F,
    ) -> Result<bool, ReplayError>
    where
        D: WebDriver + ?Sized,
        F: FnMut(&mut D, &ElementRef) -> Result<(), ReplayError>,
    {
        let descendants = match driver.find_elements_from(candidate, &Locator::Css("*".into())) {
            Ok(found) => found,
            Err(e) => {
                debug!(error = %e, "Could not enumerate candidate descendants");
                return Ok(false);
            }
        };

        for descendant in &descendants {
            match self.hover_if_interactive(driver, descendant) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!(error = %e, "Skipping descendant");
                    continue;
                }
            }
            thread::sleep(self.hover_pause);

            let element =
                match wait_present(driver, target, self.relocate_timeout, self.poll_interval) {
                    Ok(Some(element)) => element,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(target = %target, error = %e, "Re-locate failed after hover");
                        continue;
                    }
                };
            match action(driver, &element) {
                Ok(()) => return Ok(true),
                Err(e) => debug!(target = %target, error = %e, "Action failed after hover"),
            }
        }
        Ok(false)
    }

    fn hover_if_interactive<D: WebDriver + ?Sized>(
        &self,
        driver: &mut D,
        element: &ElementRef,
    ) -> Result<bool, DriverError> {
        if driver.css_value(element, "cursor")? != "pointer" {
            return Ok(false);
        }
        driver.hover(element)?;
        Ok(true)
    }
}
