use std::time::{Duration, Instant};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::browser::driver::{ElementRef, Locator, WebDriver};
use crate::browser::wait::{millis, poll_until};
use crate::error::ReplayError;

/// Wait for the first element matching `locator` to exist.
pub fn wait_present<D: WebDriver + ?Sized>(
    driver: &mut D,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<Option<ElementRef>, ReplayError> {
    let found = poll_until(timeout, interval, || {
        Ok(driver.find_elements(locator)?.into_iter().next())
    })?;
    Ok(found)
}

/// Locate an element that is present, visible and not covered by an overlay.
///
/// The element and its descendants are tagged with a one-off marker; the
/// element is returned once the hit-test at the center of its bounding box
/// lands on something carrying that marker. Every phase shares one
/// `timeout` budget.
pub fn locate<D: WebDriver + ?Sized>(
    driver: &mut D,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<ElementRef, ReplayError> {
    let started = Instant::now();
    let remaining = || timeout.saturating_sub(started.elapsed());

    let element = wait_present(driver, locator, timeout, interval)?.ok_or_else(|| {
        ReplayError::ElementNotFound {
            locator: locator.to_string(),
            timeout_ms: millis(timeout),
        }
    })?;

    let visible = poll_until(remaining(), interval, || {
        Ok(driver.is_displayed(&element)?.then_some(()))
    })?;
    if visible.is_none() {
        return Err(ReplayError::ElementNotVisible {
            locator: locator.to_string(),
            timeout_ms: millis(timeout),
        });
    }

    let marker = format!("replay-{}", Uuid::new_v4());
    driver.mark_subtree(&element, &marker)?;

    let unobstructed = poll_until(remaining(), interval, || {
        let hit = driver.marker_at_center(&element)?;
        trace!(locator = %locator, hit = ?hit, "Overlay hit-test");
        Ok((hit.as_deref() == Some(marker.as_str())).then_some(()))
    });

    // The marker is removed whatever the hit-test outcome.
    driver.clear_marker(&marker)?;

    match unobstructed? {
        Some(()) => {
            debug!(locator = %locator, elapsed_ms = millis(started.elapsed()), "Element located");
            Ok(element)
        }
        None => Err(ReplayError::OverlayTimeout {
            locator: locator.to_string(),
            timeout_ms: millis(timeout),
        }),
    }
}
