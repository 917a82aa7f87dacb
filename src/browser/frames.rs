use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::browser::driver::{Locator, WebDriver};
use crate::browser::wait::{millis, poll_until};
use crate::error::ReplayError;
use crate::target::parser::IframeLocator;

const BODY_IFRAME_SELECTOR: &str = "body > iframe";

/// Token returned by [`enter_frames`]; hand it back to [`restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContext {
    depth: usize,
}

impl FrameContext {
    pub fn is_default(&self) -> bool {
        self.depth == 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Switches into the frame chain of a target before it is located.
pub struct FrameResolver {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub auto_detect: bool,
}

impl FrameResolver {
    /// Enter every iframe of `chain` in order, outermost first.
    ///
    /// With an empty chain and auto-detection on, the only `body > iframe`
    /// is entered when `target` is not already present in the top document.
    /// On failure the session is returned to the default content.
    pub fn enter_frames<D: WebDriver + ?Sized>(
        &self,
        driver: &mut D,
        chain: &[IframeLocator],
        target: &Locator,
    ) -> Result<FrameContext, ReplayError> {
        if chain.is_empty() {
            return self.auto_detect(driver, target);
        }

        let mut context = FrameContext::default();
        for frame in chain {
            match self.enter_one(driver, frame) {
                Ok(()) => context.depth += 1,
                Err(e) => {
                    if !context.is_default() {
                        driver.switch_to_default_content()?;
                    }
                    return Err(e);
                }
            }
        }
        debug!(depth = context.depth, "Entered iframe chain");
        Ok(context)
    }

    fn enter_one<D: WebDriver + ?Sized>(
        &self,
        driver: &mut D,
        frame: &IframeLocator,
    ) -> Result<(), ReplayError> {
        let page_url = driver
            .document_url()?
            .and_then(|u| Url::parse(&u).ok());
        let locator = frame.to_locator(page_url.as_ref());

        let found = poll_until(self.timeout, self.poll_interval, || {
            Ok(driver.find_elements(&locator)?.into_iter().next())
        })?;

        match found {
            Some(element) => {
                driver.switch_to_frame(&element)?;
                debug!(frame = %frame, "Switched into iframe");
                Ok(())
            }
            None => Err(ReplayError::FrameNotFound {
                frame: frame.to_string(),
                timeout_ms: millis(self.timeout),
            }),
        }
    }

    fn auto_detect<D: WebDriver + ?Sized>(
        &self,
        driver: &mut D,
        target: &Locator,
    ) -> Result<FrameContext, ReplayError> {
        if !self.auto_detect {
            return Ok(FrameContext::default());
        }
        if !driver.find_elements(target)?.is_empty() {
            return Ok(FrameContext::default());
        }

        let iframes = driver.find_elements(&Locator::Css(BODY_IFRAME_SELECTOR.to_string()))?;
        if let [only] = iframes.as_slice() {
            driver.switch_to_frame(only)?;
            debug!("Auto-detected single top-level iframe");
            return Ok(FrameContext { depth: 1 });
        }
        Ok(FrameContext::default())
    }
}

/// Return to the top-level document, however deep `context` went.
pub fn restore<D: WebDriver + ?Sized>(driver: &mut D, context: FrameContext) -> Result<(), ReplayError> {
    if !context.is_default() {
        driver.switch_to_default_content()?;
    }
    Ok(())
}
