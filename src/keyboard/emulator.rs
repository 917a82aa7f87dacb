use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::browser::driver::{Locator, WebDriver};
use crate::browser::locator::wait_present;
use crate::keyboard::layout::{KeyboardPage, is_symbol, slot};

pub const SHIFT: &str = "shift";
pub const SYMBOL: &str = "symbol";
pub const ENTER: &str = "enter";
pub const SPACE: &str = "space";

/// One click on the on-screen keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    /// Page the key is searched on.
    pub page: KeyboardPage,
    /// nth-child slot of the key, `None` when the layout has no such key.
    pub slot: Option<usize>,
}

impl KeyPress {
    pub fn selector(&self) -> Option<String> {
        self.slot
            .map(|slot| format!("{} > .kpd-data:nth-child({})", self.page.selector(), slot))
    }
}

/// Key names to press for `text`, including mode toggles and a final `enter`.
///
/// `shift` and `symbol` are tracked independently. Uppercase letters are
/// pressed as their lowercase key under `shift`; symbols under `symbol`,
/// which leaves an open `shift` in place. Lowercase letters and every other
/// character close both.
pub fn derive_key_sequence(text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut shift = false;
    let mut symbol = false;

    fn toggle(keys: &mut Vec<String>, name: &str, on: &mut bool) {
        keys.push(name.to_string());
        *on = !*on;
    }

    for ch in text.chars() {
        let as_str = ch.to_string();
        if ch.is_ascii_uppercase() {
            if !shift {
                toggle(&mut keys, SHIFT, &mut shift);
            }
            if symbol {
                toggle(&mut keys, SYMBOL, &mut symbol);
            }
            keys.push(ch.to_ascii_lowercase().to_string());
        } else if is_symbol(&as_str) {
            if !symbol {
                toggle(&mut keys, SYMBOL, &mut symbol);
            }
            keys.push(as_str);
        } else {
            if shift {
                toggle(&mut keys, SHIFT, &mut shift);
            }
            if symbol {
                toggle(&mut keys, SYMBOL, &mut symbol);
            }
            keys.push(if ch == ' ' { SPACE.to_string() } else { as_str });
        }
    }

    if shift {
        keys.push(SHIFT.to_string());
    }
    if symbol {
        keys.push(SYMBOL.to_string());
    }
    keys.push(ENTER.to_string());
    keys
}

/// Page each key of `keys` is found on, starting from the lower page.
pub fn keyboard_pages(keys: &[String]) -> Vec<KeyboardPage> {
    let mut page = KeyboardPage::Lower;
    keys.iter()
        .map(|key| {
            let current = page;
            page = page.after(key);
            current
        })
        .collect()
}

/// Full click plan for typing `text` on the on-screen keyboard.
pub fn plan_key_presses(text: &str) -> Vec<KeyPress> {
    let keys = derive_key_sequence(text);
    let pages = keyboard_pages(&keys);
    keys.into_iter()
        .zip(pages)
        .map(|(key, page)| {
            let slot = slot(&key, page);
            KeyPress { key, page, slot }
        })
        .collect()
}

/// Drives an on-screen keyboard widget by clicking its keys.
pub struct VirtualKeyboard {
    pub key_timeout: Duration,
    pub key_pause: Duration,
    pub poll_interval: Duration,
}

impl VirtualKeyboard {
    /// Click through the plan for `text`. Best effort: a key that cannot be
    /// found or clicked is logged and skipped. Returns the number of keys
    /// actually clicked.
    pub fn type_text<D: WebDriver + ?Sized>(&self, driver: &mut D, text: &str) -> usize {
        let mut clicked = 0;
        for press in plan_key_presses(text) {
            let Some(selector) = press.selector() else {
                warn!(key = %press.key, page = %press.page, "Key missing from keyboard layout");
                continue;
            };

            let locator = Locator::Css(selector.clone());
            match wait_present(driver, &locator, self.key_timeout, self.poll_interval) {
                Ok(Some(element)) => match driver.click(&element) {
                    Ok(()) => {
                        debug!(key = %press.key, selector = %selector, "Key clicked");
                        clicked += 1;
                    }
                    Err(e) => warn!(key = %press.key, selector = %selector, error = %e, "Key click failed"),
                },
                Ok(None) => warn!(key = %press.key, selector = %selector, "Key not rendered"),
                Err(e) => warn!(key = %press.key, selector = %selector, error = %e, "Key lookup failed"),
            }
            thread::sleep(self.key_pause);
        }
        clicked
    }
}
