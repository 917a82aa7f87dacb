use std::collections::HashMap;

use crate::browser::driver::WindowHandle;

/// Maps recorded `{windowId}:{tabId}` keys to live browser window handles
/// and tracks which handle is currently active.
#[derive(Debug, Clone, Default)]
pub struct WindowRegistry {
    handles: HashMap<String, WindowHandle>,
    active: Option<WindowHandle>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: &str, handle: WindowHandle) {
        self.handles.insert(key.to_string(), handle);
    }

    pub fn unbind(&mut self, key: &str) -> Option<WindowHandle> {
        self.handles.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&WindowHandle> {
        self.handles.get(key)
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.handles.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn active(&self) -> Option<&WindowHandle> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, handle: WindowHandle) {
        self.active = Some(handle);
    }

    /// Handle to switch to before replaying an event for `key`, if it is
    /// bound to something other than the active window.
    pub fn switch_target(&self, key: &str) -> Option<&WindowHandle> {
        self.handles
            .get(key)
            .filter(|handle| self.active.as_ref() != Some(*handle))
    }

    pub fn clear(&mut self) {
        self.handles.clear();
        self.active = None;
    }
}
