use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Opaque handle of a browser window or tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub String);

impl WindowHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to an element in the current browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

/// Element lookup strategy within the current browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locator {
    Id(String),
    Name(String),
    LinkText(String),
    Css(String),
}

impl Locator {
    /// W3C strategy and value for this locator. `id` and `name` have no
    /// native W3C strategy and are sent as attribute selectors.
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self {
            Locator::Id(id) => ("css selector", format!("*[id=\"{}\"]", css_escape(id))),
            Locator::Name(name) => ("css selector", format!("*[name=\"{}\"]", css_escape(name))),
            Locator::LinkText(text) => ("link text", text.clone()),
            Locator::Css(css) => ("css selector", css.clone()),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id={}", v),
            Locator::Name(v) => write!(f, "name={}", v),
            Locator::LinkText(v) => write!(f, "linkText={}", v),
            Locator::Css(v) => write!(f, "css={}", v),
        }
    }
}

/// Escape a value for use inside a double-quoted CSS attribute selector.
pub fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Bounding box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Errors raised at the browser-session boundary.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("WebDriver transport error ({context}): {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("WebDriver command '{command}' failed: {error}: {message}")]
    Protocol {
        command: String,
        error: String,
        message: String,
    },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed WebDriver response for '{command}': {detail}")]
    Malformed { command: String, detail: String },
}

impl DriverError {
    /// True when the server reported that no alert is open.
    pub fn is_no_such_alert(&self) -> bool {
        matches!(self, DriverError::Protocol { error, .. } if error == "no such alert")
    }
}

/// Marks every element of a subtree with a transient attribute.
pub const MARK_SUBTREE_SCRIPT: &str = r#"
const root = arguments[0];
const marker = arguments[1];
root.setAttribute('data-replay-marker', marker);
root.querySelectorAll('*').forEach((el) => el.setAttribute('data-replay-marker', marker));
return true;
"#;

/// Removes the transient attribute set by `MARK_SUBTREE_SCRIPT`.
pub const CLEAR_MARKER_SCRIPT: &str = r#"
const marker = arguments[0];
document.querySelectorAll('[data-replay-marker]').forEach((el) => {
  if (el.getAttribute('data-replay-marker') === marker) {
    el.removeAttribute('data-replay-marker');
  }
});
return true;
"#;

/// Returns the marker of the element hit-tested at the center of arguments[0].
pub const CENTER_MARKER_SCRIPT: &str = r#"
const rect = arguments[0].getBoundingClientRect();
const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
return hit ? hit.getAttribute('data-replay-marker') : null;
"#;

pub const READY_STATE_SCRIPT: &str = "return document.readyState;";

pub const DOCUMENT_URL_SCRIPT: &str = "return document.URL;";

/// The automated browser session the replay engine drives.
///
/// Every call is synchronous and operates on the session-global current
/// window and frame. Implementations are not expected to be shared between
/// threads.
pub trait WebDriver {
    /// Open a new tab and make it the current window.
    fn new_tab(&mut self) -> Result<WindowHandle, DriverError>;
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;
    fn current_url(&mut self) -> Result<String, DriverError>;
    fn window_handle(&mut self) -> Result<WindowHandle, DriverError>;
    fn window_handles(&mut self) -> Result<Vec<WindowHandle>, DriverError>;
    fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<(), DriverError>;
    /// Close the current window.
    fn close_window(&mut self) -> Result<(), DriverError>;

    fn switch_to_frame(&mut self, frame: &ElementRef) -> Result<(), DriverError>;
    fn switch_to_default_content(&mut self) -> Result<(), DriverError>;

    /// All elements matching `locator` in the current context, in document order.
    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError>;
    /// All descendants of `root` matching `locator`, in document order.
    fn find_elements_from(
        &mut self,
        root: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError>;

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, DriverError>;
    fn rect(&mut self, element: &ElementRef) -> Result<Rect, DriverError>;
    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError>;
    fn css_value(&mut self, element: &ElementRef, property: &str) -> Result<String, DriverError>;
    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError>;

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError>;
    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError>;
    /// Send a literal Enter key press to whatever has focus.
    fn press_enter(&mut self) -> Result<(), DriverError>;
    /// Move the pointer over the element.
    fn hover(&mut self, element: &ElementRef) -> Result<(), DriverError>;

    fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, DriverError>;

    /// Accept the open native dialog. Returns `false` when none is open.
    fn accept_alert(&mut self) -> Result<bool, DriverError>;

    /// PNG bytes of the element's visual bounds.
    fn element_screenshot(&mut self, element: &ElementRef) -> Result<Vec<u8>, DriverError>;

    fn quit(&mut self) -> Result<(), DriverError>;

    /// JSON form of an element reference as a script argument.
    fn element_arg(&self, element: &ElementRef) -> Value {
        json!({ ELEMENT_KEY: element.0 })
    }

    fn ready_state(&mut self) -> Result<String, DriverError> {
        let value = self.execute_script(READY_STATE_SCRIPT, Vec::new())?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// URL of the document in the current frame context.
    fn document_url(&mut self) -> Result<Option<String>, DriverError> {
        let value = self.execute_script(DOCUMENT_URL_SCRIPT, Vec::new())?;
        Ok(value.as_str().map(str::to_string))
    }

    fn mark_subtree(&mut self, element: &ElementRef, marker: &str) -> Result<(), DriverError> {
        let arg = self.element_arg(element);
        self.execute_script(MARK_SUBTREE_SCRIPT, vec![arg, json!(marker)])?;
        Ok(())
    }

    fn clear_marker(&mut self, marker: &str) -> Result<(), DriverError> {
        self.execute_script(CLEAR_MARKER_SCRIPT, vec![json!(marker)])?;
        Ok(())
    }

    /// Marker attribute of the element actually hit at the element's center.
    fn marker_at_center(&mut self, element: &ElementRef) -> Result<Option<String>, DriverError> {
        let arg = self.element_arg(element);
        let value = self.execute_script(CENTER_MARKER_SCRIPT, vec![arg])?;
        Ok(value.as_str().map(str::to_string))
    }
}

/// W3C web element identifier key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
