use base64::Engine;
use reqwest::Method;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::browser::driver::{
    DriverError, ELEMENT_KEY, ElementRef, Locator, Rect, WebDriver, WindowHandle,
};

const ENTER_KEY: &str = "\u{E007}";

/// Connection settings for a W3C WebDriver server (chromedriver by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_browser")]
    pub browser: String,

    #[serde(default)]
    pub headless: bool,

    /// Extra command-line arguments passed to the browser.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            browser: default_browser(),
            headless: false,
            args: Vec::new(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_browser() -> String {
    "chrome".to_string()
}

/// Envelope every WebDriver response is wrapped in.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

/// A live WebDriver session spoken to over HTTP.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
    closed: bool,
}

impl WebDriverSession {
    /// Create a new browser session on the configured server.
    pub fn start(config: &WebDriverConfig) -> Result<Self, DriverError> {
        let client = Client::new();
        let base_url = config.server_url.trim_end_matches('/').to_string();

        let mut args = config.args.clone();
        if config.headless {
            args.push("--headless=new".to_string());
        }
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": config.browser,
                    "goog:chromeOptions": { "args": args },
                }
            }
        });

        let response = client
            .post(format!("{}/session", base_url))
            .json(&capabilities)
            .send()
            .map_err(|e| DriverError::Transport {
                context: "new session".into(),
                source: e,
            })?;
        let value = decode_response("new session", response)?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| DriverError::Malformed {
                command: "new session".into(),
                detail: "missing sessionId".into(),
            })?
            .to_string();

        debug!(session_id = %session_id, server = %base_url, "WebDriver session started");

        Ok(Self {
            client,
            base_url,
            session_id,
            closed: false,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a command relative to the session URL and return its `value`.
    fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            request = request.json(&json!({}));
        }

        let response = request.send().map_err(|e| DriverError::Transport {
            context: path.to_string(),
            source: e,
        })?;
        decode_response(path, response)
    }

    fn get(&self, path: &str) -> Result<Value, DriverError> {
        self.send(Method::GET, path, None)
    }

    fn post(&self, path: &str, body: Value) -> Result<Value, DriverError> {
        self.send(Method::POST, path, Some(body))
    }

    fn element_path(element: &ElementRef, suffix: &str) -> String {
        format!("/element/{}{}", element.0, suffix)
    }

    fn perform_actions(&self, actions: Value) -> Result<(), DriverError> {
        self.post("/actions", json!({ "actions": actions }))?;
        Ok(())
    }
}

fn decode_response(command: &str, response: reqwest::blocking::Response) -> Result<Value, DriverError> {
    let status = response.status();
    let body = response.text().map_err(|e| DriverError::Transport {
        context: command.to_string(),
        source: e,
    })?;

    let wire: WireResponse = serde_json::from_str(&body).map_err(|e| DriverError::JsonParse {
        context: format!("{} response", command),
        source: e,
    })?;

    if !status.is_success() {
        return Err(DriverError::Protocol {
            command: command.to_string(),
            error: wire.value["error"].as_str().unwrap_or("unknown error").to_string(),
            message: wire.value["message"].as_str().unwrap_or_default().to_string(),
        });
    }

    Ok(wire.value)
}

fn element_from_value(command: &str, value: &Value) -> Result<ElementRef, DriverError> {
    value[ELEMENT_KEY]
        .as_str()
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| DriverError::Malformed {
            command: command.to_string(),
            detail: format!("expected element reference, got {}", value),
        })
}

fn elements_from_value(command: &str, value: &Value) -> Result<Vec<ElementRef>, DriverError> {
    value
        .as_array()
        .ok_or_else(|| DriverError::Malformed {
            command: command.to_string(),
            detail: "expected an array of elements".into(),
        })?
        .iter()
        .map(|v| element_from_value(command, v))
        .collect()
}

fn string_from_value(command: &str, value: &Value) -> Result<String, DriverError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DriverError::Malformed {
            command: command.to_string(),
            detail: format!("expected a string, got {}", value),
        })
}

impl WebDriver for WebDriverSession {
    fn new_tab(&mut self) -> Result<WindowHandle, DriverError> {
        let value = self.post("/window/new", json!({ "type": "tab" }))?;
        let handle = WindowHandle(string_from_value("new window", &value["handle"])?);
        self.switch_to_window(&handle)?;
        Ok(handle)
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.post("/url", json!({ "url": url }))?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        let value = self.get("/url")?;
        string_from_value("current url", &value)
    }

    fn window_handle(&mut self) -> Result<WindowHandle, DriverError> {
        let value = self.get("/window")?;
        Ok(WindowHandle(string_from_value("window handle", &value)?))
    }

    fn window_handles(&mut self) -> Result<Vec<WindowHandle>, DriverError> {
        let value = self.get("/window/handles")?;
        value
            .as_array()
            .ok_or_else(|| DriverError::Malformed {
                command: "window handles".into(),
                detail: "expected an array".into(),
            })?
            .iter()
            .map(|v| string_from_value("window handles", v).map(WindowHandle))
            .collect()
    }

    fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<(), DriverError> {
        self.post("/window", json!({ "handle": handle.0 }))?;
        Ok(())
    }

    fn close_window(&mut self) -> Result<(), DriverError> {
        self.send(Method::DELETE, "/window", None)?;
        Ok(())
    }

    fn switch_to_frame(&mut self, frame: &ElementRef) -> Result<(), DriverError> {
        self.post("/frame", json!({ "id": { ELEMENT_KEY: frame.0 } }))?;
        Ok(())
    }

    fn switch_to_default_content(&mut self) -> Result<(), DriverError> {
        self.post("/frame", json!({ "id": Value::Null }))?;
        Ok(())
    }

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        let (using, value) = locator.to_w3c();
        let found = self.post("/elements", json!({ "using": using, "value": value }))?;
        elements_from_value("find elements", &found)
    }

    fn find_elements_from(
        &mut self,
        root: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let (using, value) = locator.to_w3c();
        let found = self.post(
            &Self::element_path(root, "/elements"),
            json!({ "using": using, "value": value }),
        )?;
        elements_from_value("find elements from element", &found)
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, DriverError> {
        let value = self.get(&Self::element_path(element, "/displayed"))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn rect(&mut self, element: &ElementRef) -> Result<Rect, DriverError> {
        let value = self.get(&Self::element_path(element, "/rect"))?;
        serde_json::from_value(value).map_err(|e| DriverError::JsonParse {
            context: "element rect".into(),
            source: e,
        })
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError> {
        let value = self.get(&Self::element_path(element, &format!("/attribute/{}", name)))?;
        Ok(value.as_str().map(str::to_string))
    }

    fn css_value(&mut self, element: &ElementRef, property: &str) -> Result<String, DriverError> {
        let value = self.get(&Self::element_path(element, &format!("/css/{}", property)))?;
        string_from_value("css value", &value)
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self.get(&Self::element_path(element, "/text"))?;
        string_from_value("element text", &value)
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.post(&Self::element_path(element, "/click"), json!({}))?;
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.post(&Self::element_path(element, "/value"), json!({ "text": text }))?;
        Ok(())
    }

    fn press_enter(&mut self) -> Result<(), DriverError> {
        self.perform_actions(json!([{
            "type": "key",
            "id": "keyboard",
            "actions": [
                { "type": "keyDown", "value": ENTER_KEY },
                { "type": "keyUp", "value": ENTER_KEY },
            ]
        }]))
    }

    fn hover(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.perform_actions(json!([{
            "type": "pointer",
            "id": "mouse",
            "parameters": { "pointerType": "mouse" },
            "actions": [{
                "type": "pointerMove",
                "duration": 0,
                "origin": { ELEMENT_KEY: element.0 },
                "x": 0,
                "y": 0,
            }]
        }]))
    }

    fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
    }

    fn accept_alert(&mut self) -> Result<bool, DriverError> {
        match self.post("/alert/accept", json!({})) {
            Ok(_) => Ok(true),
            Err(e) if e.is_no_such_alert() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn element_screenshot(&mut self, element: &ElementRef) -> Result<Vec<u8>, DriverError> {
        let value = self.get(&Self::element_path(element, "/screenshot"))?;
        let encoded = string_from_value("element screenshot", &value)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| DriverError::Malformed {
                command: "element screenshot".into(),
                detail: format!("invalid base64 payload: {}", e),
            })
    }

    fn quit(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let response = self
            .client
            .delete(&url)
            .send()
            .map_err(|e| DriverError::Transport {
                context: "delete session".into(),
                source: e,
            })?;
        self.closed = true;
        if let Err(e) = decode_response("delete session", response) {
            warn!(error = %e, "WebDriver session did not close cleanly");
        }
        Ok(())
    }
}
