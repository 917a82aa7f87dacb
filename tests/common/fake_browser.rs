//! Scripted in-memory browser used in place of a WebDriver server.
//!
//! Pages are declared as node trees and instantiated on navigation. The
//! fake supports a small CSS subset (tag, `#id`, `.class`, `[attr="v"]`,
//! `[attr$="v"]`, `:nth-child(n)`, child and descendant combinators),
//! iframes with their own documents, hidden nodes revealed by hover or
//! click, overlay occlusion and a log of every interaction.

use std::collections::{HashMap, HashSet};

use event_replay::browser::driver::{
    DriverError, ElementRef, Locator, Rect, WebDriver, WindowHandle,
};
use serde_json::Value;

pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-element";

// =========================================================================
// Page description
// =========================================================================

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    /// Not in the DOM until revealed.
    pub hidden: bool,
    /// In the DOM but not displayed.
    pub invisible: bool,
    pub pointer: bool,
    /// Hit-tests that land on an overlay before the node is reachable.
    pub covered_checks: usize,
    pub reveals_on_hover: Vec<String>,
    pub reveals_on_click: Vec<String>,
    pub children: Vec<Node>,
    pub frame: Option<Page>,
}

pub fn node(tag: &str) -> Node {
    Node {
        tag: tag.to_string(),
        ..Node::default()
    }
}

impl Node {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.invisible = true;
        self
    }

    pub fn pointer(mut self) -> Self {
        self.pointer = true;
        self
    }

    pub fn covered(mut self, checks: usize) -> Self {
        self.covered_checks = checks;
        self
    }

    pub fn reveals_on_hover(mut self, id: &str) -> Self {
        self.reveals_on_hover.push(id.to_string());
        self
    }

    pub fn reveals_on_click(mut self, id: &str) -> Self {
        self.reveals_on_click.push(id.to_string());
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn frame(mut self, page: Page) -> Self {
        self.frame = Some(page);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub url: String,
    pub body: Vec<Node>,
}

impl Page {
    pub fn new(url: &str, body: Vec<Node>) -> Self {
        Self {
            url: url.to_string(),
            body,
        }
    }

    pub fn blank(url: &str) -> Self {
        Self::new(url, Vec::new())
    }
}

// =========================================================================
// Runtime model
// =========================================================================

#[derive(Debug)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    attached: bool,
    displayed: bool,
    pointer: bool,
    covered_checks: usize,
    reveals_on_hover: Vec<String>,
    reveals_on_click: Vec<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    doc: usize,
    frame_doc: Option<usize>,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, key: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }
}

#[derive(Debug)]
struct Document {
    url: String,
    roots: Vec<usize>,
}

#[derive(Debug)]
struct Window {
    handle: String,
    url: String,
    doc: usize,
}

pub struct FakeBrowser {
    pages: HashMap<String, Page>,
    stalled: HashSet<String>,
    elements: Vec<Element>,
    docs: Vec<Document>,
    windows: Vec<Window>,
    next_window: usize,
    current: Option<String>,
    frames: Vec<usize>,
    markers: HashMap<String, usize>,
    alert_delay: usize,
    pending_alerts: usize,

    /// Every interaction, in order (`click #id`, `switch_frame #outer`, ...).
    pub log: Vec<String>,
    /// Locators passed to top-level `find_elements`, in order.
    pub queries: Vec<String>,
    pub cleared_markers: Vec<String>,
    pub quit_called: bool,
}

impl FakeBrowser {
    /// A browser with one blank window, like a fresh WebDriver session.
    pub fn new() -> Self {
        let mut browser = Self {
            pages: HashMap::new(),
            stalled: HashSet::new(),
            elements: Vec::new(),
            docs: Vec::new(),
            windows: Vec::new(),
            next_window: 0,
            current: None,
            frames: Vec::new(),
            markers: HashMap::new(),
            alert_delay: 0,
            pending_alerts: 0,
            log: Vec::new(),
            queries: Vec::new(),
            cleared_markers: Vec::new(),
            quit_called: false,
        };
        browser.open_window_silently();
        browser
    }

    /// A browser whose initial window already shows `page`.
    pub fn showing(page: Page) -> Self {
        let url = page.url.clone();
        let mut browser = Self::new().with_page(page);
        browser.load_current(&url);
        browser
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.insert(page.url.clone(), page);
        self
    }

    /// Pages at `url` never reach `document.readyState == "complete"`.
    pub fn stalled(mut self, url: &str) -> Self {
        self.stalled.insert(url.to_string());
        self
    }

    /// Open a native alert after `polls` unsuccessful accept attempts.
    pub fn with_alert_after(mut self, polls: usize) -> Self {
        self.pending_alerts = 1;
        self.alert_delay = polls;
        self
    }

    pub fn without_windows(mut self) -> Self {
        self.windows.clear();
        self.current = None;
        self
    }

    /// Labels of clicked elements, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.entries("click ")
    }

    /// Log entries starting with `prefix`, with the prefix stripped.
    pub fn entries(&self, prefix: &str) -> Vec<String> {
        self.log
            .iter()
            .filter_map(|l| l.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn open_handles(&self) -> Vec<String> {
        self.windows.iter().map(|w| w.handle.clone()).collect()
    }

    pub fn current_handle(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn active_markers(&self) -> usize {
        self.markers.len()
    }

    /// Current value of `attr` on the first element with id `id`.
    pub fn attr_of(&self, id: &str, attr: &str) -> Option<String> {
        self.elements
            .iter()
            .find(|e| e.attr("id") == Some(id))
            .and_then(|e| e.attr(attr))
            .map(str::to_string)
    }

    // ---- instantiation ----

    fn open_window_silently(&mut self) -> String {
        let handle = format!("win-{}", self.next_window);
        self.next_window += 1;
        let doc = self.instantiate_doc(&Page::blank("about:blank"));
        self.windows.push(Window {
            handle: handle.clone(),
            url: "about:blank".to_string(),
            doc,
        });
        self.current = Some(handle.clone());
        self.frames.clear();
        handle
    }

    fn load_current(&mut self, url: &str) {
        let page = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Page::blank(url));
        let doc = self.instantiate_doc(&page);
        if let Some(window) = self.current_window_mut() {
            window.url = url.to_string();
            window.doc = doc;
        }
        self.frames.clear();
    }

    fn instantiate_doc(&mut self, page: &Page) -> usize {
        let doc = self.docs.len();
        self.docs.push(Document {
            url: page.url.clone(),
            roots: Vec::new(),
        });
        let body = node("body").children(page.body.clone());
        let root = self.instantiate(&body, None, doc);
        self.docs[doc].roots.push(root);
        doc
    }

    fn instantiate(&mut self, template: &Node, parent: Option<usize>, doc: usize) -> usize {
        let idx = self.elements.len();
        self.elements.push(Element {
            tag: template.tag.clone(),
            attrs: template.attrs.clone(),
            text: template.text.clone(),
            attached: !template.hidden,
            displayed: !template.invisible,
            pointer: template.pointer,
            covered_checks: template.covered_checks,
            reveals_on_hover: template.reveals_on_hover.clone(),
            reveals_on_click: template.reveals_on_click.clone(),
            parent,
            children: Vec::new(),
            doc,
            frame_doc: None,
        });
        if let Some(frame) = &template.frame {
            let frame_doc = self.instantiate_doc(frame);
            self.elements[idx].frame_doc = Some(frame_doc);
        }
        for child in &template.children {
            let child_idx = self.instantiate(child, Some(idx), doc);
            self.elements[idx].children.push(child_idx);
        }
        idx
    }

    // ---- lookup ----

    fn current_window(&self) -> Result<&Window, DriverError> {
        let handle = self.current.as_deref().unwrap_or_default();
        self.windows
            .iter()
            .find(|w| w.handle == handle)
            .ok_or_else(|| protocol("window", "no such window", handle))
    }

    fn current_window_mut(&mut self) -> Option<&mut Window> {
        let handle = self.current.clone()?;
        self.windows.iter_mut().find(|w| w.handle == handle)
    }

    fn current_doc(&self) -> Result<usize, DriverError> {
        match self.frames.last() {
            Some(doc) => Ok(*doc),
            None => Ok(self.current_window()?.doc),
        }
    }

    fn is_live(&self, idx: usize) -> bool {
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            if !self.elements[i].attached {
                return false;
            }
            cursor = self.elements[i].parent;
        }
        true
    }

    fn resolve(&self, element: &ElementRef, command: &str) -> Result<usize, DriverError> {
        let stale = || protocol(command, "stale element reference", &element.0);
        let idx: usize = element
            .0
            .strip_prefix("el-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(stale)?;
        if idx >= self.elements.len() || !self.is_live(idx) {
            return Err(stale());
        }
        if self.elements[idx].doc != self.current_doc()? {
            return Err(stale());
        }
        Ok(idx)
    }

    fn element_ref(idx: usize) -> ElementRef {
        ElementRef(format!("el-{}", idx))
    }

    fn label(&self, idx: usize) -> String {
        let el = &self.elements[idx];
        if let Some(id) = el.attr("id") {
            format!("#{}", id)
        } else if let Some(name) = el.attr("name") {
            format!("[name={}]", name)
        } else if !el.text.trim().is_empty() {
            el.text.trim().to_string()
        } else {
            el.tag.clone()
        }
    }

    fn subtree(&self, root: usize, out: &mut Vec<usize>) {
        for &child in &self.elements[root].children {
            if self.elements[child].attached {
                out.push(child);
                self.subtree(child, out);
            }
        }
    }

    fn document_order(&self, doc: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for &root in &self.docs[doc].roots {
            out.push(root);
            self.subtree(root, &mut out);
        }
        out
    }

    fn filter(&self, candidates: Vec<usize>, locator: &Locator) -> Vec<ElementRef> {
        let selector = match locator {
            Locator::Css(css) => Some(parse_selector(css)),
            _ => None,
        };
        candidates
            .into_iter()
            .filter(|&idx| {
                let el = &self.elements[idx];
                match locator {
                    Locator::Id(id) => el.attr("id") == Some(id.as_str()),
                    Locator::Name(name) => el.attr("name") == Some(name.as_str()),
                    Locator::LinkText(text) => el.tag == "a" && el.text.trim() == text,
                    Locator::Css(_) => selector
                        .as_ref()
                        .is_some_and(|parts| !parts.is_empty() && self.matches(idx, parts, parts.len() - 1)),
                }
            })
            .map(Self::element_ref)
            .collect()
    }

    fn matches(&self, idx: usize, parts: &[(Combinator, Compound)], i: usize) -> bool {
        if !self.compound_matches(idx, &parts[i].1) {
            return false;
        }
        if i == 0 {
            return true;
        }
        match parts[i].0 {
            Combinator::Child => self.elements[idx]
                .parent
                .is_some_and(|p| self.matches(p, parts, i - 1)),
            Combinator::Descendant => {
                let mut cursor = self.elements[idx].parent;
                while let Some(p) = cursor {
                    if self.matches(p, parts, i - 1) {
                        return true;
                    }
                    cursor = self.elements[p].parent;
                }
                false
            }
        }
    }

    fn compound_matches(&self, idx: usize, compound: &Compound) -> bool {
        let el = &self.elements[idx];
        if compound.tag.as_ref().is_some_and(|t| *t != el.tag) {
            return false;
        }
        if compound.id.as_deref().is_some_and(|id| el.attr("id") != Some(id)) {
            return false;
        }
        let classes: Vec<&str> = el.attr("class").unwrap_or_default().split_whitespace().collect();
        if !compound.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        for (key, op, expected) in &compound.attrs {
            let actual = el.attr(key);
            let ok = match op {
                AttrOp::Exists => actual.is_some(),
                AttrOp::Equals => actual == Some(expected.as_str()),
                AttrOp::EndsWith => actual.is_some_and(|a| a.ends_with(expected.as_str())),
            };
            if !ok {
                return false;
            }
        }
        if let Some(n) = compound.nth_child {
            let position = match el.parent {
                Some(parent) => self.elements[parent]
                    .children
                    .iter()
                    .filter(|&&c| self.elements[c].attached)
                    .position(|&c| c == idx)
                    .map(|p| p + 1),
                None => Some(1),
            };
            if position != Some(n) {
                return false;
            }
        }
        true
    }

    fn reveal(&mut self, ids: Vec<String>) {
        for el in self.elements.iter_mut() {
            if el.attr("id").is_some_and(|id| ids.iter().any(|r| r == id)) {
                el.attached = true;
            }
        }
    }

    fn is_self_or_ancestor(&self, ancestor: usize, idx: usize) -> bool {
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            if i == ancestor {
                return true;
            }
            cursor = self.elements[i].parent;
        }
        false
    }
}

impl Default for FakeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

fn protocol(command: &str, error: &str, message: &str) -> DriverError {
    DriverError::Protocol {
        command: command.to_string(),
        error: error.to_string(),
        message: message.to_string(),
    }
}

// =========================================================================
// Minimal CSS selector support
// =========================================================================

#[derive(Debug, Clone, Copy)]
enum Combinator {
    Child,
    Descendant,
}

#[derive(Debug)]
enum AttrOp {
    Exists,
    Equals,
    EndsWith,
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp, String)>,
    nth_child: Option<usize>,
}

fn parse_selector(css: &str) -> Vec<(Combinator, Compound)> {
    let mut parts = Vec::new();
    let mut pending = Combinator::Descendant;
    for token in css.split_whitespace() {
        if token == ">" {
            pending = Combinator::Child;
            continue;
        }
        parts.push((pending, parse_compound(token)));
        pending = Combinator::Descendant;
    }
    parts
}

fn parse_compound(token: &str) -> Compound {
    let chars: Vec<char> = token.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && (chars[*i].is_alphanumeric() || chars[*i] == '-' || chars[*i] == '_') {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        match chars[i] {
            '*' => i += 1,
            '#' => {
                i += 1;
                compound.id = Some(read_ident(&mut i));
            }
            '.' => {
                i += 1;
                compound.classes.push(read_ident(&mut i));
            }
            '[' => {
                let Some(offset) = chars[i..].iter().position(|c| *c == ']') else {
                    break;
                };
                let inner: String = chars[i + 1..i + offset].iter().collect();
                i += offset + 1;
                let attr = if let Some((k, v)) = inner.split_once("$=") {
                    (k.to_string(), AttrOp::EndsWith, v.trim_matches('"').to_string())
                } else if let Some((k, v)) = inner.split_once('=') {
                    (k.to_string(), AttrOp::Equals, v.trim_matches('"').to_string())
                } else {
                    (inner, AttrOp::Exists, String::new())
                };
                compound.attrs.push(attr);
            }
            ':' => {
                let rest: String = chars[i..].iter().collect();
                let Some(arg) = rest.strip_prefix(":nth-child(") else {
                    break;
                };
                let Some(end) = arg.find(')') else {
                    break;
                };
                compound.nth_child = arg[..end].parse().ok();
                i += ":nth-child(".len() + end + 1;
            }
            _ => {
                let tag = read_ident(&mut i);
                if tag.is_empty() {
                    i += 1;
                } else {
                    compound.tag = Some(tag);
                }
            }
        }
    }
    compound
}

// =========================================================================
// WebDriver implementation
// =========================================================================

impl WebDriver for FakeBrowser {
    fn new_tab(&mut self) -> Result<WindowHandle, DriverError> {
        let handle = self.open_window_silently();
        self.log.push(format!("new_tab {}", handle));
        Ok(WindowHandle(handle))
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.current_window()?;
        self.load_current(url);
        self.log.push(format!("navigate {}", url));
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.current_window()?.url.clone())
    }

    fn window_handle(&mut self) -> Result<WindowHandle, DriverError> {
        Ok(WindowHandle(self.current_window()?.handle.clone()))
    }

    fn window_handles(&mut self) -> Result<Vec<WindowHandle>, DriverError> {
        Ok(self
            .windows
            .iter()
            .map(|w| WindowHandle(w.handle.clone()))
            .collect())
    }

    fn switch_to_window(&mut self, handle: &WindowHandle) -> Result<(), DriverError> {
        if !self.windows.iter().any(|w| w.handle == handle.0) {
            return Err(protocol("switch window", "no such window", &handle.0));
        }
        self.current = Some(handle.0.clone());
        self.frames.clear();
        self.log.push(format!("switch_window {}", handle.0));
        Ok(())
    }

    fn close_window(&mut self) -> Result<(), DriverError> {
        let handle = self.current_window()?.handle.clone();
        self.windows.retain(|w| w.handle != handle);
        self.current = None;
        self.frames.clear();
        self.log.push(format!("close {}", handle));
        Ok(())
    }

    fn switch_to_frame(&mut self, frame: &ElementRef) -> Result<(), DriverError> {
        let idx = self.resolve(frame, "switch frame")?;
        let doc = self.elements[idx]
            .frame_doc
            .ok_or_else(|| protocol("switch frame", "no such frame", &frame.0))?;
        self.frames.push(doc);
        let label = self.label(idx);
        self.log.push(format!("switch_frame {}", label));
        Ok(())
    }

    fn switch_to_default_content(&mut self) -> Result<(), DriverError> {
        self.frames.clear();
        self.log.push("default_content".to_string());
        Ok(())
    }

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        self.queries.push(locator.to_string());
        let doc = self.current_doc()?;
        let candidates = self.document_order(doc);
        Ok(self.filter(candidates, locator))
    }

    fn find_elements_from(
        &mut self,
        root: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let idx = self.resolve(root, "find elements from element")?;
        let mut candidates = Vec::new();
        self.subtree(idx, &mut candidates);
        Ok(self.filter(candidates, locator))
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, DriverError> {
        let idx = self.resolve(element, "displayed")?;
        Ok(self.elements[idx].displayed)
    }

    fn rect(&mut self, element: &ElementRef) -> Result<Rect, DriverError> {
        self.resolve(element, "rect")?;
        Ok(Rect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 20.0,
        })
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError> {
        let idx = self.resolve(element, "attribute")?;
        Ok(self.elements[idx].attr(name).map(str::to_string))
    }

    fn css_value(&mut self, element: &ElementRef, property: &str) -> Result<String, DriverError> {
        let idx = self.resolve(element, "css value")?;
        let value = match property {
            "cursor" if self.elements[idx].pointer => "pointer",
            "cursor" => "auto",
            _ => "",
        };
        Ok(value.to_string())
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        let idx = self.resolve(element, "text")?;
        Ok(self.elements[idx].text.clone())
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        let idx = self.resolve(element, "click")?;
        let label = self.label(idx);
        self.log.push(format!("click {}", label));
        let reveals = self.elements[idx].reveals_on_click.clone();
        self.reveal(reveals);
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        let idx = self.resolve(element, "send keys")?;
        let label = self.label(idx);
        self.log.push(format!("type {} {}", label, text));
        let value = format!("{}{}", self.elements[idx].attr("value").unwrap_or_default(), text);
        self.elements[idx].set_attr("value", value);
        Ok(())
    }

    fn press_enter(&mut self) -> Result<(), DriverError> {
        self.log.push("enter".to_string());
        Ok(())
    }

    fn hover(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        let idx = self.resolve(element, "hover")?;
        let label = self.label(idx);
        self.log.push(format!("hover {}", label));
        let reveals = self.elements[idx].reveals_on_hover.clone();
        self.reveal(reveals);
        Ok(())
    }

    fn execute_script(&mut self, _script: &str, _args: Vec<Value>) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    fn accept_alert(&mut self) -> Result<bool, DriverError> {
        if self.alert_delay > 0 {
            self.alert_delay -= 1;
            return Ok(false);
        }
        if self.pending_alerts > 0 {
            self.pending_alerts -= 1;
            self.log.push("accept_alert".to_string());
            return Ok(true);
        }
        Ok(false)
    }

    fn element_screenshot(&mut self, element: &ElementRef) -> Result<Vec<u8>, DriverError> {
        let idx = self.resolve(element, "element screenshot")?;
        let label = self.label(idx);
        self.log.push(format!("screenshot {}", label));
        Ok(FAKE_PNG.to_vec())
    }

    fn quit(&mut self) -> Result<(), DriverError> {
        self.quit_called = true;
        self.log.push("quit".to_string());
        Ok(())
    }

    fn ready_state(&mut self) -> Result<String, DriverError> {
        let url = &self.current_window()?.url;
        let state = if self.stalled.contains(url) { "loading" } else { "complete" };
        Ok(state.to_string())
    }

    fn document_url(&mut self) -> Result<Option<String>, DriverError> {
        let doc = self.current_doc()?;
        Ok(Some(self.docs[doc].url.clone()))
    }

    fn mark_subtree(&mut self, element: &ElementRef, marker: &str) -> Result<(), DriverError> {
        let idx = self.resolve(element, "mark subtree")?;
        self.markers.insert(marker.to_string(), idx);
        Ok(())
    }

    fn clear_marker(&mut self, marker: &str) -> Result<(), DriverError> {
        self.markers.remove(marker);
        self.cleared_markers.push(marker.to_string());
        Ok(())
    }

    fn marker_at_center(&mut self, element: &ElementRef) -> Result<Option<String>, DriverError> {
        let idx = self.resolve(element, "hit test")?;
        if self.elements[idx].covered_checks > 0 {
            self.elements[idx].covered_checks -= 1;
            return Ok(None);
        }
        Ok(self
            .markers
            .iter()
            .find(|(_, root)| self.is_self_or_ancestor(**root, idx))
            .map(|(marker, _)| marker.clone()))
    }
}
