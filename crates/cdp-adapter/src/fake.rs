//! Scripted in-memory page.
//!
//! Pages are declared as routes: a URL (exact or prefix) mapped to a tree of
//! [`FakeNode`]s. Selectors are matched by membership, not parsed: a node
//! matches `sel` when `sel` is one of the selectors it was declared with.
//! Every driver call is recorded so tests can assert what was attempted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AdapterError, AdapterErrorKind};
use crate::{Cdp, ElementRef, ElementState, QueryScope};

/// What happens when a node is clicked.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickBehavior {
    Ok,
    Fail,
    /// Load another route, as a link would.
    NavigateTo(String),
    /// Hide every node matching the selector.
    Hide(String),
    /// The browser dies; every later call fails with a lost session.
    Crash,
}

#[derive(Clone, Debug)]
pub struct FakeNode {
    name: String,
    selectors: Vec<String>,
    attrs: HashMap<String, String>,
    text: String,
    visible: bool,
    enabled: bool,
    on_click: ClickBehavior,
    on_script_click: ClickBehavior,
    children: Vec<FakeNode>,
}

impl FakeNode {
    pub fn new(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self {
            name: selector.clone(),
            selectors: vec![selector],
            attrs: HashMap::new(),
            text: String::new(),
            visible: true,
            enabled: true,
            on_click: ClickBehavior::Ok,
            on_script_click: ClickBehavior::Ok,
            children: Vec::new(),
        }
    }

    /// A `a[href]` link node also matching the usual watch-link selectors.
    pub fn watch_link(id: &str) -> Self {
        FakeNode::new("a")
            .also("a[href*=\"/watch?v=\"]")
            .also("a#video-title-link")
            .named(format!("link:{id}"))
            .attr("href", format!("/watch?v={id}"))
    }

    /// Name reported in recorded events.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn also(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn on_click(mut self, behavior: ClickBehavior) -> Self {
        self.on_click = behavior;
        self
    }

    pub fn on_script_click(mut self, behavior: ClickBehavior) -> Self {
        self.on_script_click = behavior;
        self
    }

    pub fn child(mut self, node: FakeNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = FakeNode>) -> Self {
        self.children.extend(nodes);
        self
    }
}

/// Driver calls as seen by the page.
#[derive(Clone, Debug, PartialEq)]
pub enum FakeEvent {
    Navigate(String),
    Query(String),
    Click(String),
    ScriptClick(String),
    Evaluate(String),
    Close,
}

struct FlatNode {
    node: FakeNode,
    parent: Option<usize>,
}

#[derive(Default)]
struct FakeState {
    routes: Vec<(String, Vec<FakeNode>)>,
    failing: Vec<String>,
    url: String,
    generation: u64,
    nodes: Vec<FlatNode>,
    events: Vec<FakeEvent>,
    disconnected: bool,
}

impl FakeState {
    fn load(&mut self, url: &str) {
        self.url = url.to_string();
        self.generation += 1;
        self.nodes.clear();
        let route = self
            .routes
            .iter()
            .filter(|(pattern, _)| url == pattern || url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, nodes)| nodes.clone())
            .unwrap_or_default();
        for node in route {
            self.flatten(node, None);
        }
    }

    fn flatten(&mut self, mut node: FakeNode, parent: Option<usize>) {
        let children = std::mem::take(&mut node.children);
        let index = self.nodes.len();
        self.nodes.push(FlatNode { node, parent });
        for child in children {
            self.flatten(child, Some(index));
        }
    }

    fn descends_from(&self, mut index: usize, ancestor: usize) -> bool {
        while let Some(parent) = self.nodes[index].parent {
            if parent == ancestor {
                return true;
            }
            index = parent;
        }
        false
    }

    fn connected(&self) -> Result<(), AdapterError> {
        if self.disconnected {
            Err(AdapterError::session_lost("fake browser disconnected"))
        } else {
            Ok(())
        }
    }

    fn node(&self, element: ElementRef) -> Result<&FakeNode, AdapterError> {
        self.connected()?;
        if !element.is_current(self.generation) {
            return Err(AdapterError::stale(element.generation, self.generation));
        }
        self.nodes
            .get(element.slot as usize)
            .map(|flat| &flat.node)
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::TargetNotFound))
    }

    fn apply(&mut self, name: String, behavior: ClickBehavior) -> Result<(), AdapterError> {
        match behavior {
            ClickBehavior::Ok => Ok(()),
            ClickBehavior::Fail => Err(AdapterError::new(AdapterErrorKind::NotInteractable)
                .with_hint(format!("{name} refused the click"))),
            ClickBehavior::NavigateTo(url) => {
                self.load(&url);
                Ok(())
            }
            ClickBehavior::Crash => {
                self.disconnected = true;
                Err(AdapterError::session_lost(format!("browser died clicking {name}")))
            }
            ClickBehavior::Hide(selector) => {
                for flat in self.nodes.iter_mut() {
                    if flat.node.selectors.contains(&selector) {
                        flat.node.visible = false;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Deterministic [`Cdp`] implementation for tests.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the document served for `url` (exact match or prefix).
    pub fn route(self, url: impl Into<String>, nodes: Vec<FakeNode>) -> Self {
        self.state().routes.push((url.into(), nodes));
        self
    }

    /// Make navigation to `url` (prefix) fail.
    pub fn failing(self, url: impl Into<String>) -> Self {
        self.state().failing.push(url.into());
        self
    }

    /// Drop the connection, as if the browser process exited.
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.state().events.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FakeEvent::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Names of nodes clicked natively or by script, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FakeEvent::Click(name) | FakeEvent::ScriptClick(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FakeEvent::Query(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn click_with(&self, element: ElementRef, scripted: bool) -> Result<(), AdapterError> {
        let mut state = self.state();
        let node = state.node(element)?;
        let name = node.name.clone();
        let behavior = if scripted {
            node.on_script_click.clone()
        } else {
            node.on_click.clone()
        };
        if !scripted && !node.visible {
            state.events.push(FakeEvent::Click(name.clone()));
            return Err(AdapterError::new(AdapterErrorKind::NotInteractable)
                .with_hint(format!("{name} is not visible")));
        }
        state.events.push(if scripted {
            FakeEvent::ScriptClick(name.clone())
        } else {
            FakeEvent::Click(name.clone())
        });
        state.apply(name, behavior)
    }
}

#[async_trait]
impl Cdp for FakePage {
    async fn navigate(&self, url: &str, _deadline: Duration) -> Result<(), AdapterError> {
        let mut state = self.state();
        state.events.push(FakeEvent::Navigate(url.to_string()));
        state.connected()?;
        if state.failing.iter().any(|prefix| url.starts_with(prefix.as_str())) {
            state.generation += 1;
            state.nodes.clear();
            return Err(AdapterError::new(AdapterErrorKind::NavTimeout).with_hint(url.to_string()));
        }
        state.load(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        let state = self.state();
        state.connected()?;
        Ok(state.url.clone())
    }

    fn generation(&self) -> u64 {
        self.state().generation
    }

    fn invalidate_handles(&self) {
        self.state().generation += 1;
    }

    fn is_connected(&self) -> bool {
        !self.state().disconnected
    }

    async fn query(
        &self,
        scope: QueryScope,
        selector: &str,
    ) -> Result<Vec<ElementRef>, AdapterError> {
        let mut state = self.state();
        state.events.push(FakeEvent::Query(selector.to_string()));
        state.connected()?;
        let ancestor = match scope {
            QueryScope::Document => None,
            QueryScope::Within(parent) => {
                state.node(parent)?;
                Some(parent.slot as usize)
            }
        };
        let generation = state.generation;
        let matches = (0..state.nodes.len())
            .filter(|&index| {
                state.nodes[index].node.selectors.iter().any(|s| s == selector)
                    && ancestor.map_or(true, |a| state.descends_from(index, a))
            })
            .map(|index| ElementRef::new(generation, index as u32))
            .collect();
        Ok(matches)
    }

    async fn attribute(
        &self,
        element: ElementRef,
        name: &str,
    ) -> Result<Option<String>, AdapterError> {
        Ok(self.state().node(element)?.attrs.get(name).cloned())
    }

    async fn probe(&self, element: ElementRef) -> Result<ElementState, AdapterError> {
        let state = self.state();
        let node = state.node(element)?;
        Ok(ElementState {
            visible: node.visible,
            enabled: node.enabled,
            aria_label: node.attrs.get("aria-label").cloned(),
            title: node.attrs.get("title").cloned(),
            text: node.text.clone(),
        })
    }

    async fn click(&self, element: ElementRef) -> Result<(), AdapterError> {
        self.click_with(element, false)
    }

    async fn script_click(&self, element: ElementRef) -> Result<(), AdapterError> {
        self.click_with(element, true)
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError> {
        let mut state = self.state();
        state.events.push(FakeEvent::Evaluate(expression.to_string()));
        state.connected()?;
        Ok(Value::Null)
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.state().events.push(FakeEvent::Close);
        Ok(())
    }
}
