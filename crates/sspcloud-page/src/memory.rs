//! In-memory doubles for `Dom` and `Host`
//!
//! `MemoryDom` is an element arena with document-order queries and a
//! per-element layout. `RecordingHost` records every host call and keeps a
//! virtual clock so tests can run timers deterministically.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::dom::{Dom, ElementSpec, Layout, PageLocation, ReadyState, Selector};
use crate::host::{Host, PageEvent, TimerId};
use crate::script::ContentScript;

/// Element handle in a `MemoryDom`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    inner_html: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: Layout,
    clickable: bool,
}

impl Element {
    fn new(spec: &ElementSpec) -> Self {
        let mut attrs = spec.attrs.clone();
        if let Some(id) = &spec.id {
            attrs.push(("id".to_string(), id.clone()));
        }
        if !spec.classes.is_empty() {
            attrs.push(("class".to_string(), spec.classes.join(" ")));
        }
        Self {
            tag: spec.tag.clone(),
            attrs,
            text: spec.text.clone().unwrap_or_default(),
            inner_html: spec.inner_html.clone(),
            parent: None,
            children: Vec::new(),
            layout: Layout::default(),
            clickable: false,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// In-memory document
#[derive(Debug, Clone)]
pub struct MemoryDom {
    elements: Vec<Element>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    location: PageLocation,
    ready: ReadyState,
}

impl MemoryDom {
    /// Empty `html > head + body` document at `page_url`
    ///
    /// An unparseable URL yields an empty host.
    pub fn new(page_url: &str) -> Self {
        let location = PageLocation::parse(page_url).unwrap_or_else(|| PageLocation::new("", "/"));
        let mut dom = Self {
            elements: vec![Element::new(&ElementSpec::new("html"))],
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            location,
            ready: ReadyState::Complete,
        };
        dom.head = dom.append(dom.root, ElementSpec::new("head"));
        dom.body = dom.append(dom.root, ElementSpec::new("body"));
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head_node(&self) -> NodeId {
        self.head
    }

    pub fn body_node(&self) -> NodeId {
        self.body
    }

    pub fn set_ready_state(&mut self, ready: ReadyState) {
        self.ready = ready;
    }

    /// Change the URL without touching the document, like an SPA route change
    pub fn set_url(&mut self, page_url: &str) {
        if let Some(location) = PageLocation::parse(page_url) {
            self.location = location;
        }
    }

    /// Create an element outside the document
    pub fn detached(&mut self, spec: ElementSpec) -> NodeId {
        self.elements.push(Element::new(&spec));
        NodeId(self.elements.len() - 1)
    }

    /// Create an element and append it to `parent`
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let node = self.detached(spec);
        self.append_child(&parent, &node);
        node
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.elements.get_mut(node.0) {
            el.set_attr(name, value.to_string());
        }
    }

    pub fn set_layout(&mut self, node: NodeId, layout: Layout) {
        if let Some(el) = self.elements.get_mut(node.0) {
            el.layout = layout;
        }
    }

    /// Detach every child of the body, like an SPA page swap
    pub fn clear_body(&mut self) {
        let children = self.children(self.body);
        for child in children {
            self.remove(&child);
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.elements
            .get(node.0)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> &str {
        self.elements.get(node.0).map_or("", |el| el.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> &str {
        self.elements.get(node.0).map_or("", |el| el.text.as_str())
    }

    pub fn inner_html(&self, node: NodeId) -> Option<&str> {
        self.elements.get(node.0)?.inner_html.as_deref()
    }

    /// Whether a click listener was attached
    pub fn is_clickable(&self, node: NodeId) -> bool {
        self.elements.get(node.0).is_some_and(|el| el.clickable)
    }

    /// Attached to the document through its ancestors
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.elements.get(id.0).and_then(|el| el.parent);
        }
        false
    }

    /// Connected elements carrying this id
    pub fn count_id(&self, id: &str) -> usize {
        self.query_all(&Selector::id(id)).len()
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.0)
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node)
            .is_some_and(|el| selector.matches(&el.tag, |name| el.attr(name)))
    }

    /// Connected descendants of `scope` in document order
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.elements.get(node.0).and_then(|el| el.parent) else {
            return;
        };
        if let Some(p) = self.elements.get_mut(parent.0) {
            p.children.retain(|c| *c != node);
        }
        if let Some(el) = self.elements.get_mut(node.0) {
            el.parent = None;
        }
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn location(&self) -> PageLocation {
        self.location.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn head(&self) -> Option<NodeId> {
        Some(self.head)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn query(&self, selector: &Selector) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.matches(*n, selector))
    }

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| self.matches(*n, selector))
            .collect()
    }

    fn query_within(&self, scope: &NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(*scope)
            .into_iter()
            .find(|n| self.matches(*n, selector))
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(&Selector::id(id))
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.element(*node)?.attr(name).map(str::to_string)
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.element(*node)
            .and_then(|el| el.attr("class"))
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.element(*node)?.parent
    }

    fn child_element_count(&self, node: &NodeId) -> usize {
        self.element(*node).map_or(0, |el| el.children.len())
    }

    fn layout(&self, node: &NodeId) -> Layout {
        self.element(*node)
            .map(|el| el.layout.clone())
            .unwrap_or_else(|| Layout::shown(0.0))
    }

    fn create_element(&mut self, spec: &ElementSpec) -> Option<NodeId> {
        Some(self.detached(spec.clone()))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.element(*parent).is_none() || self.element(*child).is_none() {
            return;
        }
        self.detach(*child);
        if let Some(p) = self.elements.get_mut(parent.0) {
            p.children.push(*child);
        }
        if let Some(c) = self.elements.get_mut(child.0) {
            c.parent = Some(*parent);
        }
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        if let Some(el) = self.elements.get_mut(node.0) {
            let list = match el.attr("class") {
                Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
                _ => class.to_string(),
            };
            el.set_attr("class", list);
        }
    }

    fn listen_for_click(&mut self, node: &NodeId) {
        if let Some(el) = self.elements.get_mut(node.0) {
            el.clickable = true;
        }
    }
}

/// A host call, as recorded by `RecordingHost`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    SetTimeout(TimerId, Duration),
    ClearTimeout(TimerId),
    Observe,
    Disconnect,
    ListenForDomReady,
    OpenTab(String),
}

/// Host double with a virtual clock
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
    now: Duration,
    next_timer: u64,
    /// Timer id to (due time, delay)
    timers: BTreeMap<TimerId, (Duration, Duration)>,
    observing: bool,
    block_popups: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `open_tab` fail like a popup blocker would
    pub fn blocking_popups() -> Self {
        Self {
            block_popups: true,
            ..Self::default()
        }
    }

    pub fn set_block_popups(&mut self, block: bool) {
        self.block_popups = block;
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Number of `observe_mutations` calls so far
    pub fn observe_count(&self) -> usize {
        self.count(|c| matches!(c, HostCall::Observe))
    }

    pub fn disconnect_count(&self) -> usize {
        self.count(|c| matches!(c, HostCall::Disconnect))
    }

    /// URLs passed to `open_tab`, blocked ones included
    pub fn opened_tabs(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::OpenTab(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Pending timers with their delays, in creation order
    pub fn pending_timers(&self) -> Vec<(TimerId, Duration)> {
        self.timers
            .iter()
            .map(|(id, (_, delay))| (*id, *delay))
            .collect()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Pop the earliest timer due at or before `deadline`, moving the clock
    pub fn pop_due(&mut self, deadline: Duration) -> Option<TimerId> {
        let (id, due) = self
            .timers
            .iter()
            .filter(|(_, (due, _))| *due <= deadline)
            .min_by_key(|(id, (due, _))| (*due, **id))
            .map(|(id, (due, _))| (*id, *due))?;
        self.timers.remove(&id);
        self.now = due;
        Some(id)
    }

    fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Host for RecordingHost {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.timers.insert(id, (self.now + delay, delay));
        self.calls.push(HostCall::SetTimeout(id, delay));
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.remove(&id);
        self.calls.push(HostCall::ClearTimeout(id));
    }

    fn observe_mutations(&mut self) {
        self.observing = true;
        self.calls.push(HostCall::Observe);
    }

    fn disconnect_mutations(&mut self) {
        self.observing = false;
        self.calls.push(HostCall::Disconnect);
    }

    fn listen_for_dom_ready(&mut self) {
        self.calls.push(HostCall::ListenForDomReady);
    }

    fn open_tab(&mut self, url: &str) -> bool {
        self.calls.push(HostCall::OpenTab(url.to_string()));
        !self.block_popups
    }
}

impl ContentScript<MemoryDom, RecordingHost> {
    /// Deliver a mutation notification, as the observer would, if observing
    ///
    /// Returns whether the observer was connected.
    pub fn mutate(&mut self) -> bool {
        if !self.host().is_observing() {
            return false;
        }
        self.handle(PageEvent::Mutations);
        true
    }

    /// Move the virtual clock forward, firing due timers in order
    pub fn advance(&mut self, by: Duration) {
        let deadline = self.host().now() + by;
        while let Some(id) = self.host_mut().pop_due(deadline) {
            self.handle(PageEvent::TimerFired(id));
        }
        self.host_mut().now = deadline;
    }
}
