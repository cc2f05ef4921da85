//! `Dom` over the page's real document

use js_sys::Function;
use sspcloud_page::{Dom, ElementSpec, Layout, PageLocation, ReadyState, Selector};
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Window};

pub struct WebDom {
    window: Window,
    document: Document,
    /// Shared click handler attached to every button
    on_click: Function,
}

impl WebDom {
    pub fn new(window: Window, document: Document, on_click: Function) -> Self {
        Self {
            window,
            document,
            on_click,
        }
    }

    fn build(&self, spec: &ElementSpec) -> Result<Element, JsValue> {
        let el = self.document.create_element(&spec.tag)?;
        if let Some(id) = &spec.id {
            el.set_id(id);
        }
        if !spec.classes.is_empty() {
            el.set_class_name(&spec.classes.join(" "));
        }
        for (name, value) in &spec.attrs {
            el.set_attribute(name, value)?;
        }
        if let Some(text) = &spec.text {
            el.set_text_content(Some(text));
        }
        if let Some(html) = &spec.inner_html {
            el.set_inner_html(html);
        }
        Ok(el)
    }

    fn computed(&self, node: &Element, property: &str) -> String {
        self.window
            .get_computed_style(node)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn location(&self) -> PageLocation {
        let location = self.window.location();
        PageLocation::new(
            location.hostname().unwrap_or_default(),
            location.pathname().unwrap_or_default(),
        )
    }

    fn ready_state(&self) -> ReadyState {
        match self.document.ready_state().as_str() {
            "loading" => ReadyState::Loading,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Complete,
        }
    }

    fn head(&self) -> Option<Element> {
        self.document.head().map(Into::into)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn query(&self, selector: &Selector) -> Option<Element> {
        self.document
            .query_selector(&selector.to_string())
            .ok()
            .flatten()
    }

    fn query_all(&self, selector: &Selector) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(&selector.to_string()) else {
            debug!("Invalid selector {}", selector);
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_within(&self, scope: &Element, selector: &Selector) -> Option<Element> {
        scope.query_selector(&selector.to_string()).ok().flatten()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn child_element_count(&self, node: &Element) -> usize {
        node.child_element_count() as usize
    }

    fn layout(&self, node: &Element) -> Layout {
        Layout {
            width: node.get_bounding_client_rect().width(),
            display: self.computed(node, "display"),
            visibility: self.computed(node, "visibility"),
        }
    }

    fn create_element(&mut self, spec: &ElementSpec) -> Option<Element> {
        self.build(spec)
            .map_err(|e| debug!("Could not create <{}>: {:?}", spec.tag, e))
            .ok()
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        if let Err(e) = parent.append_child(child) {
            debug!("appendChild failed: {:?}", e);
        }
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            debug!("Could not add class {}: {:?}", class, e);
        }
    }

    fn listen_for_click(&mut self, node: &Element) {
        if let Err(e) = node.add_event_listener_with_callback("click", &self.on_click) {
            debug!("Could not bind click handler: {:?}", e);
        }
    }
}
