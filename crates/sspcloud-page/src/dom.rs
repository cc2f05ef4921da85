//! DOM abstraction
//!
//! The engine only needs a handful of document operations. `Dom` exposes
//! them over an opaque node handle so the same engine runs against the
//! browser DOM and against `MemoryDom` in tests.

use std::fmt;

use sspcloud_core::decode_path;

/// Document loading state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Whether the DOM can be queried yet
    pub fn is_ready(self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// The parts of `window.location` the engine reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Host name without port
    pub host: String,
    /// Path, always starting with `/`
    pub path: String,
}

impl PageLocation {
    /// `path` may be percent-encoded, as `location.pathname` is
    pub fn new(host: impl Into<String>, path: impl AsRef<str>) -> Self {
        let path = decode_path(path.as_ref());
        Self {
            host: host.into(),
            path: if path.starts_with('/') {
                path
            } else {
                format!("/{}", path)
            },
        }
    }

    /// Parse a full page URL
    pub fn parse(page_url: &str) -> Option<Self> {
        let url = url::Url::parse(page_url).ok()?;
        Some(Self::new(url.host_str()?, url.path()))
    }
}

/// Rendered geometry and computed style of an element
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub display: String,
    pub visibility: String,
}

impl Layout {
    /// Laid out with a non-zero width
    pub fn shown(width: f64) -> Self {
        Self {
            width,
            display: "block".to_string(),
            visibility: "visible".to_string(),
        }
    }

    /// `display: none`
    pub fn display_none() -> Self {
        Self {
            width: 0.0,
            display: "none".to_string(),
            visibility: "visible".to_string(),
        }
    }

    /// `visibility: hidden`, still taking up space
    pub fn visibility_hidden(width: f64) -> Self {
        Self {
            width,
            display: "block".to_string(),
            visibility: "hidden".to_string(),
        }
    }

    /// Non-zero width, not `display: none`, not `visibility: hidden`
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.display != "none" && self.visibility != "hidden"
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::shown(100.0)
    }
}

/// How an attribute selector compares the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[name]`
    Exists,
    /// `[name="v"]`
    Equals(String),
    /// `[name*="v"]`
    Contains(String),
    /// `[name^="v"]`
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub op: AttrMatch,
}

impl AttrSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        match (&self.op, value) {
            (_, None) => false,
            (AttrMatch::Exists, Some(_)) => true,
            (AttrMatch::Equals(expected), Some(v)) => v == expected,
            (AttrMatch::Contains(needle), Some(v)) => v.contains(needle.as_str()),
            (AttrMatch::Prefix(prefix), Some(v)) => v.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for AttrSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            AttrMatch::Exists => write!(f, "[{}]", self.name),
            AttrMatch::Equals(v) => write!(f, "[{}=\"{}\"]", self.name, v),
            AttrMatch::Contains(v) => write!(f, "[{}*=\"{}\"]", self.name, v),
            AttrMatch::Prefix(v) => write!(f, "[{}^=\"{}\"]", self.name, v),
        }
    }
}

/// A compound CSS selector (no combinators)
///
/// Covers the shapes the mount plans and page markers use: a tag, an id,
/// classes, attribute tests and negated attribute tests. `Display` renders
/// it as CSS for `querySelector`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    not_attrs: Vec<AttrSelector>,
}

impl Selector {
    /// Matches every element
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn id(id: &str) -> Self {
        Self::any().with_id(id)
    }

    pub fn class(class: &str) -> Self {
        Self::any().and_class(class)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn and_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, op: AttrMatch) -> Self {
        self.attrs.push(AttrSelector {
            name: name.to_string(),
            op,
        });
        self
    }

    pub fn has_attr(self, name: &str) -> Self {
        self.attr(name, AttrMatch::Exists)
    }

    /// `:not([name...])`
    pub fn not_attr(mut self, name: &str, op: AttrMatch) -> Self {
        self.not_attrs.push(AttrSelector {
            name: name.to_string(),
            op,
        });
        self
    }

    /// Test an element given its tag name and attribute lookup
    pub fn matches<'a>(&self, tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if attr("id") != Some(expected.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_list = attr("class").unwrap_or("");
            let has_all = self
                .classes
                .iter()
                .all(|c| class_list.split_whitespace().any(|have| have == c));
            if !has_all {
                return false;
            }
        }
        self.attrs.iter().all(|a| a.matches(attr(&a.name)))
            && !self.not_attrs.iter().any(|a| a.matches(attr(&a.name)))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        for attr in &self.attrs {
            write!(f, "{}", attr)?;
        }
        for attr in &self.not_attrs {
            write!(f, ":not({})", attr)?;
        }
        if self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.not_attrs.is_empty()
        {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Description of an element to create
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    /// Text content
    pub text: Option<String>,
    /// Trusted markup (the button icon), set as `innerHTML`
    pub inner_html: Option<String>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn inner_html(mut self, html: &str) -> Self {
        self.inner_html = Some(html.to_string());
        self
    }
}

/// Document operations used by the engine
///
/// Queries only ever see elements connected to the document.
pub trait Dom {
    /// Element handle
    type Node: Clone + PartialEq + fmt::Debug;

    fn location(&self) -> PageLocation;
    fn ready_state(&self) -> ReadyState;
    fn head(&self) -> Option<Self::Node>;
    fn body(&self) -> Option<Self::Node>;

    /// First matching element in document order
    fn query(&self, selector: &Selector) -> Option<Self::Node>;
    /// Every matching element in document order
    fn query_all(&self, selector: &Selector) -> Vec<Self::Node>;
    /// First matching descendant of `scope`
    fn query_within(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node>;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn child_element_count(&self, node: &Self::Node) -> usize;
    fn layout(&self, node: &Self::Node) -> Layout;

    /// Create a detached element; `None` when the host refuses
    fn create_element(&mut self, spec: &ElementSpec) -> Option<Self::Node>;
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);
    /// Detach a node from the document
    fn remove(&mut self, node: &Self::Node);
    fn add_class(&mut self, node: &Self::Node, class: &str);
    /// Route clicks on `node` back to the content script
    fn listen_for_click(&mut self, node: &Self::Node);
}
