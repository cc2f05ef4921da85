//! Toolbar locator
//!
//! A mount plan is an ordered list of candidates. Each candidate knows how
//! to find a container (`Probe`), whether the container must be visible, and
//! how the button is attached to it. The first candidate that yields a
//! container wins; nothing is scored and nothing is retried once mounted.

use tracing::{debug, info};

use crate::assets::{SPACER_CLASS, SPACER_TEXT, WRAPPER_CLASS};
use crate::dom::{Dom, ElementSpec, Selector};

/// Priority tier of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Known stable containers
    Modern,
    /// Older toolbars, only used when visible
    Legacy,
    /// Last-resort guesses from DOM shape
    Heuristic,
}

/// How a candidate finds its container
#[derive(Debug, Clone)]
pub enum Probe {
    /// The first element matching the selector
    First(Selector),
    /// The parent of the first element matching the selector
    ParentOf(Selector),
    /// The first match, in document order, with more than `min_children`
    /// children and no descendant matching `reject_containing`
    GroupScan {
        candidates: Selector,
        min_children: usize,
        reject_containing: Selector,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Skip,
    Require,
}

#[derive(Debug, Clone)]
pub struct MountCandidate {
    pub tier: Tier,
    pub probe: Probe,
    pub visibility: Visibility,
    /// Append a spacer element before the button
    pub spacer: bool,
    /// Wrap the button in an element of this tag (`li` in action lists)
    pub wrapper: Option<&'static str>,
}

impl MountCandidate {
    pub fn modern(selector: Selector) -> Self {
        Self {
            tier: Tier::Modern,
            probe: Probe::First(selector),
            visibility: Visibility::Skip,
            spacer: false,
            wrapper: None,
        }
    }

    pub fn legacy(selector: Selector) -> Self {
        Self {
            tier: Tier::Legacy,
            probe: Probe::First(selector),
            visibility: Visibility::Require,
            spacer: false,
            wrapper: None,
        }
    }

    pub fn heuristic(probe: Probe) -> Self {
        Self {
            tier: Tier::Heuristic,
            probe,
            visibility: Visibility::Skip,
            spacer: false,
            wrapper: None,
        }
    }

    pub fn with_spacer(mut self) -> Self {
        self.spacer = true;
        self
    }

    pub fn wrapped_in(mut self, tag: &'static str) -> Self {
        self.wrapper = Some(tag);
        self
    }

    /// Find this candidate's container, if any
    pub fn locate<D: Dom>(&self, dom: &D) -> Option<D::Node> {
        let container = match &self.probe {
            Probe::First(selector) => dom.query(selector),
            Probe::ParentOf(selector) => dom.query(selector).and_then(|el| dom.parent(&el)),
            Probe::GroupScan {
                candidates,
                min_children,
                reject_containing,
            } => dom.query_all(candidates).into_iter().find(|el| {
                dom.child_element_count(el) > *min_children
                    && dom.query_within(el, reject_containing).is_none()
            }),
        }?;

        if self.visibility == Visibility::Require && !dom.layout(&container).is_visible() {
            debug!("Skipping hidden container for {:?}", self.probe);
            return None;
        }
        Some(container)
    }

    fn attach<D: Dom>(&self, dom: &mut D, container: &D::Node, button: &D::Node) {
        if self.spacer {
            let spacer = ElementSpec::new("span").class(SPACER_CLASS).text(SPACER_TEXT);
            if let Some(spacer) = dom.create_element(&spacer) {
                dom.append_child(container, &spacer);
            }
        }
        let wrapper = self
            .wrapper
            .and_then(|tag| dom.create_element(&ElementSpec::new(tag).class(WRAPPER_CLASS)));
        match wrapper {
            Some(wrapper) => {
                dom.append_child(&wrapper, button);
                dom.append_child(container, &wrapper);
            }
            None => dom.append_child(container, button),
        }
    }
}

/// Where a button ended up
#[derive(Debug, Clone, PartialEq)]
pub struct MountPoint<N> {
    pub tier: Tier,
    /// Index of the winning candidate in the plan
    pub candidate: usize,
    pub container: N,
}

/// Mount `button` at the first viable candidate of `plan`
///
/// Returns `None`, leaving the document untouched, when no candidate fits.
pub fn mount<D: Dom>(
    dom: &mut D,
    plan: &[MountCandidate],
    button: &D::Node,
) -> Option<MountPoint<D::Node>> {
    let (index, candidate, container) = plan
        .iter()
        .enumerate()
        .find_map(|(i, c)| c.locate(&*dom).map(|container| (i, c, container)))?;

    candidate.attach(dom, &container, button);
    info!("Mounted launch button ({:?} candidate {})", candidate.tier, index);
    Some(MountPoint {
        tier: candidate.tier,
        candidate: index,
        container,
    })
}
