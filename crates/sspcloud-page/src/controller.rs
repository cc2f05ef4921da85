//! Injection controller: one button per page view

use tracing::debug;

use crate::assets::{ensure_stylesheet, injected_leftovers, BUTTON_ID};
use crate::dom::Dom;
use crate::forge::PageForge;
use crate::lifecycle::AttemptOutcome;
use crate::locator;

/// Try to put the launch button on the page
///
/// Idempotent: an existing button short-circuits before anything is
/// created, and the stylesheet is only added once.
pub fn try_inject<D: Dom>(dom: &mut D, forge: PageForge) -> AttemptOutcome {
    if !forge.is_eligible(dom) {
        debug!("{} is not a repository page", dom.location().path);
        return AttemptOutcome::NotEligible;
    }
    if dom.element_by_id(BUTTON_ID).is_some() {
        return AttemptOutcome::AlreadyPresent;
    }

    ensure_stylesheet(dom, &forge.stylesheet());

    let Some(button) = dom.create_element(&forge.button()) else {
        debug!("Could not create the button element");
        return AttemptOutcome::NoMountPoint;
    };
    dom.listen_for_click(&button);

    match locator::mount(dom, &forge.mount_plan(), &button) {
        Some(_) => AttemptOutcome::Mounted,
        None => {
            debug!("No toolbar found, waiting for more DOM");
            AttemptOutcome::NoMountPoint
        }
    }
}

/// Remove the button and its spacer/wrapper from a previous view
///
/// Returns the number of elements removed.
pub fn remove_stale_button<D: Dom>(dom: &mut D) -> usize {
    let stale: Vec<D::Node> = injected_leftovers()
        .iter()
        .flat_map(|selector| dom.query_all(selector))
        .collect();
    for node in &stale {
        dom.remove(node);
    }
    if !stale.is_empty() {
        debug!("Removed {} stale element(s)", stale.len());
    }
    stale.len()
}
