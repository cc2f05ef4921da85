//! Fixed ids, class names, markup and styles injected into host pages

use tracing::debug;

use crate::dom::{Dom, ElementSpec, Selector};

/// Id of the injected button, at most one per page view
pub const BUTTON_ID: &str = "sspcloud-launch-btn";
/// Id of the injected stylesheet
pub const STYLESHEET_ID: &str = "sspcloud-styles";
pub const BUTTON_LABEL: &str = "Open on SSPCloud";

pub const GITHUB_BUTTON_CLASS: &str = "sspcloud-github-button";
pub const GITLAB_BUTTON_CLASS: &str = "sspcloud-launch-button";
pub const TOAST_CLASS: &str = "sspcloud-toast";
pub const TOAST_FADE_CLASS: &str = "fade-out";
pub const SPACER_CLASS: &str = "sspcloud-spacing";
/// Marks the list item wrapping the button in action lists
pub const WRAPPER_CLASS: &str = "sspcloud-launch-item";
/// Non-breaking space
pub const SPACER_TEXT: &str = "\u{00A0}";

pub const GITHUB_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="currentColor"><path d="M13.35 20.13c1.1-1.22.97-2.5-1.25-4.02-2.3-1.53-2.57-2.7-2.27-3.25 0.47-0.92 2.0-1.1 3.26-1.35 3.08-.6 5.41-1.96 5.15-5.32-.23-2.84-2.72-6.18-6.86-6.9-4.52-.77-8.43 1.75-8.97 6.3-.29 2.25.55 4.63 3.47 6.72 2.88 2.06 2.97 4.63 1.63 6.34-1.74 2.2-5.1 1.72-5.88.44-0.53-.84-0.04-.13 0.26-0.63 0.3-.5 0.6-0.95 0.6-1.3 0-.37-.26-0.8-.8-0.9-.54-.1-1.05.2-1.5.6-0.5.4-0.93 0.9-1.08 1.4-0.15.5.04 1.1.8 1.55.76.45 2.5.85 4.6-.53 3.9-2.55 2.2-5.16.4-6.6-1.8-1.44-2.9-3.9-2.6-6.82.31-3 3.12-6.45 7.08-5.13 3.96 1.3 5.57 5.03 5.1 8.28-.26 1.8-.9 3.56-2.9 3.82-1.01.13-2.1-.2-2.5-1.05-.45-0.95-.1-2.05.65-2.75 2.9-2.8 1-6.1-2.2-5.83-1.3.1-2.4.8-2.1 2.8.23 1.6 2.15 2.6 2.95 3.4 0.8.8 1.4 1.45 1.86 2.1.5.65.95 1.2 1.3 1.55.55.6 1.13 1.2 1.55 0.95zM20.7 7.7z"/></svg>"#;

pub const GITLAB_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="33 19 375 254" fill="currentColor"><path d="M232.743 88.7774L266.693 122.898C277.502 133.761 295.018 133.761 305.812 122.898L339.762 88.7774L286.253 35L232.743 88.7774Z"/><path d="M106.253 88.7774L140.204 122.898C151.012 133.761 168.528 133.761 179.322 122.898L213.273 88.7774L159.763 35L106.253 88.7774Z"/><path d="M43 152.331L76.9508 186.452C87.7594 197.314 105.275 197.314 116.069 186.452L150.02 152.331L96.5099 98.5537L43 152.331Z"/><path d="M169.49 152.331L203.441 186.452C214.25 197.314 231.765 197.314 242.559 186.452L276.51 152.331L223 98.5537L169.49 152.331Z"/><path d="M349.49 98.5537L295.98 152.331L329.931 186.452C340.74 197.314 358.256 197.314 369.049 186.452L403 152.331L349.49 98.5537Z"/><path d="M106.253 215.9L140.204 250.02C151.012 260.883 168.528 260.883 179.322 250.02L213.273 215.9L159.763 162.123L106.253 215.9Z"/><path d="M232.743 215.9L266.693 250.02C277.502 260.883 295.018 260.883 305.812 250.02L339.762 215.9L286.253 162.123L232.743 215.9Z"/></svg>"#;

const BUTTON_BASE_RULES: &str = "background-color: #3298dc;
  color: white;
  border-radius: 6px;
  font-family: -apple-system, BlinkMacSystemFont, \"Segoe UI\", Helvetica, Arial, sans-serif;
  font-size: 14px;
  font-weight: 600;
  padding: 5px 16px;
  margin-left: 8px;
  cursor: pointer;
  align-items: center;
  gap: 6px;
  text-decoration: none;
  user-select: none;
  white-space: nowrap;
  border: none;
  -webkit-appearance: none;";

const TOAST_RULES: &str = ".sspcloud-toast {
  position: fixed;
  bottom: 20px;
  right: 20px;
  background-color: #c0392b;
  color: white;
  padding: 10px 16px;
  border-radius: 6px;
  font-family: -apple-system, BlinkMacSystemFont, \"Segoe UI\", Helvetica, Arial, sans-serif;
  font-size: 14px;
  z-index: 99999;
  box-shadow: 0 2px 8px rgba(0,0,0,0.3);
  opacity: 1;
  transition: opacity 0.4s ease;
}
.sspcloud-toast.fade-out { opacity: 0; }
";

/// Stylesheet for a button class
///
/// `display` is the button's display mode: `flex` inside GitHub toolbars,
/// `inline-flex` among GitLab buttons.
pub fn stylesheet(button_class: &str, display: &str) -> String {
    format!(
        ".{class} {{
  {base}
  display: {display};
  transition: background-color 0.2s ease;
}}
.{class} svg {{ width: 14px; height: 14px; flex-shrink: 0; }}
.{class}:hover {{ background-color: #286799; }}
.{class}:active {{ background-color: #207dc7; }}
{toast}",
        class = button_class,
        base = BUTTON_BASE_RULES,
        display = display,
        toast = TOAST_RULES,
    )
}

/// The launch button: icon then label
pub fn button_spec(button_class: &str, icon: &str) -> ElementSpec {
    ElementSpec::new("button")
        .id(BUTTON_ID)
        .class(button_class)
        .attr("type", "button")
        .inner_html(&format!("{}<span>{}</span>", icon, BUTTON_LABEL))
}

/// Add the stylesheet to the head unless a previous attempt already did
///
/// Returns whether a stylesheet was added.
pub fn ensure_stylesheet<D: Dom>(dom: &mut D, css: &str) -> bool {
    if dom.element_by_id(STYLESHEET_ID).is_some() {
        return false;
    }
    let Some(head) = dom.head() else {
        debug!("No document head, stylesheet deferred");
        return false;
    };
    let Some(style) = dom.create_element(&ElementSpec::new("style").id(STYLESHEET_ID).text(css))
    else {
        return false;
    };
    dom.append_child(&head, &style);
    true
}

/// Elements left behind by a previous mount
pub fn injected_leftovers() -> [Selector; 3] {
    [
        Selector::id(BUTTON_ID),
        Selector::class(SPACER_CLASS),
        Selector::class(WRAPPER_CLASS),
    ]
}
