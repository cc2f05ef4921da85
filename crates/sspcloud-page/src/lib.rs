//! # sspcloud-page
//!
//! The page side of the SSPCloud launch button: decides whether a forge page
//! is a repository page, extracts the project identity, finds a toolbar and
//! mounts the launch button exactly once per page view.
//!
//! The engine is written against two small traits. `Dom` covers document
//! queries and mutations, `Host` covers timers, the mutation observer and
//! tab opening. The browser extension implements both over `web-sys`;
//! `memory` provides in-memory doubles for tests and tooling.
//!
//! ```
//! use sspcloud_page::memory::{MemoryDom, RecordingHost};
//! use sspcloud_page::{ContentScript, ElementSpec, PageForge};
//!
//! let mut dom = MemoryDom::new("https://github.com/org/repo");
//! let body = dom.body_node();
//! dom.append(body, ElementSpec::new("div").id("repository-container-header"));
//! dom.append(body, ElementSpec::new("ul").class("pagehead-actions"));
//!
//! let mut script = ContentScript::new(dom, RecordingHost::new(), PageForge::Github);
//! script.start();
//! assert_eq!(script.dom().count_id("sspcloud-launch-btn"), 1);
//! ```

pub mod assets;
mod click;
pub mod controller;
mod debounce;
mod dom;
mod forge;
mod host;
pub mod identity;
mod lifecycle;
pub mod locator;
pub mod memory;
mod script;
pub mod toast;

pub use click::{ClickOutcome, LaunchRequest};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use dom::{AttrMatch, AttrSelector, Dom, ElementSpec, Layout, PageLocation, ReadyState, Selector};
pub use forge::{PageForge, GITHUB_NAVIGATION_EVENTS, GITLAB_NAVIGATION_EVENTS};
pub use host::{Host, PageEvent, TimerId};
pub use lifecycle::{transition, Action, AttemptOutcome, Event, Lifecycle, ObserverState, Phase};
pub use script::{ContentScript, ScriptConfig};
