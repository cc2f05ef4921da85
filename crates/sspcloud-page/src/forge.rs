//! Per-forge page behavior
//!
//! Everything that differs between GitHub and GitLab pages lives here as
//! data: navigation event names, eligibility, identity, mount plan and
//! button styling. Adding a layout means adding a candidate, not a branch.

use sspcloud_core::{ForgeKind, ProjectIdentity};

use crate::assets::{self, GITHUB_BUTTON_CLASS, GITHUB_ICON, GITLAB_BUTTON_CLASS, GITLAB_ICON};
use crate::dom::{AttrMatch, Dom, ElementSpec, Selector};
use crate::identity;
use crate::locator::{MountCandidate, Probe};

/// GitHub's SPA router events
pub const GITHUB_NAVIGATION_EVENTS: [&str; 2] = ["turbo:load", "pjax:end"];
/// GitLab's SPA router event
pub const GITLAB_NAVIGATION_EVENTS: [&str; 1] = ["turbolinks:load"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageForge {
    Github,
    Gitlab,
}

impl From<ForgeKind> for PageForge {
    fn from(kind: ForgeKind) -> Self {
        match kind {
            ForgeKind::Github => Self::Github,
            ForgeKind::Gitlab => Self::Gitlab,
        }
    }
}

impl PageForge {
    pub fn kind(self) -> ForgeKind {
        match self {
            Self::Github => ForgeKind::Github,
            Self::Gitlab => ForgeKind::Gitlab,
        }
    }

    /// In-page navigation events that re-arm the page
    pub fn navigation_events(self) -> &'static [&'static str] {
        match self {
            Self::Github => &GITHUB_NAVIGATION_EVENTS,
            Self::Gitlab => &GITLAB_NAVIGATION_EVENTS,
        }
    }

    pub fn is_navigation_event(self, name: &str) -> bool {
        self.navigation_events().contains(&name)
    }

    /// Whether the current page should carry a button
    pub fn is_eligible<D: Dom>(self, dom: &D) -> bool {
        match self {
            Self::Github => identity::is_github_repository_root(dom),
            Self::Gitlab => identity::is_gitlab_project_root(dom),
        }
    }

    /// Project shown on the current page
    pub fn identity<D: Dom>(self, dom: &D) -> Option<ProjectIdentity> {
        match self {
            Self::Github => identity::github_identity(&dom.location().path),
            Self::Gitlab => identity::gitlab_identity(dom),
        }
    }

    /// Ordered mount candidates
    pub fn mount_plan(self) -> Vec<MountCandidate> {
        match self {
            Self::Github => github_mount_plan(),
            Self::Gitlab => gitlab_mount_plan(),
        }
    }

    pub fn button_class(self) -> &'static str {
        match self {
            Self::Github => GITHUB_BUTTON_CLASS,
            Self::Gitlab => GITLAB_BUTTON_CLASS,
        }
    }

    pub fn button(self) -> ElementSpec {
        let icon = match self {
            Self::Github => GITHUB_ICON,
            Self::Gitlab => GITLAB_ICON,
        };
        assets::button_spec(self.button_class(), icon)
    }

    pub fn stylesheet(self) -> String {
        let display = match self {
            Self::Github => "flex",
            Self::Gitlab => "inline-flex",
        };
        assets::stylesheet(self.button_class(), display)
    }
}

fn github_mount_plan() -> Vec<MountCandidate> {
    let legacy = [
        Selector::class("react-jump-to-actions"),
        Selector::tag("div").and_class("form-inline"),
        Selector::id("repo-clone-provider"),
        Selector::id("repo-links-bar"),
    ];

    let mut plan = vec![
        MountCandidate::modern(Selector::tag("ul").and_class("pagehead-actions")).wrapped_in("li"),
    ];
    plan.extend(
        legacy
            .into_iter()
            .map(|selector| MountCandidate::legacy(selector).with_spacer()),
    );
    // Watch/fork/star button groups
    plan.push(
        MountCandidate::heuristic(Probe::GroupScan {
            candidates: Selector::tag("span")
                .has_attr("id")
                .not_attr("id", AttrMatch::Prefix("actions-".into())),
            min_children: 1,
            reject_containing: Selector::tag("a").attr(
                "data-hovercard-type",
                AttrMatch::Equals("repository".into()),
            ),
        })
        .with_spacer(),
    );
    plan
}

fn gitlab_mount_plan() -> Vec<MountCandidate> {
    let legacy = [
        Selector::class("project-repo-buttons"),
        Selector::class("count-buttons"),
        Selector::class("project-clone-holder"),
        Selector::class("tree-controls"),
        Selector::class("nav-controls"),
        Selector::class("repo-buttons"),
        Selector::class("gl-display-flex").and_class("gl-gap-3"),
    ];

    let mut plan: Vec<MountCandidate> = legacy.into_iter().map(MountCandidate::legacy).collect();
    plan.push(MountCandidate::heuristic(Probe::ParentOf(
        Selector::any().attr("data-testid", AttrMatch::Equals("fork-button".into())),
    )));
    plan.push(MountCandidate::heuristic(Probe::ParentOf(
        Selector::tag("a").attr("href", AttrMatch::Contains("/forks".into())),
    )));
    plan
}
