//! Project identity extraction and page eligibility
//!
//! A missing identity is not an error: it means "no button on this page".

use std::sync::OnceLock;

use regex::Regex;
use sspcloud_core::{path_segments, ProjectIdentity};
use tracing::debug;

use crate::dom::{AttrMatch, Dom, Selector};

/// First path segments that are GitHub site routes, not owners
pub const GITHUB_RESERVED_ROUTES: [&str; 20] = [
    "settings",
    "orgs",
    "organizations",
    "marketplace",
    "notifications",
    "explore",
    "topics",
    "trending",
    "sponsors",
    "login",
    "logout",
    "join",
    "new",
    "features",
    "pulls",
    "issues",
    "codespaces",
    "search",
    "dashboard",
    "apps",
];

/// Attribute carrying the canonical GitLab project path
pub const GITLAB_PROJECT_PATH_ATTR: &str = "data-project-full-path";

fn github_root_path() -> &'static Regex {
    static ROOT: OnceLock<Regex> = OnceLock::new();
    ROOT.get_or_init(|| Regex::new(r"^/[^/]+/[^/]+/?$").expect("repository root pattern is valid"))
}

/// Non-project route suffixes, stripped in order
fn gitlab_route_suffixes() -> &'static [Regex] {
    static SUFFIXES: OnceLock<Vec<Regex>> = OnceLock::new();
    SUFFIXES.get_or_init(|| {
        [
            r"/-/.*$",
            r"/tree/.*$",
            r"/blob/.*$",
            r"/commits/.*$",
            r"/merge_requests.*$",
            r"/issues.*$",
            r"/pipelines.*$",
            r"/settings.*$",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("route suffix pattern is valid"))
        .collect()
    })
}

/// Elements that only exist on a real GitHub repository page
fn github_repository_markers() -> [Selector; 3] {
    [
        Selector::id("repository-container-header"),
        Selector::tag("meta").attr(
            "name",
            AttrMatch::Equals("octolytics-dimension-repository_nwo".into()),
        ),
        Selector::any().attr(
            "itemtype",
            AttrMatch::Equals("http://schema.org/SoftwareSourceCode".into()),
        ),
    ]
}

/// Owner and repo from the first two path segments
///
/// Anything after the second segment is ignored.
pub fn github_identity(path: &str) -> Option<ProjectIdentity> {
    match path_segments(path).as_slice() {
        [owner, repo, ..] => Some(ProjectIdentity::new(*owner, *repo)),
        _ => None,
    }
}

/// Whether the path has the exact `/owner/repo` shape of a repository root
pub fn is_github_root_path(path: &str) -> bool {
    if !github_root_path().is_match(path) {
        return false;
    }
    match path_segments(path).first() {
        Some(first) => !GITHUB_RESERVED_ROUTES.contains(first),
        None => false,
    }
}

/// Repository root page on GitHub, confirmed by a DOM marker
pub fn is_github_repository_root<D: Dom>(dom: &D) -> bool {
    let location = dom.location();
    if !is_github_root_path(&location.path) {
        return false;
    }
    let marked = github_repository_markers()
        .iter()
        .any(|marker| dom.query(marker).is_some());
    if !marked {
        debug!("{} has a repository shape but no repository marker", location.path);
    }
    marked
}

/// Remove GitLab route suffixes from a path
pub fn strip_gitlab_route(path: &str) -> String {
    gitlab_route_suffixes()
        .iter()
        .fold(path.to_string(), |acc, suffix| {
            suffix.replace(&acc, "").into_owned()
        })
}

/// Identity from a GitLab URL path, for nested groups of any depth
pub fn gitlab_identity_from_path(path: &str) -> Option<ProjectIdentity> {
    let project_path = strip_gitlab_route(path);
    ProjectIdentity::from_segments(&path_segments(&project_path))
}

/// Identity on a GitLab page
///
/// Prefers the project path attribute GitLab renders, then falls back to
/// the URL path.
pub fn gitlab_identity<D: Dom>(dom: &D) -> Option<ProjectIdentity> {
    let from_attr = dom
        .query(&Selector::any().has_attr(GITLAB_PROJECT_PATH_ATTR))
        .and_then(|el| dom.attribute(&el, GITLAB_PROJECT_PATH_ATTR))
        .and_then(|full_path| ProjectIdentity::from_segments(&path_segments(&full_path)));

    from_attr.or_else(|| gitlab_identity_from_path(&dom.location().path))
}

fn gitlab_data_page<D: Dom>(dom: &D) -> Option<String> {
    dom.body().and_then(|body| dom.attribute(&body, "data-page"))
}

/// Any GitLab project page (`body[data-page^="projects:"]` or `.project-page`)
pub fn is_gitlab_project_page<D: Dom>(dom: &D) -> bool {
    if gitlab_data_page(dom).is_some_and(|page| page.starts_with("projects:")) {
        return true;
    }
    dom.body()
        .is_some_and(|body| dom.has_class(&body, "project-page"))
}

/// Project overview or tree page on GitLab
pub fn is_gitlab_project_root<D: Dom>(dom: &D) -> bool {
    if !is_gitlab_project_page(dom) {
        return false;
    }
    match gitlab_data_page(dom).as_deref() {
        Some("projects:show") => true,
        Some(page) if page.starts_with("projects:tree:") => true,
        _ => gitlab_identity(dom).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn test_github_identity_takes_first_two_segments() {
        assert_eq!(
            github_identity("/o/r/tree/main"),
            Some(ProjectIdentity::new("o", "r"))
        );
        assert_eq!(github_identity("/org/repo/"), Some(ProjectIdentity::new("org", "repo")));
        assert_eq!(github_identity("//org//repo"), Some(ProjectIdentity::new("org", "repo")));
    }

    #[test]
    fn test_github_identity_needs_two_segments() {
        assert_eq!(github_identity("/"), None);
        assert_eq!(github_identity(""), None);
        assert_eq!(github_identity("/torvalds"), None);
    }

    #[test]
    fn test_github_root_path() {
        assert!(is_github_root_path("/org/repo"));
        assert!(is_github_root_path("/org/repo/"));
        assert!(!is_github_root_path("/org/repo/tree/main"));
        assert!(!is_github_root_path("/org"));
        assert!(!is_github_root_path("/settings/profile"));
        assert!(!is_github_root_path("/orgs/acme"));
    }

    #[test]
    fn test_encoded_page_path_yields_plain_identity() {
        let dom = MemoryDom::new("https://gitlab.example.com/data%20team/proj/-/tree/main");
        assert_eq!(
            gitlab_identity(&dom),
            Some(ProjectIdentity::new("data team", "proj"))
        );

        let dom = MemoryDom::new("https://github.com/org/r%C3%A9po");
        assert_eq!(
            github_identity(&dom.location().path),
            Some(ProjectIdentity::new("org", "r\u{e9}po"))
        );
    }

    #[test]
    fn test_strip_gitlab_route() {
        assert_eq!(strip_gitlab_route("/g/s/p/-/tree/main"), "/g/s/p");
        assert_eq!(strip_gitlab_route("/g/p/tree/main/src"), "/g/p");
        assert_eq!(strip_gitlab_route("/g/p/blob/main/README.md"), "/g/p");
        assert_eq!(strip_gitlab_route("/g/p/merge_requests/12"), "/g/p");
        assert_eq!(strip_gitlab_route("/g/p/settings"), "/g/p");
        assert_eq!(strip_gitlab_route("/g/p"), "/g/p");
    }

    #[test]
    fn test_gitlab_identity_nested_groups() {
        assert_eq!(
            gitlab_identity_from_path("/ssplab/experimentation-bdf/copain"),
            Some(ProjectIdentity::new("ssplab/experimentation-bdf", "copain"))
        );
        assert_eq!(
            gitlab_identity_from_path("/a/b/c/d/-/pipelines"),
            Some(ProjectIdentity::new("a/b/c", "d"))
        );
        assert_eq!(gitlab_identity_from_path("/lonely"), None);
        assert_eq!(gitlab_identity_from_path("/lonely/-/issues"), None);
    }
}
