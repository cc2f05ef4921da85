//! Click flow types
//!
//! A click is split in two around the asynchronous settings read. The
//! repository is captured synchronously first, so a navigation racing the
//! read can only change which settings apply, never which repository opens.

use sspcloud_core::{build_launch_url, RepositoryRef, Settings};

/// Repository captured at click time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub repository: RepositoryRef,
}

impl LaunchRequest {
    pub fn new(repository: RepositoryRef) -> Self {
        Self { repository }
    }

    /// Launcher URL under the given settings
    ///
    /// Uses the usable template of the forge registered for the host, if any.
    pub fn resolve_url(&self, settings: &Settings) -> String {
        build_launch_url(
            &self.repository,
            &settings.launcher,
            settings.template_for(&self.repository.host),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// New tab opened on the URL
    Opened(String),
    /// Popup blocker refused the URL
    Blocked(String),
    /// No project on this page
    NoIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sspcloud_core::ProjectIdentity;

    #[test]
    fn test_resolve_url_uses_host_template() {
        let request = LaunchRequest::new(RepositoryRef::new(
            "gitlab.example.com",
            ProjectIdentity::new("group/sub", "proj"),
        ));
        let settings = Settings::from_snapshot(
            json!({"forges": [{
                "domain": "gitlab.example.com",
                "type": "gitlab",
                "urlTemplate": "https://launch/{owner}/{repo}?again={repo}"
            }]})
            .as_object()
            .unwrap(),
        );
        assert_eq!(
            request.resolve_url(&settings),
            "https://launch/group/sub/proj?again=proj"
        );
    }

    #[test]
    fn test_resolve_url_defaults() {
        let request = LaunchRequest::new(RepositoryRef::new(
            "github.com",
            ProjectIdentity::new("org", "repo"),
        ));
        let url = request.resolve_url(&Settings::default());
        assert!(url.starts_with("https://datalab.sspcloud.fr/launcher/ide/vscode-python?"));
        assert!(url.contains("git.repository=%C2%ABhttps%3A%2F%2Fgithub.com%2Forg%2Frepo%C2%BB"));
    }
}
