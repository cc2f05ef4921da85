//! Core type definitions for the launch button

use serde::{Deserialize, Serialize};

use crate::launch_url::normalize_clone_url;
use crate::{LaunchError, Result};

/// Domain served by the static GitHub content script
pub const GITHUB_DOMAIN: &str = "github.com";

/// Placeholder substituted with the project owner (or namespace) in URL templates
pub const OWNER_PLACEHOLDER: &str = "{owner}";

/// Placeholder substituted with the project name in URL templates
pub const REPO_PLACEHOLDER: &str = "{repo}";

/// Kind of code forge, decides which page heuristics apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgeKind {
    #[default]
    Github,
    Gitlab,
}

impl std::fmt::Display for ForgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Github => write!(f, "github"),
            Self::Gitlab => write!(f, "gitlab"),
        }
    }
}

impl std::str::FromStr for ForgeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "github" => Ok(Self::Github),
            "gitlab" => Ok(Self::Gitlab),
            _ => Err(format!("Invalid forge type: {}", s)),
        }
    }
}

/// A configured code forge
///
/// Persisted as `{ "domain": ..., "type": ..., "urlTemplate": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forge {
    /// Host name, unique within a registry
    pub domain: String,
    /// Forge kind
    #[serde(rename = "type")]
    pub kind: ForgeKind,
    /// Optional launcher URL template with `{owner}` and `{repo}` placeholders
    #[serde(rename = "urlTemplate", default)]
    pub url_template: String,
}

impl Forge {
    /// Create a forge, normalizing the domain
    pub fn new(domain: &str, kind: ForgeKind) -> Result<Self> {
        Ok(Self {
            domain: normalize_domain(domain)?,
            kind,
            url_template: String::new(),
        })
    }

    /// The built-in github.com forge
    pub fn github() -> Self {
        Self {
            domain: GITHUB_DOMAIN.to_string(),
            kind: ForgeKind::Github,
            url_template: String::new(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// The URL template, if it is usable for substitution
    ///
    /// A template is only usable when it is non-empty and carries both the
    /// owner and the repo placeholder.
    pub fn template(&self) -> Option<&str> {
        usable_template(Some(&self.url_template))
    }
}

/// Returns the template when it contains both placeholders
pub fn usable_template(template: Option<&str>) -> Option<&str> {
    template.filter(|t| {
        !t.trim().is_empty() && t.contains(OWNER_PLACEHOLDER) && t.contains(REPO_PLACEHOLDER)
    })
}

/// Normalize a user-entered forge domain
///
/// Trims, lowercases, drops an `http(s)://` scheme and anything from the first
/// `/` onward.
pub fn normalize_domain(raw: &str) -> Result<String> {
    let lowered = raw.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let host = without_scheme.split('/').next().unwrap_or("").trim();

    if host.is_empty() {
        return Err(LaunchError::InvalidForge(format!(
            "empty domain in '{}'",
            raw
        )));
    }
    if host.chars().any(char::is_whitespace) {
        return Err(LaunchError::InvalidForge(format!(
            "domain contains whitespace: '{}'",
            raw
        )));
    }

    Ok(host.to_string())
}

/// Percent-decode a URL path
///
/// Paths that do not decode to UTF-8 are kept as they are.
pub fn decode_path(path: &str) -> String {
    urlencoding::decode(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Non-empty segments of a URL path
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Project identity on a forge
///
/// `owner` may contain `/` for GitLab nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectIdentity {
    pub owner: String,
    pub repo: String,
}

impl ProjectIdentity {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Split a namespace path: the last segment is the repo, the rest the owner
    ///
    /// Returns `None` for fewer than two segments.
    pub fn from_segments(segments: &[&str]) -> Option<Self> {
        match segments {
            [namespace @ .., repo] if !namespace.is_empty() => {
                Some(Self::new(namespace.join("/"), *repo))
            }
            _ => None,
        }
    }

    /// `owner/repo`
    pub fn path(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl std::str::FromStr for ProjectIdentity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(".git");
        Self::from_segments(&path_segments(trimmed))
            .ok_or_else(|| format!("Invalid project path (expected owner/repo): {}", s))
    }
}

/// A project identity located on a specific forge host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub host: String,
    pub identity: ProjectIdentity,
}

impl RepositoryRef {
    pub fn new(host: impl Into<String>, identity: ProjectIdentity) -> Self {
        Self {
            host: host.into(),
            identity,
        }
    }

    /// Parse any supported clone URL (HTTPS, SSH, scp-style)
    pub fn from_clone_url(clone_url: &str) -> Result<Self> {
        let normalized = normalize_clone_url(clone_url)?;
        let url = url::Url::parse(&normalized)
            .map_err(|e| LaunchError::InvalidRepository(format!("{}: {}", clone_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| LaunchError::InvalidRepository(format!("no host in {}", clone_url)))?;
        let path = decode_path(url.path());
        let identity = ProjectIdentity::from_segments(&path_segments(&path)).ok_or_else(
            || LaunchError::InvalidRepository(format!("expected owner/repo in {}", clone_url)),
        )?;

        Ok(Self::new(host, identity))
    }

    /// Canonical `https://host/owner/repo` URL
    pub fn https_url(&self) -> String {
        format!("https://{}/{}", self.host, self.identity.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forge_kind_parse_and_display() {
        assert_eq!("GitLab".parse::<ForgeKind>().unwrap(), ForgeKind::Gitlab);
        assert_eq!(" github ".parse::<ForgeKind>().unwrap(), ForgeKind::Github);
        assert!("bitbucket".parse::<ForgeKind>().is_err());
        assert_eq!(ForgeKind::Gitlab.to_string(), "gitlab");
    }

    #[test]
    fn test_forge_serde_shape() {
        let forge = Forge::new("gitlab.example.com", ForgeKind::Gitlab)
            .unwrap()
            .with_template("https://x/{owner}/{repo}");
        let json = serde_json::to_value(&forge).unwrap();
        assert_eq!(json["domain"], "gitlab.example.com");
        assert_eq!(json["type"], "gitlab");
        assert_eq!(json["urlTemplate"], "https://x/{owner}/{repo}");

        let decoded: Forge =
            serde_json::from_str(r#"{"domain":"git.lab","type":"gitlab"}"#).unwrap();
        assert_eq!(decoded.url_template, "");
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(
            normalize_domain(" HTTPS://GitLab.Example.com/group/ ").unwrap(),
            "gitlab.example.com"
        );
        assert_eq!(normalize_domain("git.lab").unwrap(), "git.lab");
        assert!(normalize_domain("   ").is_err());
        assert!(normalize_domain("https://").is_err());
    }

    #[test]
    fn test_template_requires_both_placeholders() {
        let forge = Forge::github();
        assert!(forge.template().is_none());
        assert!(forge.clone().with_template("https://x/{owner}").template().is_none());
        assert!(forge.clone().with_template("https://x/{repo}").template().is_none());
        assert_eq!(
            forge.with_template("https://x/{owner}/{repo}").template(),
            Some("https://x/{owner}/{repo}")
        );
    }

    #[test]
    fn test_identity_from_segments() {
        assert_eq!(
            ProjectIdentity::from_segments(&["group", "sub", "proj"]),
            Some(ProjectIdentity::new("group/sub", "proj"))
        );
        assert_eq!(ProjectIdentity::from_segments(&["only"]), None);
        assert_eq!(ProjectIdentity::from_segments(&[]), None);
    }

    #[test]
    fn test_identity_from_str() {
        let identity: ProjectIdentity = "org/repo".parse().unwrap();
        assert_eq!(identity, ProjectIdentity::new("org", "repo"));
        assert_eq!(identity.to_string(), "org/repo");
        assert!("repo".parse::<ProjectIdentity>().is_err());
    }

    #[test]
    fn test_repository_ref_from_clone_urls() {
        let ssh = RepositoryRef::from_clone_url("git@github.com:org/repo.git").unwrap();
        let https = RepositoryRef::from_clone_url("https://github.com/org/repo.git").unwrap();
        assert_eq!(ssh, https);
        assert_eq!(ssh.https_url(), "https://github.com/org/repo");

        let nested =
            RepositoryRef::from_clone_url("git@gitlab.example.com:a/b/c.git").unwrap();
        assert_eq!(nested.host, "gitlab.example.com");
        assert_eq!(nested.identity, ProjectIdentity::new("a/b", "c"));

        assert!(RepositoryRef::from_clone_url("https://github.com/lonely").is_err());
    }
}
