//! Launcher URL construction
//!
//! Two modes:
//! - a forge URL template with `{owner}` and `{repo}` placeholders, substituted
//!   and returned verbatim;
//! - the parameterized launcher URL, where some values are wrapped in
//!   guillemets (`«value»`) before form encoding. The launcher parses the
//!   wrapped values as literals, so the wrapping must stay exactly as is.

use std::sync::OnceLock;

use regex::Regex;
use url::form_urlencoded;

use crate::config::KUBERNETES_ROLE;
use crate::{
    decode_path, usable_template, LaunchError, LauncherConfig, ProjectIdentity, RepositoryRef,
    Result, OWNER_PLACEHOLDER, REPO_PLACEHOLDER,
};

/// Catalog name of the launched service
pub const SERVICE_NAME: &str = "vscode-generic";

/// `user@host:path` clone URLs
fn scp_like() -> &'static Regex {
    static SCP_LIKE: OnceLock<Regex> = OnceLock::new();
    SCP_LIKE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._~-]+@([A-Za-z0-9.-]+):/?(.+)$")
            .expect("scp-like clone URL pattern is valid")
    })
}

/// Wrap a value in the launcher's literal delimiters
pub fn guillemets(value: &str) -> String {
    format!("\u{00AB}{}\u{00BB}", value)
}

/// Replace every placeholder occurrence in a template
pub fn substitute_template(template: &str, identity: &ProjectIdentity) -> String {
    template
        .replace(OWNER_PLACEHOLDER, &identity.owner)
        .replace(REPO_PLACEHOLDER, &identity.repo)
}

fn strip_git_suffix(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    path.strip_suffix(".git").unwrap_or(path)
}

/// Normalize a clone URL to `https://host/path` without `.git`
///
/// The path comes back percent-decoded; it is encoded once, when the
/// launcher URL is built.
///
/// Accepts HTTP(S), `ssh://` and scp-style `user@host:path` URLs. HTTP(S)
/// URLs keep their scheme and port; SSH forms become HTTPS on the same host.
pub fn normalize_clone_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if let Some(captures) = scp_like().captures(trimmed) {
        if !trimmed.contains("://") {
            let host = &captures[1];
            let path = decode_path(&captures[2]);
            let path = strip_git_suffix(&path);
            return Ok(format!("https://{}/{}", host, path.trim_start_matches('/')));
        }
    }

    let url = url::Url::parse(trimmed)
        .map_err(|e| LaunchError::InvalidRepository(format!("{}: {}", raw, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| LaunchError::InvalidRepository(format!("no host in {}", raw)))?;
    let path = decode_path(url.path());
    let path = strip_git_suffix(&path).trim_start_matches('/');

    match url.scheme() {
        "http" | "https" => {
            let authority = match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            Ok(format!("{}://{}/{}", url.scheme(), authority, path))
        }
        "ssh" | "git+ssh" | "git" => Ok(format!("https://{}/{}", host, path)),
        other => Err(LaunchError::InvalidRepository(format!(
            "unsupported scheme '{}' in {}",
            other, raw
        ))),
    }
}

/// Build the launcher URL for a repository
///
/// A usable template wins over the parameterized form.
pub fn build_launch_url(
    repository: &RepositoryRef,
    config: &LauncherConfig,
    template: Option<&str>,
) -> String {
    match usable_template(template) {
        Some(template) => substitute_template(template, &repository.identity),
        None => parameterized_url(&repository.https_url(), config),
    }
}

/// Parameterized launcher URL for a repository URL
pub fn parameterized_url(repository_url: &str, config: &LauncherConfig) -> String {
    let config = config.with_defaults();

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("name", SERVICE_NAME)
        .append_pair("version", &config.version)
        .append_pair("s3", &config.s3)
        .append_pair("persistence.size", &guillemets(&config.persistence_size))
        .append_pair("init.personalInit", &guillemets(&config.personal_init))
        .append_pair("kubernetes.role", &guillemets(KUBERNETES_ROLE))
        .append_pair("vault.secret", &guillemets(&config.vault_secret))
        .append_pair("git.repository", &guillemets(repository_url))
        .append_pair("git.asCodeServerRoot", "true")
        .finish();

    let separator = if config.base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", config.base_url, separator, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://datalab.sspcloud.fr/launcher/ide/vscode-python";

    fn repo(owner: &str, name: &str) -> RepositoryRef {
        RepositoryRef::new("github.com", ProjectIdentity::new(owner, name))
    }

    fn param(url: &str, key: &str) -> Option<String> {
        let query = url.split_once('?')?.1;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_uses_default_base_url() {
        let url = build_launch_url(&repo("org", "repo"), &LauncherConfig::default(), None);
        assert!(url.starts_with(&format!("{}?", BASE)));
        assert_eq!(param(&url, "name").as_deref(), Some("vscode-generic"));
        assert_eq!(param(&url, "version").as_deref(), Some("2.5.0"));
        assert_eq!(param(&url, "s3").as_deref(), Some("region-79669f20"));
    }

    #[test]
    fn test_wrapped_parameters() {
        let url = build_launch_url(&repo("org", "repo"), &LauncherConfig::default(), None);
        assert_eq!(
            param(&url, "git.repository").as_deref(),
            Some("«https://github.com/org/repo»")
        );
        assert_eq!(param(&url, "persistence.size").as_deref(), Some("«20Gi»"));
        assert_eq!(param(&url, "kubernetes.role").as_deref(), Some("«admin»"));
        assert_eq!(param(&url, "vault.secret").as_deref(), Some("«OPENAI-LLM»"));

        let init = param(&url, "init.personalInit").unwrap();
        assert!(init.starts_with('«') && init.ends_with('»'));
        assert_eq!(param(&url, "git.asCodeServerRoot").as_deref(), Some("true"));
    }

    #[test]
    fn test_parameter_order_matches_launcher_contract() {
        let url = build_launch_url(&repo("org", "repo"), &LauncherConfig::default(), None);
        let query = url.split_once('?').unwrap().1;
        let keys: Vec<String> = form_urlencoded::parse(query.as_bytes())
            .map(|(k, _)| k.into_owned())
            .collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "version",
                "s3",
                "persistence.size",
                "init.personalInit",
                "kubernetes.role",
                "vault.secret",
                "git.repository",
                "git.asCodeServerRoot"
            ]
        );
    }

    #[test]
    fn test_encoded_exactly_once() {
        let url = build_launch_url(&repo("org", "repo"), &LauncherConfig::default(), None);
        assert!(!url.contains("%252F"));
        assert!(url.contains("git.repository=%C2%ABhttps%3A%2F%2Fgithub.com%2Forg%2Frepo%C2%BB"));
    }

    #[test]
    fn test_idempotent() {
        let config = LauncherConfig::default();
        let first = build_launch_url(&repo("org", "repo"), &config, None);
        let second = build_launch_url(&repo("org", "repo"), &config, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_config_overrides() {
        let config = LauncherConfig {
            base_url: "https://my-sspcloud.example.com/launcher/ide/vscode-python".to_string(),
            version: "3.0.0".to_string(),
            persistence_size: "50Gi".to_string(),
            vault_secret: "MY-SECRET".to_string(),
            ..LauncherConfig::default()
        };
        let url = build_launch_url(&repo("org", "repo"), &config, None);
        assert!(url.starts_with("https://my-sspcloud.example.com/launcher/ide/vscode-python?"));
        assert_eq!(param(&url, "version").as_deref(), Some("3.0.0"));
        assert_eq!(param(&url, "persistence.size").as_deref(), Some("«50Gi»"));
        assert_eq!(param(&url, "vault.secret").as_deref(), Some("«MY-SECRET»"));
    }

    #[test]
    fn test_blank_config_fields_fall_back() {
        let config = LauncherConfig {
            s3: String::new(),
            ..LauncherConfig::default()
        };
        let url = build_launch_url(&repo("org", "repo"), &config, None);
        assert_eq!(param(&url, "s3").as_deref(), Some("region-79669f20"));
    }

    #[test]
    fn test_template_replaces_every_occurrence() {
        let url = build_launch_url(
            &repo("o", "x"),
            &LauncherConfig::default(),
            Some("https://launch/{owner}/{repo}&name={repo}"),
        );
        assert_eq!(url, "https://launch/o/x&name=x");
    }

    #[test]
    fn test_template_is_not_encoded() {
        let identity = RepositoryRef::new("git.lab", ProjectIdentity::new("group/sub", "proj"));
        let url = build_launch_url(
            &identity,
            &LauncherConfig::default(),
            Some("https://launch?repo={owner}/{repo}"),
        );
        assert_eq!(url, "https://launch?repo=group/sub/proj");
    }

    #[test]
    fn test_incomplete_template_falls_back() {
        let url = build_launch_url(
            &repo("org", "repo"),
            &LauncherConfig::default(),
            Some("https://launch/{repo}"),
        );
        assert!(url.starts_with(BASE));
        assert_eq!(
            param(&url, "git.repository").as_deref(),
            Some("«https://github.com/org/repo»")
        );

        let url = build_launch_url(&repo("org", "repo"), &LauncherConfig::default(), Some(""));
        assert!(param(&url, "git.repository").is_some());
    }

    #[test]
    fn test_normalize_clone_urls() {
        assert_eq!(
            normalize_clone_url("git@github.com:org/repo.git").unwrap(),
            "https://github.com/org/repo"
        );
        assert_eq!(
            normalize_clone_url("https://github.com/org/repo.git").unwrap(),
            "https://github.com/org/repo"
        );
        assert_eq!(
            normalize_clone_url("git@github.com:my-org/my-repo.git").unwrap(),
            "https://github.com/my-org/my-repo"
        );
        assert_eq!(
            normalize_clone_url("ssh://git@gitlab.example.com:2222/group/sub/proj.git").unwrap(),
            "https://gitlab.example.com/group/sub/proj"
        );
        assert_eq!(
            normalize_clone_url("https://github.com/my-org/my.repo-name/").unwrap(),
            "https://github.com/my-org/my.repo-name"
        );
        assert!(normalize_clone_url("ftp://example.com/a/b").is_err());
        assert!(normalize_clone_url("not a url").is_err());
    }

    #[test]
    fn test_encoded_clone_path_is_decoded_once() {
        let repository =
            RepositoryRef::from_clone_url("https://gitlab.example.com/group%2Fsub/proj.git")
                .unwrap();
        assert_eq!(repository.identity, ProjectIdentity::new("group/sub", "proj"));

        let url = build_launch_url(&repository, &LauncherConfig::default(), None);
        assert!(!url.contains("%25"), "{}", url);
        assert_eq!(
            param(&url, "git.repository").as_deref(),
            Some("\u{00AB}https://gitlab.example.com/group/sub/proj\u{00BB}")
        );

        assert_eq!(
            normalize_clone_url("git@gitlab.example.com:data%20team/proj.git").unwrap(),
            "https://gitlab.example.com/data team/proj"
        );
    }

    #[test]
    fn test_ssh_and_https_build_the_same_url() {
        let config = LauncherConfig::default();
        let ssh = RepositoryRef::from_clone_url("git@github.com:org/repo.git").unwrap();
        let https = RepositoryRef::from_clone_url("https://github.com/org/repo.git").unwrap();
        assert_eq!(
            build_launch_url(&ssh, &config, None),
            build_launch_url(&https, &config, None)
        );
    }
}
