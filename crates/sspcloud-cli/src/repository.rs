//! Repository arguments: `owner/repo` shorthand or a clone URL

use anyhow::{Context, Result};
use sspcloud_core::{normalize_domain, ProjectIdentity, RepositoryRef, GITHUB_DOMAIN};

fn looks_like_clone_url(input: &str) -> bool {
    input.contains("://") || (input.contains('@') && input.contains(':'))
}

/// Parse a repository argument
///
/// Clone URLs carry their own host; the shorthand uses `host`, or
/// github.com when none is given.
pub fn parse_repository(input: &str, host: Option<&str>) -> Result<RepositoryRef> {
    if looks_like_clone_url(input) {
        return RepositoryRef::from_clone_url(input)
            .with_context(|| format!("Invalid clone URL: {}", input));
    }

    let identity: ProjectIdentity = input.parse().map_err(anyhow::Error::msg)?;
    let host = match host {
        Some(host) => normalize_domain(host).with_context(|| format!("Invalid host: {}", host))?,
        None => GITHUB_DOMAIN.to_string(),
    };
    Ok(RepositoryRef::new(host, identity))
}
