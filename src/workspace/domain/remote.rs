//! Remote-URL parsing into repository identifiers.
//!
//! Only two families of remote are recognised: scp-like SSH remotes
//! (`git@host:owner/repo.git`) and URL remotes with an `https`, `http`,
//! `ssh`, `git` or `git+ssh` scheme (`https://host/owner/repo`). Anything
//! else is rejected rather than guessed at.

use super::{RepositoryFullName, WorkspaceDomainError};

const URL_SCHEMES: [&str; 5] = ["https", "http", "ssh", "git", "git+ssh"];

/// Parses the `owner/repo` identifier out of a Git remote URL.
///
/// # Errors
///
/// Returns [`WorkspaceDomainError::UnrecognisedRemoteUrl`] when the URL
/// matches neither recognised pattern or its path is not exactly two
/// segments.
///
/// # Examples
///
///     use atelier::workspace::domain::parse_remote_repository;
///
///     let ssh = parse_remote_repository("git@host:owner/repo.git").expect("ssh remote");
///     let https = parse_remote_repository("https://host/owner/repo").expect("https remote");
///     assert_eq!(ssh, https);
///     assert!(parse_remote_repository("/srv/git/repo").is_err());
pub fn parse_remote_repository(url: &str) -> Result<RepositoryFullName, WorkspaceDomainError> {
    let unrecognised = || WorkspaceDomainError::UnrecognisedRemoteUrl(url.to_owned());
    let trimmed = url.trim();
    let raw_path = url_path(trimmed)
        .or_else(|| scp_path(trimmed))
        .ok_or_else(unrecognised)?;

    let unslashed = raw_path.trim_matches('/');
    let path = unslashed.strip_suffix(".git").unwrap_or(unslashed);
    let (owner, repo) = path.split_once('/').ok_or_else(unrecognised)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(unrecognised());
    }

    RepositoryFullName::new(format!("{owner}/{repo}")).map_err(|_| unrecognised())
}

/// Extracts the path of a `scheme://authority/path` remote.
fn url_path(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    if !URL_SCHEMES.contains(&scheme) {
        return None;
    }
    let (authority, path) = rest.split_once('/')?;
    (!authority.is_empty()).then_some(path)
}

/// Extracts the path of a `user@host:path` remote.
fn scp_path(url: &str) -> Option<&str> {
    if url.contains("://") {
        return None;
    }
    let (user_and_host, path) = url.split_once(':')?;
    let (user, host) = user_and_host.split_once('@')?;
    if user.is_empty() || host.is_empty() || host.contains('/') {
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::parse_remote_repository;
    use crate::workspace::domain::WorkspaceDomainError;
    use rstest::rstest;

    #[rstest]
    #[case("git@host:owner/repo.git")]
    #[case("git@host:owner/repo")]
    #[case("https://host/owner/repo")]
    #[case("https://host/owner/repo.git")]
    #[case("https://host/owner/repo/")]
    #[case("ssh://git@host:2222/owner/repo.git")]
    #[case("git+ssh://git@host/owner/repo")]
    #[case("  https://host/owner/repo\n")]
    fn recognised_remotes_parse_to_owner_repo(#[case] url: &str) {
        let repository = parse_remote_repository(url).expect("remote should parse");
        assert_eq!(repository.as_str(), "owner/repo");
    }

    #[rstest]
    #[case("")]
    #[case("/srv/git/repo.git")]
    #[case("file:///srv/git/owner/repo")]
    #[case("https://host/owner")]
    #[case("https://host/group/subgroup/repo")]
    #[case("host:owner/repo")]
    #[case("https:///owner/repo")]
    fn unrecognised_remotes_are_rejected(#[case] url: &str) {
        let result = parse_remote_repository(url);
        assert_eq!(
            result,
            Err(WorkspaceDomainError::UnrecognisedRemoteUrl(url.to_owned()))
        );
    }
}
