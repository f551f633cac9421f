//! Source tree resolution

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::errors::SkyliftError;
use crate::filesys::dir::Dir;
use crate::storage::settings::Settings;

/// Checkout URL for a repository at a tag; "trunk" selects the trunk
pub fn checkout_url(repo: &str, tag: &str) -> String {
    let repo = repo.trim_end_matches('/');
    if tag == "trunk" {
        format!("{}/trunk", repo)
    } else {
        format!("{}/tags/{}", repo, tag)
    }
}

/// Resolve a deployable source tree.
///
/// An explicit directory wins; otherwise the configured repository is
/// checked out at the requested tag into a scratch directory that lives
/// for the rest of the process.
pub async fn prepare(
    settings: &Settings,
    dir: Option<&Path>,
    tag: &str,
) -> Result<PathBuf, SkyliftError> {
    if let Some(dir) = dir {
        return Ok(std::path::absolute(dir)?);
    }

    let repo = settings
        .repo
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            SkyliftError::ConfigError(
                "-t deployments will not work without a defined repo".to_string(),
            )
        })?;

    let scratch = Dir::create_temp_dir("skylift-src").await?;
    let url = checkout_url(repo, tag);
    info!("Checking out {} to {}", url, scratch.path().display());

    let status = Command::new("svn")
        .args(["checkout", &url])
        .arg(scratch.path())
        .status()
        .await
        .map_err(|e| SkyliftError::SourceError(format!("Failed to run svn checkout: {}", e)))?;

    if !status.success() {
        return Err(SkyliftError::SourceError(format!(
            "svn checkout of {} failed",
            url
        )));
    }

    Ok(scratch.path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_url_trunk() {
        assert_eq!(
            checkout_url("svn://code.example.com/site", "trunk"),
            "svn://code.example.com/site/trunk"
        );
    }

    #[test]
    fn test_checkout_url_tag() {
        assert_eq!(
            checkout_url("svn://code.example.com/site", "1.4"),
            "svn://code.example.com/site/tags/1.4"
        );
    }

    #[test]
    fn test_checkout_url_trims_trailing_slash() {
        assert_eq!(
            checkout_url("svn://code.example.com/site/", "trunk"),
            "svn://code.example.com/site/trunk"
        );
    }

    #[tokio::test]
    async fn test_prepare_uses_explicit_dir_as_is() {
        let settings = Settings::default();
        let source = prepare(&settings, Some(Path::new("/srv/demo")), "trunk")
            .await
            .expect("prepare");

        assert_eq!(source, PathBuf::from("/srv/demo"));
    }

    #[tokio::test]
    async fn test_prepare_without_repo_or_dir_fails() {
        let settings = Settings::default();
        let result = prepare(&settings, None, "trunk").await;

        assert!(matches!(result, Err(SkyliftError::ConfigError(_))));
    }
}
