use async_trait::async_trait;
use octocrab::Octocrab;

use crate::error::{AppError, Result};

use super::Notifier;

pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;
        Ok(Self { client })
    }

    pub(crate) fn parse_repo(repo_full_name: &str) -> Result<(&str, &str)> {
        match repo_full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
            _ => Err(AppError::GitHubApi(format!(
                "Invalid repo name: {repo_full_name}"
            ))),
        }
    }
}

#[async_trait]
impl Notifier for GitHubClient {
    async fn post_comment(&self, repo_full_name: &str, issue_number: u64, body: &str) -> Result<()> {
        let (owner, repo) = Self::parse_repo(repo_full_name)?;

        self.client
            .issues(owner, repo)
            .create_comment(issue_number, body)
            .await?;

        tracing::info!(repo = %repo_full_name, issue = issue_number, "Posted comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        assert_eq!(
            GitHubClient::parse_repo("acme/site").unwrap(),
            ("acme", "site")
        );
        assert!(GitHubClient::parse_repo("acme").is_err());
        assert!(GitHubClient::parse_repo("/site").is_err());
    }
}
