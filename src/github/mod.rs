pub mod client;

use async_trait::async_trait;

use crate::deploy::{Deployment, Environment};
use crate::error::Result;

pub use client::GitHubClient;

/// Reports deployment results back to the pull request that asked for them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a comment on an issue or PR.
    async fn post_comment(&self, repo_full_name: &str, issue_number: u64, body: &str) -> Result<()>;
}

pub fn success_comment(deployment: &Deployment) -> String {
    format!(
        "Deployed to **{}**: {}",
        deployment.environment, deployment.url
    )
}

pub fn failure_comment(environment: Environment, error: &str) -> String {
    format!("Deployment to **{environment}** failed: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_bodies() {
        let deployment = Deployment {
            environment: Environment::Development,
            url: "https://dev.example.app".to_string(),
            attempts: 1,
        };
        assert_eq!(
            success_comment(&deployment),
            "Deployed to **development**: https://dev.example.app"
        );
        assert_eq!(
            failure_comment(Environment::Production, "boom"),
            "Deployment to **production** failed: boom"
        );
    }
}
