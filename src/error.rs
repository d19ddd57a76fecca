use thiserror::Error;

use crate::deploy::Environment;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid trigger event: {0}")]
    Trigger(String),

    #[error("Deploy error: {0}")]
    Deploy(String),

    #[error("Deployment to {environment} failed (exit code {code:?}): {detail}")]
    DeployFailed {
        environment: Environment,
        code: Option<i32>,
        detail: String,
    },

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Google Play API error: {0}")]
    PlayApi(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Auth(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
