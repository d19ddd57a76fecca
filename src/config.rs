use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::Environment;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeployConfig {
    /// Deployment platform CLI to invoke.
    #[serde(default = "default_cli")]
    pub cli: String,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    /// Local state directory the CLI keeps inside the working directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Program used to remove the cache directory when the CLI lacks permission.
    #[serde(default = "default_elevate_with")]
    pub elevate_with: String,
    #[serde(default = "default_deploy_args")]
    pub deploy_args: Vec<String>,
    #[serde(default = "default_production_flag")]
    pub production_flag: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub development: Option<EnvironmentConfig>,
    pub production: Option<EnvironmentConfig>,
}

#[derive(Deserialize, Clone)]
pub struct EnvironmentConfig {
    pub token: String,
    /// Extra arguments appended after the generated ones.
    #[serde(default)]
    pub args: Vec<String>,
}

// Manual Debug impl to avoid leaking the deploy token
impl std::fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("token", &"[REDACTED]")
            .field("args", &self.args)
            .finish()
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct GitHubConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_cli() -> String {
    "vercel".to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".vercel")
}

fn default_elevate_with() -> String {
    "sudo".to_string()
}

fn default_deploy_args() -> Vec<String> {
    vec!["deploy".to_string(), "--yes".to_string()]
}

fn default_production_flag() -> Option<String> {
    Some("--prod".to_string())
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            cli: default_cli(),
            working_dir: default_working_dir(),
            cache_dir: default_cache_dir(),
            elevate_with: default_elevate_with(),
            deploy_args: default_deploy_args(),
            production_flag: default_production_flag(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            development: None,
            production: None,
        }
    }
}

impl DeployConfig {
    pub fn environment(&self, env: Environment) -> Option<&EnvironmentConfig> {
        match env {
            Environment::Development => self.development.as_ref(),
            Environment::Production => self.production.as_ref(),
        }
    }

    /// Cache directory resolved against the working directory.
    pub fn cache_path(&self) -> PathBuf {
        self.working_dir.join(&self.cache_dir)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("rollout").required(false));
        }

        // Environment variable overrides, e.g. ROLLOUT__DEPLOY__PRODUCTION__TOKEN
        builder = builder.add_source(
            config::Environment::with_prefix("ROLLOUT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if config.deploy.max_attempts == 0 {
            return Err(AppError::Config(
                "deploy.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Token used for pull request comments; falls back to the CI-provided `GITHUB_TOKEN`.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}
