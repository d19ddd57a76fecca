use std::path::Path;
use std::sync::Arc;

use crate::config::DeployConfig;
use crate::error::{AppError, Result};

use super::runner::{CommandOutput, CommandRunner};
use super::Environment;

const DETAIL_TAIL_LINES: usize = 20;

/// A successful deployment.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub environment: Environment,
    pub url: String,
    pub attempts: u32,
}

/// Known failure modes of the platform CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The CLI could not remove its local cache directory.
    CachePermission,
    /// The CLI could not retrieve the project settings.
    SettingsUnavailable,
    Other,
}

/// Classify a failed CLI run. Permission errors only count as cache failures
/// when the output names the cache directory.
pub fn classify(output: &CommandOutput, cache_dir: &Path) -> Failure {
    let text = output.combined().to_lowercase();

    if text.contains("could not retrieve project settings") {
        return Failure::SettingsUnavailable;
    }

    let cache_name = cache_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| cache_dir.to_string_lossy().to_lowercase());
    let permission_markers = ["eacces", "eperm", "permission denied", "operation not permitted"];
    if !cache_name.is_empty()
        && text.contains(&cache_name)
        && permission_markers.iter().any(|m| text.contains(m))
    {
        return Failure::CachePermission;
    }

    Failure::Other
}

/// The deployment URL is the last `https://` line the CLI prints to stdout.
pub fn extract_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("https://"))
        .last()
        .map(|line| line.to_string())
}

pub struct Deployer {
    config: DeployConfig,
    runner: Arc<dyn CommandRunner>,
}

impl Deployer {
    pub fn new(config: DeployConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    fn command_args(&self, environment: Environment, token: &str, extra: &[String]) -> Vec<String> {
        let mut args = self.config.deploy_args.clone();
        args.push("--token".to_string());
        args.push(token.to_string());
        if environment == Environment::Production {
            if let Some(flag) = &self.config.production_flag {
                args.push(flag.clone());
            }
        }
        args.extend(extra.iter().cloned());
        args
    }

    /// Deploy the working directory to `environment`, remediating each known
    /// failure mode at most once.
    pub async fn deploy(&self, environment: Environment) -> Result<Deployment> {
        let env_config = self.config.environment(environment).ok_or_else(|| {
            AppError::Config(format!(
                "No credential configured for {environment} (deploy.{environment}.token)"
            ))
        })?;
        if env_config.token.is_empty() {
            return Err(AppError::Config(format!(
                "Credential for {environment} is empty"
            )));
        }

        let args = self.command_args(environment, &env_config.token, &env_config.args);
        let mut elevated_cleanup = false;
        let mut settings_reset = false;

        for attempt in 1..=self.config.max_attempts {
            tracing::info!(
                environment = %environment,
                cli = %self.config.cli,
                attempt,
                "Running deployment"
            );

            let output = self
                .runner
                .run(&self.config.cli, &args, &self.config.working_dir)
                .await?;

            if output.success {
                let url = extract_url(&output.stdout).ok_or_else(|| {
                    AppError::Deploy(format!(
                        "{} succeeded but printed no deployment URL",
                        self.config.cli
                    ))
                })?;
                tracing::info!(environment = %environment, url = %url, attempt, "Deployment finished");
                return Ok(Deployment {
                    environment,
                    url,
                    attempts: attempt,
                });
            }

            let failure = classify(&output, &self.config.cache_dir);
            tracing::warn!(
                environment = %environment,
                code = ?output.code,
                failure = ?failure,
                attempt,
                "Deployment attempt failed"
            );

            // Remediate only when another attempt will follow it
            let can_retry = attempt < self.config.max_attempts;
            match failure {
                Failure::CachePermission if can_retry && !elevated_cleanup => {
                    elevated_cleanup = true;
                    self.remove_cache_elevated().await?;
                }
                Failure::SettingsUnavailable if can_retry && !settings_reset => {
                    settings_reset = true;
                    self.remove_cache().await?;
                }
                _ => return Err(self.failed(environment, &output, &env_config.token)),
            }
        }

        Err(AppError::Config(
            "deploy.max_attempts must be at least 1".to_string(),
        ))
    }

    async fn remove_cache_elevated(&self) -> Result<()> {
        let cache = self.config.cache_path();
        tracing::info!(
            path = %cache.display(),
            with = %self.config.elevate_with,
            "Removing cache directory with elevated privileges"
        );

        let args = vec![
            "rm".to_string(),
            "-rf".to_string(),
            cache.to_string_lossy().into_owned(),
        ];
        let output = self
            .runner
            .run(&self.config.elevate_with, &args, &self.config.working_dir)
            .await?;

        if !output.success {
            return Err(AppError::Deploy(format!(
                "Elevated removal of {} failed: {}",
                cache.display(),
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    async fn remove_cache(&self) -> Result<()> {
        let cache = self.config.cache_path();
        tracing::info!(path = %cache.display(), "Removing cache directory");

        match tokio::fs::remove_dir_all(&cache).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Deploy(format!(
                "Failed to remove {}: {e}",
                cache.display()
            ))),
        }
    }

    fn failed(&self, environment: Environment, output: &CommandOutput, token: &str) -> AppError {
        let source = if output.stderr.trim().is_empty() {
            &output.stdout
        } else {
            &output.stderr
        };
        let lines: Vec<&str> = source.lines().collect();
        let tail = lines[lines.len().saturating_sub(DETAIL_TAIL_LINES)..].join("\n");

        AppError::DeployFailed {
            environment,
            code: output.code,
            detail: tail.replace(token, "[REDACTED]"),
        }
    }
}
