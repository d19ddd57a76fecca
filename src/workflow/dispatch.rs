use std::path::Path;

use crate::deploy::{Deployer, Deployment};
use crate::error::{AppError, Result};
use crate::github::{self, Notifier};
use crate::trigger::events::CiEvent;
use crate::trigger::{self, TriggerSource};

/// Read and parse the event payload the CI service stored on disk.
pub fn load_event(event_name: &str, event_path: &Path) -> Result<CiEvent> {
    let payload = std::fs::read(event_path).map_err(|e| {
        AppError::Trigger(format!(
            "Failed to read event payload at {}: {e}",
            event_path.display()
        ))
    })?;

    CiEvent::parse(event_name, &payload)
        .map_err(|e| AppError::Trigger(format!("Failed to parse {event_name} event: {e}")))
}

/// Deploy whatever the event asks for, reporting back on the pull request
/// when a comment triggered it. Returns `None` when the event is not a
/// deployment trigger. The URL and environment are appended to
/// `step_outputs` when given.
pub async fn run(
    event: &CiEvent,
    deployer: &Deployer,
    notifier: Option<&dyn Notifier>,
    step_outputs: Option<&Path>,
) -> Result<Option<Deployment>> {
    let request = match trigger::resolve(event) {
        Some(request) => request,
        None => {
            tracing::info!("Event does not request a deployment");
            return Ok(None);
        }
    };

    tracing::info!(
        environment = %request.environment,
        source = ?request.source,
        "Deployment requested"
    );

    let result = deployer.deploy(request.environment).await;

    if let TriggerSource::Comment {
        repo_full_name,
        pr_number,
        ..
    } = &request.source
    {
        let body = match &result {
            Ok(deployment) => github::success_comment(deployment),
            Err(e) => github::failure_comment(request.environment, &e.to_string()),
        };

        match notifier {
            Some(notifier) => {
                if let Err(e) = notifier.post_comment(repo_full_name, *pr_number, &body).await {
                    tracing::warn!(error = %e, pr = pr_number, "Failed to post result comment");
                }
            }
            None => tracing::warn!(
                pr = pr_number,
                "No GitHub token configured, skipping result comment"
            ),
        }
    }

    let deployment = result?;
    super::emit_step_outputs(
        step_outputs,
        &[
            ("url", deployment.url.as_str()),
            ("environment", deployment.environment.as_str()),
        ],
    )?;

    Ok(Some(deployment))
}
