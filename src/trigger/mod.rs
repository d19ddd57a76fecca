pub mod command;
pub mod events;

use crate::deploy::Environment;
use events::CiEvent;

/// What caused a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSource {
    Push {
        branch: String,
    },
    Comment {
        repo_full_name: String,
        pr_number: u64,
        author: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub environment: Environment,
    pub source: TriggerSource,
}

/// Decide whether a CI event asks for a deployment.
pub fn resolve(event: &CiEvent) -> Option<DeployRequest> {
    match event {
        CiEvent::Push(push) => {
            if push.deleted {
                tracing::debug!(git_ref = %push.ref_name, "Ignoring branch deletion");
                return None;
            }
            let environment = Environment::from_branch(&push.ref_name)?;
            let branch = push
                .ref_name
                .strip_prefix("refs/heads/")
                .unwrap_or(&push.ref_name)
                .to_string();
            Some(DeployRequest {
                environment,
                source: TriggerSource::Push { branch },
            })
        }
        CiEvent::IssueComment(event) => {
            if event.action != "created" {
                return None;
            }

            // Comments on plain issues carry no deployable code
            if event.issue.pull_request.is_none() {
                return None;
            }

            // Ignore bots (including our own result comments)
            if event.comment.user.is_bot() {
                tracing::debug!(user = %event.comment.user.login, "Ignoring comment from bot");
                return None;
            }

            let environment = command::parse_comment(event.comment.body.as_deref()?)?;
            Some(DeployRequest {
                environment,
                source: TriggerSource::Comment {
                    repo_full_name: event.repository.full_name.clone(),
                    pr_number: event.issue.number,
                    author: event.comment.user.login.clone(),
                },
            })
        }
        CiEvent::Unsupported(name) => {
            tracing::debug!(event_name = %name, "Ignoring unsupported event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment_event(action: &str, body: &str, login: &str, on_pr: bool) -> CiEvent {
        let mut issue = json!({"number": 12});
        if on_pr {
            issue["pull_request"] = json!({"url": "https://api.github.com/repos/acme/site/pulls/12"});
        }
        let payload = json!({
            "action": action,
            "issue": issue,
            "comment": {"id": 1, "body": body, "user": {"login": login, "type": "User"}},
            "repository": {"full_name": "acme/site"}
        });
        CiEvent::parse("issue_comment", payload.to_string().as_bytes()).unwrap()
    }

    fn push_event(git_ref: &str, deleted: bool) -> CiEvent {
        let payload = json!({
            "ref": git_ref,
            "deleted": deleted,
            "repository": {"full_name": "acme/site"}
        });
        CiEvent::parse("push", payload.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_push_to_mapped_branches() {
        let request = resolve(&push_event("refs/heads/staging", false)).unwrap();
        assert_eq!(request.environment, Environment::Development);
        assert_eq!(
            request.source,
            TriggerSource::Push {
                branch: "staging".to_string()
            }
        );

        let request = resolve(&push_event("refs/heads/production", false)).unwrap();
        assert_eq!(request.environment, Environment::Production);
    }

    #[test]
    fn test_push_to_other_branch_or_deletion() {
        assert!(resolve(&push_event("refs/heads/main", false)).is_none());
        assert!(resolve(&push_event("refs/heads/production", true)).is_none());
    }

    #[test]
    fn test_comment_on_pull_request() {
        let request = resolve(&comment_event("created", ".deploy to prod", "octocat", true)).unwrap();
        assert_eq!(request.environment, Environment::Production);
        assert_eq!(
            request.source,
            TriggerSource::Comment {
                repo_full_name: "acme/site".to_string(),
                pr_number: 12,
                author: "octocat".to_string(),
            }
        );
    }

    #[test]
    fn test_comment_filters() {
        assert!(resolve(&comment_event("edited", ".deploy to dev", "octocat", true)).is_none());
        assert!(resolve(&comment_event("created", ".deploy to dev", "octocat", false)).is_none());
        assert!(resolve(&comment_event("created", ".deploy to dev", "ci[bot]", true)).is_none());
        assert!(resolve(&comment_event("created", "nice work", "octocat", true)).is_none());
    }

    #[test]
    fn test_unsupported() {
        assert!(resolve(&CiEvent::Unsupported("release".to_string())).is_none());
    }
}
