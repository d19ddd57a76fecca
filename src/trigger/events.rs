use serde::Deserialize;

/// CI event parsed from the payload based on the event name (`GITHUB_EVENT_NAME`).
#[derive(Debug)]
pub enum CiEvent {
    Push(PushEvent),
    IssueComment(IssueCommentEvent),
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub deleted: bool,
    pub repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: IssuePayload,
    pub comment: CommentPayload,
    pub repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    pub pull_request: Option<serde_json::Value>, // Present if issue is a PR
}

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub body: Option<String>,
    pub user: UserPayload,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub login: String,
    #[serde(rename = "type", default)]
    pub user_type: String,
}

impl UserPayload {
    pub fn is_bot(&self) -> bool {
        self.user_type == "Bot" || self.login.ends_with("[bot]")
    }
}

impl CiEvent {
    pub fn parse(event_name: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        match event_name {
            "push" => {
                let event: PushEvent = serde_json::from_slice(payload)?;
                Ok(CiEvent::Push(event))
            }
            "issue_comment" => {
                let event: IssueCommentEvent = serde_json::from_slice(payload)?;
                Ok(CiEvent::IssueComment(event))
            }
            other => Ok(CiEvent::Unsupported(other.to_string())),
        }
    }
}
