use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

use super::types::{CountryTargeting, LocalizedText, Release, ReleaseStatus};
use super::PlayApi;

const DEFAULT_LOCALE: &str = "en-US";

/// Everything needed to start a staged rollout of a new bundle.
#[derive(Debug, Clone)]
pub struct RolloutPlan {
    pub track: String,
    pub release_name: String,
    pub aab: PathBuf,
    pub native_symbols: Option<PathBuf>,
    pub notes_locale: String,
    pub notes_text: String,
    pub country: String,
    pub user_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishResult {
    pub version_code: String,
    pub halted_previous: bool,
}

pub fn validate_user_fraction(raw: &str) -> Result<f64> {
    let fraction: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid user fraction: {raw}")))?;
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(AppError::Config(format!(
            "User fraction must be between 0 and 1 (exclusive), got {raw}"
        )));
    }
    Ok(fraction)
}

/// `whatsnew-<locale>` files carry their locale in the name.
pub fn infer_locale(notes_file: &Path) -> String {
    notes_file
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix("whatsnew-"))
        .filter(|locale| !locale.is_empty())
        .unwrap_or(DEFAULT_LOCALE)
        .to_string()
}

/// Releases to write back so that any in-progress rollout is halted.
///
/// Returns `None` when nothing is in progress. Drafts are dropped since they
/// block new releases.
pub fn halt_in_progress(releases: &[Release]) -> Option<Vec<Release>> {
    if !releases.iter().any(|r| r.has_status(ReleaseStatus::InProgress)) {
        return None;
    }

    let halted = releases
        .iter()
        .filter(|r| !r.has_status(ReleaseStatus::Draft))
        .cloned()
        .map(|mut r| {
            if r.has_status(ReleaseStatus::InProgress) {
                r.status = Some(ReleaseStatus::Halted);
            }
            r
        })
        .collect();
    Some(halted)
}

/// Only completed releases may accompany a new staged release, otherwise the
/// API rejects the update with "Too many staged releases specified".
pub fn completed_only(releases: &[Release]) -> Vec<Release> {
    releases
        .iter()
        .filter(|r| r.has_status(ReleaseStatus::Completed))
        .cloned()
        .collect()
}

pub fn staged_release(plan: &RolloutPlan, version_code: &str) -> Release {
    Release {
        name: Some(plan.release_name.clone()),
        version_codes: Some(vec![version_code.to_string()]),
        status: Some(ReleaseStatus::InProgress),
        user_fraction: Some(plan.user_fraction),
        country_targeting: Some(CountryTargeting {
            countries: vec![plan.country.clone()],
            include_rest_of_world: false,
        }),
        release_notes: Some(vec![LocalizedText {
            language: plan.notes_locale.clone(),
            text: plan.notes_text.clone(),
        }]),
        in_app_update_priority: Some(0),
    }
}

/// Halt any in-progress rollout in its own committed edit, then upload the
/// new bundle and start a single staged release in a second edit.
pub async fn publish(api: &dyn PlayApi, plan: &RolloutPlan) -> Result<PublishResult> {
    let halted_previous = halt_previous(api, &plan.track).await?;

    let edit_id = api.create_edit().await?;
    let version_code = api.upload_bundle(&edit_id, &plan.aab).await?;
    tracing::info!(version_code = %version_code, "Uploaded bundle");

    if let Some(symbols) = &plan.native_symbols {
        api.upload_native_symbols(&edit_id, &version_code, symbols)
            .await?;
        tracing::info!(version_code = %version_code, "Uploaded native debug symbols");
    }

    let track = api.get_track(&edit_id, &plan.track).await?;
    let mut releases = completed_only(&track.releases);
    releases.push(staged_release(plan, &version_code));

    api.update_track(&edit_id, &plan.track, releases).await?;
    api.commit_edit(&edit_id).await?;

    tracing::info!(
        track = %plan.track,
        version_code = %version_code,
        user_fraction = plan.user_fraction,
        country = %plan.country,
        "Staged rollout started"
    );

    Ok(PublishResult {
        version_code,
        halted_previous,
    })
}

async fn halt_previous(api: &dyn PlayApi, track_name: &str) -> Result<bool> {
    let edit_id = api.create_edit().await?;
    let track = api.get_track(&edit_id, track_name).await?;

    match halt_in_progress(&track.releases) {
        Some(releases) => {
            api.update_track(&edit_id, track_name, releases).await?;
            api.commit_edit(&edit_id).await?;
            tracing::info!(track = %track_name, "Halted in-progress rollout");
            Ok(true)
        }
        None => {
            if let Err(e) = api.delete_edit(&edit_id).await {
                tracing::warn!(edit_id = %edit_id, error = %e, "Failed to discard unused edit");
            }
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::types::Track;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateEdit(String),
        GetTrack(String),
        UpdateTrack(String, Vec<Release>),
        Commit(String),
        Delete(String),
        UploadBundle(String),
        UploadSymbols(String, String),
    }

    /// In-memory Play backend: every read returns the same track contents.
    struct FakePlay {
        releases: Vec<Release>,
        calls: Mutex<Vec<Call>>,
        next_edit: Mutex<u32>,
    }

    impl FakePlay {
        fn new(releases: Vec<Release>) -> Self {
            Self {
                releases,
                calls: Mutex::new(Vec::new()),
                next_edit: Mutex::new(0),
            }
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlayApi for FakePlay {
        async fn create_edit(&self) -> Result<String> {
            let mut next = self.next_edit.lock().unwrap();
            *next += 1;
            let id = format!("edit-{next}");
            self.record(Call::CreateEdit(id.clone()));
            Ok(id)
        }

        async fn get_track(&self, edit_id: &str, track: &str) -> Result<Track> {
            self.record(Call::GetTrack(edit_id.to_string()));
            Ok(Track {
                track: track.to_string(),
                releases: self.releases.clone(),
            })
        }

        async fn update_track(&self, edit_id: &str, _track: &str, releases: Vec<Release>) -> Result<()> {
            self.record(Call::UpdateTrack(edit_id.to_string(), releases));
            Ok(())
        }

        async fn commit_edit(&self, edit_id: &str) -> Result<()> {
            self.record(Call::Commit(edit_id.to_string()));
            Ok(())
        }

        async fn delete_edit(&self, edit_id: &str) -> Result<()> {
            self.record(Call::Delete(edit_id.to_string()));
            Err(AppError::PlayApi("delete not allowed".to_string()))
        }

        async fn upload_bundle(&self, edit_id: &str, _aab: &Path) -> Result<String> {
            self.record(Call::UploadBundle(edit_id.to_string()));
            Ok("421".to_string())
        }

        async fn upload_native_symbols(
            &self,
            edit_id: &str,
            version_code: &str,
            _symbols: &Path,
        ) -> Result<()> {
            self.record(Call::UploadSymbols(
                edit_id.to_string(),
                version_code.to_string(),
            ));
            Ok(())
        }
    }

    fn release(name: &str, status: ReleaseStatus) -> Release {
        Release {
            name: Some(name.to_string()),
            version_codes: Some(vec![name.to_string()]),
            status: Some(status),
            ..Release::default()
        }
    }

    fn plan() -> RolloutPlan {
        RolloutPlan {
            track: "production".to_string(),
            release_name: "2.0.0".to_string(),
            aab: PathBuf::from("app.aab"),
            native_symbols: Some(PathBuf::from("symbols.zip")),
            notes_locale: "en-GB".to_string(),
            notes_text: "New things".to_string(),
            country: "BD".to_string(),
            user_fraction: 0.2,
        }
    }

    #[test]
    fn test_user_fraction_bounds() {
        assert_eq!(validate_user_fraction("0.99").unwrap(), 0.99);
        assert!(validate_user_fraction("0").is_err());
        assert!(validate_user_fraction("1").is_err());
        assert!(validate_user_fraction("NaN").is_err());
        assert!(validate_user_fraction("half").is_err());
    }

    #[test]
    fn test_infer_locale() {
        assert_eq!(infer_locale(Path::new("distribution/whatsnew/whatsnew-bn-BD")), "bn-BD");
        assert_eq!(infer_locale(Path::new("notes.txt")), "en-US");
        assert_eq!(infer_locale(Path::new("whatsnew-")), "en-US");
    }

    #[test]
    fn test_halt_in_progress() {
        let releases = vec![
            release("1", ReleaseStatus::Completed),
            release("2", ReleaseStatus::InProgress),
            release("3", ReleaseStatus::Draft),
        ];

        let halted = halt_in_progress(&releases).unwrap();
        assert_eq!(
            halted,
            vec![
                release("1", ReleaseStatus::Completed),
                release("2", ReleaseStatus::Halted),
            ]
        );

        assert!(halt_in_progress(&[release("1", ReleaseStatus::Completed)]).is_none());
    }

    #[test]
    fn test_completed_only() {
        let releases = vec![
            release("1", ReleaseStatus::Completed),
            release("2", ReleaseStatus::Halted),
            release("3", ReleaseStatus::Draft),
        ];
        assert_eq!(
            completed_only(&releases),
            vec![release("1", ReleaseStatus::Completed)]
        );
    }

    #[test]
    fn test_staged_release_shape() {
        let value = serde_json::to_value(staged_release(&plan(), "421")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "2.0.0",
                "versionCodes": ["421"],
                "status": "inProgress",
                "userFraction": 0.2,
                "countryTargeting": {"countries": ["BD"], "includeRestOfWorld": false},
                "releaseNotes": [{"language": "en-GB", "text": "New things"}],
                "inAppUpdatePriority": 0
            })
        );
    }

    #[tokio::test]
    async fn test_publish_halts_previous_rollout() {
        let api = FakePlay::new(vec![
            release("1", ReleaseStatus::Completed),
            release("2", ReleaseStatus::InProgress),
        ]);

        let result = publish(&api, &plan()).await.unwrap();

        assert_eq!(
            result,
            PublishResult {
                version_code: "421".to_string(),
                halted_previous: true,
            }
        );
        let calls = api.calls();
        assert_eq!(
            calls[..4],
            [
                Call::CreateEdit("edit-1".to_string()),
                Call::GetTrack("edit-1".to_string()),
                Call::UpdateTrack(
                    "edit-1".to_string(),
                    vec![
                        release("1", ReleaseStatus::Completed),
                        release("2", ReleaseStatus::Halted),
                    ]
                ),
                Call::Commit("edit-1".to_string()),
            ]
        );
        assert_eq!(
            calls[4..7],
            [
                Call::CreateEdit("edit-2".to_string()),
                Call::UploadBundle("edit-2".to_string()),
                Call::UploadSymbols("edit-2".to_string(), "421".to_string()),
            ]
        );
        assert_eq!(
            calls[8],
            Call::UpdateTrack(
                "edit-2".to_string(),
                vec![
                    release("1", ReleaseStatus::Completed),
                    staged_release(&plan(), "421"),
                ]
            )
        );
        assert_eq!(calls[9], Call::Commit("edit-2".to_string()));
        assert_eq!(calls.len(), 10);
    }

    #[tokio::test]
    async fn test_publish_without_in_progress_discards_first_edit() {
        let api = FakePlay::new(vec![release("1", ReleaseStatus::Completed)]);
        let mut plan = plan();
        plan.native_symbols = None;

        let result = publish(&api, &plan).await.unwrap();

        assert!(!result.halted_previous);
        let calls = api.calls();
        // Discard failure is logged, not fatal
        assert_eq!(calls[2], Call::Delete("edit-1".to_string()));
        assert!(!calls.contains(&Call::Commit("edit-1".to_string())));
        assert!(!calls
            .iter()
            .any(|c| matches!(c, Call::UploadSymbols(..))));
        assert_eq!(calls.last(), Some(&Call::Commit("edit-2".to_string())));
    }
}
