use serde::{Deserialize, Serialize};

/// A release track (`production`, `beta`, ...) inside an edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub track: String,
    #[serde(default)]
    pub releases: Vec<Release>,
}

impl Track {
    pub fn empty(track: &str) -> Self {
        Self {
            track: track.to_string(),
            releases: Vec::new(),
        }
    }
}

/// Release on a track. Only the fields we send back are modelled; everything
/// else the API returns is dropped on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReleaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_targeting: Option<CountryTargeting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<Vec<LocalizedText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_app_update_priority: Option<i32>,
}

impl Release {
    pub fn has_status(&self, status: ReleaseStatus) -> bool {
        self.status == Some(status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    StatusUnspecified,
    Draft,
    InProgress,
    Halted,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryTargeting {
    #[serde(default)]
    pub countries: Vec<String>,
    // Omitted by the API when false
    #[serde(default)]
    pub include_rest_of_world: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalizedText {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AppEdit {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub version_code: i64,
}
