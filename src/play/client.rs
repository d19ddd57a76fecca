use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;

use crate::error::{AppError, Result};

use super::types::{AppEdit, Bundle, Release, Track};
use super::PlayApi;

const API_BASE: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";
const UPLOAD_BASE: &str = "https://androidpublisher.googleapis.com/upload/androidpublisher/v3";

/// Android Publisher API client scoped to one package.
pub struct PlayClient {
    http: Client,
    token: String,
    package: String,
}

impl PlayClient {
    pub fn new(http: Client, token: String, package: &str) -> Self {
        Self {
            http,
            token,
            package: package.to_string(),
        }
    }

    fn edits_url(&self, base: &str) -> String {
        format!(
            "{base}/applications/{}/edits",
            urlencoding::encode(&self.package)
        )
    }

    fn edit_url(&self, base: &str, edit_id: &str) -> String {
        format!("{}/{}", self.edits_url(base), urlencoding::encode(edit_id))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.bearer_auth(&self.token).send().await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(&method, url, status, &body)
    }

    async fn upload(&self, url: &str, file: &Path) -> Result<serde_json::Value> {
        let payload = tokio::fs::read(file).await.map_err(|e| {
            AppError::PlayApi(format!("Failed to read {}: {e}", file.display()))
        })?;
        tracing::info!(file = %file.display(), bytes = payload.len(), "Uploading");

        let request = self
            .http
            .post(url)
            .header("content-type", "application/octet-stream")
            .body(payload);
        self.send(Method::POST, url, request).await
    }
}

/// Map an API answer to `T`: non-2xx statuses become `PlayApi` errors,
/// undecodable bodies become `Serialization` errors.
fn parse_response<T: DeserializeOwned>(
    method: &Method,
    url: &str,
    status: StatusCode,
    body: &str,
) -> Result<T> {
    if !status.is_success() {
        return Err(AppError::PlayApi(format!(
            "HTTP {status} {method} {url}\n{body}"
        )));
    }

    // Some endpoints answer with an empty body
    let body = if body.trim().is_empty() { "{}" } else { body };
    Ok(serde_json::from_str(body)?)
}

/// A track the API refuses to return counts as empty. Transport and
/// decoding failures still propagate.
fn track_or_empty(result: Result<Track>, track: &str) -> Result<Track> {
    match result {
        Err(AppError::PlayApi(e)) => {
            tracing::warn!(track = %track, error = %e, "Could not read track, treating it as empty");
            Ok(Track::empty(track))
        }
        other => other,
    }
}

#[async_trait]
impl PlayApi for PlayClient {
    async fn create_edit(&self) -> Result<String> {
        let url = self.edits_url(API_BASE);
        let request = self.http.post(&url).json(&json!({}));
        let edit: AppEdit = self.send(Method::POST, &url, request).await?;
        Ok(edit.id)
    }

    async fn get_track(&self, edit_id: &str, track: &str) -> Result<Track> {
        let url = format!(
            "{}/tracks/{}",
            self.edit_url(API_BASE, edit_id),
            urlencoding::encode(track)
        );
        let request = self.http.get(&url);
        track_or_empty(self.send(Method::GET, &url, request).await, track)
    }

    async fn update_track(&self, edit_id: &str, track: &str, releases: Vec<Release>) -> Result<()> {
        let url = format!(
            "{}/tracks/{}",
            self.edit_url(API_BASE, edit_id),
            urlencoding::encode(track)
        );
        let body = Track {
            track: track.to_string(),
            releases,
        };
        let request = self.http.put(&url).json(&body);
        let _: serde_json::Value = self.send(Method::PUT, &url, request).await?;
        Ok(())
    }

    async fn commit_edit(&self, edit_id: &str) -> Result<()> {
        let url = format!("{}:commit", self.edit_url(API_BASE, edit_id));
        let request = self.http.post(&url);
        let _: serde_json::Value = self.send(Method::POST, &url, request).await?;
        Ok(())
    }

    async fn delete_edit(&self, edit_id: &str) -> Result<()> {
        let url = self.edit_url(API_BASE, edit_id);
        let request = self.http.delete(&url);
        let _: serde_json::Value = self.send(Method::DELETE, &url, request).await?;
        Ok(())
    }

    async fn upload_bundle(&self, edit_id: &str, aab: &Path) -> Result<String> {
        let url = format!(
            "{}/bundles?uploadType=media",
            self.edit_url(UPLOAD_BASE, edit_id)
        );
        let response = self.upload(&url, aab).await?;
        let bundle: Bundle = serde_json::from_value(response)?;
        Ok(bundle.version_code.to_string())
    }

    async fn upload_native_symbols(
        &self,
        edit_id: &str,
        version_code: &str,
        symbols: &Path,
    ) -> Result<()> {
        let url = format!(
            "{}/apks/{}/deobfuscationFiles/nativeCode?uploadType=media",
            self.edit_url(UPLOAD_BASE, edit_id),
            urlencoding::encode(version_code)
        );
        self.upload(&url, symbols).await?;
        Ok(())
    }
}
