pub mod auth;
pub mod client;
pub mod report;
pub mod rollout;
pub mod types;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use types::{Release, Track};

pub use client::PlayClient;

/// The subset of the Android Publisher edits API used for staged rollouts.
///
/// Every call is scoped to the package the implementation was built for.
/// Changes made inside an edit only become visible once it is committed.
#[async_trait]
pub trait PlayApi: Send + Sync {
    /// Open a new edit and return its id.
    async fn create_edit(&self) -> Result<String>;

    /// Read a track. A track that cannot be read is reported as empty.
    async fn get_track(&self, edit_id: &str, track: &str) -> Result<Track>;

    /// Replace the releases of a track.
    async fn update_track(&self, edit_id: &str, track: &str, releases: Vec<Release>) -> Result<()>;

    async fn commit_edit(&self, edit_id: &str) -> Result<()>;

    /// Abandon an edit without committing it.
    async fn delete_edit(&self, edit_id: &str) -> Result<()>;

    /// Upload an app bundle and return its version code.
    async fn upload_bundle(&self, edit_id: &str, aab: &Path) -> Result<String>;

    /// Attach native debug symbols to an uploaded version.
    async fn upload_native_symbols(
        &self,
        edit_id: &str,
        version_code: &str,
        symbols: &Path,
    ) -> Result<()>;
}
