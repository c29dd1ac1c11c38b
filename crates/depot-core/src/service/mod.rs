//! Catalog service.
//!
//! Every operation takes the [`Caller`] explicitly: the service trusts the
//! user id and admin flag it is handed and never looks up a session.
//! Mutations need `is_admin`.
//!
//! Writes that involve an uploaded blob are two-step: the bytes are already
//! in the blob store when the row is written. If the row write fails, the
//! upload is deleted again before the original error is returned.

mod applications;
mod downloads;
mod extras;
mod releases;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use depot_schema::{ApplicationId, UserId};
use tokio::io::AsyncRead;

use crate::blob::{ArtifactSource, BlobError, BlobStore, FsBlobStore, StoredBlob};
use crate::config::Config;
use crate::error::{CatalogError, ErrorKind};
use crate::store::{CatalogStore, DbHandle};

pub use downloads::Download;

/// Identity of whoever is calling, supplied by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Caller {
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    fn require_admin(&self, action: &'static str) -> Result<(), CatalogError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(CatalogError::Forbidden(action))
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// SQLite catalog and filesystem uploads at the configured locations.
    pub fn open(config: &Config) -> Result<Self, CatalogError> {
        let store = DbHandle::spawn(&config.database)?;
        let blobs = FsBlobStore::new(&config.upload_root);
        Ok(Self::new(Arc::new(store), Arc::new(blobs)))
    }

    /// Write an upload into the managed blob store.
    ///
    /// The blob is referenced by nothing until it is passed to a create or
    /// update as [`ArtifactSource::Uploaded`].
    pub async fn upload(
        &self,
        caller: &Caller,
        file_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredBlob, CatalogError> {
        caller.require_admin("upload files")?;
        Ok(self.blobs.put(file_name, reader).await?)
    }

    /// Path and size of a new artifact, checked before anything is written.
    async fn measure(&self, artifact: &ArtifactSource) -> Result<(PathBuf, u64), CatalogError> {
        match artifact {
            ArtifactSource::Uploaded(blob) => Ok((blob.path.clone(), blob.size_bytes)),
            ArtifactSource::PathReference(path) => {
                let invalid = |reason: String| CatalogError::InvalidArtifact {
                    path: path.clone(),
                    reason,
                };
                if !path.is_absolute() {
                    return Err(invalid("path must be absolute".to_string()));
                }
                // Files under the upload root belong to the catalog and are
                // deleted with their row; a reference must never alias one.
                if self.blobs.is_managed(path) {
                    return Err(invalid("path lies inside the managed upload root".to_string()));
                }
                match self.blobs.stat(path).await {
                    Ok(size) => Ok((path.clone(), size)),
                    Err(BlobError::NotFound(_)) => Err(invalid("file does not exist".to_string())),
                    Err(BlobError::NotAFile(_)) => Err(invalid("not a regular file".to_string())),
                    Err(e) => Err(invalid(e.to_string())),
                }
            }
        }
    }

    /// Undo an upload whose row write failed, then hand back the result.
    async fn compensate<T>(
        &self,
        upload: Option<&StoredBlob>,
        result: Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        if let (Err(cause), Some(blob)) = (&result, upload) {
            match self.blobs.delete(&blob.path).await {
                Ok(()) => tracing::info!(
                    path = %blob.path.display(),
                    cause = %cause,
                    "Removed upload after failed write"
                ),
                Err(e) => tracing::error!(
                    kind = ErrorKind::OrphanCleanupFailure.code(),
                    path = %blob.path.display(),
                    cause = %cause,
                    error = %e,
                    "Failed to remove orphaned upload"
                ),
            }
        }
        result
    }

    /// Delete a blob the catalog owns. Path references are left alone.
    ///
    /// Runs after the owning row is gone, so failures are only logged.
    async fn release_blob(&self, path: &Path) {
        if !self.blobs.is_managed(path) {
            tracing::debug!(path = %path.display(), "Keeping referenced file");
            return;
        }
        if let Err(e) = self.blobs.delete(path).await {
            tracing::error!(
                kind = ErrorKind::OrphanCleanupFailure.code(),
                path = %path.display(),
                error = %e,
                "Failed to delete managed file"
            );
        }
    }

    /// Recompute the multiple-OS flag from the stored releases.
    ///
    /// Called after the write it follows has succeeded, so a failure is
    /// logged and left for the next mutation to correct.
    async fn refresh_os_flag(&self, app: ApplicationId) {
        let result = async {
            let oses = self.store.distinct_operating_systems(app).await?;
            let multiple = oses.len() > 1;
            self.store.set_multiple_os_flag(app, multiple).await?;
            Ok::<bool, CatalogError>(multiple)
        }
        .await;

        match result {
            Ok(multiple) => tracing::debug!(application = %app, multiple, "Refreshed OS flag"),
            Err(e) => tracing::warn!(application = %app, error = %e, "Failed to refresh OS flag"),
        }
    }
}
