use depot_schema::{DownloadLogEntry, Release, ReleaseId};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use super::{Caller, CatalogService};
use crate::blob::{BlobError, BlobReader, original_file_name};
use crate::error::CatalogError;
use crate::transfer::copy_with_cancel;

/// An opened release artifact, ready to stream.
pub struct Download {
    pub release: Release,
    /// Name offered to the downloader.
    pub file_name: String,
    pub reader: BlobReader,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("release", &self.release.id)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Append a download log entry.
    pub async fn record_download(
        &self,
        caller: &Caller,
        release: ReleaseId,
    ) -> Result<DownloadLogEntry, CatalogError> {
        self.get_release(caller, release).await?;
        Ok(self.store.insert_download(caller.user_id, release).await?)
    }

    pub async fn download_count(
        &self,
        caller: &Caller,
        release: ReleaseId,
    ) -> Result<u64, CatalogError> {
        self.get_release(caller, release).await?;
        Ok(self.store.count_downloads(release).await?)
    }

    /// Open a release for download and log the request.
    ///
    /// The log entry records that the download started; failing to write it
    /// is logged and does not stop the transfer.
    pub async fn open_download(
        &self,
        caller: &Caller,
        id: ReleaseId,
    ) -> Result<Download, CatalogError> {
        let release = self.get_release(caller, id).await?;
        let reader = match self.blobs.open(&release.file_path).await {
            Ok(reader) => reader,
            Err(BlobError::NotFound(path)) => {
                return Err(CatalogError::not_found("file", path.display()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.store.insert_download(caller.user_id, id).await {
            tracing::warn!(release = %id, user = %caller.user_id, error = %e, "Failed to log download");
        }

        let file_name = self.offered_file_name(&release);
        tracing::info!(release = %id, user = %caller.user_id, file = %file_name, "Download started");
        Ok(Download {
            release,
            file_name,
            reader,
        })
    }

    /// Name a downloader should save `release` under.
    ///
    /// Managed uploads drop the prefix that keeps them unique on disk.
    pub fn offered_file_name(&self, release: &Release) -> String {
        match release.file_name() {
            Some(name) if self.blobs.is_managed(&release.file_path) => {
                original_file_name(name).to_string()
            }
            Some(name) => name.to_string(),
            None => format!("release-{}", release.id),
        }
    }

    /// Stream a release into `writer` until done or until `cancel` fires.
    ///
    /// A cancelled transfer leaves the download log entry in place.
    pub async fn download_to<W>(
        &self,
        caller: &Caller,
        id: ReleaseId,
        writer: &mut W,
        cancel: &CancellationToken,
    ) -> Result<(Release, u64), CatalogError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut download = self.open_download(caller, id).await?;
        let copied = copy_with_cancel(&mut download.reader, writer, cancel).await?;
        Ok((download.release, copied))
    }
}
