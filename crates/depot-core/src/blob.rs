//! Artifact byte storage.
//!
//! The catalog never looks inside a blob; it only needs a path, a size and
//! a way to stream the bytes back out. Files written through
//! [`BlobStore::put`] are *managed*: they live under the upload root and
//! the catalog deletes them when their row goes away. Operator path
//! references point anywhere else and are never deleted.

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::paths::file_name_of;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Stream error: {0}")]
    Stream(std::io::Error),
}

impl BlobError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// A blob written to the managed upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Where the bytes of a new artifact come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Already written through [`BlobStore::put`]; owned by the catalog.
    Uploaded(StoredBlob),
    /// An existing file the operator points at; never deleted by the catalog.
    PathReference(PathBuf),
}

impl ArtifactSource {
    /// The uploaded blob, if this source owns one.
    pub fn uploaded(&self) -> Option<&StoredBlob> {
        match self {
            Self::Uploaded(blob) => Some(blob),
            Self::PathReference(_) => None,
        }
    }
}

/// Boxed reader returned by [`BlobStore::open`].
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the contents of `reader` under a fresh name derived from `file_name`.
    async fn put(
        &self,
        file_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredBlob, BlobError>;

    /// Store an in-memory buffer.
    async fn put_bytes(&self, file_name: &str, bytes: Bytes) -> Result<StoredBlob, BlobError> {
        let mut reader: &[u8] = &bytes;
        self.put(file_name, &mut reader).await
    }

    /// Remove a blob. Removing a missing path succeeds.
    async fn delete(&self, path: &Path) -> Result<(), BlobError>;

    /// Size of the regular file at `path`.
    async fn stat(&self, path: &Path) -> Result<u64, BlobError>;

    /// Open `path` for streaming.
    async fn open(&self, path: &Path) -> Result<BlobReader, BlobError>;

    /// Whether `path` lies under the managed upload root.
    fn is_managed(&self, path: &Path) -> bool;
}

/// Filesystem blob store rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<unix-millis>-<random>-<sanitized name>`
    fn fresh_name(file_name: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let nonce: u32 = rand::rng().random_range(0..1_000_000_000);
        format!("{millis}-{nonce}-{}", sanitize_file_name(file_name))
    }
}

/// The upload's own name inside a name made by `fresh_name`.
///
/// Names without the `<millis>-<nonce>-` prefix come back unchanged.
pub fn original_file_name(stored: &str) -> &str {
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let mut parts = stored.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(millis), Some(nonce), Some(rest))
            if is_number(millis) && is_number(nonce) && !rest.is_empty() =>
        {
            rest
        }
        _ => stored,
    }
}

/// Reduce an uploaded file name to a safe single path component.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = file_name_of(raw.trim());
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

async fn fill_file(
    reader: &mut (dyn AsyncRead + Send + Unpin),
    file: &mut tokio::fs::File,
) -> std::io::Result<u64> {
    let n = tokio::io::copy(reader, file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(n)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        file_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredBlob, BlobError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BlobError::io(&self.root, e))?;

        let path = self.root.join(Self::fresh_name(file_name));
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| BlobError::io(&path, e))?;

        match fill_file(reader, &mut file).await {
            Ok(size_bytes) => {
                tracing::debug!(path = %path.display(), size_bytes, "Stored blob");
                Ok(StoredBlob { path, size_bytes })
            }
            Err(e) => {
                drop(file);
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
                }
                Err(BlobError::io(&path, e))
            }
        }
    }

    async fn delete(&self, path: &Path) -> Result<(), BlobError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::io(path, e)),
        }
    }

    async fn stat(&self, path: &Path) -> Result<u64, BlobError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| BlobError::io(path, e))?;
        if !meta.is_file() {
            return Err(BlobError::NotAFile(path.to_path_buf()));
        }
        Ok(meta.len())
    }

    async fn open(&self, path: &Path) -> Result<BlobReader, BlobError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| BlobError::io(path, e))?;
        Ok(Box::new(file))
    }

    fn is_managed(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && !path.components().any(|c| matches!(c, Component::ParentDir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My App (x64).exe"), "My_App__x64_.exe");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("   "), "upload");
    }

    #[tokio::test]
    async fn test_put_stat_open_delete() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("uploads"));

        let blob = store
            .put_bytes("setup.exe", Bytes::from_static(b"hello blob"))
            .await
            .unwrap();
        assert_eq!(blob.size_bytes, 10);
        assert!(store.is_managed(&blob.path));
        let name = blob.path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("-setup.exe"), "{name}");
        assert_eq!(original_file_name(name), "setup.exe");

        assert_eq!(store.stat(&blob.path).await.unwrap(), 10);

        let mut reader = store.open(&blob.path).await.unwrap();
        let mut contents = String::new();
        reader.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "hello blob");

        store.delete(&blob.path).await.unwrap();
        assert!(matches!(
            store.stat(&blob.path).await,
            Err(BlobError::NotFound(_))
        ));
        // Idempotent.
        store.delete(&blob.path).await.unwrap();
    }

    #[test]
    fn test_original_file_name() {
        assert_eq!(original_file_name("1700000000000-42-foo-setup.exe"), "foo-setup.exe");
        assert_eq!(original_file_name("foo-1-setup.exe"), "foo-1-setup.exe");
        assert_eq!(original_file_name("12-34-"), "12-34-");
        assert_eq!(original_file_name("12-34"), "12-34");
        assert_eq!(original_file_name("setup.exe"), "setup.exe");
    }

    #[tokio::test]
    async fn test_stat_rejects_directories() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("uploads"));
        assert!(matches!(
            store.stat(dir.path()).await,
            Err(BlobError::NotAFile(_))
        ));
    }

    #[test]
    fn test_is_managed() {
        let store = FsBlobStore::new("/srv/depot/uploads");
        assert!(store.is_managed(Path::new("/srv/depot/uploads/1-2-a.zip")));
        assert!(!store.is_managed(Path::new("/srv/depot/uploads-old/a.zip")));
        assert!(!store.is_managed(Path::new("/srv/depot/uploads/../catalog.db")));
        assert!(!store.is_managed(Path::new("/mnt/share/a.zip")));
    }
}
