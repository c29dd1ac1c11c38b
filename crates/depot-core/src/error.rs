//! Catalog service errors.
//!
//! Every error maps to a stable machine-readable [`ErrorKind`] code plus the
//! human message from `Display`. Front ends print or serialize both.

use std::path::PathBuf;

use depot_schema::{InvalidPackageType, ReleaseKey};
use thiserror::Error;

use crate::blob::BlobError;
use crate::store::StoreError;
use crate::transfer::TransferError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid artifact {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error(transparent)]
    InvalidPackageType(#[from] InvalidPackageType),

    #[error("Release already exists: {0}")]
    DuplicateRelease(ReleaseKey),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Admin rights required to {0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("Transfer cancelled")]
    Cancelled,
}

/// Stable classification of catalog failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArtifact,
    InvalidPackageType,
    DuplicateRelease,
    NotFound,
    Forbidden,
    Validation,
    Storage,
    Cancelled,
    /// Never returned; used as the log marker when compensation leaks a blob.
    OrphanCleanupFailure,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArtifact => "INVALID_ARTIFACT",
            Self::InvalidPackageType => "INVALID_PACKAGE_TYPE",
            Self::DuplicateRelease => "DUPLICATE_RELEASE",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::OrphanCleanupFailure => "ORPHAN_CLEANUP_FAILURE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArtifact { .. } => ErrorKind::InvalidArtifact,
            Self::InvalidPackageType(_) => ErrorKind::InvalidPackageType,
            Self::DuplicateRelease(_) => ErrorKind::DuplicateRelease,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) | Self::Blob(_) => ErrorKind::Storage,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<TransferError> for CatalogError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Cancelled { .. } => Self::Cancelled,
            TransferError::Io(source) => Self::Blob(BlobError::Stream(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let err = CatalogError::not_found("release", 42);
        assert_eq!(err.kind().code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "release 42 not found");

        let err = CatalogError::from(InvalidPackageType("msi".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidPackageType);
        assert!(err.to_string().contains("msi"));

        assert_eq!(CatalogError::Store(StoreError::ActorDied).kind().code(), "STORAGE_ERROR");
        assert_eq!(ErrorKind::OrphanCleanupFailure.to_string(), "ORPHAN_CLEANUP_FAILURE");
    }
}
