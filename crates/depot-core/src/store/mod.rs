//! Catalog persistence.
//!
//! [`CatalogStore`] is the contract the catalog service needs from its
//! database. [`CatalogDb`] implements the queries on SQLite and
//! [`DbHandle`] hosts it on a dedicated thread so async callers can share
//! one connection.

pub mod actor;
pub mod db;

use async_trait::async_trait;
use chrono::NaiveDate;
use depot_schema::{
    Application, ApplicationId, ApplicationSummary, Architecture, DownloadLogEntry, Extra,
    ExtraId, PackageType, Release, ReleaseId, UserId,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

pub use actor::DbHandle;
pub use db::CatalogDb;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Corrupt {table} row: {detail}")]
    Corrupt { table: &'static str, detail: String },

    #[error("Database actor died")]
    ActorDied,
}

/// Application row to insert. Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub icon_url: Option<String>,
    pub homepage: Option<String>,
    pub tags: BTreeSet<String>,
}

/// Release row to insert. `uploaded_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub application_id: ApplicationId,
    pub version_label: String,
    pub package_type: PackageType,
    pub operating_system: Option<String>,
    pub architectures: Vec<Architecture>,
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
    pub release_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub sort_order: i64,
}

/// Extra row to insert. `uploaded_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExtra {
    pub application_id: ApplicationId,
    pub name: String,
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
    pub notes: Option<String>,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_application(&self, app: NewApplication) -> Result<Application, StoreError>;

    async fn get_application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError>;

    /// Every application with its release count and top-ranked version, newest first.
    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>, StoreError>;

    /// Write every mutable column of `app`. `None` if the row is gone.
    async fn update_application(&self, app: Application)
    -> Result<Option<Application>, StoreError>;

    /// Delete an application; releases, extras and download logs cascade.
    async fn delete_application(&self, id: ApplicationId) -> Result<bool, StoreError>;

    async fn set_multiple_os_flag(&self, id: ApplicationId, value: bool)
    -> Result<(), StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the release key is taken.
    async fn insert_release(&self, release: NewRelease) -> Result<Release, StoreError>;

    async fn get_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError>;

    /// Releases of one application in display order.
    async fn list_releases(&self, app: ApplicationId) -> Result<Vec<Release>, StoreError>;

    /// Write every mutable column of `release`. `None` if the row is gone.
    async fn update_release(&self, release: Release) -> Result<Option<Release>, StoreError>;

    /// Delete a release, returning the removed row.
    async fn delete_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError>;

    /// Distinct non-null operating systems among an application's releases.
    async fn distinct_operating_systems(
        &self,
        app: ApplicationId,
    ) -> Result<Vec<String>, StoreError>;

    /// Assign sort orders in one transaction.
    ///
    /// Returns `false` and changes nothing if any release does not belong
    /// to `app`.
    async fn reorder_releases(
        &self,
        app: ApplicationId,
        assignments: Vec<(ReleaseId, i64)>,
    ) -> Result<bool, StoreError>;

    async fn insert_download(
        &self,
        user: UserId,
        release: ReleaseId,
    ) -> Result<DownloadLogEntry, StoreError>;

    async fn count_downloads(&self, release: ReleaseId) -> Result<u64, StoreError>;

    async fn insert_extra(&self, extra: NewExtra) -> Result<Extra, StoreError>;

    async fn list_extras(&self, app: ApplicationId) -> Result<Vec<Extra>, StoreError>;

    async fn delete_extra(&self, id: ExtraId) -> Result<Option<Extra>, StoreError>;
}
