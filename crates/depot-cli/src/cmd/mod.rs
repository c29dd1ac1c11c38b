//! Command implementations

pub mod app;
pub mod download;
pub mod extra;
pub mod list;
pub mod release;
pub mod resolve;
pub mod show;

use std::path::Path;

use anyhow::{Context, Result};
use depot_core::{
    ArtifactSource, Caller, CatalogError, CatalogService, Config, Patch, file_name_of,
};
use depot_schema::{Application, UserId};

use crate::{ArtifactArgs, OptionalArtifactArgs};

/// The service plus the identity every command runs as.
#[derive(Debug, Clone)]
pub struct Session {
    pub service: CatalogService,
    pub caller: Caller,
}

impl Session {
    /// Load configuration and open the catalog.
    pub fn open(user: UserId, admin: bool) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        tracing::debug!(
            database = %config.database.display(),
            uploads = %config.upload_root.display(),
            "Opening catalog"
        );
        let service = CatalogService::open(&config).context("Failed to open catalog")?;
        let caller = if admin {
            Caller::admin(user)
        } else {
            Caller::user(user)
        };
        Ok(Self { service, caller })
    }

    /// Look an application up by id or name.
    pub async fn application(&self, key: &str) -> Result<Application> {
        Ok(self.service.find_application(&self.caller, key).await?)
    }

    /// Turn `--file` / `--path` into an artifact, uploading `--file` first.
    pub async fn artifact(&self, args: &ArtifactArgs) -> Result<ArtifactSource> {
        match (&args.file, &args.path) {
            (Some(file), _) => self.upload(file).await,
            (None, Some(path)) => Ok(ArtifactSource::PathReference(path.clone())),
            (None, None) => anyhow::bail!("Pass --file or --path"),
        }
    }

    pub async fn optional_artifact(
        &self,
        args: &OptionalArtifactArgs,
    ) -> Result<Option<ArtifactSource>> {
        match (&args.file, &args.path) {
            (Some(file), _) => self.upload(file).await.map(Some),
            (None, Some(path)) => Ok(Some(ArtifactSource::PathReference(path.clone()))),
            (None, None) => Ok(None),
        }
    }

    async fn upload(&self, file: &Path) -> Result<ArtifactSource> {
        let mut reader = tokio::fs::File::open(file)
            .await
            .with_context(|| format!("Failed to open {}", file.display()))?;
        let name = file_name_of(&file.to_string_lossy()).to_string();
        let blob = self
            .service
            .upload(&self.caller, &name, &mut reader)
            .await?;
        Ok(ArtifactSource::Uploaded(blob))
    }
}

/// `--value` sets, `--clear field` clears, neither leaves the field alone.
pub(crate) fn field_patch<T>(value: Option<T>, cleared: bool) -> Patch<T> {
    match (value, cleared) {
        (Some(v), _) => Patch::Set(v),
        (None, true) => Patch::Clear,
        (None, false) => Patch::Unchanged,
    }
}

/// Machine-readable code for a failed command.
pub fn error_code(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|e| e.downcast_ref::<CatalogError>())
        .map_or("ERROR", |e| e.kind().code())
}
