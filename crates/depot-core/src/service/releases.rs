use std::collections::HashSet;

use depot_schema::{
    ApplicationId, Architecture, ArchitectureKey, GroupedVersion, OperatingSystemKey, PackageType,
    Release, ReleaseId, ReleaseKey, Resolution, Selection, group_releases,
    normalize_operating_system, resolve_selection,
};

use super::{Caller, CatalogService};
use crate::blob::ArtifactSource;
use crate::error::CatalogError;
use crate::input::{Patch, ReleaseFields, ReleasePatch, clean_text};
use crate::store::{NewRelease, StoreError};

fn required_version(label: &str) -> Result<String, CatalogError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(CatalogError::Validation(
            "Version label is required".to_string(),
        ));
    }
    Ok(label.to_string())
}

fn dedupe_architectures(tags: Vec<Architecture>) -> Vec<Architecture> {
    Architecture::normalize_all(tags.iter().map(Architecture::as_str))
}

/// Labels that selection parses as a slot instead of a value cannot be stored.
fn check_selectable(os: Option<&str>, architectures: &[Architecture]) -> Result<(), CatalogError> {
    if let Some(os) = os.filter(|os| OperatingSystemKey::is_reserved(os)) {
        return Err(CatalogError::Validation(format!(
            "\"{os}\" is reserved for releases without an operating system"
        )));
    }
    if let Some(arch) = architectures
        .iter()
        .find(|a| ArchitectureKey::is_reserved(a.as_str()))
    {
        return Err(CatalogError::Validation(format!(
            "\"{arch}\" is reserved for releases without an architecture tag"
        )));
    }
    Ok(())
}

/// Map a store failure on a release write, naming the key that collided.
fn release_write_error(e: StoreError, key: ReleaseKey) -> CatalogError {
    match e {
        StoreError::UniqueViolation(_) => CatalogError::DuplicateRelease(key),
        other => CatalogError::Store(other),
    }
}

impl CatalogService {
    /// Add a release to an application.
    ///
    /// A path reference must name an existing regular file. Source releases
    /// are always filed under the "Source Code" operating system. If the
    /// artifact was uploaded and anything fails, the upload is deleted.
    pub async fn create_release(
        &self,
        caller: &Caller,
        app: ApplicationId,
        fields: ReleaseFields,
        artifact: ArtifactSource,
    ) -> Result<Release, CatalogError> {
        let upload = artifact.uploaded().cloned();
        let result = self.try_create_release(caller, app, fields, &artifact).await;
        self.compensate(upload.as_ref(), result).await
    }

    async fn try_create_release(
        &self,
        caller: &Caller,
        app: ApplicationId,
        fields: ReleaseFields,
        artifact: &ArtifactSource,
    ) -> Result<Release, CatalogError> {
        caller.require_admin("create releases")?;
        self.get_application(caller, app).await?;

        let version_label = required_version(&fields.version_label)?;
        let operating_system =
            normalize_operating_system(fields.package_type, fields.operating_system.as_deref());
        let architectures = dedupe_architectures(fields.architectures);
        check_selectable(operating_system.as_deref(), &architectures)?;
        let (file_path, file_size_bytes) = self.measure(artifact).await?;

        let new = NewRelease {
            application_id: app,
            version_label,
            package_type: fields.package_type,
            operating_system,
            architectures,
            file_path,
            file_size_bytes,
            release_date: fields.release_date,
            notes: clean_text(fields.notes),
            sort_order: fields.sort_order,
        };
        let key = ReleaseKey {
            application_id: app,
            version_label: new.version_label.clone(),
            operating_system: new.operating_system.clone(),
            package_type: new.package_type,
        };

        let release = self
            .store
            .insert_release(new)
            .await
            .map_err(|e| release_write_error(e, key))?;
        self.refresh_os_flag(app).await;

        tracing::info!(
            application = %app,
            release = %release.id,
            version = %release.version_label,
            package_type = %release.package_type,
            "Created release"
        );
        Ok(release)
    }

    /// Apply a partial update to a release.
    ///
    /// Switching to `source` forces the "Source Code" operating system;
    /// switching away from `source` without naming a new operating system
    /// clears it. A new artifact is validated like on create, and the old
    /// file is deleted once the row points elsewhere if the catalog owned it.
    pub async fn update_release(
        &self,
        caller: &Caller,
        id: ReleaseId,
        patch: ReleasePatch,
    ) -> Result<Release, CatalogError> {
        let upload = patch.artifact.as_ref().and_then(ArtifactSource::uploaded).cloned();
        let result = self.try_update_release(caller, id, patch).await;
        self.compensate(upload.as_ref(), result).await
    }

    async fn try_update_release(
        &self,
        caller: &Caller,
        id: ReleaseId,
        patch: ReleasePatch,
    ) -> Result<Release, CatalogError> {
        caller.require_admin("edit releases")?;
        if patch.is_empty() {
            return Err(CatalogError::Validation("No fields to update".to_string()));
        }

        let current = self.get_release(caller, id).await?;
        let mut next = current.clone();

        if let Some(label) = &patch.version_label {
            next.version_label = required_version(label)?;
        }
        if let Some(package_type) = patch.package_type {
            next.package_type = package_type;
        }
        let leaving_source = current.package_type == PackageType::Source
            && next.package_type != PackageType::Source;
        let raw_os = match patch.operating_system {
            Patch::Unchanged if leaving_source => None,
            other => other.apply(current.operating_system.clone()),
        };
        next.operating_system = normalize_operating_system(next.package_type, raw_os.as_deref());
        if let Some(tags) = patch.architectures {
            next.architectures = dedupe_architectures(tags);
        }
        check_selectable(next.operating_system.as_deref(), &next.architectures)?;
        if let Some(artifact) = &patch.artifact {
            let (path, size) = self.measure(artifact).await?;
            next.file_path = path;
            next.file_size_bytes = size;
        }
        next.release_date = patch.release_date.apply(current.release_date);
        next.notes = clean_text(patch.notes.apply(current.notes.clone()));
        if let Some(sort_order) = patch.sort_order {
            next.sort_order = sort_order;
        }

        let key = next.key();
        let updated = self
            .store
            .update_release(next)
            .await
            .map_err(|e| release_write_error(e, key))?
            .ok_or_else(|| CatalogError::not_found("release", id))?;

        if updated.file_path != current.file_path {
            self.release_blob(&current.file_path).await;
        }
        self.refresh_os_flag(updated.application_id).await;

        tracing::info!(release = %id, "Updated release");
        Ok(updated)
    }

    /// Delete a release and, if the catalog owns it, its file.
    pub async fn delete_release(
        &self,
        caller: &Caller,
        id: ReleaseId,
    ) -> Result<Release, CatalogError> {
        caller.require_admin("delete releases")?;

        let release = self
            .store
            .delete_release(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("release", id))?;

        self.release_blob(&release.file_path).await;
        self.refresh_os_flag(release.application_id).await;

        tracing::info!(release = %id, version = %release.version_label, "Deleted release");
        Ok(release)
    }

    pub async fn get_release(
        &self,
        _caller: &Caller,
        id: ReleaseId,
    ) -> Result<Release, CatalogError> {
        self.store
            .get_release(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("release", id))
    }

    /// Releases of an application in display order.
    pub async fn list_releases(
        &self,
        caller: &Caller,
        app: ApplicationId,
    ) -> Result<Vec<Release>, CatalogError> {
        self.get_application(caller, app).await?;
        Ok(self.store.list_releases(app).await?)
    }

    /// Rank releases in the given order, first shown first.
    ///
    /// `order` must list every release of the application exactly once.
    /// Positions become absolute sort orders (`n - index`) written in one
    /// transaction.
    pub async fn reorder_releases(
        &self,
        caller: &Caller,
        app: ApplicationId,
        order: &[ReleaseId],
    ) -> Result<Vec<Release>, CatalogError> {
        caller.require_admin("reorder releases")?;
        let current = self.list_releases(caller, app).await?;

        let known: HashSet<ReleaseId> = current.iter().map(|r| r.id).collect();
        let given: HashSet<ReleaseId> = order.iter().copied().collect();
        if given.len() != order.len() || given != known {
            return Err(CatalogError::Validation(format!(
                "Reorder must list each of the {} releases exactly once",
                known.len()
            )));
        }

        let n = order.len() as i64;
        let assignments: Vec<(ReleaseId, i64)> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, n - i as i64))
            .collect();

        if !self.store.reorder_releases(app, assignments).await? {
            return Err(CatalogError::Validation(
                "Releases changed while reordering; nothing was applied".to_string(),
            ));
        }

        tracing::info!(application = %app, releases = n, "Reordered releases");
        Ok(self.store.list_releases(app).await?)
    }

    /// The variant tree of an application.
    pub async fn variants(
        &self,
        caller: &Caller,
        app: ApplicationId,
    ) -> Result<Vec<GroupedVersion>, CatalogError> {
        let releases = self.list_releases(caller, app).await?;
        Ok(group_releases(&releases))
    }

    /// Narrow an application's releases with `selection`.
    pub async fn resolve(
        &self,
        caller: &Caller,
        app: ApplicationId,
        selection: &Selection,
    ) -> Result<Resolution, CatalogError> {
        let tree = self.variants(caller, app).await?;
        Ok(resolve_selection(&tree, selection))
    }
}
