use depot_schema::{ApplicationId, Extra, ExtraId};

use super::{Caller, CatalogService};
use crate::blob::ArtifactSource;
use crate::error::CatalogError;
use crate::input::{ExtraFields, clean_text};
use crate::store::NewExtra;

impl CatalogService {
    /// Attach an auxiliary file to an application.
    pub async fn add_extra(
        &self,
        caller: &Caller,
        app: ApplicationId,
        fields: ExtraFields,
        artifact: ArtifactSource,
    ) -> Result<Extra, CatalogError> {
        let upload = artifact.uploaded().cloned();
        let result = self.try_add_extra(caller, app, fields, &artifact).await;
        self.compensate(upload.as_ref(), result).await
    }

    async fn try_add_extra(
        &self,
        caller: &Caller,
        app: ApplicationId,
        fields: ExtraFields,
        artifact: &ArtifactSource,
    ) -> Result<Extra, CatalogError> {
        caller.require_admin("add extras")?;
        self.get_application(caller, app).await?;

        let name = fields.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation("Extra name is required".to_string()));
        }
        let (file_path, file_size_bytes) = self.measure(artifact).await?;

        let extra = self
            .store
            .insert_extra(NewExtra {
                application_id: app,
                name,
                file_path,
                file_size_bytes,
                notes: clean_text(fields.notes),
            })
            .await?;

        tracing::info!(application = %app, extra = %extra.id, name = %extra.name, "Added extra");
        Ok(extra)
    }

    pub async fn list_extras(
        &self,
        caller: &Caller,
        app: ApplicationId,
    ) -> Result<Vec<Extra>, CatalogError> {
        self.get_application(caller, app).await?;
        Ok(self.store.list_extras(app).await?)
    }

    /// Remove an extra and, if the catalog owns it, its file.
    pub async fn delete_extra(&self, caller: &Caller, id: ExtraId) -> Result<Extra, CatalogError> {
        caller.require_admin("delete extras")?;

        let extra = self
            .store
            .delete_extra(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("extra", id))?;
        self.release_blob(&extra.file_path).await;

        tracing::info!(extra = %id, name = %extra.name, "Deleted extra");
        Ok(extra)
    }
}
