use depot_schema::{Application, ApplicationId, ApplicationSummary, normalize_tags};

use super::{Caller, CatalogService};
use crate::error::CatalogError;
use crate::input::{ApplicationFields, ApplicationPatch, clean_text};
use crate::store::NewApplication;

fn required_name(name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation(
            "Application name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

impl CatalogService {
    pub async fn create_application(
        &self,
        caller: &Caller,
        fields: ApplicationFields,
    ) -> Result<Application, CatalogError> {
        caller.require_admin("create applications")?;

        let app = self
            .store
            .insert_application(NewApplication {
                name: required_name(&fields.name)?,
                description: clean_text(fields.description),
                developer: clean_text(fields.developer),
                publisher: clean_text(fields.publisher),
                icon_url: clean_text(fields.icon_url),
                homepage: clean_text(fields.homepage),
                tags: normalize_tags(fields.tags),
            })
            .await?;

        tracing::info!(application = %app.id, name = %app.name, "Created application");
        Ok(app)
    }

    pub async fn update_application(
        &self,
        caller: &Caller,
        id: ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, CatalogError> {
        caller.require_admin("edit applications")?;
        if patch.is_empty() {
            return Err(CatalogError::Validation("No fields to update".to_string()));
        }

        let mut app = self.get_application(caller, id).await?;
        if let Some(name) = patch.name {
            app.name = required_name(&name)?;
        }
        app.description = clean_text(patch.description.apply(app.description));
        app.developer = clean_text(patch.developer.apply(app.developer));
        app.publisher = clean_text(patch.publisher.apply(app.publisher));
        app.icon_url = clean_text(patch.icon_url.apply(app.icon_url));
        app.homepage = clean_text(patch.homepage.apply(app.homepage));
        if let Some(tags) = patch.tags {
            app.tags = normalize_tags(tags);
        }

        let app = self
            .store
            .update_application(app)
            .await?
            .ok_or_else(|| CatalogError::not_found("application", id))?;

        tracing::info!(application = %app.id, "Updated application");
        Ok(app)
    }

    pub async fn get_application(
        &self,
        _caller: &Caller,
        id: ApplicationId,
    ) -> Result<Application, CatalogError> {
        self.store
            .get_application(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("application", id))
    }

    /// Look an application up by numeric id or, failing that, by name.
    ///
    /// Names are not unique; a name shared by several applications is a
    /// validation error that asks for the id instead.
    pub async fn find_application(
        &self,
        caller: &Caller,
        key: &str,
    ) -> Result<Application, CatalogError> {
        if let Ok(id) = key.parse::<ApplicationId>() {
            return self.get_application(caller, id).await;
        }

        let wanted = key.trim();
        let mut matches: Vec<Application> = self
            .store
            .list_applications()
            .await?
            .into_iter()
            .map(|s| s.application)
            .filter(|a| a.name.eq_ignore_ascii_case(wanted))
            .collect();

        match matches.len() {
            0 => Err(CatalogError::not_found("application", format!("'{wanted}'"))),
            1 => Ok(matches.remove(0)),
            n => Err(CatalogError::Validation(format!(
                "{n} applications are named '{wanted}'; use the id instead"
            ))),
        }
    }

    pub async fn list_applications(
        &self,
        _caller: &Caller,
    ) -> Result<Vec<ApplicationSummary>, CatalogError> {
        Ok(self.store.list_applications().await?)
    }

    /// Delete an application with all its releases and extras.
    ///
    /// Managed files are removed first, one by one; a file that cannot be
    /// removed is logged and does not stop the cascade.
    pub async fn delete_application(
        &self,
        caller: &Caller,
        id: ApplicationId,
    ) -> Result<(), CatalogError> {
        caller.require_admin("delete applications")?;
        let app = self.get_application(caller, id).await?;

        let releases = self.store.list_releases(id).await?;
        let extras = self.store.list_extras(id).await?;
        for path in releases
            .iter()
            .map(|r| &r.file_path)
            .chain(extras.iter().map(|e| &e.file_path))
        {
            self.release_blob(path).await;
        }

        if !self.store.delete_application(id).await? {
            return Err(CatalogError::not_found("application", id));
        }

        tracing::info!(
            application = %id,
            name = %app.name,
            releases = releases.len(),
            extras = extras.len(),
            "Deleted application"
        );
        Ok(())
    }
}
