//! Release management commands

use anyhow::Result;
use chrono::NaiveDate;
use depot_core::{ReleaseFields, ReleasePatch};
use depot_schema::{Architecture, PackageType, ReleaseId};

use super::{Session, field_patch};
use crate::ui::list::{print_done, print_release_detail};
use crate::{ArtifactArgs, OptionalArtifactArgs, ReleaseField};

/// Canonical architecture tags from `--arch` values.
pub fn architectures(raw: &[String]) -> Vec<Architecture> {
    Architecture::parse_list(&raw.join(","))
}

/// Flags of `depot release edit`.
#[derive(Debug, Clone, Default)]
pub struct ReleaseEdit {
    pub version_label: Option<String>,
    pub package_type: Option<PackageType>,
    pub os: Option<String>,
    pub architectures: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub sort_order: Option<i64>,
    pub clear: Vec<ReleaseField>,
}

impl ReleaseEdit {
    fn into_patch(self) -> ReleasePatch {
        let cleared = |field| self.clear.contains(&field);
        let architectures = match &self.architectures {
            Some(raw) => Some(architectures(raw)),
            None if cleared(ReleaseField::Arch) => Some(Vec::new()),
            None => None,
        };
        ReleasePatch {
            operating_system: field_patch(self.os.clone(), cleared(ReleaseField::Os)),
            release_date: field_patch(self.date, cleared(ReleaseField::Date)),
            notes: field_patch(self.notes.clone(), cleared(ReleaseField::Notes)),
            architectures,
            version_label: self.version_label,
            package_type: self.package_type,
            artifact: None,
            sort_order: self.sort_order,
        }
    }
}

pub async fn add(
    session: &Session,
    key: &str,
    fields: ReleaseFields,
    artifact: &ArtifactArgs,
) -> Result<()> {
    let app = session.application(key).await?;
    let artifact = session.artifact(artifact).await?;

    let release = session
        .service
        .create_release(&session.caller, app.id, fields, artifact)
        .await?;

    print_done(&format!(
        "Added release {} to {}",
        release.key(),
        app.name
    ));
    print_release_detail(&release);
    Ok(())
}

pub async fn edit(
    session: &Session,
    id: ReleaseId,
    edit: ReleaseEdit,
    artifact: &OptionalArtifactArgs,
) -> Result<()> {
    let mut patch = edit.into_patch();
    patch.artifact = session.optional_artifact(artifact).await?;

    let release = session
        .service
        .update_release(&session.caller, id, patch)
        .await?;

    print_done(&format!("Updated release #{id}"));
    print_release_detail(&release);
    Ok(())
}

pub async fn remove(session: &Session, id: ReleaseId) -> Result<()> {
    let release = session.service.delete_release(&session.caller, id).await?;
    print_done(&format!("Deleted release {}", release.key()));
    Ok(())
}

pub async fn reorder(session: &Session, key: &str, ids: &[ReleaseId]) -> Result<()> {
    let app = session.application(key).await?;
    let releases = session
        .service
        .reorder_releases(&session.caller, app.id, ids)
        .await?;

    print_done(&format!("Reordered {} releases of {}", releases.len(), app.name));
    for release in &releases {
        println!(
            "    #{:<5} {} {}",
            release.id.get(),
            release.version_label,
            release.package_type
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::Patch;

    #[test]
    fn test_architectures_canonicalize_and_dedupe() {
        let raw = vec!["amd64,arm64".to_string(), "x64".to_string()];
        let tags = architectures(&raw);
        assert_eq!(
            tags,
            vec![Architecture::new("x86_64"), Architecture::new("arm64")]
        );
    }

    #[test]
    fn test_edit_flags_map_to_patch() {
        let edit = ReleaseEdit {
            os: Some("Linux".to_string()),
            clear: vec![ReleaseField::Notes, ReleaseField::Arch],
            ..Default::default()
        };
        let patch = edit.into_patch();
        assert_eq!(patch.operating_system, Patch::Set("Linux".to_string()));
        assert_eq!(patch.notes, Patch::Clear);
        assert_eq!(patch.release_date, Patch::Unchanged);
        assert_eq!(patch.architectures, Some(Vec::new()));
        assert!(patch.version_label.is_none());
    }

    #[test]
    fn test_value_wins_over_clear() {
        let edit = ReleaseEdit {
            notes: Some("fixed".to_string()),
            clear: vec![ReleaseField::Notes],
            ..Default::default()
        };
        assert_eq!(edit.into_patch().notes, Patch::Set("fixed".to_string()));
    }
}
