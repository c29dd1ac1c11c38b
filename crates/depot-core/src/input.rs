//! Operation payloads.
//!
//! Create payloads carry every field. Update payloads separate the two ways
//! a field can be left alone or changed: non-nullable fields are
//! `Option<T>` (`None` leaves the value as is), nullable fields are
//! [`Patch<T>`], which can also clear the value.

use chrono::NaiveDate;
use depot_schema::{Architecture, PackageType};

use crate::blob::ArtifactSource;

/// Change to a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Keep the stored value.
    #[default]
    Unchanged,
    /// Set the field to null.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// The value after applying this patch to `current`.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unchanged => current,
            Self::Clear => None,
            Self::Set(v) => Some(v),
        }
    }
}

/// New application.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFields {
    pub name: String,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub icon_url: Option<String>,
    pub homepage: Option<String>,
    pub tags: Vec<String>,
}

/// Partial application update.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub name: Option<String>,
    pub description: Patch<String>,
    pub developer: Patch<String>,
    pub publisher: Patch<String>,
    pub icon_url: Patch<String>,
    pub homepage: Patch<String>,
    /// Replaces the whole tag set; `Some(vec![])` removes every tag.
    pub tags: Option<Vec<String>>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_unchanged()
            && self.developer.is_unchanged()
            && self.publisher.is_unchanged()
            && self.icon_url.is_unchanged()
            && self.homepage.is_unchanged()
            && self.tags.is_none()
    }
}

/// New release. The artifact is passed separately.
#[derive(Debug, Clone, Default)]
pub struct ReleaseFields {
    pub version_label: String,
    pub package_type: PackageType,
    /// Ignored for source releases.
    pub operating_system: Option<String>,
    pub architectures: Vec<Architecture>,
    pub release_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub sort_order: i64,
}

/// Partial release update.
#[derive(Debug, Clone, Default)]
pub struct ReleasePatch {
    pub version_label: Option<String>,
    pub package_type: Option<PackageType>,
    pub operating_system: Patch<String>,
    /// Replaces every tag; `Some(vec![])` moves the release to the default slot.
    pub architectures: Option<Vec<Architecture>>,
    /// New backing file, validated and measured like on create.
    pub artifact: Option<ArtifactSource>,
    pub release_date: Patch<NaiveDate>,
    pub notes: Patch<String>,
    pub sort_order: Option<i64>,
}

impl ReleasePatch {
    pub fn is_empty(&self) -> bool {
        self.version_label.is_none()
            && self.package_type.is_none()
            && self.operating_system.is_unchanged()
            && self.architectures.is_none()
            && self.artifact.is_none()
            && self.release_date.is_unchanged()
            && self.notes.is_unchanged()
            && self.sort_order.is_none()
    }
}

/// New auxiliary file. The artifact is passed separately.
#[derive(Debug, Clone, Default)]
pub struct ExtraFields {
    pub name: String,
    pub notes: Option<String>,
}

/// Trim optional free text; blank means absent.
pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_apply() {
        assert_eq!(Patch::Unchanged.apply(Some(1)), Some(1));
        assert_eq!(Patch::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(Patch::Set(2).apply(None), Some(2));
    }

    #[test]
    fn test_empty_patches() {
        assert!(ReleasePatch::default().is_empty());
        let patch = ReleasePatch {
            notes: Patch::Clear,
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(ApplicationPatch::default().is_empty());
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  hi ".into())).as_deref(), Some("hi"));
        assert_eq!(clean_text(Some("   ".into())), None);
        assert_eq!(clean_text(None), None);
    }
}
