//! Catalog records: applications, releases, extras and the download log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::arch::Architecture;
use crate::ids::{ApplicationId, DownloadId, ExtraId, ReleaseId, UserId};

/// How a release is meant to be used. This is a closed set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    /// Runs an installer that places the application on the system (default).
    #[default]
    Installer,
    /// Self-contained archive or executable that runs without installation.
    Portable,
    /// Source bundle; always filed under the "Source Code" operating system.
    Source,
}

/// A package type string outside `installer`, `portable` and `source`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid package type '{0}': must be installer, portable, or source")]
pub struct InvalidPackageType(pub String);

impl PackageType {
    /// Every package type, in display order.
    pub const ALL: [Self; 3] = [Self::Installer, Self::Portable, Self::Source];

    /// Wire representation (`installer`, `portable`, `source`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installer => "installer",
            Self::Portable => "portable",
            Self::Source => "source",
        }
    }

    /// Capitalized label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Installer => "Installer",
            Self::Portable => "Portable",
            Self::Source => "Source",
        }
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PackageType {
    type Err = InvalidPackageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "installer" => Ok(Self::Installer),
            "portable" => Ok(Self::Portable),
            "source" => Ok(Self::Source),
            _ => Err(InvalidPackageType(s.to_string())),
        }
    }
}

/// One concrete downloadable artifact of an application.
///
/// A release is scoped by version label, operating system, architecture
/// tags and package type. The tuple `(application_id, version_label,
/// operating_system, package_type)` is unique; architecture tags are not
/// part of that key, a single row may carry several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Row identifier.
    pub id: ReleaseId,
    /// Owning application.
    pub application_id: ApplicationId,
    /// Free-text version label (e.g. "2.4.1"); not unique on its own.
    pub version_label: String,
    /// Installer, portable or source.
    #[serde(rename = "version_type")]
    pub package_type: PackageType,
    /// Normalized operating system label, if any.
    pub operating_system: Option<String>,
    /// Architecture tags; empty means the default (untagged) slot.
    #[serde(rename = "architecture")]
    pub architectures: Vec<Architecture>,
    /// Backing file: a managed upload or an operator-supplied path.
    pub file_path: PathBuf,
    /// Size of the backing file in bytes.
    #[serde(rename = "file_size")]
    pub file_size_bytes: u64,
    /// Operator-supplied release date.
    pub release_date: Option<NaiveDate>,
    /// When the row was created.
    pub uploaded_at: DateTime<Utc>,
    /// Release notes.
    pub notes: Option<String>,
    /// Manual ranking; higher is shown first.
    pub sort_order: i64,
}

/// The uniqueness key of a release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReleaseKey {
    /// Owning application.
    pub application_id: ApplicationId,
    /// Version label.
    pub version_label: String,
    /// Normalized operating system, if any.
    pub operating_system: Option<String>,
    /// Package type.
    pub package_type: PackageType,
}

impl std::fmt::Display for ReleaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "application {} version '{}' ({}, {})",
            self.application_id,
            self.version_label,
            self.operating_system.as_deref().unwrap_or("no operating system"),
            self.package_type
        )
    }
}

impl Release {
    /// The date shown to users: the release date when known, else the upload date.
    pub fn display_date(&self) -> NaiveDate {
        self.release_date
            .unwrap_or_else(|| self.uploaded_at.date_naive())
    }

    /// The uniqueness key of this release.
    pub fn key(&self) -> ReleaseKey {
        ReleaseKey {
            application_id: self.application_id,
            version_label: self.version_label.clone(),
            operating_system: self.operating_system.clone(),
            package_type: self.package_type,
        }
    }

    /// File name offered to downloaders.
    pub fn file_name(&self) -> Option<&str> {
        self.file_path.file_name().and_then(|n| n.to_str())
    }

    /// Display ranking: `sort_order` descending, newest upload first, then id.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .sort_order
            .cmp(&self.sort_order)
            .then_with(|| other.uploaded_at.cmp(&self.uploaded_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort releases into display order in place.
pub fn sort_for_display(releases: &mut [Release]) {
    releases.sort_by(Release::display_cmp);
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Row identifier.
    pub id: ApplicationId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Who wrote the software.
    pub developer: Option<String>,
    /// Who distributes the software.
    pub publisher: Option<String>,
    /// Reference to an icon image.
    pub icon_url: Option<String>,
    /// Project homepage.
    pub homepage: Option<String>,
    /// Unordered tags.
    pub tags: BTreeSet<String>,
    /// Derived: releases span two or more named operating systems.
    #[serde(rename = "has_multiple_os")]
    pub has_multiple_operating_systems: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Normalize a tag set: trimmed, blanks dropped, de-duplicated.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// An application together with listing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    /// The application row.
    #[serde(flatten)]
    pub application: Application,
    /// Number of releases.
    pub version_count: u64,
    /// Version label of the top-ranked release.
    pub latest_version: Option<String>,
}

/// Append-only record of a download request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLogEntry {
    /// Row identifier.
    pub id: DownloadId,
    /// Who asked for the file.
    pub user_id: UserId,
    /// Which release was requested.
    #[serde(rename = "version_id")]
    pub release_id: ReleaseId,
    /// When the request started.
    pub downloaded_at: DateTime<Utc>,
}

/// An auxiliary file attached to an application (manuals, plugins, keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    /// Row identifier.
    pub id: ExtraId,
    /// Owning application.
    pub application_id: ApplicationId,
    /// Display name.
    pub name: String,
    /// Backing file: a managed upload or an operator-supplied path.
    pub file_path: PathBuf,
    /// Size of the backing file in bytes.
    #[serde(rename = "file_size")]
    pub file_size_bytes: u64,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the row was created.
    pub uploaded_at: DateTime<Utc>,
}

impl Extra {
    /// File name offered to downloaders.
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.file_path).file_name().and_then(|n| n.to_str())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Build a release with sensible defaults for tests.
    pub(crate) fn release(
        id: i64,
        version: &str,
        os: Option<&str>,
        package_type: PackageType,
        archs: &[&str],
    ) -> Release {
        Release {
            id: ReleaseId(id),
            application_id: ApplicationId(1),
            version_label: version.to_string(),
            package_type,
            operating_system: crate::os::normalize_operating_system(package_type, os),
            architectures: Architecture::normalize_all(archs),
            file_path: PathBuf::from(format!("/srv/files/{id}.bin")),
            file_size_bytes: 1024,
            release_date: None,
            uploaded_at: Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
            notes: None,
            sort_order: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::release;
    use super::*;

    #[test]
    fn test_package_type_parse() {
        assert_eq!("Portable".parse::<PackageType>().unwrap(), PackageType::Portable);
        assert_eq!(" source ".parse::<PackageType>().unwrap(), PackageType::Source);
        let err = "msi".parse::<PackageType>().unwrap_err();
        assert_eq!(err, InvalidPackageType("msi".to_string()));
    }

    #[test]
    fn test_release_wire_names() {
        let r = release(7, "1.0", Some("Windows"), PackageType::Installer, &["amd64"]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["version_type"], "installer");
        assert_eq!(json["operating_system"], "Windows");
        assert_eq!(json["architecture"], serde_json::json!(["x86_64"]));
        assert_eq!(json["sort_order"], 0);
    }

    #[test]
    fn test_display_date_prefers_release_date() {
        let mut r = release(1, "1.0", None, PackageType::Installer, &[]);
        assert_eq!(r.display_date(), r.uploaded_at.date_naive());
        let date = NaiveDate::from_ymd_opt(2020, 5, 17).unwrap();
        r.release_date = Some(date);
        assert_eq!(r.display_date(), date);
    }

    #[test]
    fn test_display_ranking() {
        let mut a = release(1, "1.0", None, PackageType::Installer, &[]);
        let b = release(2, "1.1", None, PackageType::Installer, &[]);
        let mut releases = vec![a.clone(), b.clone()];
        sort_for_display(&mut releases);
        // Same sort order: newest upload first.
        assert_eq!(releases[0].id, b.id);

        a.sort_order = 5;
        let mut releases = vec![b, a];
        sort_for_display(&mut releases);
        assert_eq!(releases[0].id, ReleaseId(1));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["  editor", "", "ide", "editor"]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["editor", "ide"]);
    }
}
