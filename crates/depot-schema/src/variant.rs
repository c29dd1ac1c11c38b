//! Release variant grouping.
//!
//! One logical version of an application can fan out across operating
//! systems, architectures and package types. [`group_releases`] turns the
//! flat release list into the tree clients walk:
//!
//! ```text
//! (version label, operating system)      GroupedVersion
//!   └── architecture tag | default       ArchitectureGroup
//!         └── installer / portable / ..  Release
//! ```
//!
//! A release tagged with several architectures appears under each of them.

use serde::{Deserialize, Serialize};

use crate::arch::Architecture;
use crate::ids::ReleaseId;
use crate::types::{PackageType, Release, sort_for_display};

/// Releases sharing a version label and operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedVersion {
    /// Version label shared by every release in the group.
    pub version_label: String,
    /// Operating system shared by every release in the group.
    pub operating_system: Option<String>,
    /// One entry per architecture tag, plus the default slot for untagged releases.
    pub architecture_groups: Vec<ArchitectureGroup>,
}

/// Releases sharing (version label, operating system, architecture).
///
/// Within a group the package type tells releases apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureGroup {
    /// Architecture tag, or `None` for the default slot.
    pub architecture: Option<Architecture>,
    /// Releases ordered by package type.
    pub releases: Vec<Release>,
}

/// Integrity problems found in a grouped tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    /// Two releases occupy the same (version, OS, architecture, package type) slot.
    #[error(
        "Releases {first} and {second} both provide {package_type} for version '{version_label}'"
    )]
    DuplicatePackageType {
        /// Version label of the offending group.
        version_label: String,
        /// Package type that appears twice.
        package_type: PackageType,
        /// First release in the slot.
        first: ReleaseId,
        /// Second release in the slot.
        second: ReleaseId,
    },
}

impl GroupedVersion {
    /// Compact descriptor such as `(Installer, x86_64)`.
    ///
    /// Only available when the version resolves to a single release, so a
    /// listing can show everything about it on one line.
    pub fn summary(&self) -> Option<String> {
        let [group] = self.architecture_groups.as_slice() else {
            return None;
        };
        let [release] = group.releases.as_slice() else {
            return None;
        };
        Some(match &group.architecture {
            Some(arch) => format!("({}, {arch})", release.package_type.label()),
            None => format!("({})", release.package_type.label()),
        })
    }

    /// Every release in this group, once each, in display order.
    pub fn releases(&self) -> Vec<&Release> {
        let mut out: Vec<&Release> = Vec::new();
        for group in &self.architecture_groups {
            for release in &group.releases {
                if !out.iter().any(|r| r.id == release.id) {
                    out.push(release);
                }
            }
        }
        out.sort_by(|a, b| a.display_cmp(b));
        out
    }
}

/// Group a flat release list into the variant tree.
///
/// The input is ranked for display first, so every permutation of the
/// same releases produces the same tree in the same order.
pub fn group_releases(releases: &[Release]) -> Vec<GroupedVersion> {
    let mut ranked = releases.to_vec();
    sort_for_display(&mut ranked);

    let mut grouped: Vec<GroupedVersion> = Vec::new();
    for release in ranked {
        let idx = if let Some(idx) = grouped.iter().position(|g| {
            g.version_label == release.version_label
                && g.operating_system == release.operating_system
        }) {
            idx
        } else {
            grouped.push(GroupedVersion {
                version_label: release.version_label.clone(),
                operating_system: release.operating_system.clone(),
                architecture_groups: Vec::new(),
            });
            grouped.len() - 1
        };
        let version = &mut grouped[idx];

        let slots: Vec<Option<Architecture>> = if release.architectures.is_empty() {
            vec![None]
        } else {
            release.architectures.iter().cloned().map(Some).collect()
        };

        for slot in slots {
            match version
                .architecture_groups
                .iter_mut()
                .find(|g| g.architecture == slot)
            {
                Some(group) => group.releases.push(release.clone()),
                None => version.architecture_groups.push(ArchitectureGroup {
                    architecture: slot,
                    releases: vec![release.clone()],
                }),
            }
        }
    }

    for version in &mut grouped {
        for group in &mut version.architecture_groups {
            group
                .releases
                .sort_by(|a, b| a.package_type.cmp(&b.package_type).then(a.display_cmp(b)));
        }
    }

    grouped
}

/// Report every slot holding two releases of the same package type.
///
/// The catalog store rejects such rows at write time; this is the
/// read-side check for data that predates the constraint.
pub fn check_integrity(tree: &[GroupedVersion]) -> Vec<VariantError> {
    let mut errors = Vec::new();
    for version in tree {
        for group in &version.architecture_groups {
            for pair in group.releases.windows(2) {
                if pair[0].package_type == pair[1].package_type {
                    errors.push(VariantError::DuplicatePackageType {
                        version_label: version.version_label.clone(),
                        package_type: pair[0].package_type,
                        first: pair[0].id,
                        second: pair[1].id,
                    });
                }
            }
        }
    }
    errors
}
