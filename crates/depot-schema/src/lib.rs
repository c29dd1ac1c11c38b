//! Catalog entities and the release variant model.
//!
//! This crate has no I/O. It defines what an application and its releases
//! look like, and how a flat list of releases fans out into the
//! operating system → architecture → package type tree that clients narrow
//! down to a single downloadable artifact.

pub mod arch;
pub mod ids;
pub mod os;
pub mod select;
pub mod types;
pub mod variant;

// Re-exports
pub use arch::Architecture;
pub use ids::{ApplicationId, DownloadId, ExtraId, ReleaseId, UserId};
pub use os::{SOURCE_CODE_OS, normalize_operating_system};
pub use select::{
    ArchitectureKey, Axis, OperatingSystemKey, Resolution, Selection, resolve_selection,
};
pub use types::*;
pub use variant::{ArchitectureGroup, GroupedVersion, VariantError, check_integrity, group_releases};
