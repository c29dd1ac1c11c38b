//! Operating system labels.
//!
//! Operating systems are free text chosen by the operator. Two rules apply
//! everywhere: source bundles always carry the fixed [`SOURCE_CODE_OS`]
//! label, and blank labels mean "no operating system".

use std::cmp::Ordering;

use crate::types::PackageType;

/// Label every `source` release is filed under, whatever the caller sent.
pub const SOURCE_CODE_OS: &str = "Source Code";

/// Labels with a fixed position at the top of every operating system list.
const PREFERRED_ORDER: [&str; 4] = ["Windows", "macOS", "Linux", SOURCE_CODE_OS];

/// Normalize the operating system of a release given its package type.
///
/// # Example
///
/// ```
/// use depot_schema::{PackageType, normalize_operating_system};
///
/// assert_eq!(
///     normalize_operating_system(PackageType::Source, Some("Windows")).as_deref(),
///     Some("Source Code")
/// );
/// assert_eq!(normalize_operating_system(PackageType::Installer, Some("  ")), None);
/// ```
pub fn normalize_operating_system(package_type: PackageType, raw: Option<&str>) -> Option<String> {
    if package_type == PackageType::Source {
        return Some(SOURCE_CODE_OS.to_string());
    }
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Compare two operating system labels for display.
///
/// Windows, macOS, Linux and Source Code come first in that order; any
/// other label follows alphabetically.
pub fn compare_operating_systems(a: &str, b: &str) -> Ordering {
    let rank = |s: &str| PREFERRED_ORDER.iter().position(|p| p.eq_ignore_ascii_case(s));
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_forces_label() {
        assert_eq!(
            normalize_operating_system(PackageType::Source, None).as_deref(),
            Some(SOURCE_CODE_OS)
        );
        assert_eq!(
            normalize_operating_system(PackageType::Portable, Some(" Linux ")).as_deref(),
            Some("Linux")
        );
        assert_eq!(normalize_operating_system(PackageType::Installer, None), None);
    }

    #[test]
    fn test_display_order() {
        let mut labels = vec!["Linux", "FreeBSD", "Source Code", "windows", "Android", "macOS"];
        labels.sort_by(|a, b| compare_operating_systems(a, b));
        assert_eq!(
            labels,
            vec!["windows", "macOS", "Linux", "Source Code", "Android", "FreeBSD"]
        );
    }
}
