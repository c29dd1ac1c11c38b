//! Narrowing a variant tree down to one release.
//!
//! Clients collect choices one axis at a time (operating system, version,
//! architecture, package type) and call [`resolve_selection`] after each
//! one. The function keeps no state: every call starts again from the full
//! tree with whatever choices are present.
//!
//! Most applications ship one release per version, so the resolver skips
//! any axis that offers a single option and stops as soon as one release
//! is left. A simple catalog entry therefore resolves with no choices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::arch::Architecture;
use crate::os::compare_operating_systems;
use crate::types::{PackageType, Release};
use crate::variant::GroupedVersion;

/// One level of the variant tree, in the order choices are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Which platform the release targets.
    OperatingSystem,
    /// Which version label.
    Version,
    /// Which CPU architecture.
    Architecture,
    /// Installer, portable or source.
    PackageType,
}

impl Axis {
    /// Axes in the order they are narrowed.
    pub const ORDER: [Self; 4] = [
        Self::OperatingSystem,
        Self::Version,
        Self::Architecture,
        Self::PackageType,
    ];

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OperatingSystem => "operating system",
            Self::Version => "version",
            Self::Architecture => "architecture",
            Self::PackageType => "package type",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operating system choice.
///
/// Releases without an operating system can still be picked explicitly
/// through [`OperatingSystemKey::Unspecified`], spelled `unspecified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatingSystemKey {
    /// Releases with no operating system.
    Unspecified,
    /// Releases with this exact label.
    Named(String),
}

impl OperatingSystemKey {
    const UNSPECIFIED: &'static str = "unspecified";

    /// Whether `label` would parse as [`Self::Unspecified`], so a release
    /// filed under it could never be chosen by name.
    pub fn is_reserved(label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(Self::UNSPECIFIED)
    }

    /// Key of a release's operating system.
    pub fn of(os: Option<&str>) -> Self {
        os.map_or(Self::Unspecified, |s| Self::Named(s.to_string()))
    }

    /// Whether a release with operating system `os` matches this key.
    pub fn matches(&self, os: Option<&str>) -> bool {
        match (self, os) {
            (Self::Unspecified, None) => true,
            (Self::Named(want), Some(have)) => want == have,
            _ => false,
        }
    }
}

impl std::fmt::Display for OperatingSystemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unspecified => write!(f, "{}", Self::UNSPECIFIED),
            Self::Named(s) => write!(f, "{s}"),
        }
    }
}

impl std::str::FromStr for OperatingSystemKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if Self::is_reserved(s) {
            Ok(Self::Unspecified)
        } else {
            Ok(Self::Named(s.to_string()))
        }
    }
}

impl From<&str> for OperatingSystemKey {
    fn from(s: &str) -> Self {
        Self::Named(s.to_string())
    }
}

/// An architecture choice; `default` selects untagged releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArchitectureKey {
    /// The slot for releases without architecture tags.
    Default,
    /// Releases carrying this tag.
    Tag(Architecture),
}

impl ArchitectureKey {
    const DEFAULT: &'static str = "default";

    /// Whether `tag` would parse as [`Self::Default`] instead of a tag.
    pub fn is_reserved(tag: &str) -> bool {
        tag.trim().eq_ignore_ascii_case(Self::DEFAULT)
    }

    /// Key of an architecture slot.
    pub fn of(arch: Option<&Architecture>) -> Self {
        arch.map_or(Self::Default, |a| Self::Tag(a.clone()))
    }

    /// Whether the slot `arch` matches this key.
    pub fn matches(&self, arch: Option<&Architecture>) -> bool {
        match (self, arch) {
            (Self::Default, None) => true,
            (Self::Tag(want), Some(have)) => want == have,
            _ => false,
        }
    }
}

impl std::fmt::Display for ArchitectureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "{}", Self::DEFAULT),
            Self::Tag(a) => write!(f, "{a}"),
        }
    }
}

impl std::str::FromStr for ArchitectureKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_reserved(s) {
            Ok(Self::Default)
        } else {
            Ok(Self::Tag(Architecture::new(s)))
        }
    }
}

impl From<&str> for ArchitectureKey {
    fn from(s: &str) -> Self {
        Self::Tag(Architecture::new(s))
    }
}

/// The choices a client has made so far. Unset fields are open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Chosen operating system.
    pub operating_system: Option<OperatingSystemKey>,
    /// Chosen version label.
    pub version_label: Option<String>,
    /// Chosen architecture slot.
    pub architecture: Option<ArchitectureKey>,
    /// Chosen package type.
    pub package_type: Option<PackageType>,
}

impl Selection {
    /// Set the operating system choice.
    pub fn with_operating_system(mut self, os: impl Into<OperatingSystemKey>) -> Self {
        self.operating_system = Some(os.into());
        self
    }

    /// Set the version choice.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version_label = Some(version.into());
        self
    }

    /// Set the architecture choice.
    pub fn with_architecture(mut self, arch: impl Into<ArchitectureKey>) -> Self {
        self.architecture = Some(arch.into());
        self
    }

    /// Set the package type choice.
    pub fn with_package_type(mut self, package_type: PackageType) -> Self {
        self.package_type = Some(package_type);
        self
    }

    /// Whether a choice was made on `axis`.
    pub fn is_set(&self, axis: Axis) -> bool {
        match axis {
            Axis::OperatingSystem => self.operating_system.is_some(),
            Axis::Version => self.version_label.is_some(),
            Axis::Architecture => self.architecture.is_some(),
            Axis::PackageType => self.package_type.is_some(),
        }
    }

    /// Clear the choice on `axis` and every axis after it.
    ///
    /// Call this after a [`Resolution::NoMatch`] to drop stale choices.
    pub fn reset_from(&mut self, axis: Axis) {
        for a in Axis::ORDER.into_iter().filter(|a| *a >= axis) {
            match a {
                Axis::OperatingSystem => self.operating_system = None,
                Axis::Version => self.version_label = None,
                Axis::Architecture => self.architecture = None,
                Axis::PackageType => self.package_type = None,
            }
        }
    }

    fn accepts(&self, axis: Axis, candidate: &Candidate<'_>) -> bool {
        match axis {
            Axis::OperatingSystem => self
                .operating_system
                .as_ref()
                .is_none_or(|k| k.matches(candidate.release.operating_system.as_deref())),
            Axis::Version => self
                .version_label
                .as_deref()
                .is_none_or(|v| v.trim() == candidate.release.version_label),
            Axis::Architecture => self
                .architecture
                .as_ref()
                .is_none_or(|k| k.matches(candidate.architecture)),
            Axis::PackageType => self
                .package_type
                .is_none_or(|t| t == candidate.release.package_type),
        }
    }
}

/// Outcome of narrowing a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Exactly one release matches.
    Resolved(Release),
    /// Several releases remain; the client must choose on `axis`.
    NeedsMoreInput {
        /// The next axis to ask about.
        axis: Axis,
        /// Values on that axis, in display order, parseable back into a choice.
        options: Vec<String>,
    },
    /// A choice matched nothing. `axis` is `None` when there are no releases at all.
    NoMatch {
        /// The first axis whose choice eliminated every candidate.
        axis: Option<Axis>,
    },
}

impl Resolution {
    /// The resolved release, if any.
    pub fn release(&self) -> Option<&Release> {
        match self {
            Self::Resolved(r) => Some(r),
            _ => None,
        }
    }
}

/// A release as seen from one architecture slot of the tree.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    architecture: Option<&'a Architecture>,
    release: &'a Release,
}

fn flatten(tree: &[GroupedVersion]) -> Vec<Candidate<'_>> {
    tree.iter()
        .flat_map(|version| version.architecture_groups.iter())
        .flat_map(|group| {
            group.releases.iter().map(move |release| Candidate {
                architecture: group.architecture.as_ref(),
                release,
            })
        })
        .collect()
}

fn single_release<'a>(candidates: &[Candidate<'a>]) -> Option<&'a Release> {
    let first = candidates.first()?.release;
    candidates
        .iter()
        .all(|c| c.release.id == first.id)
        .then_some(first)
}

fn options_for(axis: Axis, candidates: &[Candidate<'_>]) -> Vec<String> {
    match axis {
        Axis::OperatingSystem => {
            let keys: BTreeSet<OperatingSystemKey> = candidates
                .iter()
                .map(|c| OperatingSystemKey::of(c.release.operating_system.as_deref()))
                .collect();
            let mut keys: Vec<OperatingSystemKey> = keys.into_iter().collect();
            keys.sort_by(|a, b| match (a, b) {
                (OperatingSystemKey::Named(x), OperatingSystemKey::Named(y)) => {
                    compare_operating_systems(x, y)
                }
                (OperatingSystemKey::Named(_), OperatingSystemKey::Unspecified) => {
                    std::cmp::Ordering::Less
                }
                (OperatingSystemKey::Unspecified, OperatingSystemKey::Named(_)) => {
                    std::cmp::Ordering::Greater
                }
                _ => std::cmp::Ordering::Equal,
            });
            keys.iter().map(ToString::to_string).collect()
        }
        Axis::Version => first_appearance(candidates.iter().map(|c| c.release.version_label.clone())),
        Axis::Architecture => first_appearance(
            candidates
                .iter()
                .map(|c| ArchitectureKey::of(c.architecture).to_string()),
        ),
        Axis::PackageType => {
            let types: BTreeSet<PackageType> =
                candidates.iter().map(|c| c.release.package_type).collect();
            types.iter().map(ToString::to_string).collect()
        }
    }
}

fn first_appearance(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Narrow `tree` with the choices in `selection`.
///
/// Axes are visited in [`Axis::ORDER`]. A choice on an axis filters the
/// candidates; if nothing survives, the result is [`Resolution::NoMatch`].
/// Whenever a single release is left the result is
/// [`Resolution::Resolved`], even if later axes were never chosen. An axis
/// without a choice is passed over when it cannot split the candidates: the
/// operating system axis when the application has fewer than two named
/// operating systems, any other axis when it offers one value. Otherwise
/// the client is asked for that axis.
///
/// # Example
///
/// ```
/// use depot_schema::{Resolution, Selection, group_releases, resolve_selection};
///
/// let tree = group_releases(&[]);
/// assert_eq!(
///     resolve_selection(&tree, &Selection::default()),
///     Resolution::NoMatch { axis: None }
/// );
/// ```
pub fn resolve_selection(tree: &[GroupedVersion], selection: &Selection) -> Resolution {
    let mut candidates = flatten(tree);
    if candidates.is_empty() {
        return Resolution::NoMatch { axis: None };
    }

    let named_os: BTreeSet<&str> = candidates
        .iter()
        .filter_map(|c| c.release.operating_system.as_deref())
        .collect();
    let multiple_os = named_os.len() > 1;

    // Every explicit choice must hold, even one made past the point where
    // a single release would already be left.
    for axis in Axis::ORDER.into_iter().filter(|a| selection.is_set(*a)) {
        candidates.retain(|c| selection.accepts(axis, c));
        if candidates.is_empty() {
            return Resolution::NoMatch { axis: Some(axis) };
        }
    }

    for axis in Axis::ORDER {
        if let Some(release) = single_release(&candidates) {
            return Resolution::Resolved(release.clone());
        }

        if !selection.is_set(axis) {
            let options = options_for(axis, &candidates);
            let skippable = match axis {
                Axis::OperatingSystem => !multiple_os,
                _ => options.len() <= 1,
            };
            if !skippable {
                return Resolution::NeedsMoreInput { axis, options };
            }
        }
    }

    // Every axis is settled but releases still differ: the operating system
    // axis was skipped and they differ only there.
    let options = options_for(Axis::OperatingSystem, &candidates);
    if options.len() > 1 {
        return Resolution::NeedsMoreInput {
            axis: Axis::OperatingSystem,
            options,
        };
    }

    // Indistinguishable rows only exist when the uniqueness constraint was
    // bypassed; take the top-ranked one.
    candidates
        .iter()
        .map(|c| c.release)
        .min_by(|a, b| a.display_cmp(b))
        .map_or(Resolution::NoMatch { axis: None }, |r| {
            Resolution::Resolved(r.clone())
        })
}
