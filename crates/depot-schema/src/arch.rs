//! CPU architecture tags.

/// A CPU architecture tag attached to a release (e.g. `x86_64`, `arm64`).
///
/// Vendors and operators spell the same architecture many ways. Known
/// aliases are folded into one canonical spelling so that `amd64` and
/// `x86_64` uploads land in the same variant slot; unknown tags are kept
/// exactly as typed (minus surrounding whitespace).
///
/// # Example
///
/// ```
/// use depot_schema::Architecture;
///
/// let arch = Architecture::new("AMD64");
/// assert_eq!(arch.as_str(), "x86_64");
///
/// let list = Architecture::parse_list("x64, arm64 aarch64");
/// assert_eq!(list.len(), 2);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "String", into = "String")]
pub struct Architecture(String);

impl Architecture {
    /// Create a tag, canonicalizing well-known aliases.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let canonical = match trimmed.to_lowercase().as_str() {
            "x86_64" | "x86-64" | "amd64" | "x64" => "x86_64",
            "arm64" | "aarch64" => "arm64",
            "x86" | "i386" | "i686" | "ia32" => "x86",
            "armv7" | "armhf" | "arm" => "armv7",
            "universal" => "universal",
            _ => trimmed,
        };
        Self(canonical.to_string())
    }

    /// Parse a comma or whitespace separated list of tags.
    ///
    /// Blank entries are dropped and duplicates (after canonicalization)
    /// keep only their first occurrence.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut out: Vec<Self> = Vec::new();
        for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
            if part.trim().is_empty() {
                continue;
            }
            let arch = Self::new(part);
            if !out.contains(&arch) {
                out.push(arch);
            }
        }
        out
    }

    /// Canonicalize and de-duplicate an already split list of tags.
    pub fn normalize_all<I, S>(tags: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<Self> = Vec::new();
        for tag in tags {
            if tag.as_ref().trim().is_empty() {
                continue;
            }
            let arch = Self::new(tag.as_ref());
            if !out.contains(&arch) {
                out.push(arch);
            }
        }
        out
    }

    /// Return the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Architecture {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Architecture {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<Architecture> for String {
    fn from(a: Architecture) -> Self {
        a.0
    }
}

impl AsRef<str> for Architecture {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Architecture {
    fn eq(&self, other: &str) -> bool {
        self.0 == Self::new(other).0
    }
}

impl PartialEq<&str> for Architecture {
    fn eq(&self, other: &&str) -> bool {
        self.0 == Self::new(other).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_fold_together() {
        assert_eq!(Architecture::new("amd64"), Architecture::new("x86_64"));
        assert_eq!(Architecture::new(" AArch64 "), "arm64");
        assert_eq!(Architecture::new("i686").as_str(), "x86");
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        assert_eq!(Architecture::new(" riscv64 ").as_str(), "riscv64");
        assert_eq!(Architecture::new("PowerPC").as_str(), "PowerPC");
    }

    #[test]
    fn test_parse_list_dedupes_and_skips_blanks() {
        let list = Architecture::parse_list("x64,, amd64 arm64,aarch64");
        assert_eq!(
            list,
            vec![Architecture::new("x86_64"), Architecture::new("arm64")]
        );
        assert!(Architecture::parse_list("  ,  ").is_empty());
    }

    #[test]
    fn test_serde_roundtrip_canonicalizes() {
        let arch: Architecture = serde_json::from_str("\"AMD64\"").unwrap();
        assert_eq!(arch.as_str(), "x86_64");
        assert_eq!(serde_json::to_string(&arch).unwrap(), "\"x86_64\"");
    }
}
