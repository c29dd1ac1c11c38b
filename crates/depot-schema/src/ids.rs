//! Strongly typed row identifiers.
//!
//! Every entity is keyed by a database integer. Wrapping each one keeps a
//! release id from being passed where an application id is expected.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the raw integer value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Identifier of a catalog [`Application`](crate::Application).
    ApplicationId
);
id_type!(
    /// Identifier of a single [`Release`](crate::Release) row.
    ReleaseId
);
id_type!(
    /// Identifier of an auxiliary [`Extra`](crate::Extra) file.
    ExtraId
);
id_type!(
    /// Identifier of the user on whose behalf an operation runs.
    UserId
);
id_type!(
    /// Identifier of a [`DownloadLogEntry`](crate::DownloadLogEntry).
    DownloadId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_parse_and_serialize_transparently() {
        let id: ReleaseId = " 42 ".parse().unwrap();
        assert_eq!(id, ReleaseId(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert!("abc".parse::<ApplicationId>().is_err());
    }
}
