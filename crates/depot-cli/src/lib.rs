//! depot - self-hosted application and release catalog
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Operator and user front end for the depot catalog.
//!
//! # Overview
//!
//! Administrators register applications and attach release artifacts
//! tagged by operating system, architecture and package type. Users
//! browse the catalog and narrow an application's releases down to one
//! download with `--os`, `--version`, `--arch` and `--type`.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.depot/
//! ├── uploads/     # Managed release and extra files
//! ├── catalog.db   # SQLite catalog
//! └── config.toml  # Optional path overrides
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use depot_schema::{
    ArchitectureKey, ExtraId, OperatingSystemKey, PackageType, ReleaseId, Selection, UserId,
};

#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "Self-hosted application and release catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    /// User id recorded on downloads
    #[arg(long, global = true, env = "DEPOT_USER", default_value = "1")]
    pub user: UserId,

    /// Act as an administrator (required for every change)
    #[arg(long, global = true, env = "DEPOT_ADMIN")]
    pub admin: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List applications in the catalog
    List,
    /// Show an application with its releases and extras
    Show {
        /// Application id or name
        app: String,
    },
    /// Manage applications
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// Manage releases
    Release {
        #[command(subcommand)]
        command: ReleaseCommands,
    },
    /// Narrow an application's releases down to one
    Resolve {
        /// Application id or name
        app: String,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Download a release artifact
    Download {
        /// Application id or name
        #[arg(required_unless_present = "release")]
        app: Option<String>,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Download this release directly instead of resolving
        #[arg(long, conflicts_with = "app")]
        release: Option<ReleaseId>,
        /// Output file (defaults to the artifact's name in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Manage auxiliary files attached to an application
    Extra {
        #[command(subcommand)]
        command: ExtraCommands,
    },
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// Register a new application
    Add {
        /// Display name
        name: String,
        #[command(flatten)]
        details: AppDetails,
        /// Tag (repeatable or comma separated)
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Change fields of an application
    Edit {
        /// Application id or name
        app: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        details: AppDetails,
        /// Replace all tags (comma separated)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Clear a field (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<AppField>,
    },
    /// Delete an application with all of its releases and extras
    Rm {
        /// Application id or name
        app: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AppDetails {
    /// Short description
    #[arg(long)]
    pub description: Option<String>,
    /// Developer name
    #[arg(long)]
    pub developer: Option<String>,
    /// Publisher name
    #[arg(long)]
    pub publisher: Option<String>,
    /// Icon URL
    #[arg(long)]
    pub icon_url: Option<String>,
    /// Homepage URL
    #[arg(long)]
    pub homepage: Option<String>,
}

/// Nullable application fields that `app edit --clear` can reset.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppField {
    Description,
    Developer,
    Publisher,
    IconUrl,
    Homepage,
    Tags,
}

#[derive(Subcommand)]
pub enum ReleaseCommands {
    /// Add a release to an application
    Add {
        /// Application id or name
        app: String,
        /// Version label (e.g. 1.2.0)
        #[arg(long = "version")]
        version_label: String,
        /// Package type: installer, portable or source
        #[arg(long = "type", default_value = "installer")]
        package_type: PackageType,
        /// Operating system label (ignored for source releases)
        #[arg(long)]
        os: Option<String>,
        /// Architecture tag (repeatable or comma separated)
        #[arg(long = "arch", value_delimiter = ',')]
        architectures: Vec<String>,
        #[command(flatten)]
        artifact: ArtifactArgs,
        /// Release date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Release notes
        #[arg(long)]
        notes: Option<String>,
        /// Manual rank; higher is listed first
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        sort_order: i64,
    },
    /// Change fields of a release
    Edit {
        /// Release id
        id: ReleaseId,
        /// New version label
        #[arg(long = "version")]
        version_label: Option<String>,
        /// New package type
        #[arg(long = "type")]
        package_type: Option<PackageType>,
        /// New operating system label
        #[arg(long)]
        os: Option<String>,
        /// Replace all architecture tags (comma separated)
        #[arg(long = "arch", value_delimiter = ',')]
        architectures: Option<Vec<String>>,
        #[command(flatten)]
        artifact: OptionalArtifactArgs,
        /// New release date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// New release notes
        #[arg(long)]
        notes: Option<String>,
        /// New manual rank
        #[arg(long, allow_negative_numbers = true)]
        sort_order: Option<i64>,
        /// Clear a field (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<ReleaseField>,
    },
    /// Delete a release
    Rm {
        /// Release id
        id: ReleaseId,
    },
    /// Rank an application's releases, first listed first
    Reorder {
        /// Application id or name
        app: String,
        /// Every release id of the application, in the new order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<ReleaseId>,
    },
}

/// Nullable release fields that `release edit --clear` can reset.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseField {
    Os,
    Arch,
    Date,
    Notes,
}

/// Where a new artifact comes from; exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ArtifactArgs {
    /// Copy this file into the managed upload store
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Reference this file in place (absolute path, never deleted by depot)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Replacement artifact for an edit; at most one.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct OptionalArtifactArgs {
    /// Copy this file into the managed upload store
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Reference this file in place
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ExtraCommands {
    /// Attach a file to an application
    Add {
        /// Application id or name
        app: String,
        /// Display name
        #[arg(long)]
        name: String,
        #[command(flatten)]
        artifact: ArtifactArgs,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List the extras of an application
    List {
        /// Application id or name
        app: String,
    },
    /// Delete an extra
    Rm {
        /// Extra id
        id: ExtraId,
    },
}

/// Choices narrowing an application's releases.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Operating system ("unspecified" picks releases without one)
    #[arg(long)]
    pub os: Option<OperatingSystemKey>,
    /// Version label
    #[arg(long = "version")]
    pub version_label: Option<String>,
    /// Architecture tag ("default" picks untagged releases)
    #[arg(long)]
    pub arch: Option<ArchitectureKey>,
    /// Package type: installer, portable or source
    #[arg(long = "type")]
    pub package_type: Option<PackageType>,
}

impl SelectionArgs {
    pub fn to_selection(&self) -> Selection {
        Selection {
            operating_system: self.os.clone(),
            version_label: self.version_label.clone(),
            architecture: self.arch.clone(),
            package_type: self.package_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_selection_flags() {
        let cli = Cli::parse_from([
            "depot", "resolve", "Foo", "--os", "unspecified", "--arch", "amd64", "--type",
            "portable",
        ]);
        let Commands::Resolve { app, selection } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(app, "Foo");
        let selection = selection.to_selection();
        assert_eq!(
            selection.operating_system,
            Some(OperatingSystemKey::Unspecified)
        );
        assert_eq!(selection.architecture, Some(ArchitectureKey::from("x86_64")));
        assert_eq!(selection.package_type, Some(PackageType::Portable));
        assert!(selection.version_label.is_none());
    }

    #[test]
    fn test_release_add_requires_one_artifact() {
        let base = ["depot", "release", "add", "Foo", "--version", "1.0"];
        assert!(Cli::try_parse_from(base).is_err());

        let both = [&base[..], &["--file", "/a", "--path", "/b"][..]].concat();
        assert!(Cli::try_parse_from(both).is_err());

        let one = [&base[..], &["--path", "/b"][..]].concat();
        let cli = Cli::try_parse_from(one).unwrap();
        assert!(!cli.admin);
        assert_eq!(cli.user, UserId(1));
    }
}
