use std::path::PathBuf;

use clap::Subcommand;

use crate::types::{PackageKind, SourceType};

#[derive(Subcommand)]
pub enum Commands {
    /// Create the store layout, default config and index database
    Init,

    /// Register a new package version from a manifest file
    Add {
        /// Namespace the package lives in
        namespace: String,

        /// Package name
        name: String,

        /// Path to the manifest.toml to store
        #[arg(long, short)]
        manifest: PathBuf,

        /// Version to register (defaults to [package].version)
        #[arg(long)]
        version: Option<String>,

        /// Where the package came from
        #[arg(long, default_value = "local")]
        source: SourceType,

        /// Artifact kind (defaults to [package].kind, else "other")
        #[arg(long)]
        kind: Option<PackageKind>,
    },

    /// Copy a prepared version directory into the store and register it
    Import {
        /// Namespace the package lives in
        namespace: String,

        /// Package name
        name: String,

        /// Directory whose contents become the version directory
        src_dir: PathBuf,

        /// Version to register (defaults to the source directory name)
        #[arg(long)]
        version: Option<String>,

        /// Where the package came from
        #[arg(long, default_value = "local")]
        source: SourceType,

        /// Artifact kind (defaults to [package].kind, else "other")
        #[arg(long)]
        kind: Option<PackageKind>,
    },

    /// List indexed packages
    List {
        /// Only these namespaces (repeatable)
        #[arg(long = "namespace", short = 'n')]
        namespaces: Vec<String>,

        /// Only these package names (repeatable)
        #[arg(long = "name")]
        names: Vec<String>,

        /// Hide versions below this one
        #[arg(long)]
        min_version: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the versions of one package, newest first
    Versions {
        namespace: String,
        name: String,

        /// Hide versions below this one
        #[arg(long)]
        min_version: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one package version with its dependencies
    Show {
        namespace: String,
        name: String,
        version: String,
    },

    /// Mark a package version as deleted in the index (files are kept)
    Remove {
        namespace: String,
        name: String,
        version: String,
    },

    /// Recompute the latest pointer of a package
    Relink {
        namespace: String,
        name: String,

        /// Let prerelease versions become latest
        #[arg(long)]
        include_prerelease: bool,
    },
}
