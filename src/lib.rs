//! # LocalPM
//!
//! A local package manager for native libraries: a versioned on-disk store
//! plus a SQLite index that mirrors it. Usable as the `localpm` binary or as a
//! library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! localpm = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::path::Path;
//! use localpm::layout::{ensure_package_version, init_storage};
//! use localpm::manifest::{Manifest, manifest_hash};
//! use localpm::store::{PackageIndex, SqliteIndex};
//! use localpm::types::{PackageKind, PackageRecord, SourceType};
//!
//! let sl = init_storage(Path::new("/opt/localpm"))?;
//! let index = SqliteIndex::open(&sl.index_db)?;
//! index.initialize()?;
//!
//! let content = std::fs::read_to_string("manifest.toml")?;
//! let manifest = Manifest::parse(&content)?;
//! let pl = ensure_package_version(&sl, "core", "logger", &manifest.package.version, &content)?;
//!
//! let record = PackageRecord::new(
//!     "core",
//!     "logger",
//!     &pl.version,
//!     pl.ver_dir.display().to_string(),
//!     SourceType::Local,
//!     PackageKind::StaticLib,
//! )
//! .with_manifest_hash(manifest_hash(&content));
//! index.upsert_package(&record, &manifest.index_dependencies()?)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod store;
pub mod types;
pub mod validation;
pub mod version;

pub use error::{Error, Result};
