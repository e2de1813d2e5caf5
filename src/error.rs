use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid {kind}: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("invalid semver '{version}': {reason}")]
    VersionParse { version: String, reason: String },

    #[error("path \"{}\" already exists, but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("package version already exists: {namespace}::{name}@{version}")]
    PackageVersionExists {
        namespace: String,
        name: String,
        version: String,
    },

    #[error("version directory does not contain manifest.toml: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("source directory does not exist or is not a directory: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error(
        "source directory {} contains the destination {}",
        .src_dir.display(),
        .dest.display()
    )]
    SourceContainsDestination { src_dir: PathBuf, dest: PathBuf },

    #[error("invalid package record: {0}")]
    InvalidPackageRecord(String),

    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database initialization failed: {0}")]
    DatabaseInit(String),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn version_parse(version: &str, reason: impl ToString) -> Self {
        Self::VersionParse {
            version: version.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
