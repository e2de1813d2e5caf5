//! Read side of `manifest.toml`.
//!
//! ```toml
//! [package]
//! name = "logger"
//! version = "1.2.0"
//! kind = "static-lib"
//!
//! [dependencies]
//! fmt = ">=9.0.0"
//! zlib = { version = "1.3", namespace = "vendor", optional = true }
//! spdlog = { git = "https://github.com/gabime/spdlog", tag = "v1.14.1" }
//!
//! [build-dependencies]
//! cmake-helpers = { path = "../helpers" }
//! ```
//!
//! A declaration with only a version comes from a registry. `git`, `path` and
//! `archive` pick the other sources and are mutually exclusive.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::{DependencyRecord, PackageKind};
use crate::validation::is_valid_identifier;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    pub package: PackageInfo,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default)]
    pub build_dependencies: BTreeMap<String, DependencySpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
    pub kind: Option<String>,
}

/// A dependency as written: `name = "<constraint>"` or an inline table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Short(String),
    Detailed(DependencyTable),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DependencyTable {
    pub version: Option<String>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub optional: bool,
    pub registry: Option<String>,
    pub git: Option<String>,
    pub tag: Option<String>,
    pub rev: Option<String>,
    pub path: Option<PathBuf>,
    pub archive: Option<String>,
    pub checksum: Option<String>,
}

/// Where a declared dependency is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// `None` means the default registry.
    Registry { registry: Option<String> },
    Git {
        url: String,
        tag: Option<String>,
        rev: Option<String>,
    },
    Path { path: PathBuf },
    Archive {
        url: String,
        checksum: Option<String>,
    },
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry { registry: None } => f.write_str("registry"),
            Self::Registry {
                registry: Some(name),
            } => write!(f, "registry {name}"),
            Self::Git { url, tag, rev } => {
                write!(f, "git {url}")?;
                if let Some(tag) = tag {
                    write!(f, " tag {tag}")?;
                }
                if let Some(rev) = rev {
                    write!(f, " rev {rev}")?;
                }
                Ok(())
            }
            Self::Path { path } => write!(f, "path {}", path.display()),
            Self::Archive { url, checksum } => {
                write!(f, "archive {url}")?;
                if let Some(checksum) = checksum {
                    write!(f, " checksum {checksum}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySection {
    Normal,
    Dev,
    Build,
}

impl DependencySection {
    pub const ALL: [DependencySection; 3] = [Self::Normal, Self::Dev, Self::Build];

    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Normal => "dependencies",
            Self::Dev => "dev-dependencies",
            Self::Build => "build-dependencies",
        }
    }
}

/// One resolved declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub constraint: Option<String>,
    pub optional: bool,
    pub source: DependencySource,
}

impl DependencyDecl {
    #[must_use]
    pub fn to_record(&self) -> DependencyRecord {
        DependencyRecord {
            dep_namespace: self.namespace.clone().unwrap_or_default(),
            dep_name: self.name.clone(),
            constraint: self.constraint.clone(),
            optional: self.optional,
        }
    }
}

impl DependencySpec {
    fn resolve(&self, name: &str) -> Result<DependencyDecl> {
        if !is_valid_identifier(name) {
            return Err(Error::Manifest(format!("invalid dependency name '{name}'")));
        }

        let table = match self {
            Self::Short(constraint) => {
                return Ok(DependencyDecl {
                    name: name.to_string(),
                    namespace: None,
                    constraint: Some(constraint.clone()),
                    optional: false,
                    source: DependencySource::Registry { registry: None },
                });
            }
            Self::Detailed(table) => table,
        };

        if let Some(ns) = &table.namespace {
            if !is_valid_identifier(ns) {
                return Err(Error::Manifest(format!(
                    "dependency '{name}' has invalid namespace '{ns}'"
                )));
            }
        }

        let chosen = [
            table.git.is_some(),
            table.path.is_some(),
            table.archive.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if chosen > 1 {
            return Err(Error::Manifest(format!(
                "dependency '{name}' declares more than one of git, path and archive"
            )));
        }
        if table.git.is_none() && (table.tag.is_some() || table.rev.is_some()) {
            return Err(Error::Manifest(format!(
                "dependency '{name}' sets tag or rev without git"
            )));
        }
        if table.archive.is_none() && table.checksum.is_some() {
            return Err(Error::Manifest(format!(
                "dependency '{name}' sets checksum without archive"
            )));
        }
        if chosen > 0 && table.registry.is_some() {
            return Err(Error::Manifest(format!(
                "dependency '{name}' sets registry together with another source"
            )));
        }

        let source = if let Some(url) = &table.git {
            DependencySource::Git {
                url: url.clone(),
                tag: table.tag.clone(),
                rev: table.rev.clone(),
            }
        } else if let Some(path) = &table.path {
            DependencySource::Path { path: path.clone() }
        } else if let Some(url) = &table.archive {
            DependencySource::Archive {
                url: url.clone(),
                checksum: table.checksum.clone(),
            }
        } else {
            DependencySource::Registry {
                registry: table.registry.clone(),
            }
        };

        Ok(DependencyDecl {
            name: name.to_string(),
            namespace: table.namespace.clone(),
            constraint: table.version.clone(),
            optional: table.optional,
            source,
        })
    }
}

impl Manifest {
    /// Parses and checks every dependency declaration.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(content).map_err(|e| Error::Manifest(e.to_string()))?;

        if manifest.package.name.trim().is_empty() {
            return Err(Error::Manifest("[package].name must not be empty".into()));
        }
        if manifest.package.version.trim().is_empty() {
            return Err(Error::Manifest(
                "[package].version must not be empty".into(),
            ));
        }
        for section in DependencySection::ALL {
            manifest.declarations(section)?;
        }

        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            Error::Manifest(msg) => Error::Manifest(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    fn table(&self, section: DependencySection) -> &BTreeMap<String, DependencySpec> {
        match section {
            DependencySection::Normal => &self.dependencies,
            DependencySection::Dev => &self.dev_dependencies,
            DependencySection::Build => &self.build_dependencies,
        }
    }

    /// Declarations of one section, in name order.
    pub fn declarations(&self, section: DependencySection) -> Result<Vec<DependencyDecl>> {
        self.table(section)
            .iter()
            .map(|(name, spec)| spec.resolve(name))
            .collect()
    }

    /// Edges recorded in the index: runtime and build dependencies. Dev
    /// dependencies are never indexed.
    pub fn index_dependencies(&self) -> Result<Vec<DependencyRecord>> {
        let mut records = Vec::new();
        for section in [DependencySection::Normal, DependencySection::Build] {
            records.extend(self.declarations(section)?.iter().map(DependencyDecl::to_record));
        }
        Ok(records)
    }

    /// `[package].kind` when it names a known kind.
    #[must_use]
    pub fn kind(&self) -> Option<PackageKind> {
        self.package.kind.as_deref().and_then(|k| k.parse().ok())
    }
}

/// Lowercase hex SHA-256 of the manifest text as stored on disk.
#[must_use]
pub fn manifest_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
