use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a package's contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Local,
    Git,
    Vendor,
    Remote,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [Self::Local, Self::Git, Self::Vendor, Self::Remote];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Git => "git",
            Self::Vendor => "vendor",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown source type '{s}' (expected local, git, vendor or remote)"))
    }
}

/// What kind of artifact a package provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageKind {
    StaticLib,
    SharedLib,
    HeaderOnly,
    Abi,
    Other,
}

impl PackageKind {
    pub const ALL: [PackageKind; 5] = [
        Self::StaticLib,
        Self::SharedLib,
        Self::HeaderOnly,
        Self::Abi,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StaticLib => "static-lib",
            Self::SharedLib => "shared-lib",
            Self::HeaderOnly => "header-only",
            Self::Abi => "abi",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|k| k.as_str() == s).ok_or_else(|| {
            format!(
                "unknown package kind '{s}' (expected static-lib, shared-lib, header-only, abi or other)"
            )
        })
    }
}

/// A row of the `packages` table. The natural key is `(namespace, name, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Row identity. Zero until the record has been written to the index.
    #[serde(default)]
    pub id: i64,
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub path: String,
    pub source_type: SourceType,
    pub pkg_type: PackageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl PackageRecord {
    /// A fresh, not yet indexed record.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
        source_type: SourceType,
        pkg_type: PackageKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
            path: path.into(),
            source_type,
            pkg_type,
            manifest_hash: None,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    #[must_use]
    pub fn with_manifest_hash(mut self, hash: impl Into<String>) -> Self {
        self.manifest_hash = Some(hash.into());
        self
    }

    /// `ns::name@version`, the form used in messages.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}@{}", self.namespace, self.name, self.version)
    }
}

/// A declared dependency edge owned by one package row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Empty means `"default"` once written.
    pub dep_namespace: String,
    pub dep_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    pub optional: bool,
}

impl DependencyRecord {
    pub fn new(dep_name: impl Into<String>) -> Self {
        Self {
            dep_namespace: String::new(),
            dep_name: dep_name.into(),
            constraint: None,
            optional: false,
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, ns: impl Into<String>) -> Self {
        self.dep_namespace = ns.into();
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// Contents of a version directory's `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMeta {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub source_type: SourceType,
    pub pkg_type: PackageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<String>,
    pub installed_at: DateTime<Utc>,
}

impl From<&PackageRecord> for PackageMeta {
    fn from(record: &PackageRecord) -> Self {
        Self {
            namespace: record.namespace.clone(),
            name: record.name.clone(),
            version: record.version.clone(),
            source_type: record.source_type,
            pkg_type: record.pkg_type,
            manifest_hash: record.manifest_hash.clone(),
            installed_at: Utc::now(),
        }
    }
}
