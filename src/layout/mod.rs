//! On-disk shape of a store.
//!
//! ```text
//! <root>/
//!   config.toml
//!   logs/  cache/  index/
//!   index.db
//!   packages/<namespace>/<name>/
//!     latest -> <version>
//!     <version>/{manifest.toml, source/, build/, meta.json}
//! ```
//!
//! Every path here is derived from the root; nothing is persisted on its own.

mod latest;
mod storage;

use std::path::{Path, PathBuf};

pub use latest::{read_latest, update_latest_symlink};
pub use storage::{
    ensure_dir, ensure_package_version, import_package_version, init_storage, read_meta,
    write_meta,
};

pub const CONFIG_FILE: &str = "config.toml";
pub const INDEX_DB_FILE: &str = "index.db";
pub const MANIFEST_FILE: &str = "manifest.toml";
pub const META_FILE: &str = "meta.json";
pub const LATEST_POINTER: &str = "latest";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub root: PathBuf,
    pub config: PathBuf,
    pub logs: PathBuf,
    pub cache: PathBuf,
    pub index_dir: PathBuf,
    pub index_db: PathBuf,
    pub packages: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join(CONFIG_FILE),
            logs: root.join("logs"),
            cache: root.join("cache"),
            index_dir: root.join("index"),
            index_db: root.join(INDEX_DB_FILE),
            packages: root.join("packages"),
            root,
        }
    }

    #[must_use]
    pub fn package(&self, ns: &str, name: &str) -> PackageDir {
        PackageDir::new(self, ns, name)
    }

    /// `version` is expected in normalized form.
    #[must_use]
    pub fn package_version(&self, ns: &str, name: &str, version: &str) -> PackageLayout {
        PackageLayout::new(self, ns, name, version)
    }
}

/// Package-level paths shared by all versions of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDir {
    pub ns_dir: PathBuf,
    pub pkg_dir: PathBuf,
    pub latest_link: PathBuf,
    pub lock_file: PathBuf,
}

impl PackageDir {
    #[must_use]
    pub fn new(sl: &StorageLayout, ns: &str, name: &str) -> Self {
        let ns_dir = sl.packages.join(ns);
        let pkg_dir = ns_dir.join(name);
        Self {
            latest_link: pkg_dir.join(LATEST_POINTER),
            lock_file: pkg_dir.join(LOCK_FILE),
            ns_dir,
            pkg_dir,
        }
    }

    #[must_use]
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.pkg_dir.join(version)
    }
}

impl AsRef<PackageDir> for PackageDir {
    fn as_ref(&self) -> &PackageDir {
        self
    }
}

/// Paths for one `(namespace, name, version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    pub package: PackageDir,
    pub version: String,
    pub ver_dir: PathBuf,
    pub manifest: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub meta_json: PathBuf,
}

impl PackageLayout {
    #[must_use]
    pub fn new(sl: &StorageLayout, ns: &str, name: &str, version: &str) -> Self {
        let package = PackageDir::new(sl, ns, name);
        let ver_dir = package.version_dir(version);
        Self {
            manifest: ver_dir.join(MANIFEST_FILE),
            source_dir: ver_dir.join("source"),
            build_dir: ver_dir.join("build"),
            meta_json: ver_dir.join(META_FILE),
            version: version.to_string(),
            package,
            ver_dir,
        }
    }

    #[must_use]
    pub fn pkg_dir(&self) -> &Path {
        &self.package.pkg_dir
    }

    #[must_use]
    pub fn latest_link(&self) -> &Path {
        &self.package.latest_link
    }
}

impl AsRef<PackageDir> for PackageLayout {
    fn as_ref(&self) -> &PackageDir {
        &self.package
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_layout_paths() {
        let sl = StorageLayout::new("/store");
        assert_eq!(sl.config, PathBuf::from("/store/config.toml"));
        assert_eq!(sl.logs, PathBuf::from("/store/logs"));
        assert_eq!(sl.cache, PathBuf::from("/store/cache"));
        assert_eq!(sl.index_dir, PathBuf::from("/store/index"));
        assert_eq!(sl.index_db, PathBuf::from("/store/index.db"));
        assert_eq!(sl.packages, PathBuf::from("/store/packages"));
    }

    #[test]
    fn test_package_layout_is_namespaced() {
        let sl = StorageLayout::new("/store");
        let pl = sl.package_version("core", "logger", "1.2.0");

        assert_eq!(pl.package.ns_dir, PathBuf::from("/store/packages/core"));
        assert_eq!(pl.pkg_dir(), Path::new("/store/packages/core/logger"));
        assert_eq!(pl.ver_dir, PathBuf::from("/store/packages/core/logger/1.2.0"));
        assert_eq!(
            pl.manifest,
            PathBuf::from("/store/packages/core/logger/1.2.0/manifest.toml")
        );
        assert_eq!(pl.source_dir, PathBuf::from("/store/packages/core/logger/1.2.0/source"));
        assert_eq!(pl.build_dir, PathBuf::from("/store/packages/core/logger/1.2.0/build"));
        assert_eq!(pl.meta_json, PathBuf::from("/store/packages/core/logger/1.2.0/meta.json"));
    }

    #[test]
    fn test_latest_pointer_is_per_package() {
        let sl = StorageLayout::new("/store");
        let a = sl.package_version("core", "logger", "1.0.0");
        let b = sl.package_version("core", "logger", "2.0.0");
        assert_eq!(a.latest_link(), b.latest_link());
        assert_eq!(a.latest_link(), Path::new("/store/packages/core/logger/latest"));
    }
}
