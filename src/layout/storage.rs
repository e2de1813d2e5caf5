use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::latest::{PackageLock, refresh_latest};
use super::{PackageLayout, StorageLayout};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::PackageMeta;
use crate::validation::{validate_namespace, validate_package_name};
use crate::version::normalize_str;

/// Creates `path` and any missing parents. Fails if it exists as something
/// other than a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("creating {}", path.display());
            fs::create_dir_all(path)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Materializes the store skeleton under `root`.
///
/// Writes a default `config.toml` only when none exists and makes sure the
/// index database file is present. The index schema is applied separately by
/// [`crate::store::SqliteIndex::initialize`].
pub fn init_storage(root: &Path) -> Result<StorageLayout> {
    let sl = StorageLayout::new(root);

    ensure_dir(&sl.root)?;
    ensure_dir(&sl.logs)?;
    ensure_dir(&sl.cache)?;
    ensure_dir(&sl.index_dir)?;
    ensure_dir(&sl.packages)?;

    if !sl.config.exists() {
        StoreConfig::for_root(&sl.root).save(&sl.config)?;
        debug!("wrote default config to {}", sl.config.display());
    }

    if !sl.index_db.exists() {
        fs::File::create(&sl.index_db)?;
    }

    Ok(sl)
}

/// Creates a new version directory with its manifest and refreshes `latest`.
///
/// Identifiers and the version are validated before anything touches the
/// disk. An existing manifest for the same normalized version is rejected
/// with [`Error::PackageVersionExists`] and leaves the tree as it was.
pub fn ensure_package_version(
    sl: &StorageLayout,
    ns: &str,
    name: &str,
    version_str: &str,
    manifest_content: &str,
) -> Result<PackageLayout> {
    validate_namespace(ns)?;
    validate_package_name(name)?;
    let version = normalize_str(version_str)?;

    let pl = PackageLayout::new(sl, ns, name, &version);
    let exists = || Error::PackageVersionExists {
        namespace: ns.to_string(),
        name: name.to_string(),
        version: version.clone(),
    };

    if pl.manifest.exists() {
        return Err(exists());
    }

    ensure_dir(&pl.package.ns_dir)?;
    let _lock = PackageLock::acquire(&pl.package)?;
    // another process may have won the race while we waited for the lock
    if pl.manifest.exists() {
        return Err(exists());
    }

    ensure_dir(&pl.ver_dir)?;
    ensure_dir(&pl.source_dir)?;
    ensure_dir(&pl.build_dir)?;
    fs::write(&pl.manifest, manifest_content)?;

    refresh_latest(&pl.package, true)?;
    info!("created {}::{}@{}", ns, name, version);
    Ok(pl)
}

/// Copies the contents of `src_dir` into a new version directory.
///
/// The version defaults to the name of `src_dir` itself. The copy is not
/// rolled back: if the copied tree has no `manifest.toml` the call fails with
/// [`Error::ManifestMissing`] and the populated directory is left behind for
/// the caller to clean up.
pub fn import_package_version(
    sl: &StorageLayout,
    ns: &str,
    name: &str,
    src_dir: &Path,
    version: Option<&str>,
) -> Result<PackageLayout> {
    validate_namespace(ns)?;
    validate_package_name(name)?;

    if !src_dir.is_dir() {
        return Err(Error::SourceMissing(src_dir.to_path_buf()));
    }

    let version_str = match version {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => src_dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                Error::version_parse(
                    &src_dir.display().to_string(),
                    "cannot derive a version from the source directory name",
                )
            })?,
    };
    let version = normalize_str(&version_str)?;

    let pl = PackageLayout::new(sl, ns, name, &version);
    let exists = || Error::PackageVersionExists {
        namespace: ns.to_string(),
        name: name.to_string(),
        version: version.clone(),
    };

    if pl.ver_dir.exists() {
        return Err(exists());
    }

    // copying a directory into itself never terminates
    let src_real = fs::canonicalize(src_dir)?;
    let dest_real = canonicalize_existing(&pl.ver_dir)?;
    if dest_real.starts_with(&src_real) {
        return Err(Error::SourceContainsDestination {
            src_dir: src_real,
            dest: dest_real,
        });
    }

    ensure_dir(&pl.package.ns_dir)?;
    let _lock = PackageLock::acquire(&pl.package)?;
    if pl.ver_dir.exists() {
        return Err(exists());
    }

    ensure_dir(&pl.ver_dir)?;
    copy_dir_contents(src_dir, &pl.ver_dir)?;

    if !pl.manifest.exists() {
        return Err(Error::ManifestMissing(pl.manifest.clone()));
    }

    refresh_latest(&pl.package, true)?;
    info!(
        "imported {}::{}@{} from {}",
        ns,
        name,
        version,
        src_dir.display()
    );
    Ok(pl)
}

/// Writes `meta.json` for a version directory.
pub fn write_meta(pl: &PackageLayout, meta: &PackageMeta) -> Result<()> {
    let content = serde_json::to_string_pretty(meta).map_err(std::io::Error::from)?;
    fs::write(&pl.meta_json, content)?;
    Ok(())
}

pub fn read_meta(pl: &PackageLayout) -> Result<Option<PackageMeta>> {
    let content = match fs::read_to_string(&pl.meta_json) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let meta = serde_json::from_str(&content).map_err(std::io::Error::from)?;
    Ok(Some(meta))
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is resolved and the missing components are appended.
fn canonicalize_existing(path: &Path) -> Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        match fs::canonicalize(current) {
            Ok(real) => {
                return Ok(missing.iter().rev().fold(real, |acc, part| acc.join(part)));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (current.parent(), current.file_name()) else {
                    return Ok(path.to_path_buf());
                };
                missing.push(name);
                current = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Recursive copy of the entries of `src` into `dst`. Symlinks are recreated
/// rather than followed, regular files overwrite, other file types are skipped.
fn copy_dir_contents(src: &Path, dst: &Path) -> Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
        } else if file_type.is_dir() {
            ensure_dir(&to)?;
            copy_dir_contents(&from, &to)?;
        } else if file_type.is_file() {
            fs::copy(&from, &to)?;
        } else {
            debug!("skipping special file {}", from.display());
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = fs::read_link(from)?;
    if fs::symlink_metadata(to).is_ok() {
        fs::remove_file(to)?;
    }
    std::os::unix::fs::symlink(target, to)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    if fs::metadata(from)?.is_dir() {
        ensure_dir(to)?;
        copy_dir_contents(from, to)
    } else {
        fs::copy(from, to)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::read_latest;
    use crate::types::{PackageKind, PackageRecord, SourceType};
    use tempfile::TempDir;

    const MANIFEST: &str = "[package]\nname = \"logger\"\nversion = \"1.0.0\"\n";

    fn store() -> (TempDir, StorageLayout) {
        let temp = TempDir::new().unwrap();
        let sl = init_storage(&temp.path().join("store")).unwrap();
        (temp, sl)
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(ensure_dir(&file), Err(Error::NotADirectory(p)) if p == file));
    }

    #[test]
    fn test_init_storage_creates_skeleton() {
        let (_temp, sl) = store();
        for dir in [&sl.root, &sl.logs, &sl.cache, &sl.index_dir, &sl.packages] {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
        assert!(sl.config.is_file());
        assert!(sl.index_db.is_file());
    }

    #[test]
    fn test_init_storage_keeps_existing_config() {
        let (_temp, sl) = store();
        fs::write(&sl.config, "store_path = \"/elsewhere\"\n").unwrap();

        init_storage(&sl.root).unwrap();
        assert_eq!(
            fs::read_to_string(&sl.config).unwrap(),
            "store_path = \"/elsewhere\"\n"
        );
    }

    #[test]
    fn test_ensure_package_version_creates_tree() {
        let (_temp, sl) = store();
        let pl = ensure_package_version(&sl, "core", "logger", "1.0.0", MANIFEST).unwrap();

        assert!(pl.source_dir.is_dir());
        assert!(pl.build_dir.is_dir());
        assert_eq!(fs::read_to_string(&pl.manifest).unwrap(), MANIFEST);
        assert_eq!(read_latest(&pl).unwrap().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_ensure_package_version_rejects_bad_version() {
        let (_temp, sl) = store();
        let err = ensure_package_version(&sl, "core", "logger", "v1", MANIFEST).unwrap_err();
        assert!(matches!(err, Error::VersionParse { version, .. } if version == "v1"));
        assert!(!sl.packages.join("core").exists());
    }

    #[test]
    fn test_prerelease_does_not_move_latest() {
        let (_temp, sl) = store();
        ensure_package_version(&sl, "core", "logger", "1.0.0", MANIFEST).unwrap();
        let pl = ensure_package_version(&sl, "core", "logger", "2.0.0-rc.1", MANIFEST).unwrap();
        assert_eq!(read_latest(&pl).unwrap().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_import_copies_contents() {
        let (temp, sl) = store();
        let src = temp.path().join("1.4.0");
        fs::create_dir_all(src.join("include/logger")).unwrap();
        fs::write(src.join("manifest.toml"), MANIFEST).unwrap();
        fs::write(src.join("include/logger/log.h"), "#pragma once\n").unwrap();

        let pl = import_package_version(&sl, "core", "logger", &src, None).unwrap();

        assert_eq!(pl.version, "1.4.0");
        assert!(pl.manifest.is_file());
        assert!(pl.ver_dir.join("include/logger/log.h").is_file());
        assert!(!pl.ver_dir.join("1.4.0").exists());
        assert_eq!(read_latest(&pl).unwrap().as_deref(), Some("1.4.0"));
    }

    #[cfg(unix)]
    #[test]
    fn test_import_preserves_symlinks() {
        let (temp, sl) = store();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("manifest.toml"), MANIFEST).unwrap();
        fs::write(src.join("lib/liblogger.so.1"), "elf").unwrap();
        std::os::unix::fs::symlink("liblogger.so.1", src.join("lib/liblogger.so")).unwrap();

        let pl = import_package_version(&sl, "core", "logger", &src, Some("1.0.0")).unwrap();
        let link = pl.ver_dir.join("lib/liblogger.so");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("liblogger.so.1"));
    }

    #[test]
    fn test_import_without_manifest_leaves_copy() {
        let (temp, sl) = store();
        let src = temp.path().join("0.3.0");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("README"), "no manifest").unwrap();

        let err = import_package_version(&sl, "core", "logger", &src, None).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing(_)));

        let pl = sl.package_version("core", "logger", "0.3.0");
        assert!(pl.ver_dir.join("README").is_file());
        assert!(read_latest(&pl).unwrap().is_none());
    }

    #[test]
    fn test_import_existing_version_is_rejected_before_copy() {
        let (temp, sl) = store();
        ensure_package_version(&sl, "core", "logger", "1.0.0", MANIFEST).unwrap();

        let src = temp.path().join("1.0.0");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("manifest.toml"), "changed").unwrap();
        fs::write(src.join("extra"), "x").unwrap();

        let err = import_package_version(&sl, "core", "logger", &src, None).unwrap_err();
        assert!(matches!(err, Error::PackageVersionExists { .. }));

        let pl = sl.package_version("core", "logger", "1.0.0");
        assert_eq!(fs::read_to_string(&pl.manifest).unwrap(), MANIFEST);
        assert!(!pl.ver_dir.join("extra").exists());
    }

    #[test]
    fn test_import_missing_source() {
        let (temp, sl) = store();
        let err =
            import_package_version(&sl, "core", "logger", &temp.path().join("nope"), None)
                .unwrap_err();
        assert!(matches!(err, Error::SourceMissing(_)));
    }

    #[test]
    fn test_import_rejects_source_containing_destination() {
        let (_temp, sl) = store();

        let err =
            import_package_version(&sl, "core", "logger", &sl.packages, Some("1.0.0")).unwrap_err();
        assert!(matches!(err, Error::SourceContainsDestination { .. }));
        assert!(!sl.packages.join("core").exists());

        let err = import_package_version(&sl, "core", "logger", &sl.root, Some("1.0.0"))
            .unwrap_err();
        assert!(matches!(err, Error::SourceContainsDestination { .. }));
        assert!(!sl.packages.join("core").exists());
    }

    #[test]
    fn test_import_rejects_own_package_dir() {
        let (_temp, sl) = store();
        let pl = ensure_package_version(&sl, "core", "logger", "1.0.0", MANIFEST).unwrap();

        let err = import_package_version(&sl, "core", "logger", pl.pkg_dir(), Some("2.0.0"))
            .unwrap_err();
        match err {
            Error::SourceContainsDestination { src_dir, dest } => {
                assert!(dest.starts_with(&src_dir));
                assert!(dest.ends_with("2.0.0"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!pl.package.version_dir("2.0.0").exists());
        assert_eq!(read_latest(&pl).unwrap().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_meta_round_trip() {
        let (_temp, sl) = store();
        let pl = ensure_package_version(&sl, "core", "logger", "1.0.0", MANIFEST).unwrap();
        assert!(read_meta(&pl).unwrap().is_none());

        let record = PackageRecord::new(
            "core",
            "logger",
            "1.0.0",
            pl.ver_dir.display().to_string(),
            SourceType::Local,
            PackageKind::HeaderOnly,
        );
        let meta = PackageMeta::from(&record);
        write_meta(&pl, &meta).unwrap();

        assert_eq!(read_meta(&pl).unwrap(), Some(meta));
    }
}
