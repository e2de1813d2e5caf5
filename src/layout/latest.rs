//! The per-package `latest` pointer and the advisory lock that guards it.
//!
//! On unix the pointer is a relative symlink `latest -> <version>`; elsewhere
//! it is a one-line file holding the version string. Either way a new pointer
//! is written next to the old one and renamed over it, so readers never see
//! a missing pointer while it is being replaced.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use fs2::FileExt;
use tracing::debug;

use super::{LATEST_POINTER, PackageDir, ensure_dir};
use crate::error::Result;
use crate::version::{Version, resolve_latest};

const POINTER_TMP: &str = ".latest.tmp";

/// Exclusive advisory lock on `<pkg_dir>/.lock`, released on drop.
pub(crate) struct PackageLock {
    _file: File,
}

impl PackageLock {
    pub(crate) fn acquire(pkg: &PackageDir) -> Result<Self> {
        ensure_dir(&pkg.pkg_dir)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&pkg.lock_file)?;
        // blocks while another process holds it
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }
}

/// Recomputes the `latest` pointer from the version directories present.
///
/// Only real subdirectories whose names parse as semver are candidates. When
/// none qualifies, any existing pointer is removed. Returns the version the
/// pointer now references.
pub fn update_latest_symlink(
    pkg: impl AsRef<PackageDir>,
    stable_only: bool,
) -> Result<Option<Version>> {
    let pkg = pkg.as_ref();
    if !pkg.pkg_dir.is_dir() {
        remove_pointer(&pkg.latest_link)?;
        return Ok(None);
    }
    let _lock = PackageLock::acquire(pkg)?;
    refresh_latest(pkg, stable_only)
}

/// Same as [`update_latest_symlink`] for callers already holding the lock.
pub(crate) fn refresh_latest(pkg: &PackageDir, stable_only: bool) -> Result<Option<Version>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(&pkg.pkg_dir)? {
        let entry = entry?;
        // file_type does not follow symlinks, so `latest` itself never qualifies
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name != LATEST_POINTER {
                names.push(name.to_string());
            }
        }
    }

    let Some(best) = resolve_latest(&names, stable_only) else {
        debug!("no candidate version in {}, clearing latest", pkg.pkg_dir.display());
        remove_pointer(&pkg.latest_link)?;
        return Ok(None);
    };

    let target = names
        .iter()
        .find(|n| Version::parse(n).is_ok_and(|v| v == best))
        .cloned()
        .unwrap_or_else(|| best.to_string());

    write_pointer(pkg, &target)?;
    debug!("latest -> {} in {}", target, pkg.pkg_dir.display());
    Ok(Some(best))
}

/// Reads the version the pointer references, if any.
pub fn read_latest(pkg: impl AsRef<PackageDir>) -> Result<Option<String>> {
    let link = &pkg.as_ref().latest_link;
    let meta = match fs::symlink_metadata(link) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if meta.file_type().is_symlink() {
        let target = fs::read_link(link)?;
        return Ok(target
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from));
    }
    if meta.is_file() {
        let content = fs::read_to_string(link)?;
        let version = content.trim();
        return Ok((!version.is_empty()).then(|| version.to_string()));
    }
    Ok(None)
}

fn remove_pointer(link: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(_) => {
            fs::remove_file(link)?;
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn write_pointer(pkg: &PackageDir, target: &str) -> Result<()> {
    let tmp = pkg.pkg_dir.join(POINTER_TMP);
    remove_pointer(&tmp)?;
    std::os::unix::fs::symlink(target, &tmp)?;
    fs::rename(&tmp, &pkg.latest_link)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_pointer(pkg: &PackageDir, target: &str) -> Result<()> {
    let tmp = pkg.pkg_dir.join(POINTER_TMP);
    fs::write(&tmp, format!("{target}\n"))?;
    fs::rename(&tmp, &pkg.latest_link)?;
    Ok(())
}
