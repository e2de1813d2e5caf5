use std::path::Path;

use super::{load_config, open_store};
use crate::layout::update_latest_symlink;
use crate::store::PackageIndex;
use crate::validation::{validate_namespace, validate_package_name};

pub fn run_remove(root: &Path, namespace: &str, name: &str, version: &str) -> anyhow::Result<()> {
    let (sl, index) = open_store(root)?;

    if !index.mark_deleted(namespace, name, version)? {
        anyhow::bail!("Package not found: {namespace}::{name}@{version}");
    }

    println!("Removed {namespace}::{name}@{version} from the index");
    let pkg = sl.package(namespace, name);
    println!("  files kept under {}", pkg.pkg_dir.display());
    Ok(())
}

pub fn run_relink(
    root: &Path,
    namespace: &str,
    name: &str,
    include_prerelease: bool,
) -> anyhow::Result<()> {
    validate_namespace(namespace)?;
    validate_package_name(name)?;

    let (sl, _index) = open_store(root)?;
    let config = load_config(&sl)?;
    let stable_only = config.latest_stable_only && !include_prerelease;

    match update_latest_symlink(sl.package(namespace, name), stable_only)? {
        Some(version) => println!("{namespace}::{name} latest -> {version}"),
        None => println!("{namespace}::{name} has no eligible version; latest removed"),
    }
    Ok(())
}
