use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::warn;

use super::{load_config, open_store};
use crate::layout::{
    PackageLayout, ensure_package_version, import_package_version, update_latest_symlink,
    write_meta,
};
use crate::manifest::{Manifest, manifest_hash};
use crate::store::{PackageIndex, SqliteIndex};
use crate::types::{DependencyRecord, PackageKind, PackageMeta, PackageRecord, SourceType};
use crate::version::normalize_str;

pub fn run_add(
    root: &Path,
    namespace: &str,
    name: &str,
    manifest_path: &Path,
    version: Option<String>,
    source: SourceType,
    kind: Option<PackageKind>,
) -> anyhow::Result<()> {
    let (sl, index) = open_store(root)?;

    let content = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
    let manifest = Manifest::parse(&content)?;
    let deps = manifest.index_dependencies()?;

    let version = version.unwrap_or_else(|| manifest.package.version.clone());
    let pl = ensure_package_version(&sl, namespace, name, &version, &content)?;

    let kind = kind.or_else(|| manifest.kind()).unwrap_or(PackageKind::Other);
    let record = register(&index, &pl, namespace, name, source, kind, &content, &deps)?;

    let config = load_config(&sl)?;
    if !config.latest_stable_only {
        update_latest_symlink(&pl, false)?;
    }

    println!("Added {} ({} dependencies)", record.qualified_name(), deps.len());
    println!("  path: {}", record.path);
    Ok(())
}

pub fn run_import(
    root: &Path,
    namespace: &str,
    name: &str,
    src_dir: &Path,
    version: Option<String>,
    source: SourceType,
    kind: Option<PackageKind>,
) -> anyhow::Result<()> {
    let (sl, index) = open_store(root)?;

    let pl = import_package_version(&sl, namespace, name, src_dir, version.as_deref())?;

    let content = fs::read_to_string(&pl.manifest)?;
    let manifest = Manifest::parse(&content).with_context(|| {
        format!(
            "Imported files left at {}; fix the manifest and remove the directory to retry",
            pl.ver_dir.display()
        )
    })?;
    if normalize_str(&manifest.package.version).ok().as_deref() != Some(pl.version.as_str()) {
        warn!(
            "manifest declares version '{}' but {} was imported as {}",
            manifest.package.version, name, pl.version
        );
    }
    let deps = manifest.index_dependencies()?;

    let kind = kind.or_else(|| manifest.kind()).unwrap_or(PackageKind::Other);
    let record = register(&index, &pl, namespace, name, source, kind, &content, &deps)?;

    let config = load_config(&sl)?;
    if !config.latest_stable_only {
        update_latest_symlink(&pl, false)?;
    }

    println!(
        "Imported {} from {}",
        record.qualified_name(),
        src_dir.display()
    );
    println!("  path: {}", record.path);
    Ok(())
}

/// Indexes a materialized version and writes its `meta.json`.
#[allow(clippy::too_many_arguments)]
fn register(
    index: &SqliteIndex,
    pl: &PackageLayout,
    namespace: &str,
    name: &str,
    source: SourceType,
    kind: PackageKind,
    content: &str,
    deps: &[DependencyRecord],
) -> anyhow::Result<PackageRecord> {
    let mut record = PackageRecord::new(
        namespace,
        name,
        &pl.version,
        pl.ver_dir.display().to_string(),
        source,
        kind,
    )
    .with_manifest_hash(manifest_hash(content));

    record.id = index.upsert_package(&record, deps)?;
    write_meta(pl, &PackageMeta::from(&record))?;
    Ok(record)
}
