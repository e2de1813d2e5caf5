use std::path::Path;

use serde::Serialize;

use super::open_store;
use crate::layout::read_latest;
use crate::manifest::{DependencySection, Manifest};
use crate::store::PackageIndex;
use crate::types::PackageRecord;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    path: &'a str,
    source_type: &'static str,
    pkg_type: &'static str,
    latest: bool,
    updated_at: String,
}

pub fn run_list(
    root: &Path,
    namespaces: &[String],
    names: &[String],
    min_version: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let (_sl, index) = open_store(root)?;

    let found = index.search_packages(namespaces, names, min_version)?;
    let mut packages: Vec<&PackageRecord> = found.values().collect();
    packages.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

    if json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    if packages.is_empty() {
        println!("No packages found");
        return Ok(());
    }

    for pkg in packages {
        println!(
            "{:<32} {:<16} {:<12} {}",
            format!("{}::{}", pkg.namespace, pkg.name),
            pkg.version,
            pkg.pkg_type,
            pkg.source_type
        );
    }
    Ok(())
}

pub fn run_versions(
    root: &Path,
    namespace: &str,
    name: &str,
    min_version: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let (sl, index) = open_store(root)?;

    let records = index.search_package_versions(namespace, name, min_version)?;
    let latest = read_latest(sl.package(namespace, name))?;
    let is_latest = |record: &PackageRecord| latest.as_deref() == Some(record.version.as_str());

    if json {
        let output: Vec<VersionOutput<'_>> = records
            .iter()
            .map(|r| VersionOutput {
                version: &r.version,
                path: &r.path,
                source_type: r.source_type.as_str(),
                pkg_type: r.pkg_type.as_str(),
                latest: is_latest(r),
                updated_at: r.updated_at.to_rfc3339(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No versions of {namespace}::{name} found");
        return Ok(());
    }

    for record in &records {
        let marker = if is_latest(record) { "*" } else { " " };
        println!("{marker} {:<16} {}", record.version, record.path);
    }
    Ok(())
}

pub fn run_show(root: &Path, namespace: &str, name: &str, version: &str) -> anyhow::Result<()> {
    let (sl, index) = open_store(root)?;

    let Some(record) = index.get_package(namespace, name, version)? else {
        anyhow::bail!("Package not found: {namespace}::{name}@{version}");
    };

    println!("{}", record.qualified_name());
    println!("{}", "─".repeat(record.qualified_name().chars().count()));
    println!("Path:     {}", record.path);
    println!("Kind:     {}", record.pkg_type);
    println!("Source:   {}", record.source_type);
    if let Some(hash) = &record.manifest_hash {
        println!("Manifest: sha256:{hash}");
    }
    println!("Created:  {}", record.created_at.to_rfc3339());
    println!("Updated:  {}", record.updated_at.to_rfc3339());

    let deps = index.list_dependencies(record.id)?;
    println!();
    if deps.is_empty() {
        println!("Dependencies: none");
    } else {
        println!("Dependencies:");
        for dep in &deps {
            let constraint = dep.constraint.as_deref().unwrap_or("*");
            let optional = if dep.optional { " (optional)" } else { "" };
            println!(
                "  {}::{} {}{}",
                dep.dep_namespace, dep.dep_name, constraint, optional
            );
        }
    }

    let pl = sl.package_version(namespace, name, &record.version);
    if !pl.manifest.exists() {
        return Ok(());
    }
    let manifest = Manifest::load(&pl.manifest)?;
    for section in DependencySection::ALL {
        let decls = manifest.declarations(section)?;
        if decls.is_empty() {
            continue;
        }
        println!();
        println!("Declared [{}]:", section.table_name());
        for decl in decls {
            println!("  {:<24} {}", decl.name, decl.source);
        }
    }

    Ok(())
}
