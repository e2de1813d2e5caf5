//! CLI integration tests for the localpm binary.
//!
//! Each test uses an isolated temp directory as the store root, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

const LOGGER_MANIFEST: &str = r#"[package]
name = "logger"
version = "1.0.0"
kind = "static-lib"

[dependencies]
fmt = ">=9.0.0"
zlib = { version = "1.3", namespace = "vendor", optional = true }

[dev-dependencies]
catch2 = "3"
"#;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn root(&self) -> PathBuf {
        self.temp_dir.path().join("store")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("localpm").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd.env("LOCALPM_ROOT", self.root());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd().arg("init").assert()
    }

    fn write_manifest(&self, file: &str, content: &str) -> PathBuf {
        let child = self.temp_dir.child(file);
        child.write_str(content).expect("failed to write manifest");
        child.path().to_path_buf()
    }

    fn add(&self, manifest: &Path, version: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["add", "core", "logger", "--manifest"])
            .arg(manifest)
            .args(["--version", version])
            .assert()
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().expect("failed to run command");
        assert!(output.status.success(), "command failed: {args:?}");
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }

    fn package_dir(&self) -> PathBuf {
        self.root().join("packages/core/logger")
    }
}

#[test]
fn test_init_creates_store() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized store"));

    let root = ctx.root();
    assert!(root.join("config.toml").is_file());
    assert!(root.join("index.db").is_file());
    assert!(root.join("packages").is_dir());
    assert!(root.join("logs").is_dir());

    let config = std::fs::read_to_string(root.join("config.toml")).unwrap();
    assert!(config.starts_with("# LocalPM config"));
}

#[test]
fn test_init_is_idempotent() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.init().success();
}

#[test]
fn test_commands_require_init() {
    let ctx = TestContext::new();
    ctx.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("localpm init"));
}

#[test]
fn test_add_registers_version() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);

    ctx.add(&manifest, "1.0.0")
        .success()
        .stdout(predicate::str::contains("Added core::logger@1.0.0 (2 dependencies)"));

    let ver_dir = ctx.package_dir().join("1.0.0");
    assert!(ver_dir.join("manifest.toml").is_file());
    assert!(ver_dir.join("meta.json").is_file());
    assert!(ver_dir.join("source").is_dir());

    let meta: Value =
        serde_json::from_str(&std::fs::read_to_string(ver_dir.join("meta.json")).unwrap())
            .unwrap();
    assert_eq!(meta["pkg_type"], "static-lib");
    assert_eq!(meta["source_type"], "local");

    let list = ctx.json(&["list", "--json"]);
    let packages = list.as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["namespace"], "core");
    assert_eq!(packages[0]["version"], "1.0.0");
    assert_eq!(packages[0]["manifest_hash"].as_str().unwrap().len(), 64);
}

#[test]
fn test_add_duplicate_version_fails() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);

    ctx.add(&manifest, "1.0.0").success();
    ctx.add(&manifest, "1.0.0")
        .failure()
        .stderr(predicate::str::contains(
            "package version already exists: core::logger@1.0.0",
        ));
}

#[test]
fn test_add_rejects_bad_namespace() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);

    ctx.cmd()
        .args(["add", "Bad_NS", "logger", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid namespace"));

    assert!(!ctx.root().join("packages/Bad_NS").exists());
}

#[test]
fn test_add_rejects_empty_dependency_name() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest(
        "manifest.toml",
        "[package]\nname = \"logger\"\nversion = \"1.0.0\"\n\n[dependencies]\n\"\" = \"1\"\n",
    );

    ctx.add(&manifest, "1.0.0")
        .failure()
        .stderr(predicate::str::contains("invalid dependency name"));

    assert!(!ctx.package_dir().join("1.0.0").exists());
    assert_eq!(ctx.json(&["list", "--json"]).as_array().map(Vec::len), Some(0));
}

#[test]
fn test_versions_marks_latest() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);

    for v in ["1.0.0", "1.1.0", "1.2.0-beta"] {
        ctx.add(&manifest, v).success();
    }

    let versions = ctx.json(&["versions", "core", "logger", "--json"]);
    let versions = versions.as_array().unwrap();
    let order: Vec<&str> = versions
        .iter()
        .map(|v| v["version"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["1.2.0-beta", "1.1.0", "1.0.0"]);

    let latest: Vec<&str> = versions
        .iter()
        .filter(|v| v["latest"].as_bool().unwrap())
        .map(|v| v["version"].as_str().unwrap())
        .collect();
    assert_eq!(latest, vec!["1.1.0"]);

    ctx.cmd()
        .args(["versions", "core", "logger", "--min-version", "1.1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* 1.1.0"))
        .stdout(predicate::str::contains("1.0.0").not());
}

#[test]
fn test_relink_with_prerelease() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);
    ctx.add(&manifest, "1.0.0").success();
    ctx.add(&manifest, "2.0.0-rc.1").success();

    ctx.cmd()
        .args(["relink", "core", "logger", "--include-prerelease"])
        .assert()
        .success()
        .stdout(predicate::str::contains("latest -> 2.0.0-rc.1"));

    ctx.cmd()
        .args(["relink", "core", "logger"])
        .assert()
        .success()
        .stdout(predicate::str::contains("latest -> 1.0.0"));
}

#[test]
fn test_import_directory() {
    let ctx = TestContext::new();
    ctx.init().success();

    let src = ctx.temp_dir.child("staging/3.0.0");
    src.child("manifest.toml")
        .write_str(&LOGGER_MANIFEST.replace("1.0.0", "3.0.0"))
        .unwrap();
    src.child("include/logger/log.h")
        .write_str("#pragma once\n")
        .unwrap();

    ctx.cmd()
        .args(["import", "core", "logger"])
        .arg(src.path())
        .args(["--kind", "header-only", "--source", "vendor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported core::logger@3.0.0"));

    let ver_dir = ctx.package_dir().join("3.0.0");
    assert!(ver_dir.join("include/logger/log.h").is_file());

    ctx.cmd()
        .args(["show", "core", "logger", "3.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kind:     header-only"))
        .stdout(predicate::str::contains("Source:   vendor"))
        .stdout(predicate::str::contains("default::fmt >=9.0.0"))
        .stdout(predicate::str::contains("vendor::zlib 1.3 (optional)"))
        .stdout(predicate::str::contains("Declared [dev-dependencies]:"));
}

#[test]
fn test_import_without_manifest_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    let src = ctx.temp_dir.child("0.1.0");
    src.child("README").write_str("nothing here").unwrap();

    ctx.cmd()
        .args(["import", "core", "logger"])
        .arg(src.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not contain manifest.toml"));
}

#[test]
fn test_remove_is_soft() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);
    ctx.add(&manifest, "1.0.0").success();

    ctx.cmd()
        .args(["remove", "core", "logger", "1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed core::logger@1.0.0"));

    let list = ctx.json(&["list", "--json"]);
    assert!(list.as_array().unwrap().is_empty());
    assert!(ctx.package_dir().join("1.0.0/manifest.toml").is_file());

    ctx.cmd()
        .args(["remove", "core", "logger", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Package not found"));
}

#[test]
fn test_list_filters_by_namespace() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);
    ctx.add(&manifest, "1.0.0").success();

    let zlib = ctx.write_manifest(
        "zlib.toml",
        "[package]\nname = \"zlib\"\nversion = \"1.3.1\"\n",
    );
    ctx.cmd()
        .args(["add", "vendor", "zlib", "--manifest"])
        .arg(&zlib)
        .assert()
        .success();

    let list = ctx.json(&["list", "--namespace", "vendor", "--json"]);
    let packages = list.as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["name"], "zlib");
    assert_eq!(packages[0]["pkg_type"], "other");

    ctx.cmd()
        .args(["list", "--min-version", "2.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages found"));
}

#[test]
fn test_log_file_written_after_init() {
    let ctx = TestContext::new();
    ctx.init().success();
    let manifest = ctx.write_manifest("manifest.toml", LOGGER_MANIFEST);
    ctx.add(&manifest, "1.0.0").success();

    let log = std::fs::read_to_string(ctx.root().join("logs/localpm.log")).unwrap();
    assert!(log.contains("created core::logger@1.0.0"));
}
