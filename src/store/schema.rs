/// Base schema, recorded as `schema_version = 1`. Later revisions are applied
/// by the migrations in `migrations.rs`.
pub const SCHEMA: &str = r#"
-- One row per installed (namespace, name, version)
CREATE TABLE IF NOT EXISTS packages (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    namespace     TEXT    NOT NULL,
    version       TEXT    NOT NULL,  -- canonical semver
    path          TEXT    NOT NULL,  -- version directory
    source_type   TEXT    NOT NULL CHECK(source_type IN ('local','git','vendor','remote')),
    pkg_type      TEXT    NOT NULL CHECK(pkg_type IN ('static-lib','shared-lib','abi','header-only','other')),
    manifest_hash TEXT,              -- sha256 of manifest.toml
    created_at    INTEGER NOT NULL DEFAULT (strftime('%s','now')),
    updated_at    INTEGER NOT NULL DEFAULT (strftime('%s','now')),
    UNIQUE(namespace, name, version)
);

-- Declared dependency edges, replaced wholesale on every upsert
CREATE TABLE IF NOT EXISTS dependencies (
    package_id    INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    dep_namespace TEXT    NOT NULL,
    dep_name      TEXT    NOT NULL CHECK(length(dep_name) > 0),
    "constraint"  TEXT,
    optional      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_pkg_lookup  ON packages(namespace, name, version);
CREATE INDEX IF NOT EXISTS idx_pkg_name    ON packages(namespace, name);
CREATE INDEX IF NOT EXISTS idx_pkg_source  ON packages(source_type);
CREATE INDEX IF NOT EXISTS idx_deps_pkg    ON dependencies(package_id);
CREATE INDEX IF NOT EXISTS idx_deps_target ON dependencies(dep_namespace, dep_name);

CREATE TRIGGER IF NOT EXISTS packages_set_updated_at
AFTER UPDATE ON packages
FOR EACH ROW
BEGIN
    UPDATE packages SET updated_at = strftime('%s','now') WHERE id = NEW.id;
END;

CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '1');
"#;
