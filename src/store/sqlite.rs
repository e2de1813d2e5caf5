use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::{debug, info, warn};

use super::PackageIndex;
use super::migrations::{current_version, run_migrations};
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;
use crate::version::{Version, cmp_precedence, normalize_str, parse_version};

/// Namespace written for dependencies that do not name one.
pub const DEFAULT_DEP_NAMESPACE: &str = "default";

const PACKAGE_COLUMNS: &str = "id, namespace, name, version, path, source_type, pkg_type, \
                               manifest_hash, created_at, updated_at, deleted";

pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Opens or creates the database file. The schema is not touched until
    /// [`PackageIndex::initialize`] runs.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let init_err =
            |e: rusqlite::Error| Error::DatabaseInit(format!("{}: {e}", db_path.display()));

        let conn = Connection::open(db_path).map_err(init_err)?;

        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(init_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(init_err)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(init_err)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows callers to run SQL the trait does not cover.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    /// Value of `meta.schema_version`, 0 before initialization.
    pub fn schema_version(&self) -> Result<i64> {
        current_version(&self.conn()).map_err(Error::from)
    }
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| {
        tracing::error!("Invalid timestamp in database: {}", secs);
        Utc::now()
    })
}

fn parse_column<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let value: String = row.get(idx)?;
    value
        .parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn row_to_package(row: &Row<'_>) -> rusqlite::Result<PackageRecord> {
    Ok(PackageRecord {
        id: row.get(0)?,
        namespace: row.get(1)?,
        name: row.get(2)?,
        version: row.get(3)?,
        path: row.get(4)?,
        source_type: parse_column(row, 5)?,
        pkg_type: parse_column(row, 6)?,
        manifest_hash: row.get(7)?,
        created_at: from_unix(row.get(8)?),
        updated_at: from_unix(row.get(9)?),
        deleted: row.get(10)?,
    })
}

/// Stored versions are written normalized, but rows can predate that or be
/// edited by hand.
fn stored_version(record: &PackageRecord) -> Option<Version> {
    match Version::parse(&record.version) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                "skipping package row {} with invalid version '{}': {}",
                record.id, record.version, e
            );
            None
        }
    }
}

/// Lookups accept non-canonical spellings of stored versions where possible.
fn lookup_version(version: &str) -> String {
    normalize_str(version).unwrap_or_else(|_| version.to_string())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl PackageIndex for SqliteIndex {
    fn initialize(&self) -> Result<()> {
        let mut conn = self.conn();
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::DatabaseInit(format!("applying schema: {e}")))?;
        let version = run_migrations(&mut conn)
            .map_err(|e| Error::DatabaseInit(format!("running migrations: {e}")))?;
        debug!("index schema at version {}", version);
        Ok(())
    }

    fn upsert_package(&self, record: &PackageRecord, deps: &[DependencyRecord]) -> Result<i64> {
        if record.namespace.is_empty() || record.name.is_empty() || record.version.is_empty() {
            return Err(Error::InvalidPackageRecord(format!(
                "namespace, name and version are required (got '{}')",
                record.qualified_name()
            )));
        }
        let version = normalize_str(&record.version)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let id: i64 = tx.query_row(
            "INSERT INTO packages
                 (namespace, name, version, path, source_type, pkg_type, manifest_hash, updated_at, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, strftime('%s','now'), 0)
             ON CONFLICT(namespace, name, version) DO UPDATE SET
                 path          = excluded.path,
                 source_type   = excluded.source_type,
                 pkg_type      = excluded.pkg_type,
                 manifest_hash = excluded.manifest_hash,
                 updated_at    = strftime('%s','now'),
                 deleted       = 0
             RETURNING id",
            params![
                record.namespace,
                record.name,
                version,
                record.path,
                record.source_type.as_str(),
                record.pkg_type.as_str(),
                record.manifest_hash,
            ],
            |row| row.get(0),
        )?;

        tx.execute(
            "DELETE FROM dependencies WHERE package_id = ?1",
            params![id],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO dependencies (package_id, dep_namespace, dep_name, \"constraint\", optional)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for dep in deps {
                let namespace = if dep.dep_namespace.is_empty() {
                    DEFAULT_DEP_NAMESPACE
                } else {
                    dep.dep_namespace.as_str()
                };
                let constraint = dep.constraint.as_deref().filter(|c| !c.is_empty());
                stmt.execute(params![id, namespace, dep.dep_name, constraint, dep.optional])?;
            }
        }

        tx.commit()?;
        info!(
            "indexed {}::{}@{} (id {}, {} dependencies)",
            record.namespace,
            record.name,
            version,
            id,
            deps.len()
        );
        Ok(id)
    }

    fn mark_deleted(&self, namespace: &str, name: &str, version: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE packages SET deleted = 1
             WHERE namespace = ?1 AND name = ?2 AND version = ?3 AND deleted = 0",
            params![namespace, name, lookup_version(version)],
        )?;
        Ok(rows > 0)
    }

    fn get_package(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<PackageRecord>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {PACKAGE_COLUMNS} FROM packages
                 WHERE namespace = ?1 AND name = ?2 AND version = ?3 AND deleted = 0"
            ),
            params![namespace, name, lookup_version(version)],
            row_to_package,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_dependencies(&self, package_id: i64) -> Result<Vec<DependencyRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT dep_namespace, dep_name, \"constraint\", optional
             FROM dependencies WHERE package_id = ?1 ORDER BY rowid",
        )?;

        let rows = stmt.query_map(params![package_id], |row| {
            Ok(DependencyRecord {
                dep_namespace: row.get(0)?,
                dep_name: row.get(1)?,
                constraint: row.get(2)?,
                optional: row.get(3)?,
            })
        })?;

        let deps = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(deps)
    }

    fn search_packages(
        &self,
        namespaces: &[String],
        names: &[String],
        min_version: Option<&str>,
    ) -> Result<HashMap<String, PackageRecord>> {
        let min = match min_version.filter(|s| !s.is_empty()) {
            Some(s) => match parse_version(s) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("ignoring minimum version filter: {}", e);
                    None
                }
            },
            None => None,
        };

        let mut sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE deleted = 0");
        if !namespaces.is_empty() {
            sql.push_str(&format!(" AND namespace IN ({})", placeholders(namespaces.len())));
        }
        if !names.is_empty() {
            sql.push_str(&format!(" AND name IN ({})", placeholders(names.len())));
        }
        sql.push_str(" ORDER BY id");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(namespaces.iter().chain(names.iter())),
            row_to_package,
        )?;

        let mut result = HashMap::new();
        for row in rows {
            let record = row?;
            let Some(version) = stored_version(&record) else {
                continue;
            };
            if let Some(min) = &min {
                if cmp_precedence(&version, min) == Ordering::Less {
                    continue;
                }
            }
            // same name in another namespace replaces the earlier row
            result.insert(record.name.clone(), record);
        }

        Ok(result)
    }

    fn search_package_versions(
        &self,
        namespace: &str,
        name: &str,
        min_version: Option<&str>,
    ) -> Result<Vec<PackageRecord>> {
        let min = min_version
            .filter(|s| !s.is_empty())
            .map(parse_version)
            .transpose()?;

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages
             WHERE namespace = ?1 AND name = ?2 AND deleted = 0"
        ))?;
        let rows = stmt.query_map(params![namespace, name], row_to_package)?;

        let mut versions: Vec<(Version, PackageRecord)> = Vec::new();
        for row in rows {
            let record = row?;
            let Some(version) = stored_version(&record) else {
                continue;
            };
            if let Some(min) = &min {
                if cmp_precedence(&version, min) == Ordering::Less {
                    continue;
                }
            }
            versions.push((version, record));
        }

        versions.sort_by(|(a, _), (b, _)| cmp_precedence(b, a).then_with(|| b.cmp(a)));
        Ok(versions.into_iter().map(|(_, record)| record).collect())
    }
}
