//! Forward-only schema migrations keyed by `meta.schema_version`.

use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

/// Version the database ends up at after [`run_migrations`].
pub const SCHEMA_VERSION: i64 = 2;

/// `(target_version, sql)`, applied in order to databases below the target.
const MIGRATIONS: &[(i64, &str)] = &[(
    2,
    "ALTER TABLE packages ADD COLUMN deleted INTEGER NOT NULL DEFAULT 0;",
)];

/// Reads `meta.schema_version`; a missing table or row counts as 0.
pub fn current_version(conn: &Connection) -> rusqlite::Result<i64> {
    let has_meta: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'meta')",
        [],
        |row| row.get(0),
    )?;
    if !has_meta {
        return Ok(0);
    }

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(v) => v.trim().parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

/// Applies every pending migration, each in its own transaction together with
/// the version bump. Returns the resulting version.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<i64> {
    let mut version = current_version(conn)?;

    for &(target, sql) in MIGRATIONS {
        if version >= target {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![target.to_string()],
        )?;
        tx.commit()?;

        info!("migrated index schema {} -> {}", version, target);
        version = target;
    }

    Ok(version)
}
