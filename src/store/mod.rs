mod migrations;
mod schema;
mod sqlite;

use std::collections::HashMap;

pub use migrations::SCHEMA_VERSION;
pub use sqlite::SqliteIndex;

use crate::error::Result;
use crate::types::{DependencyRecord, PackageRecord};

/// PackageIndex defines the queryable mirror of the on-disk store.
pub trait PackageIndex: Send + Sync {
    /// Creates the schema and applies pending migrations.
    fn initialize(&self) -> Result<()>;

    /// Inserts or updates the row for the record's natural key and replaces its
    /// dependency set, atomically. Clears a previous soft delete. Returns the
    /// row id, which is stable across updates.
    fn upsert_package(&self, record: &PackageRecord, deps: &[DependencyRecord]) -> Result<i64>;

    /// Soft-deletes a row. Returns false when no live row matched.
    fn mark_deleted(&self, namespace: &str, name: &str, version: &str) -> Result<bool>;

    fn get_package(&self, namespace: &str, name: &str, version: &str)
    -> Result<Option<PackageRecord>>;

    fn list_dependencies(&self, package_id: i64) -> Result<Vec<DependencyRecord>>;

    /// Live rows filtered by namespace and name (an empty slice does not
    /// filter) and by a minimum version. Keyed by package name, so rows with
    /// the same name in different namespaces overwrite each other in id order.
    fn search_packages(
        &self,
        namespaces: &[String],
        names: &[String],
        min_version: Option<&str>,
    ) -> Result<HashMap<String, PackageRecord>>;

    /// Live versions of one package, newest first.
    fn search_package_versions(
        &self,
        namespace: &str,
        name: &str,
        min_version: Option<&str>,
    ) -> Result<Vec<PackageRecord>>;
}
