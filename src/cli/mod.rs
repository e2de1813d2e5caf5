mod commands;
mod init;
mod query;
mod register;
mod remove;

pub use commands::Commands;
pub use init::run_init;
pub use query::{run_list, run_show, run_versions};
pub use register::{run_add, run_import};
pub use remove::{run_relink, run_remove};

use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::layout::StorageLayout;
use crate::store::{PackageIndex, SqliteIndex};

/// `<home>/.local/localpm`, or a relative `.localpm` when there is no home.
#[must_use]
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".local").join("localpm"))
        .unwrap_or_else(|| PathBuf::from(".localpm"))
}

/// Dispatches one parsed command against the store at `root`.
pub fn run(root: &Path, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => run_init(root),
        Commands::Add {
            namespace,
            name,
            manifest,
            version,
            source,
            kind,
        } => run_add(root, &namespace, &name, &manifest, version, source, kind),
        Commands::Import {
            namespace,
            name,
            src_dir,
            version,
            source,
            kind,
        } => run_import(root, &namespace, &name, &src_dir, version, source, kind),
        Commands::List {
            namespaces,
            names,
            min_version,
            json,
        } => run_list(root, &namespaces, &names, min_version.as_deref(), json),
        Commands::Versions {
            namespace,
            name,
            min_version,
            json,
        } => run_versions(root, &namespace, &name, min_version.as_deref(), json),
        Commands::Show {
            namespace,
            name,
            version,
        } => run_show(root, &namespace, &name, &version),
        Commands::Remove {
            namespace,
            name,
            version,
        } => run_remove(root, &namespace, &name, &version),
        Commands::Relink {
            namespace,
            name,
            include_prerelease,
        } => run_relink(root, &namespace, &name, include_prerelease),
    }
}

/// Opens an existing store, checking it has been initialized.
pub(crate) fn open_store(root: &Path) -> anyhow::Result<(StorageLayout, SqliteIndex)> {
    let sl = StorageLayout::new(root);

    if !sl.index_db.exists() {
        anyhow::bail!(
            "No store found at {}. Run 'localpm init' first.",
            sl.root.display()
        );
    }

    let index = SqliteIndex::open(&sl.index_db)?;
    index.initialize()?;
    Ok((sl, index))
}

pub(crate) fn load_config(sl: &StorageLayout) -> anyhow::Result<StoreConfig> {
    Ok(StoreConfig::load_or_default(&sl.config, &sl.root)?)
}
