use std::path::Path;

use crate::layout::init_storage;
use crate::store::{PackageIndex, SqliteIndex};

pub fn run_init(root: &Path) -> anyhow::Result<()> {
    let sl = init_storage(root)?;

    let index = SqliteIndex::open(&sl.index_db)?;
    index.initialize()?;

    println!("Initialized store at {}", sl.root.display());
    println!("  config: {}", sl.config.display());
    println!("  index:  {}", sl.index_db.display());
    Ok(())
}
