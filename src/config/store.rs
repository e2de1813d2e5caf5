use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_HEADER: &str = "# LocalPM config\n";

fn default_true() -> bool {
    true
}

/// Settings persisted in `<root>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub store_path: PathBuf,
    /// Whether the `latest` pointer skips prerelease versions.
    #[serde(default = "default_true")]
    pub latest_stable_only: bool,
}

impl StoreConfig {
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        Self {
            store_path: root.to_path_buf(),
            latest_stable_only: true,
        }
    }

    /// Loads `path`, falling back to the defaults for `root` when the file is absent.
    pub fn load_or_default(path: &Path, root: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::for_root(root));
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string(self).map_err(|e| Error::Config(e.to_string()))?;
        Ok(format!("{CONFIG_HEADER}{body}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
