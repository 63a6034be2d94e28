use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use directories::ProjectDirs;

/// The data directory that contains the wallet record files.
///
/// The default varies by operating system, e.g.
///
/// - Linux:   /home/alice/.local/share/aegis
/// - Windows: C:\Users\Alice\AppData\Roaming\aegis
/// - macOS:   /Users/Alice/Library/Application Support/aegis
#[derive(Debug, Clone)]
pub struct DataDirectory {
    data_dir: PathBuf,
}

impl DataDirectory {
    /// Resolve the data directory, either under an explicit root or at
    /// the platform default.
    pub fn get(root_dir: Option<PathBuf>) -> Result<Self> {
        let project_dirs = root_dir
            .map(ProjectDirs::from_path)
            .unwrap_or_else(|| ProjectDirs::from("org", "aegis", "aegis"))
            .context("Could not determine data directory")?;

        Ok(DataDirectory {
            data_dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Create directory if it does not exist
    pub fn create_dir_if_not_exists(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.to_string_lossy()))
    }

    pub fn root_dir_path(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// The record file of the named wallet.
    pub fn wallet_file_path(&self, wallet_name: &str) -> PathBuf {
        self.data_dir.join(wallet_name)
    }
}
