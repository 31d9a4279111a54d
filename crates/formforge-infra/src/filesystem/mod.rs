//! Filesystem helpers: data-directory layout.

use std::path::{Path, PathBuf};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `FORMFORGE_DATA_DIR` environment variable
/// 2. `~/.formforge`
/// 3. `.formforge` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FORMFORGE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".formforge");
    }

    PathBuf::from(".formforge")
}

/// `{data_dir}/config.toml`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(data_dir).await
}
