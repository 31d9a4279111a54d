//! Global configuration loader for Formforge.
//!
//! Reads `config.toml` from the data directory (`~/.formforge/` in
//! production) and deserializes it into [`GlobalConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::Path;

use formforge_types::config::GlobalConfig;

use crate::filesystem::config_path;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => {
            tracing::debug!(
                models = config.models.len(),
                users = config.users.len(),
                "loaded {}",
                config_path.display()
            );
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.cli_user, "admin");
        assert!(config.models.is_empty());
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[mail]
default_from = "noreply@example.com"

[permissions]
frozen_forms = ["0190d6a4-5b7e-7c3a-9f00-000000000001"]

[[models]]
name = "contact"

[[models.attributes]]
name = "name"
type = "text"
max_length = 80
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.mail.default_from, "noreply@example.com");
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].attributes[0].max_length, Some(80));
        assert_eq!(config.permissions.frozen_forms.len(), 1);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.mail.default_from, "forms@localhost");
        assert!(config.users.is_empty());
    }
}
