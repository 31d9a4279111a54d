//! Global configuration types for Formforge.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls mail
//! defaults, the target data-model catalog, admin users, and external
//! permission vetoes.

use serde::{Deserialize, Serialize};

use crate::form::FormId;
use crate::model::ModelSpec;
use crate::permission::Actor;

/// Top-level configuration. Loaded from `~/.formforge/config.toml`; every
/// field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub mail: MailConfig,

    /// Target data models available to model-bound forms.
    #[serde(default)]
    pub models: Vec<ModelSpec>,

    /// Known admin actors.
    #[serde(default)]
    pub users: Vec<Actor>,

    #[serde(default)]
    pub permissions: PermissionConfig,

    /// Username the CLI acts as.
    #[serde(default = "default_cli_user")]
    pub cli_user: String,
}

fn default_cli_user() -> String {
    "admin".to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            mail: MailConfig::default(),
            models: Vec::new(),
            users: Vec::new(),
            permissions: PermissionConfig::default(),
            cli_user: default_cli_user(),
        }
    }
}

impl GlobalConfig {
    /// Resolve a configured user by name.
    pub fn user(&self, username: &str) -> Option<&Actor> {
        self.users.iter().find(|u| u.username == username)
    }

    /// The actor the CLI runs as. An unlisted CLI user is a superuser.
    pub fn cli_actor(&self) -> Actor {
        self.user(&self.cli_user)
            .cloned()
            .unwrap_or_else(|| Actor::superuser(self.cli_user.clone()))
    }
}

/// Outgoing mail defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender used when a handler does not set `from_address`.
    #[serde(default = "default_from")]
    pub default_from: String,
}

fn default_from() -> String {
    "forms@localhost".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            default_from: default_from(),
        }
    }
}

/// External permission checks applied on top of attribute-level permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Forms that no admin action may modify.
    #[serde(default)]
    pub frozen_forms: Vec<FormId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.cli_user, "admin");
        assert_eq!(config.mail.default_from, "forms@localhost");
        assert!(config.models.is_empty());
        assert!(config.cli_actor().is_superuser);
    }

    #[test]
    fn test_global_config_from_toml() {
        let config: GlobalConfig = toml::from_str(
            r#"
cli_user = "editor"

[mail]
default_from = "noreply@example.com"

[[users]]
username = "editor"
permissions = ["add_form", "add_char_field"]

[[users]]
username = "auditor"
read_only = true

[[models]]
name = "contact"

[[models.attributes]]
name = "email"
type = "email"
"#,
        )
        .unwrap();

        assert_eq!(config.mail.default_from, "noreply@example.com");
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].attributes.len(), 1);

        let actor = config.cli_actor();
        assert_eq!(actor.username, "editor");
        assert!(!actor.is_superuser);
        assert!(actor.has_permission("add_char_field"));

        assert!(config.user("auditor").unwrap().read_only);
    }
}
