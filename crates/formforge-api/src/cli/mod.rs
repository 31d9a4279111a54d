//! CLI command definitions for the `fforge` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern (e.g., `fforge form create`, `fforge field add`).

pub mod attributes;
pub mod field;
pub mod form;
pub mod handler;
pub mod outbox;
pub mod submit;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use serde::de::DeserializeOwned;

use formforge_types::form::{FormId, FormSchema};
use formforge_types::submission::SubmittedData;

/// Build, serve, and submit dynamic forms.
#[derive(Parser)]
#[command(name = "fforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage forms (create, list, show, delete, clone).
    Form {
        #[command(subcommand)]
        action: form::FormCommand,
    },

    /// Manage the fields attached to a form.
    Field {
        #[command(subcommand)]
        action: field::FieldCommand,
    },

    /// Manage the post-submission handlers attached to a form.
    Handler {
        #[command(subcommand)]
        action: handler::HandlerCommand,
    },

    /// List the unused target-model attributes of a model-bound form, or
    /// add some of them as fields.
    Attributes {
        /// Form ID.
        form_id: String,

        /// Attribute names to add as fields (comma-separated).
        #[arg(long, value_delimiter = ',')]
        add: Vec<String>,
    },

    /// Bind data to a form, validate it, and run its handlers.
    Submit {
        /// Form ID.
        form_id: String,

        /// Submitted data as a JSON object, or `@path` to read it from a file.
        #[arg(long)]
        data: String,
    },

    /// Print a form's HTML, optionally bound to data.
    Render {
        /// Form ID.
        form_id: String,

        /// Data to bind (JSON object or `@path`).
        #[arg(long)]
        data: Option<String>,
    },

    /// List emails queued by notification and confirmation handlers.
    Outbox,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse a form id argument.
pub fn parse_form_id(raw: &str) -> Result<FormId> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("'{raw}' is not a valid form ID"))
}

/// Read submitted data from an inline JSON object or an `@path` file.
pub async fn read_data(raw: &str) -> Result<SubmittedData> {
    let text = match raw.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {path}"))?,
        None => raw.to_string(),
    };
    let value: serde_json::Value = serde_json::from_str(&text).context("data is not valid JSON")?;
    SubmittedData::from_json(value).context("data must be a JSON object")
}

/// Deserialize a `type`-tagged kind from a discriminator and an optional
/// `--config` JSON object.
pub fn decode_kind<T: DeserializeOwned>(tag: &str, config: Option<&str>) -> Result<T> {
    let mut value: serde_json::Value = match config {
        Some(raw) => serde_json::from_str(raw).context("--config is not valid JSON")?,
        None => serde_json::json!({}),
    };
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("--config must be a JSON object"))?;
    obj.insert("type".to_string(), serde_json::Value::String(tag.to_string()));
    serde_json::from_value(value).with_context(|| format!("invalid {tag} configuration"))
}

/// Find a field by id or name.
pub fn resolve_field<'a>(
    schema: &'a FormSchema,
    key: &str,
) -> Result<&'a formforge_types::field::FieldDef> {
    schema
        .fields
        .iter()
        .find(|f| f.id.to_string() == key || f.name == key)
        .ok_or_else(|| anyhow!("no field '{key}' on form '{}'", schema.form.title))
}

/// Find a handler by id or name.
pub fn resolve_handler<'a>(
    schema: &'a FormSchema,
    key: &str,
) -> Result<&'a formforge_types::handler::HandlerDef> {
    schema
        .handlers
        .iter()
        .find(|h| h.id.to_string() == key || h.name == key)
        .ok_or_else(|| anyhow!("no handler '{key}' on form '{}'", schema.form.title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_types::field::FieldKind;
    use formforge_types::handler::HandlerKind;

    #[test]
    fn test_cli_parses_field_add() {
        let cli = Cli::try_parse_from([
            "fforge", "--json", "field", "add", "abc", "email", "--type", "email",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Field {
                action: field::FieldCommand::Add { .. }
            }
        ));
    }

    #[test]
    fn test_attributes_add_is_comma_separated() {
        let cli =
            Cli::try_parse_from(["fforge", "attributes", "abc", "--add", "name,email"]).unwrap();
        match cli.command {
            Commands::Attributes { add, .. } => assert_eq!(add, vec!["name", "email"]),
            _ => panic!("expected attributes command"),
        }
    }

    #[test]
    fn test_decode_kind_inserts_tag() {
        let kind: FieldKind = decode_kind("char", Some(r#"{"max_length": 20}"#)).unwrap();
        assert!(matches!(kind, FieldKind::Char { max_length: Some(20), .. }));

        let kind: HandlerKind = decode_kind("save_instance", None).unwrap();
        assert_eq!(kind, HandlerKind::SaveInstance { model: None });
    }

    #[test]
    fn test_decode_kind_rejects_non_object() {
        assert!(decode_kind::<FieldKind>("char", Some("[1]")).is_err());
        assert!(decode_kind::<FieldKind>("char", Some("{")).is_err());
    }

    #[tokio::test]
    async fn test_read_data_inline_and_file() {
        let data = read_data(r#"{"title": "hello"}"#).await.unwrap();
        assert_eq!(data.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        tokio::fs::write(&path, r#"{"a": 1, "b": "x"}"#).await.unwrap();
        let data = read_data(&format!("@{}", path.display())).await.unwrap();
        assert_eq!(data.len(), 2);

        assert!(read_data("[1, 2]").await.is_err());
    }

    #[test]
    fn test_parse_form_id() {
        let id = FormId::new();
        assert_eq!(parse_form_id(&id.to_string()).unwrap(), id);
        assert!(parse_form_id("nope").is_err());
    }
}
