//! Handler CLI commands: add, remove, types.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use formforge_core::registry::{self, HANDLER_TYPES};
use formforge_types::handler::{HandlerKind, NewHandler};

use crate::cli::{decode_kind, parse_form_id, resolve_handler};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum HandlerCommand {
    /// Attach a post-submission handler to a form.
    Add {
        /// Form ID.
        form_id: String,

        /// Handler name.
        name: String,

        /// Handler type (see `fforge handler types`).
        #[arg(long = "type")]
        handler_type: String,

        /// Type-specific configuration as a JSON object, e.g.
        /// '{"recipients": ["staff@example.com"], "subject_template": "New {{ title }}",
        /// "body_template": ""}'.
        #[arg(long)]
        config: Option<String>,

        /// Invocation order (defaults to after the existing handlers).
        #[arg(long)]
        order: Option<i32>,
    },

    /// Remove a handler from a form.
    #[command(alias = "rm")]
    Remove {
        /// Form ID.
        form_id: String,

        /// Handler ID or name.
        handler: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// List registered handler types.
    Types,
}

pub async fn run(state: &AppState, command: HandlerCommand, json: bool) -> Result<()> {
    match command {
        HandlerCommand::Add {
            form_id,
            name,
            handler_type,
            config,
            order,
        } => {
            let handler_type = registry::resolve_handler_discriminator(&handler_type)?;
            let kind: HandlerKind = decode_kind(handler_type.as_str(), config.as_deref())?;
            add_handler(state, &form_id, NewHandler { name, order, kind }, json).await
        }
        HandlerCommand::Remove {
            form_id,
            handler,
            force,
        } => remove_handler(state, &form_id, &handler, force, json).await,
        HandlerCommand::Types => list_types(json),
    }
}

async fn add_handler(
    state: &AppState,
    form_id: &str,
    request: NewHandler,
    json: bool,
) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let handler = state
        .admin
        .add_handler(&state.cli_actor(), &form_id, request)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&handler)?);
        return Ok(());
    }

    println!(
        "  {} Added {} handler '{}' at position {}.",
        style("✓").green().bold(),
        handler.handler_type(),
        style(&handler.name).cyan(),
        handler.order
    );
    Ok(())
}

async fn remove_handler(
    state: &AppState,
    form_id: &str,
    key: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let schema = state.admin.get_schema(&form_id).await?;
    let handler = resolve_handler(&schema, key)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove handler '{}' from '{}'?",
                style(&handler.name).red().bold(),
                schema.form.title
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state
        .admin
        .delete_handler(&state.cli_actor(), &form_id, &handler.id)
        .await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": handler.id}));
    } else {
        println!(
            "  {} Handler '{}' removed.",
            style("✓").red().bold(),
            handler.name
        );
    }
    Ok(())
}

fn list_types(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(HANDLER_TYPES)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Type", "Label", "Description"]);
    for descriptor in HANDLER_TYPES {
        table.add_row(vec![
            Cell::new(descriptor.handler_type.as_str()).fg(Color::Cyan),
            Cell::new(descriptor.label),
            Cell::new(descriptor.description),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}
