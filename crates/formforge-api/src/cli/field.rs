//! Field CLI commands: add, remove, types.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Select};

use formforge_core::registry::{self, FIELD_TYPES};
use formforge_types::field::{FieldKind, FieldType, NewField, Widget};

use crate::cli::{decode_kind, parse_form_id, resolve_field};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum FieldCommand {
    /// Attach a new field to a form.
    Add {
        /// Form ID.
        form_id: String,

        /// Field name (letters, digits, underscores).
        name: String,

        /// Field type (see `fforge field types`).
        #[arg(long = "type")]
        field_type: String,

        /// Display label (defaults to the humanized name).
        #[arg(long)]
        label: Option<String>,

        /// Help text shown under the input.
        #[arg(long)]
        help: Option<String>,

        /// Allow the field to be left empty.
        #[arg(long)]
        optional: bool,

        /// Widget (prompted when the type allows several).
        #[arg(long)]
        widget: Option<String>,

        /// Position in the form (defaults to the end).
        #[arg(long)]
        order: Option<i32>,

        /// Type-specific configuration as a JSON object,
        /// e.g. '{"max_length": 80}'.
        #[arg(long)]
        config: Option<String>,
    },

    /// Remove a field from a form.
    #[command(alias = "rm")]
    Remove {
        /// Form ID.
        form_id: String,

        /// Field ID or name.
        field: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// List registered field types and their widgets.
    Types,
}

pub async fn run(state: &AppState, command: FieldCommand, json: bool) -> Result<()> {
    match command {
        FieldCommand::Add {
            form_id,
            name,
            field_type,
            label,
            help,
            optional,
            widget,
            order,
            config,
        } => {
            let field_type = registry::resolve_field_discriminator(&field_type)?;
            let kind: FieldKind = match config {
                Some(raw) => decode_kind(field_type.as_str(), Some(&raw))?,
                None => FieldKind::empty(field_type),
            };
            let widget = match widget {
                Some(name) => Some(registry::parse_widget(&name)?),
                None if !json && prompt_available(field_type) => Some(pick_widget(field_type)?),
                None => None,
            };

            let request = NewField {
                name,
                label,
                help_text: help,
                required: Some(!optional),
                widget,
                order,
                kind,
            };
            add_field(state, &form_id, request, json).await
        }
        FieldCommand::Remove {
            form_id,
            field,
            force,
        } => remove_field(state, &form_id, &field, force, json).await,
        FieldCommand::Types => list_types(json),
    }
}

fn prompt_available(field_type: FieldType) -> bool {
    registry::widget_choice_required(field_type) && console::Term::stdout().is_term()
}

fn pick_widget(field_type: FieldType) -> Result<Widget> {
    let widgets = registry::permitted_widgets(field_type);
    let items: Vec<&str> = widgets.iter().map(|w| w.as_str()).collect();
    let selection = Select::new()
        .with_prompt(format!("Widget for {} field", field_type))
        .items(&items)
        .default(0)
        .interact()?;
    Ok(widgets[selection])
}

async fn add_field(state: &AppState, form_id: &str, request: NewField, json: bool) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let field = state
        .admin
        .add_field(&state.cli_actor(), &form_id, request)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&field)?);
        return Ok(());
    }

    println!(
        "  {} Added {} field '{}' ({}) at position {}.",
        style("✓").green().bold(),
        field.field_type(),
        style(&field.name).cyan(),
        field.widget,
        field.order
    );
    Ok(())
}

async fn remove_field(
    state: &AppState,
    form_id: &str,
    key: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let schema = state.admin.get_schema(&form_id).await?;
    let field = resolve_field(&schema, key)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove field '{}' from '{}'?",
                style(&field.name).red().bold(),
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
        .delete_field(&state.cli_actor(), &form_id, &field.id)
        .await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": field.id}));
    } else {
        println!("  {} Field '{}' removed.", style("✓").red().bold(), field.name);
    }
    Ok(())
}

fn list_types(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(FIELD_TYPES)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Type", "Label", "Widgets"]);
    for descriptor in FIELD_TYPES {
        let widgets: Vec<&str> = descriptor.widgets.iter().map(|w| w.as_str()).collect();
        table.add_row(vec![
            Cell::new(descriptor.field_type.as_str()).fg(Color::Cyan),
            Cell::new(descriptor.label),
            Cell::new(widgets.join(", ")),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}
