//! Form lifecycle CLI commands: create, list, show, delete, clone.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};

use formforge_core::registry;
use formforge_core::repository::form::FormFilter;
use formforge_types::form::{CloneFormRequest, CreateFormRequest};

use crate::cli::parse_form_id;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum FormCommand {
    /// Create a new form.
    Create {
        /// Form title (prompted if omitted).
        #[arg(long)]
        title: Option<String>,

        /// Target data model, for a model-bound form.
        #[arg(long)]
        model: Option<String>,
    },

    /// List forms.
    #[command(alias = "ls")]
    List {
        /// Only forms whose title contains this text.
        #[arg(long)]
        title: Option<String>,

        /// Only forms bound to this model.
        #[arg(long)]
        model: Option<String>,
    },

    /// Show a form with its fields and handlers.
    Show {
        /// Form ID.
        form_id: String,
    },

    /// Delete a form and everything attached to it.
    #[command(alias = "rm")]
    Delete {
        /// Form ID.
        form_id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Copy a form with all of its fields and handlers.
    Clone {
        /// Source form ID.
        form_id: String,

        /// Title of the copy (defaults to "<source title> (copy)").
        #[arg(long)]
        title: Option<String>,
    },
}

pub async fn run(state: &AppState, command: FormCommand, json: bool) -> Result<()> {
    match command {
        FormCommand::Create { title, model } => create_form(state, title, model, json).await,
        FormCommand::List { title, model } => list_forms(state, title, model, json).await,
        FormCommand::Show { form_id } => show_form(state, &form_id, json).await,
        FormCommand::Delete { form_id, force } => delete_form(state, &form_id, force, json).await,
        FormCommand::Clone { form_id, title } => clone_form(state, &form_id, title, json).await,
    }
}

async fn create_form(
    state: &AppState,
    title: Option<String>,
    model: Option<String>,
    json: bool,
) -> Result<()> {
    let title = match title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("Form title")
            .interact_text()?,
    };

    let form = state
        .admin
        .create_form(
            &state.cli_actor(),
            CreateFormRequest {
                title,
                target_model: model,
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&form)?);
        return Ok(());
    }

    println!();
    println!("  {} Form created.", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Title:").bold(), style(&form.title).cyan());
    if let Some(model) = &form.target_model {
        println!("  {}  {}", style("Model:").bold(), model);
    }
    println!("  {}     {}", style("ID:").bold(), style(form.id.to_string()).dim());
    println!();
    println!(
        "  Add a field: {}",
        style(format!("fforge field add {} <name> --type char", form.id)).yellow()
    );
    println!();
    Ok(())
}

async fn list_forms(
    state: &AppState,
    title: Option<String>,
    model: Option<String>,
    json: bool,
) -> Result<()> {
    let forms = state
        .admin
        .list_forms(Some(FormFilter {
            title_contains: title,
            target_model: model,
            ..Default::default()
        }))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forms)?);
        return Ok(());
    }

    if forms.is_empty() {
        println!();
        println!(
            "  {} No forms found. Create one with: {}",
            style("i").blue().bold(),
            style("fforge form create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for form in &forms {
        table.add_row(vec![
            Cell::new(&form.title).fg(Color::Cyan),
            Cell::new(form.target_model.as_deref().unwrap_or("-")),
            Cell::new(form.id.to_string()).fg(Color::DarkGrey),
            Cell::new(form.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} form{}",
        style(forms.len()).bold(),
        if forms.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

async fn show_form(state: &AppState, form_id: &str, json: bool) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let schema = state.admin.get_schema(&form_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&schema.form.title).cyan().bold());
    println!("  {}", style(schema.form.id.to_string()).dim());
    if let Some(model) = &schema.form.target_model {
        println!("  bound to model {}", style(model).bold());
    }
    println!();

    if schema.fields.is_empty() {
        println!("  {}", style("No fields.").dim());
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Order", "Name", "Label", "Type", "Widget", "Required"]);
        for field in &schema.fields {
            table.add_row(vec![
                Cell::new(field.order),
                Cell::new(&field.name).fg(Color::Cyan),
                Cell::new(&field.label),
                Cell::new(registry::field_descriptor(field.field_type()).label),
                Cell::new(field.widget.as_str()),
                if field.required {
                    Cell::new("yes").fg(Color::Green)
                } else {
                    Cell::new("no").fg(Color::DarkGrey)
                },
            ]);
        }
        println!("{table}");
    }
    println!();

    if schema.handlers.is_empty() {
        println!("  {}", style("No handlers.").dim());
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(vec!["Order", "Name", "Type"]);
        for handler in &schema.handlers {
            table.add_row(vec![
                Cell::new(handler.order),
                Cell::new(&handler.name).fg(Color::Cyan),
                Cell::new(handler.handler_type().as_str()),
            ]);
        }
        println!("{table}");
    }
    println!();
    Ok(())
}

async fn delete_form(state: &AppState, form_id: &str, force: bool, json: bool) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let form = state.admin.get_form(&form_id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete form '{}' with its fields and handlers?",
                style(&form.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.admin.delete_form(&state.cli_actor(), &form_id).await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": form_id}));
    } else {
        println!("  {} Form '{}' deleted.", style("✓").red().bold(), form.title);
    }
    Ok(())
}

async fn clone_form(
    state: &AppState,
    form_id: &str,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let title = match title {
        Some(t) => t,
        None => format!("{} (copy)", state.admin.get_form(&form_id).await?.title),
    };

    let copy = state
        .admin
        .clone_form(&state.cli_actor(), &form_id, CloneFormRequest { title })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&copy)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Cloned into '{}' ({} fields, {} handlers).",
        style("✓").green().bold(),
        style(&copy.form.title).cyan(),
        copy.fields.len(),
        copy.handlers.len()
    );
    println!("  {}", style(copy.form.id.to_string()).dim());
    println!();
    Ok(())
}
