//! Model-bound form attributes: list what is still available, or add
//! attributes as fields.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use formforge_core::registry;

use crate::cli::parse_form_id;
use crate::state::AppState;

pub async fn run(state: &AppState, form_id: &str, add: Vec<String>, json: bool) -> Result<()> {
    let form_id = parse_form_id(form_id)?;

    if !add.is_empty() {
        let fields = state
            .admin
            .add_model_fields(&state.cli_actor(), &form_id, &add)
            .await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&fields)?);
        } else {
            for field in &fields {
                println!(
                    "  {} {} ({})",
                    style("+").green().bold(),
                    style(&field.name).cyan(),
                    field.field_type()
                );
            }
        }
        return Ok(());
    }

    let available = state.admin.available_attributes(&form_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&available)?);
        return Ok(());
    }

    if available.is_empty() {
        println!("  {}", style("Every mappable attribute is already a field.").dim());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Attribute", "Label", "Field type", "Required"]);
    for attr in &available {
        let field_type = registry::field_type_for(attr)
            .map(|t| t.to_string())
            .unwrap_or_else(|_| "-".to_string());
        table.add_row(vec![
            Cell::new(&attr.name).fg(Color::Cyan),
            Cell::new(attr.label.as_deref().unwrap_or("")),
            Cell::new(field_type),
            Cell::new(if attr.required { "yes" } else { "no" }),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    println!(
        "  Add with: {}",
        style(format!("fforge attributes {form_id} --add name,email")).yellow()
    );
    println!();
    Ok(())
}
