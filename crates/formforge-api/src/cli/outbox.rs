//! List mail queued by notification and confirmation handlers.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

pub async fn run(state: &AppState, json: bool) -> Result<()> {
    let queued = state.outbox.list_queued().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&queued)?);
        return Ok(());
    }

    if queued.is_empty() {
        println!("  {}", style("Outbox is empty.").dim());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Queued", "From", "To", "Subject"]);
    for item in &queued {
        table.add_row(vec![
            Cell::new(item.queued_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(&item.email.from),
            Cell::new(item.email.to.join(", ")).fg(Color::Cyan),
            Cell::new(&item.email.subject),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}
