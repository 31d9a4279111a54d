//! Runtime commands: submit data to a form, or render it.

use anyhow::Result;
use console::style;

use formforge_types::error::FormError;

use crate::cli::{parse_form_id, read_data};
use crate::state::AppState;

pub async fn submit(state: &AppState, form_id: &str, data: &str, json: bool) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let data = read_data(data).await?;
    let form = state.composer.compose(&form_id, Some(data)).await?;

    match form.save().await {
        Ok(receipt) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                println!(
                    "  {} Submitted to '{}'.",
                    style("✓").green().bold(),
                    style(form.title()).cyan()
                );
                for name in &receipt.handlers_run {
                    println!("    {} {}", style("→").dim(), name);
                }
            }
            Ok(())
        }
        Err(FormError::Validation(errors)) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "errors": errors }))?
                );
            } else {
                println!("  {} Submission rejected.", style("✗").red().bold());
                for entry in errors.fields() {
                    for message in &entry.messages {
                        println!("    {}: {}", style(&entry.field).yellow(), message);
                    }
                }
            }
            Err(FormError::Validation(errors).into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn render(state: &AppState, form_id: &str, data: Option<&str>, json: bool) -> Result<()> {
    let form_id = parse_form_id(form_id)?;
    let data = match data {
        Some(raw) => Some(read_data(raw).await?),
        None => None,
    };
    let form = state.composer.compose(&form_id, data).await?;
    let html = form.render_html();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "form": form.descriptor(),
                "html": html,
            }))?
        );
    } else {
        println!("{html}");
    }
    Ok(())
}
