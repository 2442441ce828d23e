//! CLI history subcommands: list, show, edit, export, delete.

use std::path::Path;

use anyhow::{bail, Context, Result};

use inkread_core::{ConversionId, HISTORY_LIMIT};
use inkread_session::{ConversionController, DeleteOutcome, SaveOutcome};
use inkread_widgets::{HistoryView, TextReview};

use crate::terminal_output::{note_info, note_success, render_table, Column};

async fn load(controller: &ConversionController) -> Result<()> {
    controller
        .load_history()
        .await
        .context("Failed to load history")?;
    Ok(())
}

/// Load history and make `id` current.
async fn select(controller: &ConversionController, id: &ConversionId) -> Result<()> {
    load(controller).await?;
    if !controller.select_conversion(id).await {
        bail!("conversion {id} is not among the {HISTORY_LIMIT} most recent");
    }
    Ok(())
}

pub async fn list(controller: &ConversionController) -> Result<()> {
    load(controller).await?;
    let view = HistoryView::from_snapshot(&controller.snapshot().await);
    if let Some(placeholder) = view.placeholder() {
        note_info(placeholder);
        return Ok(());
    }

    let columns = [
        Column::left("ID"),
        Column::left("Created"),
        Column::left("Text"),
    ];
    let rows: Vec<Vec<String>> = view
        .rows()
        .iter()
        .map(|row| {
            let marker = if row.edited { " (edited)" } else { "" };
            vec![
                row.id.to_string(),
                row.created_label.clone(),
                format!("{}{marker}", row.preview),
            ]
        })
        .collect();
    print!("{}", render_table(&columns, &rows));
    Ok(())
}

pub async fn show(controller: &ConversionController, id: &ConversionId) -> Result<()> {
    select(controller, id).await?;
    println!("{}", controller.snapshot().await.current_text());
    Ok(())
}

pub async fn edit(controller: &ConversionController, id: &ConversionId, text: String) -> Result<()> {
    select(controller, id).await?;
    let mut review = TextReview::new();
    review.sync(controller.snapshot().await.current_text());
    review.edit(text);

    match review.save(controller).await {
        None => note_info("No changes to save"),
        Some(SaveOutcome::Saved) => note_success(&format!("Saved changes to {id}")),
        Some(SaveOutcome::Failed) => {
            let snapshot = controller.snapshot().await;
            bail!("{}", snapshot.error_message().unwrap_or("Failed to save changes"))
        }
        Some(other) => bail!("save did not run: {other:?}"),
    }
    Ok(())
}

pub async fn export(controller: &ConversionController, id: &ConversionId, dir: &Path) -> Result<()> {
    select(controller, id).await?;
    let mut review = TextReview::new();
    review.sync(controller.snapshot().await.current_text());

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    let path = review.export(dir).await.context("Failed to write export file")?;
    note_success(&format!("Exported to {}", path.display()));
    Ok(())
}

pub async fn delete(controller: &ConversionController, id: &ConversionId) -> Result<()> {
    match controller.delete_conversion(id).await {
        DeleteOutcome::Deleted => {
            note_success(&format!("Deleted {id}"));
            Ok(())
        }
        DeleteOutcome::Failed => {
            let snapshot = controller.snapshot().await;
            bail!("{}", snapshot.error_message().unwrap_or("Failed to delete conversion"))
        }
    }
}
