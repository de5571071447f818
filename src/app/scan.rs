use crate::adapter::clickhouse::SummaryRow;
use crate::config::Settings;
use crate::store::ConnectionManager;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ScanLine<'a> {
    user_id: i32,
    article_id: String,
    original_text: &'a str,
    categories: &'a [String],
    summary: &'a str,
    user_review: i32,
}

/// One JSON object per row, newline separated.
pub fn render_rows(rows: &[SummaryRow]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        let line = serde_json::to_string(&ScanLine {
            user_id: row.user_id,
            article_id: row.article_id.to_string(),
            original_text: &row.original_text,
            categories: &row.categories,
            summary: &row.summary,
            user_review: row.user_review,
        })
        .with_context(|| format!("failed to render row {}", row.article_id))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Dump the whole summaries table to stdout.
pub async fn run_scan(settings: &Settings) -> Result<()> {
    let mut manager = ConnectionManager::new();
    manager
        .connect(settings)
        .await
        .context("failed to connect to ClickHouse")?;
    let rows = manager
        .scan_all()
        .await
        .with_context(|| format!("failed to scan {}", manager.table()))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(render_rows(&rows)?.as_bytes())
        .context("failed to write scan output")?;
    ::tracing::info!(rows = rows.len(), "Scan complete");
    Ok(())
}
