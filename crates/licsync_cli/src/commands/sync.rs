//! Refresh, reload and export commands.

use super::render::{now, table};
use super::Context;
use licsync_sync_engine::CheckOutcome;
use std::fs;
use std::io::Write;
use tracing::info;

/// Runs the refresh command: one update check that always reports.
pub async fn refresh(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = ctx.load_engine().await?;
    match engine.check_for_updates(true).await? {
        CheckOutcome::Replaced { .. } => {
            print!("{}", table(engine.records().iter().enumerate(), now()))
        }
        CheckOutcome::Deferred => {
            println!("Gist changed; local edits kept. Save or reload to resolve.")
        }
        CheckOutcome::Unchanged => {}
    }
    Ok(())
}

/// Runs the reload command.
pub async fn reload(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = ctx.open_engine()?;
    engine.reload().await?;
    print!("{}", table(engine.records().iter().enumerate(), now()));
    Ok(())
}

/// Runs the export command. `-` writes to stdout.
pub async fn export(ctx: &Context, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.load_engine().await?;
    let text = engine.export();

    if output == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        if !text.is_empty() {
            stdout.write_all(b"\n")?;
        }
    } else {
        fs::write(output, &text)?;
        info!(path = output, entries = engine.records().len(), "exported");
    }
    Ok(())
}
