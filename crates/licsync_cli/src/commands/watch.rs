//! Watch command: periodic update checks until interrupted.

use super::render::TableSurface;
use super::Context;
use licsync_sync_engine::{PollScheduler, PollSettings, PollTarget, Trigger};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::info;

/// Runs the watch command.
///
/// Auto-poll is on for the session whatever the stored preference says.
/// Every line on stdin asks for an immediate check.
pub async fn run(ctx: &Context, interval: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx
        .load_engine()
        .await?
        .with_surface(Arc::new(TableSurface));
    let stored = engine.cache().preferences()?.poll;
    let settings = session_settings(stored, interval)?;

    let engine = Arc::new(Mutex::new(engine));
    let target: Arc<dyn PollTarget> = engine.clone();
    let (handle, task) = PollScheduler::spawn(target, settings)?;
    info!(
        interval_minutes = settings.interval_minutes,
        "watching; press Enter to check now, Ctrl-C to stop"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(_) => handle.trigger(Trigger::Focus).await?,
                None => stdin_open = false,
            },
        }
    }

    handle.stop().await?;
    task.await?;
    info!(stats = %engine.lock().await.stats(), "watch stopped");
    Ok(())
}

fn session_settings(
    stored: PollSettings,
    interval: Option<u32>,
) -> Result<PollSettings, Box<dyn std::error::Error>> {
    let minutes = interval.unwrap_or(stored.interval_minutes);
    Ok(PollSettings::new(true, minutes)?)
}
