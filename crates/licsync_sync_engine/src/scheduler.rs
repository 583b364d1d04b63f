//! Periodic and event-driven update checks.
//!
//! A [`PollScheduler`] is one tokio task that owns a timer and listens for
//! [`PollCommand`]s. While enabled it calls [`PollTarget::poll`] every
//! interval, immediately on enable, and on every external [`Trigger`].
//! Disabling drops the timer so no further ticks fire.

use crate::config::PollSettings;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use crate::state::{CheckOutcome, SyncEngine};
use async_trait::async_trait;
use licsync_storage::KeyValueStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// An external event that asks for an immediate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The user surface became visible again.
    Visibility,
    /// The user surface regained focus.
    Focus,
}

/// Commands accepted by the scheduler task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Check now, if enabled.
    Trigger(Trigger),
    /// Turn periodic checks on or off.
    SetEnabled(bool),
    /// Change the period, in minutes.
    SetInterval(u32),
    /// End the task.
    Stop,
}

/// Something that can be asked to check for remote updates.
#[async_trait]
pub trait PollTarget: Send + Sync {
    /// Runs one silent update check.
    async fn poll(&self) -> SyncResult<CheckOutcome>;
}

#[async_trait]
impl<T: RemoteStore, B: KeyValueStore> PollTarget for Mutex<SyncEngine<T, B>> {
    async fn poll(&self) -> SyncResult<CheckOutcome> {
        self.lock().await.check_for_updates(false).await
    }
}

/// Cloneable control handle for a running scheduler.
#[derive(Debug, Clone)]
pub struct PollHandle {
    command_tx: mpsc::Sender<PollCommand>,
    settings: Arc<RwLock<PollSettings>>,
}

impl PollHandle {
    async fn send(&self, command: PollCommand) -> SyncResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SyncError::SchedulerStopped)
    }

    /// Requests an immediate check. Ignored while disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SchedulerStopped`] if the task has ended.
    pub async fn trigger(&self, trigger: Trigger) -> SyncResult<()> {
        self.send(PollCommand::Trigger(trigger)).await
    }

    /// Enables or disables periodic checks.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SchedulerStopped`] if the task has ended.
    pub async fn set_enabled(&self, enabled: bool) -> SyncResult<()> {
        self.send(PollCommand::SetEnabled(enabled)).await
    }

    /// Changes the period.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidInterval`] for zero, or
    /// [`SyncError::SchedulerStopped`] if the task has ended.
    pub async fn set_interval(&self, minutes: u32) -> SyncResult<()> {
        PollSettings::check_interval(minutes)?;
        self.send(PollCommand::SetInterval(minutes)).await
    }

    /// Stops the task.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SchedulerStopped`] if the task has already ended.
    pub async fn stop(&self) -> SyncResult<()> {
        self.send(PollCommand::Stop).await
    }

    /// Returns the settings as last applied by the task.
    pub fn settings(&self) -> PollSettings {
        *self.settings.read()
    }
}

/// Spawns the poll loop.
pub struct PollScheduler;

impl PollScheduler {
    /// Starts the scheduler task on the current tokio runtime.
    ///
    /// If `settings.enabled` is set the first check runs immediately.
    /// The task ends on [`PollCommand::Stop`] or when every handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidInterval`] if `settings.interval_minutes`
    /// is zero; no task is started.
    pub fn spawn(
        target: Arc<dyn PollTarget>,
        settings: PollSettings,
    ) -> SyncResult<(PollHandle, JoinHandle<()>)> {
        PollSettings::check_interval(settings.interval_minutes)?;

        let (tx, mut rx) = mpsc::channel::<PollCommand>(16);
        let shared = Arc::new(RwLock::new(settings));
        let task_settings = Arc::clone(&shared);

        let join = tokio::spawn(async move {
            let mut settings = settings;
            let mut ticker = settings.enabled.then(|| immediate_ticker(&settings));
            info!(
                enabled = settings.enabled,
                interval_minutes = settings.interval_minutes,
                "poll scheduler started"
            );

            loop {
                tokio::select! {
                    _ = next_tick(&mut ticker) => {
                        debug!("periodic update check");
                        run_check(target.as_ref()).await;
                    }
                    command = rx.recv() => {
                        let Some(command) = command else {
                            debug!("all poll handles dropped");
                            break;
                        };
                        match command {
                            PollCommand::Trigger(trigger) => {
                                if settings.enabled {
                                    debug!(?trigger, "triggered update check");
                                    run_check(target.as_ref()).await;
                                } else {
                                    debug!(?trigger, "auto-poll disabled, trigger ignored");
                                }
                            }
                            PollCommand::SetEnabled(true) => {
                                if !settings.enabled {
                                    settings.enabled = true;
                                    ticker = Some(immediate_ticker(&settings));
                                    info!("auto-poll enabled");
                                }
                            }
                            PollCommand::SetEnabled(false) => {
                                if settings.enabled {
                                    settings.enabled = false;
                                    ticker = None;
                                    info!("auto-poll disabled");
                                }
                            }
                            PollCommand::SetInterval(minutes) => {
                                if minutes == 0 {
                                    warn!("ignoring zero poll interval");
                                    continue;
                                }
                                settings.interval_minutes = minutes;
                                if settings.enabled {
                                    ticker = Some(delayed_ticker(&settings));
                                }
                                info!(interval_minutes = minutes, "poll interval changed");
                            }
                            PollCommand::Stop => {
                                info!("poll scheduler stopping");
                                break;
                            }
                        }
                        *task_settings.write() = settings;
                    }
                }
            }
        });

        Ok((
            PollHandle {
                command_tx: tx,
                settings: shared,
            },
            join,
        ))
    }
}

fn immediate_ticker(settings: &PollSettings) -> Interval {
    let mut ticker = time::interval(settings.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn delayed_ticker(settings: &PollSettings) -> Interval {
    let period = settings.period();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn run_check(target: &dyn PollTarget) {
    match target.poll().await {
        Ok(outcome) => debug!(?outcome, "update check finished"),
        Err(e) => debug!(error = %e, "update check failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCache;
    use crate::config::SyncConfig;
    use crate::remote::MockRemote;
    use licsync_storage::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Counter {
        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PollTarget for Counter {
        async fn poll(&self) -> SyncResult<CheckOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(CheckOutcome::Unchanged)
        }
    }

    async fn settle() {
        time::sleep(Duration::from_millis(1)).await;
    }

    fn spawn(enabled: bool, minutes: u32) -> (Arc<Counter>, PollHandle, JoinHandle<()>) {
        let counter = Arc::new(Counter::default());
        let settings = PollSettings::new(enabled, minutes).unwrap();
        let (handle, join) = PollScheduler::spawn(counter.clone(), settings).unwrap();
        (counter, handle, join)
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_checks_immediately_then_periodically() {
        let (counter, _handle, _join) = spawn(true, 1);
        settle().await;
        assert_eq!(counter.get(), 1);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.get(), 2);

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(counter.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_ignores_triggers() {
        let (counter, handle, _join) = spawn(false, 1);
        handle.trigger(Trigger::Focus).await.unwrap();
        handle.trigger(Trigger::Visibility).await.unwrap();
        settle().await;
        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_checks_immediately_and_triggers_run() {
        let (counter, handle, _join) = spawn(false, 5);
        handle.set_enabled(true).await.unwrap();
        settle().await;
        assert_eq!(counter.get(), 1);
        assert!(handle.settings().enabled);

        handle.trigger(Trigger::Visibility).await.unwrap();
        settle().await;
        assert_eq!(counter.get(), 2);

        handle.trigger(Trigger::Focus).await.unwrap();
        settle().await;
        assert_eq!(counter.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_cancels_timer() {
        let (counter, handle, _join) = spawn(true, 1);
        settle().await;
        assert_eq!(counter.get(), 1);

        handle.set_enabled(false).await.unwrap();
        settle().await;
        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(counter.get(), 1);
        assert!(!handle.settings().enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_reschedules() {
        let (counter, handle, _join) = spawn(true, 5);
        settle().await;
        assert_eq!(counter.get(), 1);

        handle.set_interval(1).await.unwrap();
        settle().await;
        assert_eq!(counter.get(), 1);
        assert_eq!(handle.settings().interval_minutes, 1);

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(counter.get(), 1);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_rejected() {
        let (_counter, handle, _join) = spawn(true, 5);
        assert!(matches!(
            handle.set_interval(0).await,
            Err(SyncError::InvalidInterval(0))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_rejects_unvalidated_zero_interval() {
        let counter = Arc::new(Counter::default());
        for enabled in [true, false] {
            let settings = PollSettings {
                enabled,
                interval_minutes: 0,
            };
            let result = PollScheduler::spawn(counter.clone(), settings);
            assert!(matches!(result, Err(SyncError::InvalidInterval(0))));
        }
        settle().await;
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_task() {
        let (_counter, handle, join) = spawn(true, 5);
        handle.stop().await.unwrap();
        join.await.unwrap();
        assert!(matches!(
            handle.trigger(Trigger::Focus).await,
            Err(SyncError::SchedulerStopped)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_engine_through_mutex() {
        let remote = Arc::new(MockRemote::with_content("DEVICE_HASH=AB12"));
        let config = SyncConfig::default().with_confirm_delay(Duration::ZERO);
        let engine = SyncEngine::new(
            config,
            Arc::clone(&remote),
            LocalCache::new(InMemoryStore::new()),
        );
        let engine = Arc::new(Mutex::new(engine));

        let (handle, _join) =
            PollScheduler::spawn(engine.clone(), PollSettings::new(true, 1).unwrap()).unwrap();
        settle().await;
        assert_eq!(engine.lock().await.records().len(), 1);

        remote.set_content("DEVICE_HASH=AB12\n\nDEVICE_HASH=CD34");
        handle.trigger(Trigger::Focus).await.unwrap();
        settle().await;
        assert_eq!(engine.lock().await.records().len(), 2);
        assert_eq!(remote.fetch_count(), 2);
    }
}
