//! The sync engine: record collection, dirty tracking, load, save and poll.

use crate::cache::{DataSource, LocalCache};
use crate::config::{ConflictPolicy, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::notify::{Notifier, NullSurface, RenderSurface, Severity, TracingNotifier};
use crate::remote::RemoteStore;
use chrono::{DateTime, NaiveDateTime, Utc};
use licsync_codec::{decode, encode, Field, Record};
use licsync_storage::KeyValueStore;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where [`SyncEngine::initialize`] got its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Fetched from the remote.
    Remote,
    /// Read from the local cache.
    Cache,
}

/// Result of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Pushed and re-fetched; the collection now mirrors the remote.
    Confirmed,
    /// Pushed, but the confirming fetch failed. Dirty is still cleared.
    Unconfirmed {
        /// Why the confirming fetch failed.
        reason: String,
    },
}

/// Result of a successful update check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Remote text matches the last text seen.
    Unchanged,
    /// Remote changed and replaced the collection.
    Replaced {
        /// True if unsaved local edits were overwritten.
        discarded_local_changes: bool,
    },
    /// Remote changed while dirty and [`ConflictPolicy::KeepLocal`] kept the
    /// local collection.
    Deferred,
}

/// Counters for engine activity.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Successful remote loads, including confirmations and replacements.
    pub remote_loads: u64,
    /// Successful pushes.
    pub pushes: u64,
    /// Update checks attempted.
    pub checks: u64,
    /// Checks that replaced unsaved edits.
    pub discarded_edits: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} remote loads, {} pushes, {} checks, {} discarded edits",
            self.remote_loads, self.pushes, self.checks, self.discarded_edits
        )?;
        if let Some(error) = &self.last_error {
            write!(f, " | last error: {error}")?;
        }
        Ok(())
    }
}

/// Snapshot of engine state for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    /// Unsaved local edits exist.
    pub dirty: bool,
    /// Number of records in the collection.
    pub record_count: usize,
    /// Last successful push or remote load.
    pub last_sync: Option<DateTime<Utc>>,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dirty {
            f.write_str("Unsaved changes")?;
        } else {
            f.write_str("All changes saved")?;
        }
        write!(f, " | {} entries", self.record_count)?;
        if let Some(at) = self.last_sync {
            write!(f, " | last update {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

/// Owns the record collection and keeps it in step with a [`RemoteStore`].
///
/// All operations take `&mut self`. To share an engine with a
/// [`crate::PollScheduler`], wrap it in `Arc<tokio::sync::Mutex<_>>`.
pub struct SyncEngine<T: RemoteStore, B: KeyValueStore> {
    config: SyncConfig,
    remote: Arc<T>,
    cache: LocalCache<B>,
    notifier: Arc<dyn Notifier>,
    surface: Arc<dyn RenderSurface>,
    records: Vec<Record>,
    dirty: bool,
    last_known_remote_text: Option<String>,
    last_sync: Option<DateTime<Utc>>,
    stats: SyncStats,
}

impl<T: RemoteStore, B: KeyValueStore> SyncEngine<T, B> {
    /// Creates an engine with an empty collection.
    ///
    /// Notifications go to [`TracingNotifier`] and nothing is rendered until
    /// collaborators are supplied.
    pub fn new(config: SyncConfig, remote: T, cache: LocalCache<B>) -> Self {
        Self {
            config,
            remote: Arc::new(remote),
            cache,
            notifier: Arc::new(TracingNotifier),
            surface: Arc::new(NullSurface),
            records: Vec::new(),
            dirty: false,
            last_known_remote_text: None,
            last_sync: None,
            stats: SyncStats::default(),
        }
    }

    /// Sets the notification sink.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets the render surface.
    pub fn with_surface(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.surface = surface;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sets the conflict policy for update checks.
    pub fn set_conflict_policy(&mut self, policy: ConflictPolicy) {
        self.config.conflict_policy = policy;
    }

    /// Returns the remote store.
    pub fn remote(&self) -> &T {
        &self.remote
    }

    /// Returns the local cache.
    pub fn cache(&self) -> &LocalCache<B> {
        &self.cache
    }

    /// Returns the local cache for preference and credential changes.
    pub fn cache_mut(&mut self) -> &mut LocalCache<B> {
        &mut self.cache
    }

    /// Returns the collection.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns true if local edits have not been pushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the remote text most recently seen or written.
    pub fn last_known_remote_text(&self) -> Option<&str> {
        self.last_known_remote_text.as_deref()
    }

    /// Returns the time of the last successful push or remote load.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Returns activity counters.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Returns a display snapshot.
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            dirty: self.dirty,
            record_count: self.records.len(),
            last_sync: self.last_sync,
        }
    }

    /// Loads initial data according to the stored source preference.
    ///
    /// With [`DataSource::Remote`] a failed fetch falls back to the cache.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LocalCacheMiss`] if the cache is needed and
    /// empty, leaving the collection empty.
    pub async fn initialize(&mut self) -> SyncResult<LoadSource> {
        let prefs = match self.cache.preferences() {
            Ok(prefs) => prefs,
            Err(e) => return Err(self.report(e)),
        };

        match prefs.source {
            DataSource::Cache => self.load_cache(),
            DataSource::Remote => {
                self.notify(Severity::Info, "Loading data from Gist...");
                match self.load_remote().await {
                    Ok(()) => {
                        self.notify(Severity::Success, "Successfully loaded data from Gist");
                        Ok(LoadSource::Remote)
                    }
                    Err(e) => {
                        warn!(error = %e, "remote load failed, falling back to cache");
                        self.stats.last_error = Some(e.to_string());
                        self.notify(
                            Severity::Warning,
                            &format!(
                                "Failed to load from Gist ({e}). Loading local data instead (degraded mode)."
                            ),
                        );
                        self.load_cache()
                    }
                }
            }
        }
    }

    fn load_cache(&mut self) -> SyncResult<LoadSource> {
        match self.cache.load_records() {
            Ok(Some(records)) => {
                self.records = records;
                self.dirty = false;
                self.surface.render(&self.records);
                info!(count = self.records.len(), "loaded from cache");
                self.notify(Severity::Success, "Data loaded from local storage.");
                Ok(LoadSource::Cache)
            }
            Ok(None) => {
                self.notify(
                    Severity::Warning,
                    "No local data found. Add new entries or load from Gist.",
                );
                Err(SyncError::LocalCacheMiss)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn load_remote(&mut self) -> SyncResult<()> {
        let text = self.remote.fetch_latest().await?;
        self.replace_from_remote(text);
        Ok(())
    }

    fn replace_from_remote(&mut self, text: String) {
        self.records = decode(&text);
        self.last_known_remote_text = Some(text);
        self.dirty = false;
        self.last_sync = Some(Utc::now());
        self.stats.remote_loads += 1;

        if let Err(e) = self.cache.save_records(&self.records) {
            warn!(error = %e, "failed to refresh cache snapshot");
        }
        info!(count = self.records.len(), "collection replaced from remote");
        self.surface.render(&self.records);
    }

    fn check_index(&self, index: usize) -> SyncResult<()> {
        if index >= self.records.len() {
            return Err(SyncError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(())
    }

    /// Sets one field of the record at `index`. No remote call is made.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::IndexOutOfRange`] or [`SyncError::InvalidValue`];
    /// the collection is unchanged in either case.
    pub fn apply_field_edit(&mut self, index: usize, field: Field, value: &str) -> SyncResult<()> {
        if let Err(e) = self.check_index(index) {
            return Err(self.report(e));
        }
        if let Err(e) = self.records[index].set_field(field, value) {
            return Err(self.report(e.into()));
        }

        self.dirty = true;
        debug!(index, %field, "field edited");
        self.surface.render(&self.records);
        self.notify(Severity::Info, &format!("Entry {index} updated"));
        Ok(())
    }

    /// Prepends an empty record expiring now (UTC).
    pub fn add_entry(&mut self) {
        self.add_entry_at(Utc::now().naive_utc());
    }

    /// Prepends an empty record expiring at `now`, floored to the minute.
    pub fn add_entry_at(&mut self, now: NaiveDateTime) {
        self.records.insert(0, Record::draft(now));
        self.dirty = true;
        self.surface.render(&self.records);
        self.notify(Severity::Info, "New entry added");
    }

    /// Removes the record at `index` and immediately pushes.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::IndexOutOfRange`] without touching the
    /// collection, or any error from [`Self::push`].
    pub async fn delete_entry(&mut self, index: usize) -> SyncResult<PushOutcome> {
        if let Err(e) = self.check_index(index) {
            return Err(self.report(e));
        }

        let removed = self.records.remove(index);
        self.dirty = true;
        debug!(index, device_hash = %removed.device_hash, "entry deleted");
        self.surface.render(&self.records);
        self.notify(Severity::Warning, "Entry deleted. Updating Gist...");

        self.push().await
    }

    /// Writes the whole collection to the remote, then re-fetches it.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MissingCredential`] if no token is stored
    /// - [`SyncError::NothingToPush`] if no record has a device hash
    /// - any remote error from the push itself; dirty stays set
    ///
    /// A failed confirmation fetch is not an error: it is reported as
    /// [`PushOutcome::Unconfirmed`].
    pub async fn push(&mut self) -> SyncResult<PushOutcome> {
        let credential = match self.cache.credential() {
            Ok(Some(credential)) => credential,
            Ok(None) => return Err(self.report(SyncError::MissingCredential)),
            Err(e) => return Err(self.report(e)),
        };

        if !self.records.iter().any(Record::is_persistable) {
            return Err(self.report(SyncError::NothingToPush));
        }

        let text = encode(&self.records);
        if let Err(e) = self.remote.push_snapshot(&text, &credential).await {
            if matches!(e, SyncError::Unauthorized(_)) {
                if let Err(clear) = self.cache.clear_credential() {
                    warn!(error = %clear, "failed to clear rejected credential");
                }
                warn!("credential rejected, cleared");
            }
            return Err(self.report(e));
        }

        info!(bytes = text.len(), "gist updated");
        self.last_known_remote_text = Some(text);
        self.dirty = false;
        self.last_sync = Some(Utc::now());
        self.stats.pushes += 1;
        self.notify(Severity::Success, "Gist updated successfully!");

        if !self.config.confirm_delay.is_zero() {
            tokio::time::sleep(self.config.confirm_delay).await;
        }

        match self.load_remote().await {
            Ok(()) => Ok(PushOutcome::Confirmed),
            Err(e) => {
                warn!(error = %e, "confirmation fetch failed");
                self.stats.last_error = Some(e.to_string());
                self.notify(
                    Severity::Warning,
                    &format!("Gist updated, but reloading it failed: {e}"),
                );
                Ok(PushOutcome::Unconfirmed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Compares the remote text with the last text seen and reloads on
    /// divergence.
    ///
    /// Under [`ConflictPolicy::RemoteWins`] unsaved edits are overwritten and
    /// the outcome says so.
    ///
    /// # Errors
    ///
    /// Returns the fetch error. It is reported to the notifier only when
    /// `notify_if_unchanged` is set.
    pub async fn check_for_updates(&mut self, notify_if_unchanged: bool) -> SyncResult<CheckOutcome> {
        self.stats.checks += 1;

        let text = match self.remote.fetch_latest().await {
            Ok(text) => text,
            Err(e) => {
                if notify_if_unchanged {
                    return Err(self.report(e));
                }
                debug!(error = %e, "update check failed");
                self.stats.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        if self.last_known_remote_text.as_deref() == Some(text.as_str()) {
            if notify_if_unchanged {
                self.notify(Severity::Info, "No updates found");
            }
            return Ok(CheckOutcome::Unchanged);
        }

        if self.dirty && self.config.conflict_policy == ConflictPolicy::KeepLocal {
            self.notify(
                Severity::Warning,
                "Remote data changed while you have unsaved edits. Keeping local changes; saving will overwrite the remote.",
            );
            return Ok(CheckOutcome::Deferred);
        }

        let discarded = self.dirty;
        self.replace_from_remote(text);

        if discarded {
            self.stats.discarded_edits += 1;
            self.notify(
                Severity::Warning,
                "Remote data changed. Unsaved local edits were discarded.",
            );
        } else {
            self.notify(Severity::Info, "Remote data changed. Reloaded.");
        }

        Ok(CheckOutcome::Replaced {
            discarded_local_changes: discarded,
        })
    }

    /// Unconditionally replaces the collection with the remote content,
    /// discarding unsaved edits.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the collection is unchanged.
    pub async fn reload(&mut self) -> SyncResult<()> {
        self.notify(Severity::Info, "Loading data from Gist...");
        if let Err(e) = self.load_remote().await {
            return Err(self.report(e));
        }
        self.notify(Severity::Success, "Successfully loaded data from Gist");
        Ok(())
    }

    /// Returns every record whose device hash equals `device_hash` exactly,
    /// with its index.
    pub fn search(&self, device_hash: &str) -> Vec<(usize, &Record)> {
        let needle = device_hash.trim();
        if needle.is_empty() {
            self.notify(Severity::Warning, "Please enter a Device Hash to search");
            return Vec::new();
        }

        let found: Vec<(usize, &Record)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.device_hash == needle)
            .collect();

        if found.is_empty() {
            self.notify(Severity::Error, "No matching Device Hash found");
        } else {
            self.notify(
                Severity::Success,
                &format!("Found {} matching entry(ies)", found.len()),
            );
        }
        found
    }

    /// Encodes the collection in the remote text format.
    pub fn export(&self) -> String {
        encode(&self.records)
    }

    fn notify(&self, severity: Severity, message: &str) {
        self.notifier.notify(severity, message);
    }

    fn report(&mut self, error: SyncError) -> SyncError {
        self.stats.last_error = Some(error.to_string());
        self.notifier.notify(error.severity(), &error.to_string());
        error
    }
}
