//! Local cache: the last known record snapshot plus user preferences.

use crate::config::{PollSettings, DEFAULT_POLL_INTERVAL_MINUTES};
use crate::error::{SyncError, SyncResult};
use licsync_codec::Record;
use licsync_storage::KeyValueStore;
use tracing::{debug, warn};

/// Key holding the JSON record snapshot.
pub const RECORDS_KEY: &str = "deviceHashData";
/// Key holding the source preference (`"true"` means remote).
pub const SOURCE_KEY: &str = "loadFromGist";
/// Key holding the auto-poll flag.
pub const AUTO_POLL_KEY: &str = "autoPoll";
/// Key holding the poll interval in minutes.
pub const POLL_INTERVAL_KEY: &str = "pollIntervalMinutes";
/// Key holding the bearer credential.
pub const CREDENTIAL_KEY: &str = "github_token";

/// Where the engine loads its initial data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    /// Fetch from the remote, falling back to the cache.
    Remote,
    /// Read the cache only.
    #[default]
    Cache,
}

impl DataSource {
    fn as_flag(self) -> &'static str {
        match self {
            DataSource::Remote => "true",
            DataSource::Cache => "false",
        }
    }
}

/// Stored user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    /// Initial load source.
    pub source: DataSource,
    /// Auto-poll settings.
    pub poll: PollSettings,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            poll: PollSettings::default(),
        }
    }
}

/// Durable client-side state over a [`KeyValueStore`].
///
/// Values are stored as strings under the keys exported by this module. The
/// record snapshot is a JSON array using the text format's field names.
#[derive(Debug)]
pub struct LocalCache<B: KeyValueStore> {
    store: B,
}

impl<B: KeyValueStore> LocalCache<B> {
    /// Wraps a store.
    pub fn new(store: B) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &B {
        &self.store
    }

    /// Consumes the cache, returning the store.
    pub fn into_inner(self) -> B {
        self.store
    }

    /// Reads the record snapshot.
    ///
    /// Returns `Ok(None)` if no snapshot was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CacheCorrupted`] if the snapshot is not a JSON
    /// array of records, or [`SyncError::Storage`] if the store fails.
    pub fn load_records(&self) -> SyncResult<Option<Vec<Record>>> {
        let Some(json) = self.store.get(RECORDS_KEY)? else {
            return Ok(None);
        };
        let records: Vec<Record> =
            serde_json::from_str(&json).map_err(|e| SyncError::CacheCorrupted(e.to_string()))?;
        debug!(count = records.len(), "loaded records from cache");
        Ok(Some(records))
    }

    /// Replaces the record snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the store fails.
    pub fn save_records(&mut self, records: &[Record]) -> SyncResult<()> {
        let json = serde_json::to_string(records)
            .map_err(|e| SyncError::Storage(e.into()))?;
        self.store.set(RECORDS_KEY, &json)?;
        debug!(count = records.len(), "saved records to cache");
        Ok(())
    }

    /// Reads all preferences, substituting defaults for missing or
    /// unreadable values.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the store fails.
    pub fn preferences(&self) -> SyncResult<Preferences> {
        let source = match self.store.get(SOURCE_KEY)?.as_deref() {
            Some("true") => DataSource::Remote,
            _ => DataSource::Cache,
        };

        let enabled = self.store.get(AUTO_POLL_KEY)?.as_deref() == Some("true");

        let interval_minutes = match self.store.get(POLL_INTERVAL_KEY)? {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    warn!(value = %raw, "ignoring invalid stored poll interval");
                    DEFAULT_POLL_INTERVAL_MINUTES
                }
            },
            None => DEFAULT_POLL_INTERVAL_MINUTES,
        };

        Ok(Preferences {
            source,
            poll: PollSettings {
                enabled,
                interval_minutes,
            },
        })
    }

    /// Stores the source preference.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the store fails.
    pub fn set_source(&mut self, source: DataSource) -> SyncResult<()> {
        self.store.set(SOURCE_KEY, source.as_flag())?;
        Ok(())
    }

    /// Stores the auto-poll flag.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the store fails.
    pub fn set_auto_poll(&mut self, enabled: bool) -> SyncResult<()> {
        self.store
            .set(AUTO_POLL_KEY, if enabled { "true" } else { "false" })?;
        Ok(())
    }

    /// Stores the poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidInterval`] for zero, or
    /// [`SyncError::Storage`] if the store fails.
    pub fn set_poll_interval(&mut self, minutes: u32) -> SyncResult<()> {
        PollSettings::check_interval(minutes)?;
        self.store.set(POLL_INTERVAL_KEY, &minutes.to_string())?;
        Ok(())
    }

    /// Returns the stored credential. An empty value counts as none.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the store fails.
    pub fn credential(&self) -> SyncResult<Option<String>> {
        Ok(self
            .store
            .get(CREDENTIAL_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Stores a credential.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingCredential`] for a blank token, or
    /// [`SyncError::Storage`] if the store fails.
    pub fn set_credential(&mut self, token: &str) -> SyncResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::MissingCredential);
        }
        self.store.set(CREDENTIAL_KEY, token)?;
        Ok(())
    }

    /// Forgets the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the store fails.
    pub fn clear_credential(&mut self) -> SyncResult<()> {
        self.store.remove(CREDENTIAL_KEY)?;
        Ok(())
    }
}
