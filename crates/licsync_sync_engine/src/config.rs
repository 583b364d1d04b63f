//! Configuration for the sync engine.

use crate::error::{SyncError, SyncResult};
use std::time::Duration;

/// Gist holding the license list.
pub const DEFAULT_GIST_ID: &str = "552beb4c3904173631f320a2ca87296e";
/// File inside the gist that carries the records.
pub const DEFAULT_FILE_NAME: &str = "license_pig.txt";
/// Published raw content of the gist.
pub const DEFAULT_RAW_URL: &str =
    "https://gist.githubusercontent.com/Unknow-Hahaha/552beb4c3904173631f320a2ca87296e/raw";
/// GitHub REST API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Pause between a successful push and the confirming fetch.
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_millis(1500);
/// Poll interval used when none is stored.
pub const DEFAULT_POLL_INTERVAL_MINUTES: u32 = 5;

/// What a poll does when the remote changed while local edits are unsaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Replace the local collection with the remote one.
    #[default]
    RemoteWins,
    /// Keep the local collection; the next save overwrites the remote.
    KeepLocal,
}

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Gist identifier used for updates.
    pub gist_id: String,
    /// Name of the file inside the gist.
    pub file_name: String,
    /// URL of the published raw content.
    pub raw_url: String,
    /// Base URL of the REST API.
    pub api_base_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Delay between a successful push and the confirming fetch.
    pub confirm_delay: Duration,
    /// Whether to append a `t=<millis>` query parameter to raw fetches.
    pub cache_bust: bool,
    /// Conflict policy for poll-detected changes.
    pub conflict_policy: ConflictPolicy,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(
        gist_id: impl Into<String>,
        file_name: impl Into<String>,
        raw_url: impl Into<String>,
    ) -> Self {
        Self {
            gist_id: gist_id.into(),
            file_name: file_name.into(),
            raw_url: raw_url.into(),
            api_base_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("licsync/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            confirm_delay: DEFAULT_CONFIRM_DELAY,
            cache_bust: true,
            conflict_policy: ConflictPolicy::RemoteWins,
        }
    }

    /// Sets the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the confirmation delay.
    pub fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = delay;
        self
    }

    /// Enables or disables cache-busting on raw fetches.
    pub fn with_cache_bust(mut self, enabled: bool) -> Self {
        self.cache_bust = enabled;
        self
    }

    /// Sets the conflict policy.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Returns the PATCH endpoint for the gist.
    pub fn update_url(&self) -> String {
        format!(
            "{}/gists/{}",
            self.api_base_url.trim_end_matches('/'),
            self.gist_id
        )
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GIST_ID, DEFAULT_FILE_NAME, DEFAULT_RAW_URL)
    }
}

/// Auto-poll settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Whether periodic checks run.
    pub enabled: bool,
    /// Minutes between checks, at least 1.
    pub interval_minutes: u32,
}

impl PollSettings {
    /// Creates validated poll settings.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidInterval`] if `interval_minutes` is zero.
    pub fn new(enabled: bool, interval_minutes: u32) -> SyncResult<Self> {
        Self::check_interval(interval_minutes)?;
        Ok(Self {
            enabled,
            interval_minutes,
        })
    }

    /// Validates an interval in minutes.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidInterval`] if `minutes` is zero.
    pub fn check_interval(minutes: u32) -> SyncResult<()> {
        if minutes == 0 {
            return Err(SyncError::InvalidInterval(minutes));
        }
        Ok(())
    }

    /// Returns the interval as a duration.
    pub fn period(&self) -> Duration {
        minutes(self.interval_minutes)
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
        }
    }
}

pub(crate) fn minutes(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * 60)
}
