//! Remote store abstraction.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// The single hosted text file acting as the source of truth.
///
/// Implementations do not touch any local state. Neither operation retries.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the current published content.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Network`] if no response arrived
    /// - [`SyncError::RemoteUnavailable`] for a non-success status or an
    ///   empty body
    async fn fetch_latest(&self) -> SyncResult<String>;

    /// Replaces the remote content with `text`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Network`] if no response arrived
    /// - [`SyncError::Unauthorized`] if the credential was rejected
    /// - [`SyncError::RemoteRejected`] for any other non-success status
    async fn push_snapshot(&self, text: &str, credential: &str) -> SyncResult<()>;
}

#[async_trait]
impl<R: RemoteStore + ?Sized> RemoteStore for Arc<R> {
    async fn fetch_latest(&self) -> SyncResult<String> {
        (**self).fetch_latest().await
    }

    async fn push_snapshot(&self, text: &str, credential: &str) -> SyncResult<()> {
        (**self).push_snapshot(text, credential).await
    }
}

#[derive(Debug, Default)]
struct MockState {
    content: Option<String>,
    offline: bool,
    accepted_credential: Option<String>,
    fetch_failures: VecDeque<SyncError>,
    push_failures: VecDeque<SyncError>,
    fetch_count: usize,
    pushes: Vec<String>,
}

/// An in-memory remote for testing.
///
/// A successful push replaces the content, so the engine's confirming fetch
/// sees what it wrote.
#[derive(Debug, Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

impl MockRemote {
    /// Creates a mock with no content; fetches fail until content is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock serving `text`.
    pub fn with_content(text: impl Into<String>) -> Self {
        let remote = Self::new();
        remote.set_content(text);
        remote
    }

    /// Replaces the served content, as another client's save would.
    pub fn set_content(&self, text: impl Into<String>) {
        self.state.lock().content = Some(text.into());
    }

    /// Returns the served content.
    pub fn content(&self) -> Option<String> {
        self.state.lock().content.clone()
    }

    /// Makes every call fail with [`SyncError::Network`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Rejects pushes whose credential differs from `credential`.
    pub fn require_credential(&self, credential: impl Into<String>) {
        self.state.lock().accepted_credential = Some(credential.into());
    }

    /// Makes the next fetch fail with `error`.
    pub fn fail_next_fetch(&self, error: SyncError) {
        self.state.lock().fetch_failures.push_back(error);
    }

    /// Makes the next push fail with `error`.
    pub fn fail_next_push(&self, error: SyncError) {
        self.state.lock().push_failures.push_back(error);
    }

    /// Number of fetch attempts so far.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetch_count
    }

    /// Number of push attempts so far.
    pub fn push_count(&self) -> usize {
        self.state.lock().pushes.len()
    }

    /// Texts of every push attempt, in order.
    pub fn pushes(&self) -> Vec<String> {
        self.state.lock().pushes.clone()
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn fetch_latest(&self) -> SyncResult<String> {
        let mut state = self.state.lock();
        state.fetch_count += 1;

        if let Some(err) = state.fetch_failures.pop_front() {
            return Err(err);
        }
        if state.offline {
            return Err(SyncError::network("mock remote is offline"));
        }
        match state.content.as_deref() {
            None => Err(SyncError::unavailable("404 Not Found")),
            Some("") => Err(SyncError::unavailable("empty response body")),
            Some(text) => Ok(text.to_string()),
        }
    }

    async fn push_snapshot(&self, text: &str, credential: &str) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.pushes.push(text.to_string());

        if let Some(err) = state.push_failures.pop_front() {
            return Err(err);
        }
        if state.offline {
            return Err(SyncError::network("mock remote is offline"));
        }
        if let Some(accepted) = &state.accepted_credential {
            if accepted != credential {
                return Err(SyncError::Unauthorized("Bad credentials".into()));
            }
        }
        state.content = Some(text.to_string());
        Ok(())
    }
}
