//! # licsync Sync Engine
//!
//! Keeps a list of license records in step with a single remote text file
//! (a GitHub Gist), with a local key-value cache as fallback.
//!
//! This crate provides:
//! - [`SyncEngine`]: the record collection, dirty tracking, save and reload
//! - [`LocalCache`]: snapshot and preference persistence over a
//!   [`licsync_storage::KeyValueStore`]
//! - [`RemoteStore`]: the remote abstraction, with [`GistClient`] over HTTP
//!   and [`MockRemote`] for tests
//! - [`PollScheduler`]: periodic and event-driven update checks
//!
//! ## Sync Model
//!
//! The remote file is authoritative and always written whole:
//! 1. Load from the remote (or the cache when configured or unreachable)
//! 2. Edit locally; the collection becomes dirty
//! 3. Save pushes the full encoded snapshot, then re-fetches to confirm
//! 4. Polling compares the remote text with the last text seen and replaces
//!    the collection when they differ
//!
//! ## Key Invariants
//!
//! - Dirty is cleared only by a successful push or a fresh remote load
//! - Engine operations take `&mut self` and never interleave
//! - A poll that replaces unsaved edits says so in its result
//! - Every operation reports a (severity, message) pair to the [`Notifier`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod gist;
mod notify;
mod remote;
mod scheduler;
mod state;

pub use cache::{
    DataSource, LocalCache, Preferences, AUTO_POLL_KEY, CREDENTIAL_KEY, POLL_INTERVAL_KEY,
    RECORDS_KEY, SOURCE_KEY,
};
pub use config::{
    ConflictPolicy, PollSettings, SyncConfig, DEFAULT_API_URL, DEFAULT_CONFIRM_DELAY,
    DEFAULT_FILE_NAME, DEFAULT_GIST_ID, DEFAULT_POLL_INTERVAL_MINUTES, DEFAULT_RAW_URL,
};
pub use error::{SyncError, SyncResult};
pub use gist::GistClient;
pub use notify::{Notifier, NullSurface, RenderSurface, Severity, TracingNotifier};
pub use remote::{MockRemote, RemoteStore};
pub use scheduler::{PollCommand, PollHandle, PollScheduler, PollTarget, Trigger};
pub use state::{CheckOutcome, LoadSource, PushOutcome, SyncEngine, SyncStats, SyncStatus};
