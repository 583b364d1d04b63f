//! Error types for the sync engine.

use crate::notify::Severity;
use licsync_codec::CodecError;
use licsync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered but the content is unusable.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote rejected the credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote rejected an update for another reason.
    #[error("remote rejected update ({status}): {message}")]
    RemoteRejected {
        /// HTTP status code.
        status: u16,
        /// Message reported by the remote.
        message: String,
    },

    /// No cached snapshot exists.
    #[error("no local data found")]
    LocalCacheMiss,

    /// An edit or delete named a record that does not exist.
    #[error("no record at index {index} (collection has {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Collection length.
        len: usize,
    },

    /// The stored credential cannot be sent as a header value.
    #[error("GitHub token contains characters not allowed in a header")]
    InvalidCredential,

    /// A push was attempted without a stored credential.
    #[error("GitHub token is missing")]
    MissingCredential,

    /// A push was attempted with nothing to write.
    #[error("no data to update")]
    NothingToPush,

    /// An edited value cannot be represented in the text format.
    #[error("invalid value: {0}")]
    InvalidValue(#[from] CodecError),

    /// A poll interval below one minute.
    #[error("invalid poll interval: {0} minutes (must be at least 1)")]
    InvalidInterval(u32),

    /// The local store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cached snapshot is not valid JSON.
    #[error("cached data is corrupted: {0}")]
    CacheCorrupted(String),

    /// The poll scheduler task is no longer running.
    #[error("poll scheduler is not running")]
    SchedulerStopped,
}

impl SyncError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a remote unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::RemoteUnavailable(message.into())
    }

    /// Creates a rejected update error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    /// Returns the severity this error is reported with.
    pub fn severity(&self) -> Severity {
        match self {
            SyncError::LocalCacheMiss
            | SyncError::NothingToPush
            | SyncError::IndexOutOfRange { .. }
            | SyncError::InvalidValue(_)
            | SyncError::InvalidInterval(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Returns true if the user has to supply a (new) credential.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            SyncError::Unauthorized(_)
                | SyncError::MissingCredential
                | SyncError::InvalidCredential
        )
    }

    /// Returns true if the failure happened talking to the remote.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_)
                | SyncError::RemoteUnavailable(_)
                | SyncError::Unauthorized(_)
                | SyncError::RemoteRejected { .. }
        )
    }
}
