//! Test fixtures and engine helpers.
//!
//! Provides recording collaborators, sample data and a pre-wired engine so
//! tests can drive the sync engine and assert on what a user would see.

use chrono::NaiveDateTime;
use licsync_codec::Record;
use licsync_storage::{FileStore, InMemoryStore};
use licsync_sync_engine::{
    LocalCache, MockRemote, Notifier, RenderSurface, Severity, SyncConfig, SyncEngine,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Three records in the remote text format.
pub const SAMPLE_TEXT: &str = "DEVICE_HASH=AB12\nUSER=alice\nEXPIRY=2025-01-01 10:00\n\n\
DEVICE_HASH=CD34\nUSER=bob\nEXPIRY=2025-02-01 09:30\n\n\
DEVICE_HASH=EF56\nUSER=carol\nEXPIRY=2024-12-01 00:00";

/// The records encoded in [`SAMPLE_TEXT`].
pub fn sample_records() -> Vec<Record> {
    vec![
        Record::new("AB12", "alice", "2025-01-01 10:00"),
        Record::new("CD34", "bob", "2025-02-01 09:30"),
        Record::new("EF56", "carol", "2024-12-01 00:00"),
    ]
}

/// A fixed clock reading for deterministic expiry tests.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2025-01-01 00:00", "%Y-%m-%d %H:%M")
        .expect("valid fixed timestamp")
}

/// A notifier that keeps every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all notifications so far.
    pub fn events(&self) -> Vec<(Severity, String)> {
        self.events.lock().clone()
    }

    /// Returns the most recent notification.
    pub fn last(&self) -> Option<(Severity, String)> {
        self.events.lock().last().cloned()
    }

    /// Counts notifications of one severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }

    /// Returns true if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.events.lock().iter().any(|(_, m)| m.contains(needle))
    }

    /// Forgets everything recorded.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.events.lock().push((severity, message.to_string()));
    }
}

/// A render surface that keeps every frame.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    frames: Mutex<Vec<Vec<Record>>>,
}

impl RecordingSurface {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// The most recently rendered collection.
    pub fn last_frame(&self) -> Option<Vec<Record>> {
        self.frames.lock().last().cloned()
    }
}

impl RenderSurface for RecordingSurface {
    fn render(&self, records: &[Record]) {
        self.frames.lock().push(records.to_vec());
    }
}

/// Engine type used by [`TestEngine`].
pub type MockEngine = SyncEngine<Arc<MockRemote>, InMemoryStore>;

/// A sync engine over a [`MockRemote`] and an [`InMemoryStore`], with
/// recording collaborators and no confirmation delay.
pub struct TestEngine {
    /// The engine under test.
    pub engine: MockEngine,
    /// Shared handle to the engine's remote.
    pub remote: Arc<MockRemote>,
    /// Notifications emitted by the engine.
    pub notifier: Arc<RecordingNotifier>,
    /// Frames rendered by the engine.
    pub surface: Arc<RecordingSurface>,
}

impl TestEngine {
    /// Wires an engine around `remote` and `store`.
    pub fn build(remote: MockRemote, store: InMemoryStore) -> Self {
        let remote = Arc::new(remote);
        let notifier = Arc::new(RecordingNotifier::new());
        let surface = Arc::new(RecordingSurface::new());
        let config = SyncConfig::default().with_confirm_delay(Duration::ZERO);

        let engine = SyncEngine::new(config, Arc::clone(&remote), LocalCache::new(store))
            .with_notifier(notifier.clone())
            .with_surface(surface.clone());

        Self {
            engine,
            remote,
            notifier,
            surface,
        }
    }

    /// An engine whose remote serves `text` and whose cache is empty.
    pub fn with_remote_text(text: &str) -> Self {
        Self::build(MockRemote::with_content(text), InMemoryStore::new())
    }

    /// An engine with a stored credential whose remote serves `text`.
    pub fn authorized(text: &str, credential: &str) -> Self {
        let mut t = Self::with_remote_text(text);
        t.engine
            .cache_mut()
            .set_credential(credential)
            .expect("in-memory store accepts writes");
        t
    }
}

/// A [`FileStore`] in a temporary directory that is removed on drop.
pub struct TempStore {
    /// The store.
    pub store: FileStore,
    dir: TempDir,
}

impl TempStore {
    /// Creates an empty store in a new temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(&dir.path().join("licsync.json"))
            .expect("Failed to open file store");
        Self { store, dir }
    }

    /// Directory holding the store file.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Reopens the store file, as a new process would.
    pub fn reopen(&self) -> FileStore {
        FileStore::open(self.store.path()).expect("Failed to reopen file store")
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licsync_codec::{decode, encode};
    use licsync_storage::KeyValueStore;

    #[test]
    fn sample_text_matches_records() {
        assert_eq!(decode(SAMPLE_TEXT), sample_records());
        assert_eq!(encode(&sample_records()), SAMPLE_TEXT);
    }

    #[test]
    fn recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Severity::Info, "loading");
        notifier.notify(Severity::Error, "failed hard");
        assert_eq!(notifier.count(Severity::Error), 1);
        assert!(notifier.contains("hard"));
        assert_eq!(notifier.last().unwrap().0, Severity::Error);
        notifier.clear();
        assert!(notifier.events().is_empty());
    }

    #[test]
    fn temp_store_reopen() {
        let mut temp = TempStore::new();
        temp.store.set("k", "v").unwrap();
        assert_eq!(temp.reopen().get("k").unwrap().as_deref(), Some("v"));
        assert!(temp.dir().exists());
    }
}
