//! CLI command implementations.

pub mod config;
pub mod records;
pub mod render;
pub mod sync;
pub mod watch;

use licsync_storage::{FileStore, KeyValueStore};
use licsync_sync_engine::{
    ConflictPolicy, GistClient, LocalCache, RemoteStore, SyncConfig, SyncEngine, SyncError,
    SyncResult,
};
use std::path::PathBuf;
use std::time::Duration;

/// Engine used by every command.
pub type CliEngine = SyncEngine<GistClient, FileStore>;

/// Settings shared by all commands, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Context {
    /// Local store file.
    pub store_path: PathBuf,
    /// Gist identifier.
    pub gist_id: String,
    /// File name inside the gist.
    pub file_name: String,
    /// Raw content URL.
    pub raw_url: String,
    /// API base URL override.
    pub api_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Policy for remote changes over unsaved edits.
    pub conflict_policy: ConflictPolicy,
}

impl Context {
    /// Builds the sync configuration.
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(&self.gist_id, &self.file_name, &self.raw_url)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_conflict_policy(self.conflict_policy);
        if let Some(url) = &self.api_url {
            config = config.with_api_base_url(url.trim_end_matches('/'));
        }
        config
    }

    /// Opens the local cache.
    pub fn open_cache(&self) -> Result<LocalCache<FileStore>, Box<dyn std::error::Error>> {
        let store = FileStore::open_with_create_dirs(&self.store_path)?;
        Ok(LocalCache::new(store))
    }

    /// Opens the engine without loading any data.
    pub fn open_engine(&self) -> Result<CliEngine, Box<dyn std::error::Error>> {
        let config = self.sync_config();
        let remote = GistClient::new(config.clone())?;
        Ok(SyncEngine::new(config, remote, self.open_cache()?))
    }

    /// Opens the engine and loads data per the stored source preference.
    ///
    /// A cache miss is not fatal: commands continue with an empty list.
    pub async fn load_engine(&self) -> Result<CliEngine, Box<dyn std::error::Error>> {
        let mut engine = self.open_engine()?;
        match engine.initialize().await {
            Ok(source) => tracing::debug!(?source, "initialized"),
            Err(SyncError::LocalCacheMiss) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(engine)
    }

    /// Opens the engine for a command that saves.
    ///
    /// See [`load_for_write`].
    pub async fn load_engine_for_write(&self) -> Result<CliEngine, Box<dyn std::error::Error>> {
        let mut engine = self.open_engine()?;
        load_for_write(&mut engine).await?;
        Ok(engine)
    }
}

/// Loads data before a save.
///
/// A cache miss falls through to the remote, so a save never starts from an
/// empty list that was never loaded.
///
/// # Errors
///
/// Returns the fetch error if the cache is empty and the remote cannot be
/// read, or any other initialization error.
pub async fn load_for_write<T: RemoteStore, B: KeyValueStore>(
    engine: &mut SyncEngine<T, B>,
) -> SyncResult<()> {
    match engine.initialize().await {
        Ok(_) => Ok(()),
        Err(SyncError::LocalCacheMiss) => engine.reload().await,
        Err(e) => Err(e),
    }
}

/// Default store location: `$HOME/.licsync/store.json`, or `licsync.json`
/// in the working directory when no home directory is known.
pub fn default_store_path() -> PathBuf {
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => PathBuf::from(home).join(".licsync").join("store.json"),
        None => PathBuf::from("licsync.json"),
    }
}
