//! # licsync Storage
//!
//! Key-value storage backends for the licsync local cache.
//!
//! Stores are **opaque string maps**: they do not interpret keys or values.
//! The sync engine owns the meaning of every key it writes.
//!
//! ## Available Backends
//!
//! - [`InMemoryStore`] - For testing and ephemeral sessions
//! - [`FileStore`] - A JSON object on disk, rewritten atomically on change
//!
//! ## Example
//!
//! ```rust
//! use licsync_storage::{InMemoryStore, KeyValueStore};
//!
//! let mut store = InMemoryStore::new();
//! store.set("loadFromGist", "true").unwrap();
//! assert_eq!(store.get("loadFromGist").unwrap().as_deref(), Some("true"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::KeyValueStore;
