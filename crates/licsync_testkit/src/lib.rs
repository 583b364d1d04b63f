//! # licsync Testkit
//!
//! Test utilities for licsync.
//!
//! This crate provides:
//! - Recording notifier and render surface collaborators
//! - A pre-wired engine over [`licsync_sync_engine::MockRemote`]
//! - Sample records and temporary file stores
//! - Property-based generators for records and collections
//!
//! ## Usage
//!
//! ```rust,ignore
//! use licsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn loads_remote() {
//!     let mut t = TestEngine::with_remote_text(SAMPLE_TEXT);
//!     t.engine.reload().await.unwrap();
//!     assert_eq!(t.engine.records(), sample_records().as_slice());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
