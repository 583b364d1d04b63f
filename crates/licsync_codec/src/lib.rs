//! # licsync Codec
//!
//! Record model and the flat `KEY=value` text format used by licsync.
//!
//! The remote gist and exported files share one format:
//!
//! ```text
//! DEVICE_HASH=AB12
//! USER=alice
//! EXPIRY=2025-01-01 10:00
//!
//! DEVICE_HASH=CD34
//! USER=bob
//! EXPIRY=2025-02-01 09:30
//! ```
//!
//! ## Format Rules
//!
//! - One block per record, blocks separated by a single blank line
//! - No trailing separator after the last block
//! - Unknown keys are ignored on decode
//! - A block without a non-empty `DEVICE_HASH` is not a record
//! - Values are not escaped; line breaks inside values are unsupported
//!
//! ## Usage
//!
//! ```
//! use licsync_codec::{decode, encode, Record};
//!
//! let records = vec![Record::new("AB12", "alice", "2025-01-01 10:00")];
//! let text = encode(&records);
//! assert_eq!(text, "DEVICE_HASH=AB12\nUSER=alice\nEXPIRY=2025-01-01 10:00");
//! assert_eq!(decode(&text), records);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;
mod text;

pub use error::{CodecError, CodecResult};
pub use record::{expiry_in_days, format_expiry, parse_expiry, ExpiryStatus, Field, Record};
pub use text::{decode, encode, DEVICE_HASH_KEY, EXPIRY_KEY, USER_KEY};

/// Format string for expiry timestamps.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M";
