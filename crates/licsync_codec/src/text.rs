//! The flat `KEY=value` text format.

use crate::record::Record;

/// Key for the device fingerprint line.
pub const DEVICE_HASH_KEY: &str = "DEVICE_HASH";
/// Key for the license holder line.
pub const USER_KEY: &str = "USER";
/// Key for the expiry line.
pub const EXPIRY_KEY: &str = "EXPIRY";

const BLOCK_SEPARATOR: &str = "\n\n";

/// Decodes text into records.
///
/// Never fails: lines that are not `DEVICE_HASH=`, `USER=` or `EXPIRY=`
/// assignments are ignored, and blocks without a device hash are dropped.
/// The value is everything after the first `=`, so values may contain `=`.
pub fn decode(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut working = Record::default();

    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line.trim().is_empty() {
            close_block(&mut working, &mut records);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        match key {
            DEVICE_HASH_KEY => working.device_hash = value.to_string(),
            USER_KEY => working.user = Some(value.to_string()),
            EXPIRY_KEY => working.expiry = Some(value.to_string()),
            _ => {}
        }
    }

    close_block(&mut working, &mut records);
    records
}

fn close_block(working: &mut Record, records: &mut Vec<Record>) {
    let record = std::mem::take(working);
    if record.is_persistable() {
        records.push(record);
    }
}

/// Encodes records into text.
///
/// Records with an empty device hash are skipped. Absent fields produce no
/// line. Blocks are joined by one blank line with no trailing separator.
pub fn encode(records: &[Record]) -> String {
    records
        .iter()
        .filter(|r| r.is_persistable())
        .map(encode_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn encode_block(record: &Record) -> String {
    let mut block = format!("{DEVICE_HASH_KEY}={}", record.device_hash);
    if let Some(user) = &record.user {
        block.push('\n');
        block.push_str(USER_KEY);
        block.push('=');
        block.push_str(user);
    }
    if let Some(expiry) = &record.expiry {
        block.push('\n');
        block.push_str(EXPIRY_KEY);
        block.push('=');
        block.push_str(expiry);
    }
    block
}
