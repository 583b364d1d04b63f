//! Property-based test generators using proptest.
//!
//! Generated values never contain line breaks, so every record they produce
//! is representable in the text format.

use licsync_codec::{format_expiry, Record};
use proptest::prelude::*;

/// Strategy for device hashes, including the empty draft hash.
pub fn device_hash_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        6 => prop::string::string_regex("[A-F0-9]{4,32}").expect("Invalid regex"),
        1 => prop::string::string_regex("[A-Za-z0-9=+/]{1,16}").expect("Invalid regex"),
    ]
}

/// Strategy for user names; may contain spaces and `=`.
pub fn user_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 ._@=-]{0,24}").expect("Invalid regex")
}

/// Strategy for well-formed expiry strings.
pub fn expiry_strategy() -> impl Strategy<Value = String> {
    (2020i32..2035, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(|(y, mo, d, h, mi)| {
        let date = chrono::NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, 0))
            .expect("generated date is in range");
        format_expiry(date)
    })
}

/// Strategy for a single record, with optional fields sometimes absent.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (
        device_hash_strategy(),
        proptest::option::weighted(0.9, user_strategy()),
        proptest::option::weighted(0.9, expiry_strategy()),
    )
        .prop_map(|(device_hash, user, expiry)| Record {
            device_hash,
            user,
            expiry,
        })
}

/// Strategy for a record collection of up to `max` entries.
pub fn collection_strategy(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_records_validate(record in record_strategy()) {
            prop_assert!(record.validate().is_ok());
        }

        #[test]
        fn generated_expiry_parses(expiry in expiry_strategy()) {
            prop_assert!(licsync_codec::parse_expiry(&expiry).is_ok());
        }
    }
}
