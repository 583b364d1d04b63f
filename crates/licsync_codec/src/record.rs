//! The license record model.

use crate::error::{CodecError, CodecResult};
use crate::EXPIRY_FORMAT;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One license entry.
///
/// Records have no identity beyond their position in a collection, and
/// `device_hash` is not required to be unique. A record whose `device_hash`
/// is empty is a draft: it is never written to the text format.
///
/// `user` and `expiry` are `None` when the source block did not carry them,
/// which keeps a decoded partial block distinguishable from one with an
/// explicitly empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Device fingerprint the license is bound to.
    #[serde(rename = "DEVICE_HASH", default)]
    pub device_hash: String,
    /// License holder.
    #[serde(rename = "USER", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Expiry timestamp, `YYYY-MM-DD HH:MM` without timezone.
    #[serde(rename = "EXPIRY", default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

impl Record {
    /// Creates a record with all three fields present.
    pub fn new(
        device_hash: impl Into<String>,
        user: impl Into<String>,
        expiry: impl Into<String>,
    ) -> Self {
        Self {
            device_hash: device_hash.into(),
            user: Some(user.into()),
            expiry: Some(expiry.into()),
        }
    }

    /// Creates an empty draft record expiring at `now`, floored to the minute.
    pub fn draft(now: NaiveDateTime) -> Self {
        Self {
            device_hash: String::new(),
            user: Some(String::new()),
            expiry: Some(format_expiry(now)),
        }
    }

    /// Returns true if this record will be written by the encoder.
    pub fn is_persistable(&self) -> bool {
        !self.device_hash.is_empty()
    }

    /// Returns the value of a field, if present.
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::DeviceHash => Some(self.device_hash.as_str()),
            Field::User => self.user.as_deref(),
            Field::Expiry => self.expiry.as_deref(),
        }
    }

    /// Sets a field value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::LineBreakInValue`] if `value` contains a line
    /// break. The record is left unchanged in that case.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> CodecResult<()> {
        let value = value.into();
        check_value(field, &value)?;
        match field {
            Field::DeviceHash => self.device_hash = value,
            Field::User => self.user = Some(value),
            Field::Expiry => self.expiry = Some(value),
        }
        Ok(())
    }

    /// Checks that every field can be represented in the text format.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::LineBreakInValue`] for the first offending field.
    pub fn validate(&self) -> CodecResult<()> {
        for field in Field::ALL {
            if let Some(value) = self.field(field) {
                check_value(field, value)?;
            }
        }
        Ok(())
    }

    /// Parses the expiry timestamp.
    pub fn expiry_time(&self) -> Option<NaiveDateTime> {
        self.expiry.as_deref().and_then(|v| parse_expiry(v).ok())
    }

    /// Computes how long this license has left relative to `now`.
    pub fn expiry_status(&self, now: NaiveDateTime) -> ExpiryStatus {
        let Some(expiry) = self.expiry_time() else {
            return ExpiryStatus::Unknown;
        };

        let diff_ms = (expiry - now).num_milliseconds();
        let mut days = diff_ms / MILLIS_PER_DAY;
        if diff_ms % MILLIS_PER_DAY > 0 {
            days += 1;
        }

        if days >= 0 {
            ExpiryStatus::DaysLeft(days)
        } else {
            ExpiryStatus::Expired
        }
    }
}

fn check_value(field: Field, value: &str) -> CodecResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(CodecError::LineBreakInValue {
            field: field.key(),
        });
    }
    Ok(())
}

/// An editable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `DEVICE_HASH`
    DeviceHash,
    /// `USER`
    User,
    /// `EXPIRY`
    Expiry,
}

impl Field {
    /// All fields, in text-format order.
    pub const ALL: [Field; 3] = [Field::DeviceHash, Field::User, Field::Expiry];

    /// Returns the key used in the text format.
    pub fn key(&self) -> &'static str {
        match self {
            Field::DeviceHash => crate::DEVICE_HASH_KEY,
            Field::User => crate::USER_KEY,
            Field::Expiry => crate::EXPIRY_KEY,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "DEVICE_HASH" | "HASH" => Ok(Field::DeviceHash),
            "USER" => Ok(Field::User),
            "EXPIRY" => Ok(Field::Expiry),
            _ => Err(CodecError::unknown_field(s)),
        }
    }
}

/// Remaining validity of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Whole days left, rounded up. Zero means it expires within the day.
    DaysLeft(i64),
    /// Expired at least one full day ago.
    Expired,
    /// Expiry is missing or unparsable.
    Unknown,
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryStatus::DaysLeft(1) => f.write_str("1 day left"),
            ExpiryStatus::DaysLeft(n) => write!(f, "{n} days left"),
            ExpiryStatus::Expired => f.write_str("Expired"),
            ExpiryStatus::Unknown => Ok(()),
        }
    }
}

/// Parses an expiry timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM` and the `T`-separated form produced by
/// date-time pickers.
///
/// # Errors
///
/// Returns [`CodecError::InvalidExpiry`] if neither form matches.
pub fn parse_expiry(value: &str) -> CodecResult<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, EXPIRY_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| CodecError::invalid_expiry(value))
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM`, dropping seconds.
pub fn format_expiry(time: NaiveDateTime) -> String {
    time.format(EXPIRY_FORMAT).to_string()
}

/// Returns the expiry string for `days` days after `now`.
pub fn expiry_in_days(now: NaiveDateTime, days: u32) -> String {
    format_expiry(now + Duration::days(i64::from(days)))
}
