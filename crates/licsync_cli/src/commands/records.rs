//! Listing and editing entries.

use super::render::{now, table};
use super::Context;
use chrono::NaiveDateTime;
use licsync_codec::{expiry_in_days, format_expiry, parse_expiry, Field};
use licsync_storage::KeyValueStore;
use licsync_sync_engine::{PushOutcome, RemoteStore, SyncEngine, SyncResult};

/// Field values supplied on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldValues {
    /// New device hash.
    pub device_hash: Option<String>,
    /// New user name.
    pub user: Option<String>,
    /// New expiry timestamp.
    pub expiry: Option<String>,
    /// New expiry as days from now.
    pub expires_in_days: Option<u32>,
}

impl FieldValues {
    /// Returns true if no field was given.
    pub fn is_empty(&self) -> bool {
        self.device_hash.is_none()
            && self.user.is_none()
            && self.expiry.is_none()
            && self.expires_in_days.is_none()
    }

    /// Resolves the values into (field, value) edits.
    ///
    /// Expiry strings are normalized to `YYYY-MM-DD HH:MM`.
    pub fn edits(&self, now: NaiveDateTime) -> SyncResult<Vec<(Field, String)>> {
        let mut edits = Vec::new();
        if let Some(hash) = &self.device_hash {
            edits.push((Field::DeviceHash, hash.trim().to_string()));
        }
        if let Some(user) = &self.user {
            edits.push((Field::User, user.clone()));
        }
        if let Some(expiry) = &self.expiry {
            edits.push((Field::Expiry, format_expiry(parse_expiry(expiry)?)));
        } else if let Some(days) = self.expires_in_days {
            edits.push((Field::Expiry, expiry_in_days(now, days)));
        }
        Ok(edits)
    }
}

/// Applies `values` to the record at `index`.
pub fn apply<T: RemoteStore, B: KeyValueStore>(
    engine: &mut SyncEngine<T, B>,
    index: usize,
    values: &FieldValues,
    now: NaiveDateTime,
) -> SyncResult<()> {
    for (field, value) in values.edits(now)? {
        engine.apply_field_edit(index, field, &value)?;
    }
    Ok(())
}

/// Runs the list command.
pub async fn list(ctx: &Context, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.load_engine().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(engine.records())?),
        _ => {
            print!("{}", table(engine.records().iter().enumerate(), now()));
            println!();
            println!("{}", engine.status());
        }
    }

    Ok(())
}

/// Runs the search command.
pub async fn search(ctx: &Context, hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.load_engine().await?;
    let matches = engine.search(hash);
    if !matches.is_empty() {
        print!("{}", table(matches, now()));
    }
    Ok(())
}

/// Runs the add command.
pub async fn add(ctx: &Context, values: FieldValues) -> Result<(), Box<dyn std::error::Error>> {
    if values.device_hash.as_deref().map_or(true, |h| h.trim().is_empty()) {
        return Err("A device hash is required (--hash)".into());
    }

    let mut engine = ctx.load_engine_for_write().await?;
    let now = now();
    engine.add_entry_at(now);
    apply(&mut engine, 0, &values, now)?;
    save(&mut engine).await
}

/// Runs the edit command.
pub async fn edit(
    ctx: &Context,
    index: usize,
    values: FieldValues,
) -> Result<(), Box<dyn std::error::Error>> {
    if values.is_empty() {
        return Err("Nothing to change; pass --hash, --user, --expiry or --expires-in-days".into());
    }

    let mut engine = ctx.load_engine_for_write().await?;
    apply(&mut engine, index, &values, now())?;
    save(&mut engine).await
}

/// Runs the delete command.
pub async fn delete(ctx: &Context, index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = ctx.load_engine_for_write().await?;
    let outcome = engine.delete_entry(index).await?;
    report(&outcome);
    Ok(())
}

async fn save<T: RemoteStore, B: KeyValueStore>(
    engine: &mut SyncEngine<T, B>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = engine.push().await?;
    report(&outcome);
    Ok(())
}

fn report(outcome: &PushOutcome) {
    if let PushOutcome::Unconfirmed { reason } = outcome {
        eprintln!("Saved, but could not re-read the gist: {reason}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licsync_sync_engine::SyncError;
    use licsync_testkit::prelude::*;

    #[test]
    fn empty_values() {
        assert!(FieldValues::default().is_empty());
        let values = FieldValues {
            user: Some("bob".into()),
            ..Default::default()
        };
        assert!(!values.is_empty());
    }

    #[test]
    fn expiry_is_normalized() {
        let values = FieldValues {
            expiry: Some("2025-03-04T05:06".into()),
            ..Default::default()
        };
        let edits = values.edits(fixed_now()).unwrap();
        assert_eq!(edits, vec![(Field::Expiry, "2025-03-04 05:06".to_string())]);
    }

    #[test]
    fn expires_in_days_is_relative_to_now() {
        let values = FieldValues {
            device_hash: Some(" AB12 ".into()),
            expires_in_days: Some(7),
            ..Default::default()
        };
        let edits = values.edits(fixed_now()).unwrap();
        assert_eq!(
            edits,
            vec![
                (Field::DeviceHash, "AB12".to_string()),
                (Field::Expiry, "2025-01-08 00:00".to_string()),
            ]
        );
    }

    #[test]
    fn bad_expiry_is_rejected() {
        let values = FieldValues {
            expiry: Some("next week".into()),
            ..Default::default()
        };
        assert!(matches!(
            values.edits(fixed_now()),
            Err(SyncError::InvalidValue(_))
        ));
    }

    #[tokio::test]
    async fn apply_then_push() {
        let mut t = TestEngine::authorized(SAMPLE_TEXT, "ghp_token");
        t.engine.reload().await.unwrap();

        let values = FieldValues {
            user: Some("alicia".into()),
            expires_in_days: Some(30),
            ..Default::default()
        };
        apply(&mut t.engine, 0, &values, fixed_now()).unwrap();
        assert!(t.engine.is_dirty());

        save(&mut t.engine).await.unwrap();
        let pushed = &t.remote.pushes()[0];
        assert!(pushed.starts_with("DEVICE_HASH=AB12\nUSER=alicia\nEXPIRY=2025-01-31 00:00"));
    }

    #[tokio::test]
    async fn apply_out_of_range() {
        let mut t = TestEngine::with_remote_text(SAMPLE_TEXT);
        t.engine.reload().await.unwrap();
        let values = FieldValues {
            user: Some("x".into()),
            ..Default::default()
        };
        assert!(matches!(
            apply(&mut t.engine, 9, &values, fixed_now()),
            Err(SyncError::IndexOutOfRange { index: 9, len: 3 })
        ));
    }
}
