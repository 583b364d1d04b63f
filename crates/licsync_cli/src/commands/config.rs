//! Config command: token and stored preferences.

use super::Context;
use licsync_storage::KeyValueStore;
use licsync_sync_engine::{DataSource, LocalCache, SyncResult};
use std::fmt::Write;

/// Runs `config show`.
pub fn show(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ctx.open_cache()?;
    print!("{}", describe(ctx, &cache)?);
    Ok(())
}

/// Runs `config set-token`.
pub fn set_token(ctx: &Context, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    ctx.open_cache()?.set_credential(token)?;
    println!("Token saved");
    Ok(())
}

/// Runs `config clear-token`.
pub fn clear_token(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    ctx.open_cache()?.clear_credential()?;
    println!("Token removed");
    Ok(())
}

/// Runs `config source`.
pub fn source(ctx: &Context, source: DataSource) -> Result<(), Box<dyn std::error::Error>> {
    ctx.open_cache()?.set_source(source)?;
    println!("Startup source: {}", source_name(source));
    Ok(())
}

/// Runs `config auto-poll`.
pub fn auto_poll(ctx: &Context, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    ctx.open_cache()?.set_auto_poll(enabled)?;
    println!("Auto-poll {}", if enabled { "on" } else { "off" });
    Ok(())
}

/// Runs `config interval`.
pub fn interval(ctx: &Context, minutes: u32) -> Result<(), Box<dyn std::error::Error>> {
    ctx.open_cache()?.set_poll_interval(minutes)?;
    println!("Poll interval: {minutes} min");
    Ok(())
}

fn source_name(source: DataSource) -> &'static str {
    match source {
        DataSource::Remote => "remote",
        DataSource::Cache => "cache",
    }
}

fn mask(token: &str) -> String {
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

fn describe<B: KeyValueStore>(ctx: &Context, cache: &LocalCache<B>) -> SyncResult<String> {
    let prefs = cache.preferences()?;
    let cached = cache.load_records()?.map_or(0, |records| records.len());
    let token = match cache.credential()? {
        Some(token) => mask(&token),
        None => "(not set)".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "store:         {}", ctx.store_path.display());
    let _ = writeln!(out, "gist:          {} ({})", ctx.gist_id, ctx.file_name);
    let _ = writeln!(out, "source:        {}", source_name(prefs.source));
    let _ = writeln!(
        out,
        "auto-poll:     {} every {} min",
        if prefs.poll.enabled { "on" } else { "off" },
        prefs.poll.interval_minutes
    );
    let _ = writeln!(out, "token:         {token}");
    let _ = writeln!(out, "cached:        {cached} entries");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use licsync_storage::InMemoryStore;
    use licsync_sync_engine::ConflictPolicy;
    use licsync_testkit::prelude::*;
    use std::path::PathBuf;

    fn context() -> Context {
        Context {
            store_path: PathBuf::from("/tmp/store.json"),
            gist_id: "abc".into(),
            file_name: "list.txt".into(),
            raw_url: "http://localhost/raw".into(),
            api_url: None,
            timeout_secs: 30,
            conflict_policy: ConflictPolicy::RemoteWins,
        }
    }

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask("ghp_abcdef1234"), "****1234");
        assert_eq!(mask("ab"), "****ab");
    }

    #[test]
    fn describe_defaults() {
        let cache = LocalCache::new(InMemoryStore::new());
        let out = describe(&context(), &cache).unwrap();
        assert!(out.contains("source:        cache"));
        assert!(out.contains("auto-poll:     off every 5 min"));
        assert!(out.contains("token:         (not set)"));
        assert!(out.contains("cached:        0 entries"));
    }

    #[test]
    fn describe_after_changes() {
        let mut cache = LocalCache::new(InMemoryStore::new());
        cache.set_source(DataSource::Remote).unwrap();
        cache.set_auto_poll(true).unwrap();
        cache.set_poll_interval(10).unwrap();
        cache.set_credential("ghp_secret9876").unwrap();
        cache.save_records(&sample_records()).unwrap();

        let out = describe(&context(), &cache).unwrap();
        assert!(out.contains("source:        remote"));
        assert!(out.contains("auto-poll:     on every 10 min"));
        assert!(out.contains("token:         ****9876"));
        assert!(!out.contains("secret"));
        assert!(out.contains("cached:        3 entries"));
    }

    #[test]
    fn token_commands_use_file_store() {
        let temp = TempStore::new();
        let ctx = Context {
            store_path: temp.store.path().to_path_buf(),
            ..context()
        };

        set_token(&ctx, "  ghp_token  ").unwrap();
        let cache = ctx.open_cache().unwrap();
        assert_eq!(cache.credential().unwrap().as_deref(), Some("ghp_token"));

        clear_token(&ctx).unwrap();
        assert!(ctx.open_cache().unwrap().credential().unwrap().is_none());
        assert!(interval(&ctx, 0).is_err());
    }
}
