use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Opens (creating if needed) the SQLite database behind `raw_url`.
pub async fn connect(raw_url: &str) -> Result<SqlitePool> {
    let url = normalize_sqlite_url(raw_url);
    let opts = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("invalid database url {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);
    // every connection to :memory: is a separate database
    let max = if url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// Applies every `*.sql` file in `dir`, in file-name order.
pub async fn run_migrations_from(pool: &SqlitePool, dir: &Path) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.path());
    for e in entries {
        let p = e.path();
        if p.extension().and_then(|s| s.to_str()) == Some("sql") {
            let sql = fs::read_to_string(&p)?;
            pool.execute(sql.as_str())
                .await
                .with_context(|| format!("applying {}", p.display()))?;
            tracing::debug!(file = %p.display(), "migration applied");
        }
    }
    Ok(())
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let dir = if Path::new("migrations").exists() {
        Path::new("migrations").to_path_buf()
    } else {
        dir
    };
    run_migrations_from(pool, &dir).await
}

pub fn normalize_sqlite_url(input: &str) -> String {
    // Accept forms: sqlite:foo.db (fix), sqlite://foo.db (ok), file:foo.db (convert), just path (prepend)
    if input.starts_with("sqlite://") || input.starts_with("sqlite::memory:") {
        return input.to_string();
    }
    if input.starts_with("sqlite:") {
        let rest = input.trim_start_matches("sqlite:");
        return format!("sqlite://{}", rest.trim_start_matches('/'));
    }
    if input.starts_with("file:") {
        return format!("sqlite://{}", input.trim_start_matches("file:"));
    }
    format!("sqlite://{}", input)
}

/// Timestamps are stored as epoch milliseconds.
pub fn to_epoch(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_epoch(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

/// Drops whatever precision the store cannot hold, so values compared in
/// memory match what is read back later.
pub fn stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    from_epoch(to_epoch(ts))
}
