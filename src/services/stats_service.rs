use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::to_epoch;
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Dashboard {
    pub total_mailings: i64,
    /// Stored as running and inside their window at `now`.
    pub active_mailings: i64,
    pub unique_recipients: i64,
}

pub async fn dashboard(pool: &SqlitePool, now: DateTime<Utc>) -> AppResult<Dashboard> {
    let now = to_epoch(now);
    let stats = sqlx::query_as::<_, Dashboard>(
        "SELECT \
            (SELECT COUNT(*) FROM mailings) AS total_mailings, \
            (SELECT COUNT(*) FROM mailings \
              WHERE status = 'running' AND start_time <= ?1 AND end_time >= ?1) AS active_mailings, \
            (SELECT COUNT(*) FROM recipients) AS unique_recipients",
    )
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
