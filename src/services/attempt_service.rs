/// Append-only attempt log and its read-side aggregation.
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{from_epoch, to_epoch};
use crate::error::AppResult;
use crate::models::attempt::{Attempt, AttemptOutcome, AttemptRow, AttemptStats};

pub async fn record_attempt(
    pool: &SqlitePool,
    mailing_id: i64,
    recipient_id: i64,
    outcome: AttemptOutcome,
    server_response: &str,
    at: DateTime<Utc>,
) -> AppResult<Attempt> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO attempts (mailing_id, recipient_id, status, server_response, attempted_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(mailing_id)
    .bind(recipient_id)
    .bind(outcome)
    .bind(server_response)
    .bind(to_epoch(at))
    .fetch_one(pool)
    .await?;

    Ok(Attempt {
        id,
        mailing_id,
        recipient_id,
        status: outcome,
        server_response: Some(server_response.to_string()),
        attempted_at: from_epoch(to_epoch(at)),
    })
}

/// Newest first. `owner` restricts to attempts of mailings owned by that
/// user; `mailing_id` to a single mailing.
pub async fn list_attempts(
    pool: &SqlitePool,
    owner: Option<i64>,
    mailing_id: Option<i64>,
) -> AppResult<Vec<Attempt>> {
    let rows = sqlx::query_as::<_, AttemptRow>(
        "SELECT a.id, a.mailing_id, a.recipient_id, a.status, a.server_response, a.attempted_at \
         FROM attempts a JOIN mailings m ON m.id = a.mailing_id \
         WHERE (?1 IS NULL OR m.owner_id = ?1) AND (?2 IS NULL OR a.mailing_id = ?2) \
         ORDER BY a.attempted_at DESC, a.id DESC",
    )
    .bind(owner)
    .bind(mailing_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Attempt::from).collect())
}

pub async fn attempt_stats(
    pool: &SqlitePool,
    owner: Option<i64>,
    mailing_id: Option<i64>,
) -> AppResult<AttemptStats> {
    let stats = sqlx::query_as::<_, AttemptStats>(
        "SELECT COUNT(a.id) AS total, \
                COALESCE(SUM(CASE WHEN a.status = 'success' THEN 1 ELSE 0 END), 0) AS succeeded, \
                COALESCE(SUM(CASE WHEN a.status = 'fail' THEN 1 ELSE 0 END), 0) AS failed \
         FROM attempts a JOIN mailings m ON m.id = a.mailing_id \
         WHERE (?1 IS NULL OR m.owner_id = ?1) AND (?2 IS NULL OR a.mailing_id = ?2)",
    )
    .bind(owner)
    .bind(mailing_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
