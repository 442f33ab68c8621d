/// Mailing campaigns: window, message reference, recipient set.
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::{stored_precision, to_epoch};
use crate::error::{AppError, AppResult};
use crate::models::mailing::{Mailing, MailingDetail, MailingPatch, MailingRow, NewMailing};
use crate::models::recipient::Recipient;
use crate::services::{message_service, recipient_service, status};

const MAILING_COLUMNS: &str = "id, start_time, end_time, status, message_id, owner_id";

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if start >= end {
        return Err(AppError::validation("mailing start time must be before its end time"));
    }
    Ok(())
}

/// References must exist and, when `scope` is set, belong to that owner.
async fn validate_refs(
    pool: &SqlitePool,
    scope: Option<i64>,
    message_id: Option<i64>,
    recipient_ids: &[i64],
) -> AppResult<()> {
    if let Some(mid) = message_id {
        match message_service::find_message(pool, mid).await? {
            Some(m) if scope.is_none() || m.owner_id == scope => {}
            _ => return Err(AppError::validation(format!("unknown message {mid}"))),
        }
    }
    for rid in recipient_ids {
        match recipient_service::find_recipient(pool, *rid).await? {
            Some(r) if scope.is_none() || r.owner_id == scope => {}
            _ => return Err(AppError::validation(format!("unknown recipient {rid}"))),
        }
    }
    Ok(())
}

/// Runs inside the caller's transaction.
async fn replace_recipients(
    conn: &mut SqliteConnection,
    mailing_id: i64,
    recipient_ids: &[i64],
) -> AppResult<()> {
    sqlx::query("DELETE FROM mailing_recipients WHERE mailing_id = ?")
        .bind(mailing_id)
        .execute(&mut *conn)
        .await?;
    for rid in recipient_ids {
        sqlx::query("INSERT OR IGNORE INTO mailing_recipients (mailing_id, recipient_id) VALUES (?, ?)")
            .bind(mailing_id)
            .bind(rid)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn create_mailing(
    pool: &SqlitePool,
    owner_id: i64,
    req: NewMailing,
    now: DateTime<Utc>,
) -> AppResult<MailingDetail> {
    let start = stored_precision(req.start_time);
    let end = stored_precision(req.end_time);
    validate_window(start, end)?;
    validate_refs(pool, Some(owner_id), req.message_id, &req.recipient_ids).await?;

    let status = status::current_status(now, start, end);
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO mailings (start_time, end_time, status, message_id, owner_id) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(to_epoch(start))
    .bind(to_epoch(end))
    .bind(status)
    .bind(req.message_id)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;
    replace_recipients(&mut *tx, id, &req.recipient_ids).await?;
    tx.commit().await?;

    tracing::info!(mailing_id = id, owner_id, %status, "mailing created");
    let mailing = get_mailing(pool, id).await?;
    let recipient_ids = recipient_ids(pool, id).await?;
    Ok(MailingDetail { mailing, recipient_ids })
}

pub async fn list_mailings(pool: &SqlitePool, owner: Option<i64>) -> AppResult<Vec<Mailing>> {
    let rows = sqlx::query_as::<_, MailingRow>(&format!(
        "SELECT {MAILING_COLUMNS} FROM mailings WHERE (?1 IS NULL OR owner_id = ?1) ORDER BY start_time DESC, id DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Mailing::from).collect())
}

pub async fn find_mailing(pool: &SqlitePool, id: i64) -> AppResult<Option<Mailing>> {
    let row = sqlx::query_as::<_, MailingRow>(&format!(
        "SELECT {MAILING_COLUMNS} FROM mailings WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Mailing::from))
}

pub async fn get_mailing(pool: &SqlitePool, id: i64) -> AppResult<Mailing> {
    find_mailing(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("mailing {id}")))
}

/// Detail read: refreshes the stored status before returning it.
pub async fn get_mailing_detail(
    pool: &SqlitePool,
    id: i64,
    now: DateTime<Utc>,
) -> AppResult<MailingDetail> {
    let mut mailing = get_mailing(pool, id).await?;
    status::refresh_status(pool, &mut mailing, now).await?;
    let recipient_ids = recipient_ids(pool, id).await?;
    Ok(MailingDetail { mailing, recipient_ids })
}

pub async fn recipient_ids(pool: &SqlitePool, mailing_id: i64) -> AppResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT recipient_id FROM mailing_recipients WHERE mailing_id = ? ORDER BY recipient_id",
    )
    .bind(mailing_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn recipients_of(pool: &SqlitePool, mailing_id: i64) -> AppResult<Vec<Recipient>> {
    let rows = sqlx::query_as::<_, Recipient>(
        "SELECT r.id, r.email, r.name, r.comment, r.owner_id FROM recipients r \
         JOIN mailing_recipients mr ON mr.recipient_id = r.id \
         WHERE mr.mailing_id = ? ORDER BY r.id",
    )
    .bind(mailing_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_mailing(
    pool: &SqlitePool,
    id: i64,
    scope: Option<i64>,
    patch: MailingPatch,
    now: DateTime<Utc>,
) -> AppResult<MailingDetail> {
    let mut mailing = get_mailing(pool, id).await?;
    if let Some(start) = patch.start_time {
        mailing.start_time = stored_precision(start);
    }
    if let Some(end) = patch.end_time {
        mailing.end_time = stored_precision(end);
    }
    if let Some(message_id) = patch.message_id {
        mailing.message_id = message_id;
    }
    validate_window(mailing.start_time, mailing.end_time)?;
    let new_recipients = patch.recipient_ids.as_deref().unwrap_or(&[]);
    validate_refs(pool, scope, patch.message_id.flatten(), new_recipients).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE mailings SET start_time = ?, end_time = ?, message_id = ? WHERE id = ?")
        .bind(to_epoch(mailing.start_time))
        .bind(to_epoch(mailing.end_time))
        .bind(mailing.message_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if let Some(ids) = &patch.recipient_ids {
        replace_recipients(&mut *tx, id, ids).await?;
    }
    tx.commit().await?;

    status::refresh_status(pool, &mut mailing, now).await?;
    let recipient_ids = recipient_ids(pool, id).await?;
    Ok(MailingDetail { mailing, recipient_ids })
}

pub async fn delete_mailing(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM mailings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("mailing {id}")));
    }
    Ok(())
}

/// Manual sweep over every mailing. Returns how many stored statuses changed.
pub async fn refresh_all_statuses(pool: &SqlitePool, now: DateTime<Utc>) -> AppResult<usize> {
    let mut changed = 0;
    for mut mailing in list_mailings(pool, None).await? {
        if status::refresh_status(pool, &mut mailing, now).await? {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn window_must_be_ordered() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(validate_window(t, t + Duration::minutes(1)).is_ok());
        assert!(matches!(validate_window(t, t), Err(AppError::Validation(_))));
        assert!(validate_window(t + Duration::minutes(1), t).is_err());
    }
}
