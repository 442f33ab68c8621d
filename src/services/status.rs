//! Mailing status engine.
//!
//! The status is a pure function of the clock and the mailing window. The
//! stored column is only refreshed when a mailing is read for display or
//! dispatched, so it may lag behind wall-clock time in between.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::models::mailing::{Mailing, MailingStatus};

pub fn current_status(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> MailingStatus {
    if now < start {
        MailingStatus::Created
    } else if now <= end {
        MailingStatus::Running
    } else {
        MailingStatus::Finished
    }
}

/// Writes only the status column, and only when it changed. Returns whether a
/// write happened.
pub async fn set_status(
    pool: &SqlitePool,
    mailing: &mut Mailing,
    status: MailingStatus,
) -> AppResult<bool> {
    if mailing.status == status {
        return Ok(false);
    }
    sqlx::query("UPDATE mailings SET status = ? WHERE id = ?")
        .bind(status)
        .bind(mailing.id)
        .execute(pool)
        .await?;
    tracing::debug!(mailing_id = mailing.id, from = %mailing.status, to = %status, "mailing status changed");
    mailing.status = status;
    Ok(true)
}

pub async fn refresh_status(
    pool: &SqlitePool,
    mailing: &mut Mailing,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let status = current_status(now, mailing.start_time, mailing.end_time);
    set_status(pool, mailing, status).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn status_follows_the_timeline() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let end = start + Duration::hours(1);

        assert_eq!(current_status(start - Duration::seconds(1), start, end), MailingStatus::Created);
        assert_eq!(current_status(start, start, end), MailingStatus::Running);
        assert_eq!(current_status(start + Duration::minutes(30), start, end), MailingStatus::Running);
        assert_eq!(current_status(end, start, end), MailingStatus::Running);
        assert_eq!(current_status(end + Duration::seconds(1), start, end), MailingStatus::Finished);
    }

    #[test]
    fn exactly_one_status_for_every_instant() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let end = start + Duration::minutes(10);
        for offset in -20..=20 {
            let now = start + Duration::minutes(offset);
            let status = current_status(now, start, end);
            let expected = if now < start {
                MailingStatus::Created
            } else if now > end {
                MailingStatus::Finished
            } else {
                MailingStatus::Running
            };
            assert_eq!(status, expected, "offset {offset}");
        }
    }

    #[test]
    fn degenerate_window_is_running_only_at_its_instant() {
        let t = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(current_status(t, t, t), MailingStatus::Running);
        assert_eq!(current_status(t + Duration::seconds(1), t, t), MailingStatus::Finished);
    }
}
