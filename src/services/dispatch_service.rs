//! Mailing dispatch.
//!
//! Sends the mailing's message to every recipient, one at a time, and logs
//! one attempt per recipient. A transport failure is recorded and the loop
//! moves on; it never aborts the batch or reaches the caller.
//!
//! There is no transaction around the batch and no lock against a second
//! concurrent run: a crash mid-loop leaves a partial attempt log and the
//! mailing in `running`, and re-running sends to every recipient again,
//! including ones already logged as successful.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::attempt::AttemptOutcome;
use crate::models::mailing::MailingStatus;
use crate::services::{attempt_service, mailing_service, message_service, status};
use crate::smtp::{Mailer, OutgoingEmail};

pub const OUTSIDE_WINDOW: &str = "dispatch not permitted outside the campaign window";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub mailing_id: i64,
    pub succeeded: u32,
    pub failed: u32,
    /// Stored status after the final refresh.
    pub status: MailingStatus,
}

impl DispatchReport {
    pub fn summary(&self) -> String {
        format!(
            "dispatch finished: {} succeeded, {} failed",
            self.succeeded, self.failed
        )
    }
}

pub async fn run_mailing(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    clock: &dyn Clock,
    from_email: &str,
    mailing_id: i64,
) -> AppResult<DispatchReport> {
    let mut mailing = mailing_service::get_mailing(pool, mailing_id).await?;

    let now = clock.now();
    status::refresh_status(pool, &mut mailing, now).await?;
    if !mailing.window_contains(now) {
        warn!(mailing_id, status = %mailing.status, "dispatch refused outside campaign window");
        return Err(AppError::validation(OUTSIDE_WINDOW));
    }

    let message = match mailing.message_id {
        Some(id) => message_service::find_message(pool, id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::validation("mailing has no message to send"))?;

    status::set_status(pool, &mut mailing, MailingStatus::Running).await?;

    let recipients = mailing_service::recipients_of(pool, mailing_id).await?;
    info!(mailing_id, recipients = recipients.len(), "dispatch started");

    let mut succeeded = 0u32;
    let mut failed = 0u32;
    for recipient in recipients {
        let email = OutgoingEmail::new(
            from_email,
            recipient.email.as_str(),
            message.subject.as_str(),
            message.body.as_str(),
        );
        match mailer.send(&email).await {
            Ok(()) => {
                attempt_service::record_attempt(
                    pool,
                    mailing_id,
                    recipient.id,
                    AttemptOutcome::Success,
                    "OK",
                    clock.now(),
                )
                .await?;
                succeeded += 1;
            }
            Err(e) => {
                warn!(mailing_id, recipient = %recipient.email, error = %e, "send failed");
                attempt_service::record_attempt(
                    pool,
                    mailing_id,
                    recipient.id,
                    AttemptOutcome::Fail,
                    &e.to_string(),
                    clock.now(),
                )
                .await?;
                failed += 1;
            }
        }
    }

    status::refresh_status(pool, &mut mailing, clock.now()).await?;
    info!(mailing_id, succeeded, failed, status = %mailing.status, "dispatch finished");

    Ok(DispatchReport {
        mailing_id,
        succeeded,
        failed,
        status: mailing.status,
    })
}
