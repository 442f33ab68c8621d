use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::from_epoch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Fail,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub mailing_id: i64,
    pub recipient_id: i64,
    pub status: AttemptOutcome,
    pub server_response: Option<String>,
    pub attempted_at: i64,
}

/// One logged delivery outcome. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub mailing_id: i64,
    pub recipient_id: i64,
    pub status: AttemptOutcome,
    pub server_response: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl From<AttemptRow> for Attempt {
    fn from(row: AttemptRow) -> Self {
        Self {
            id: row.id,
            mailing_id: row.mailing_id,
            recipient_id: row.recipient_id,
            status: row.status,
            server_response: row.server_response,
            attempted_at: from_epoch(row.attempted_at),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AttemptStats {
    pub total: i64,
    pub succeeded: i64,
    pub failed: i64,
}
