use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::from_epoch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MailingStatus {
    Created,
    Running,
    Finished,
}

impl MailingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for MailingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape of the `mailings` table; timestamps are epoch milliseconds.
#[derive(Debug, Clone, FromRow)]
pub struct MailingRow {
    pub id: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub status: MailingStatus,
    pub message_id: Option<i64>,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mailing {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Stored value; may lag behind the clock until the next refresh.
    pub status: MailingStatus,
    pub message_id: Option<i64>,
    pub owner_id: Option<i64>,
}

impl From<MailingRow> for Mailing {
    fn from(row: MailingRow) -> Self {
        Self {
            id: row.id,
            start_time: from_epoch(row.start_time),
            end_time: from_epoch(row.end_time),
            status: row.status,
            message_id: row.message_id,
            owner_id: row.owner_id,
        }
    }
}

impl Mailing {
    /// Inclusive on both ends.
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MailingDetail {
    #[serde(flatten)]
    pub mailing: Mailing,
    pub recipient_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMailing {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub recipient_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailingPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub message_id: Option<Option<i64>>,
    pub recipient_ids: Option<Vec<i64>>,
}
