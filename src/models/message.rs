use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Subject/body template sent to every recipient of a mailing.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub subject: String,
    pub body: String,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePatch {
    pub subject: Option<String>,
    pub body: Option<String>,
}
