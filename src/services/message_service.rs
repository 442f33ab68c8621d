use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::message::{Message, MessagePatch, NewMessage};

const SUBJECT_MAX_CHARS: usize = 200;

fn validate_subject(subject: &str) -> AppResult<String> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(AppError::validation("message subject must not be empty"));
    }
    if subject.chars().count() > SUBJECT_MAX_CHARS {
        return Err(AppError::validation(format!(
            "message subject is limited to {SUBJECT_MAX_CHARS} characters"
        )));
    }
    Ok(subject.to_string())
}

pub async fn create_message(pool: &SqlitePool, owner_id: i64, req: NewMessage) -> AppResult<Message> {
    let subject = validate_subject(&req.subject)?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO messages (subject, body, owner_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&subject)
    .bind(&req.body)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(Message {
        id,
        subject,
        body: req.body,
        owner_id: Some(owner_id),
    })
}

pub async fn list_messages(pool: &SqlitePool, owner: Option<i64>) -> AppResult<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        "SELECT id, subject, body, owner_id FROM messages \
         WHERE (?1 IS NULL OR owner_id = ?1) ORDER BY id",
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_message(pool: &SqlitePool, id: i64) -> AppResult<Option<Message>> {
    let row = sqlx::query_as::<_, Message>(
        "SELECT id, subject, body, owner_id FROM messages WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_message(pool: &SqlitePool, id: i64) -> AppResult<Message> {
    find_message(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("message {id}")))
}

pub async fn update_message(pool: &SqlitePool, id: i64, patch: MessagePatch) -> AppResult<Message> {
    let mut message = get_message(pool, id).await?;
    if let Some(subject) = patch.subject {
        message.subject = validate_subject(&subject)?;
    }
    if let Some(body) = patch.body {
        message.body = body;
    }
    sqlx::query("UPDATE messages SET subject = ?, body = ? WHERE id = ?")
        .bind(&message.subject)
        .bind(&message.body)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(message)
}

/// Mailings that referenced the message keep existing with no message.
pub async fn delete_message(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("message {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_limits() {
        assert!(validate_subject("").is_err());
        assert!(validate_subject(&"x".repeat(201)).is_err());
        assert_eq!(validate_subject(&"x".repeat(200)).unwrap().len(), 200);
    }
}
