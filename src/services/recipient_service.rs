/// Recipient storage
use lettre::Address;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::recipient::{NewRecipient, Recipient, RecipientPatch};

fn validate_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    email
        .parse::<Address>()
        .map_err(|_| AppError::validation(format!("invalid email address: {email}")))?;
    Ok(email.to_string())
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("recipient name must not be empty"));
    }
    if name.chars().count() > 300 {
        return Err(AppError::validation("recipient name is limited to 300 characters"));
    }
    Ok(name.to_string())
}

pub async fn create_recipient(
    pool: &SqlitePool,
    owner_id: i64,
    req: NewRecipient,
) -> AppResult<Recipient> {
    let email = validate_email(&req.email)?;
    let name = validate_name(&req.name)?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO recipients (email, name, comment, owner_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&email)
    .bind(&name)
    .bind(&req.comment)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("recipient {email} already exists")),
        other => other,
    })?;

    Ok(Recipient {
        id,
        email,
        name,
        comment: req.comment,
        owner_id: Some(owner_id),
    })
}

/// `owner` of `None` lists every recipient.
pub async fn list_recipients(pool: &SqlitePool, owner: Option<i64>) -> AppResult<Vec<Recipient>> {
    let rows = sqlx::query_as::<_, Recipient>(
        "SELECT id, email, name, comment, owner_id FROM recipients \
         WHERE (?1 IS NULL OR owner_id = ?1) ORDER BY id",
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_recipient(pool: &SqlitePool, id: i64) -> AppResult<Option<Recipient>> {
    let row = sqlx::query_as::<_, Recipient>(
        "SELECT id, email, name, comment, owner_id FROM recipients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_recipient(pool: &SqlitePool, id: i64) -> AppResult<Recipient> {
    find_recipient(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("recipient {id}")))
}

pub async fn update_recipient(
    pool: &SqlitePool,
    id: i64,
    patch: RecipientPatch,
) -> AppResult<Recipient> {
    let mut recipient = get_recipient(pool, id).await?;
    if let Some(email) = patch.email {
        recipient.email = validate_email(&email)?;
    }
    if let Some(name) = patch.name {
        recipient.name = validate_name(&name)?;
    }
    if let Some(comment) = patch.comment {
        recipient.comment = comment;
    }

    sqlx::query("UPDATE recipients SET email = ?, name = ?, comment = ? WHERE id = ?")
        .bind(&recipient.email)
        .bind(&recipient.name)
        .bind(&recipient.comment)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(recipient)
}

/// Also drops the recipient from every mailing's recipient set.
pub async fn delete_recipient(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM recipients WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("recipient {id}")));
    }
    Ok(())
}
