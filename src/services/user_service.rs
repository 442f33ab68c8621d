use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::user::User;

const USER_COLUMNS: &str = "id, email, username, password_hash, role, is_active, email_verified, \
                            activation_token, api_token, created_at";

async fn find_by(pool: &SqlitePool, column: &str, value: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE {column} = ?"
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    find_by(pool, "email", email).await
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> AppResult<Option<User>> {
    find_by(pool, "api_token", token).await
}

pub async fn find_by_activation_token(pool: &SqlitePool, token: &str) -> AppResult<Option<User>> {
    find_by(pool, "activation_token", token).await
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> AppResult<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {id}")))
}

pub async fn list_users(pool: &SqlitePool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY email"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Deactivation also revokes the user's bearer token.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> AppResult<User> {
    let sql = if active {
        "UPDATE users SET is_active = 1 WHERE id = ?"
    } else {
        "UPDATE users SET is_active = 0, api_token = NULL WHERE id = ?"
    };
    let result = sqlx::query(sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("user {id}")));
    }
    tracing::info!(user_id = id, active, "user activation changed");
    get_user(pool, id).await
}
