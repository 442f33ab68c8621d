use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use lettre::Address;
use sqlx::SqlitePool;

use crate::db::to_epoch;
use crate::error::{AppError, AppResult};
use crate::models::user::{AuthResponse, LoginReq, RegisterReq, Role, User};
use crate::services::user_service;
use crate::smtp::{Mailer, OutgoingEmail};

const MIN_PASSWORD_LEN: usize = 8;

// bcrypt blocks for hundreds of milliseconds; run it off the async workers.
async fn hash_password(password: String) -> AppResult<String> {
    let hashed = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(hashed)
}

async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    let ok = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(ok)
}

pub struct RegisterOutcome {
    pub user: User,
    /// Whether the activation email went out.
    pub activation_sent: bool,
}

/// Inserts a user directly, bypassing email verification. Used by the CLI
/// to bootstrap accounts (including managers).
pub async fn create_user(
    pool: &SqlitePool,
    req: &RegisterReq,
    role: Role,
    active: bool,
    activation_token: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<User> {
    let email = req.email.trim().to_lowercase();
    email
        .parse::<Address>()
        .map_err(|_| AppError::validation(format!("invalid email address: {email}")))?;
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let password_hash = hash_password(req.password.clone()).await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, username, password_hash, role, is_active, email_verified, activation_token, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&email)
    .bind(username)
    .bind(&password_hash)
    .bind(role)
    .bind(active)
    .bind(active)
    .bind(activation_token)
    .bind(to_epoch(now))
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("email or username already registered".into()),
        other => other,
    })?;

    user_service::get_user(pool, id).await
}

/// Self-registration: the account stays inactive until the emailed link is
/// followed.
pub async fn register_user(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    from_email: &str,
    public_base_url: &str,
    req: RegisterReq,
    now: DateTime<Utc>,
) -> AppResult<RegisterOutcome> {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let user = create_user(pool, &req, Role::Owner, false, Some(&token), now).await?;

    let link = format!("{public_base_url}/users/activate/{token}");
    let email = OutgoingEmail::new(
        from_email,
        user.email.as_str(),
        "Confirm your email",
        format!("To activate your account follow this link: {link}"),
    );
    let activation_sent = match mailer.send(&email).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(email = %user.email, error = %e, "activation email failed");
            false
        }
    };
    tracing::info!(user_id = user.id, email = %user.email, "user registered");
    Ok(RegisterOutcome { user, activation_sent })
}

pub async fn activate_email(pool: &SqlitePool, token: &str) -> AppResult<User> {
    let user = user_service::find_by_activation_token(pool, token)
        .await?
        .ok_or_else(|| AppError::not_found("activation link"))?;
    sqlx::query(
        "UPDATE users SET email_verified = 1, is_active = 1, activation_token = NULL WHERE id = ?",
    )
    .bind(user.id)
    .execute(pool)
    .await?;
    tracing::info!(user_id = user.id, "email verified");
    user_service::get_user(pool, user.id).await
}

pub async fn login(pool: &SqlitePool, req: LoginReq) -> AppResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();
    let user = user_service::find_by_email(pool, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized);
    }
    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    sqlx::query("UPDATE users SET api_token = ? WHERE id = ?")
        .bind(&token)
        .bind(user.id)
        .execute(pool)
        .await?;
    tracing::info!(user_id = user.id, "login");

    Ok(AuthResponse {
        token,
        username: user.username,
        role: user.role,
    })
}

pub async fn logout(pool: &SqlitePool, user_id: i64) -> AppResult<()> {
    sqlx::query("UPDATE users SET api_token = NULL WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
