use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppResult;
use crate::models::user::{LoginReq, RegisterReq};
use crate::rbac::AuthUser;
use crate::services::auth_service;
use crate::AppState;

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> AppResult<impl IntoResponse> {
    let outcome = auth_service::register_user(
        &state.pool,
        state.mailer.as_ref(),
        &state.config.default_from_email,
        &state.config.public_base_url,
        req,
        state.clock.now(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "user": outcome.user,
            "activation_sent": outcome.activation_sent,
        })),
    ))
}

async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = auth_service::activate_email(&state.pool, &token).await?;
    Ok(Json(serde_json::json!({ "ok": true, "user": user })))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> AppResult<impl IntoResponse> {
    let resp = auth_service::login(&state.pool, req).await?;
    Ok(Json(resp))
}

async fn logout(user: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    auth_service::logout(&state.pool, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/users/activate/:token", get(activate))
}
