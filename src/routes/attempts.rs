use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppResult;
use crate::rbac::AuthUser;
use crate::routes::mailings::AttemptsResp;
use crate::services::attempt_service;
use crate::AppState;

/// Owners see attempts of their own mailings; managers see all of them.
async fn list_attempts(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<AttemptsResp>> {
    let stats = attempt_service::attempt_stats(&state.pool, user.scope(), None).await?;
    let attempts = attempt_service::list_attempts(&state.pool, user.scope(), None).await?;
    Ok(Json(AttemptsResp { stats, attempts }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/attempts", get(list_attempts))
}
