use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::error::AppResult;
use crate::services::stats_service::{self, Dashboard};
use crate::AppState;

pub mod attempts;
pub mod auth;
pub mod mailings;
pub mod messages;
pub mod recipients;
pub mod users;

async fn dashboard(State(state): State<AppState>) -> AppResult<Json<Dashboard>> {
    let stats = stats_service::dashboard(&state.pool, state.clock.now()).await?;
    Ok(Json(stats))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/stats", get(dashboard))
}
