use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::AppResult;
use crate::models::attempt::{Attempt, AttemptStats};
use crate::models::mailing::{Mailing, MailingDetail, MailingPatch, MailingStatus, NewMailing};
use crate::rbac::AuthUser;
use crate::services::{attempt_service, dispatch_service, mailing_service};
use crate::AppState;

async fn list_mailings(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Mailing>>> {
    Ok(Json(mailing_service::list_mailings(&state.pool, user.scope()).await?))
}

async fn create_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewMailing>,
) -> AppResult<impl IntoResponse> {
    user.ensure_can_create("mailings")?;
    let detail =
        mailing_service::create_mailing(&state.pool, user.id, req, state.clock.now()).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MailingDetail>> {
    let mailing = mailing_service::get_mailing(&state.pool, id).await?;
    user.ensure_can_view(mailing.owner_id, "mailings")?;
    let detail = mailing_service::get_mailing_detail(&state.pool, id, state.clock.now()).await?;
    Ok(Json(detail))
}

async fn update_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MailingPatch>,
) -> AppResult<Json<MailingDetail>> {
    let existing = mailing_service::get_mailing(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "mailings")?;
    let detail =
        mailing_service::update_mailing(&state.pool, id, user.scope(), patch, state.clock.now())
            .await?;
    Ok(Json(detail))
}

async fn delete_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = mailing_service::get_mailing(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "mailings")?;
    mailing_service::delete_mailing(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct RunResp {
    ok: bool,
    message: String,
    succeeded: u32,
    failed: u32,
    status: MailingStatus,
}

async fn run_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RunResp>> {
    let existing = mailing_service::get_mailing(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "mailings")?;
    let report = dispatch_service::run_mailing(
        &state.pool,
        state.mailer.as_ref(),
        state.clock.as_ref(),
        &state.config.default_from_email,
        id,
    )
    .await?;
    Ok(Json(RunResp {
        ok: true,
        message: report.summary(),
        succeeded: report.succeeded,
        failed: report.failed,
        status: report.status,
    }))
}

#[derive(Serialize)]
pub struct AttemptsResp {
    pub stats: AttemptStats,
    pub attempts: Vec<Attempt>,
}

async fn mailing_attempts(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AttemptsResp>> {
    let mailing = mailing_service::get_mailing(&state.pool, id).await?;
    user.ensure_can_view(mailing.owner_id, "mailings")?;
    let stats = attempt_service::attempt_stats(&state.pool, None, Some(id)).await?;
    let attempts = attempt_service::list_attempts(&state.pool, None, Some(id)).await?;
    Ok(Json(AttemptsResp { stats, attempts }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mailings", get(list_mailings).post(create_mailing))
        .route(
            "/mailings/:id",
            get(get_mailing).patch(update_mailing).delete(delete_mailing),
        )
        .route("/mailings/:id/run", post(run_mailing))
        .route("/mailings/:id/attempts", get(mailing_attempts))
}
