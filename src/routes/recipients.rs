use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::error::AppResult;
use crate::models::recipient::{NewRecipient, Recipient, RecipientPatch};
use crate::rbac::AuthUser;
use crate::services::recipient_service;
use crate::AppState;

async fn list_recipients(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Recipient>>> {
    let rows = recipient_service::list_recipients(&state.pool, user.scope()).await?;
    Ok(Json(rows))
}

async fn create_recipient(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewRecipient>,
) -> AppResult<impl IntoResponse> {
    user.ensure_can_create("recipients")?;
    let recipient = recipient_service::create_recipient(&state.pool, user.id, req).await?;
    tracing::info!(recipient_id = recipient.id, owner_id = user.id, "recipient created");
    Ok((StatusCode::CREATED, Json(recipient)))
}

async fn get_recipient(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Recipient>> {
    let recipient = recipient_service::get_recipient(&state.pool, id).await?;
    user.ensure_can_view(recipient.owner_id, "recipients")?;
    Ok(Json(recipient))
}

async fn update_recipient(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<RecipientPatch>,
) -> AppResult<Json<Recipient>> {
    let existing = recipient_service::get_recipient(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "recipients")?;
    Ok(Json(recipient_service::update_recipient(&state.pool, id, patch).await?))
}

async fn delete_recipient(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = recipient_service::get_recipient(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "recipients")?;
    recipient_service::delete_recipient(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipients", get(list_recipients).post(create_recipient))
        .route(
            "/recipients/:id",
            get(get_recipient)
                .patch(update_recipient)
                .delete(delete_recipient),
        )
}
