use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::error::AppResult;
use crate::models::message::{Message, MessagePatch, NewMessage};
use crate::rbac::AuthUser;
use crate::services::message_service;
use crate::AppState;

async fn list_messages(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(message_service::list_messages(&state.pool, user.scope()).await?))
}

async fn create_message(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewMessage>,
) -> AppResult<impl IntoResponse> {
    user.ensure_can_create("messages")?;
    let message = message_service::create_message(&state.pool, user.id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn get_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Message>> {
    let message = message_service::get_message(&state.pool, id).await?;
    user.ensure_can_view(message.owner_id, "messages")?;
    Ok(Json(message))
}

async fn update_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MessagePatch>,
) -> AppResult<Json<Message>> {
    let existing = message_service::get_message(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "messages")?;
    Ok(Json(message_service::update_message(&state.pool, id, patch).await?))
}

async fn delete_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = message_service::get_message(&state.pool, id).await?;
    user.ensure_can_modify(existing.owner_id, "messages")?;
    message_service::delete_message(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(create_message))
        .route(
            "/messages/:id",
            get(get_message).patch(update_message).delete(delete_message),
        )
}
