use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::models::user::User;
use crate::rbac::ManagerUser;
use crate::services::user_service;
use crate::AppState;

async fn list_users(
    _manager: ManagerUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(user_service::list_users(&state.pool).await?))
}

async fn get_user(
    _manager: ManagerUser,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(user_service::get_user(&state.pool, user_id).await?))
}

async fn activate_user(
    _manager: ManagerUser,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(user_service::set_active(&state.pool, user_id, true).await?))
}

async fn deactivate_user(
    ManagerUser(manager): ManagerUser,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    if manager.id == user_id {
        return Err(AppError::denied("you cannot deactivate yourself"));
    }
    Ok(Json(user_service::set_active(&state.pool, user_id, false).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id", get(get_user))
        .route("/users/:user_id/activate", post(activate_user))
        .route("/users/:user_id/deactivate", post(deactivate_user))
}
