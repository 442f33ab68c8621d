pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod rbac;
pub mod routes;
pub mod services;
pub mod smtp;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::config::Config;
use crate::smtp::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl axum::extract::FromRef<AppState> for sqlx::SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<dyn Mailer> {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::recipients::router())
        .merge(routes::messages::router())
        .merge(routes::mailings::router())
        .merge(routes::attempts::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
