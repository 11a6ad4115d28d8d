pub mod handlers;
pub mod auth;

use axum::{
    routing::get,
    Router,
    middleware,
};
use crate::http::server::AppState;
use self::handlers::*;
use self::auth::settings_auth_middleware;

pub fn setup_settings_router(state: AppState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).post(save_settings))
        .layer(middleware::from_fn_with_state(state.clone(), settings_auth_middleware))
        .with_state(state)
}
