pub mod internal;
pub mod store;
pub mod storefront;
pub mod subscription;
pub mod webhooks;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/dashboard/subscription", subscription::router())
        .nest("/dashboard", store::router())
        .nest("/webhooks", webhooks::router())
        .nest("/internal", internal::router())
        .nest("/storefront", storefront::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
