use axum::{
    Json, Router, extract::State, http::HeaderMap, response::IntoResponse, routing::post,
};

use crate::{
    adapters::http::{app_state::AppState, auth::header_secret_matches},
    app_error::{AppError, AppResult},
};

const CRON_SECRET_HEADER: &str = "x-cron-secret";

pub fn router() -> Router<AppState> {
    Router::new().route("/subscription-sweep", post(run_sweep))
}

async fn run_sweep(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    if !header_secret_matches(&headers, CRON_SECRET_HEADER, &app_state.config.cron_secret) {
        return Err(AppError::InvalidCredentials);
    }
    let report = app_state.sweep_use_cases.run(app_state.clock.now()).await?;
    Ok(Json(report))
}
