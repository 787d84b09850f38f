use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, auth::current_user_id},
    app_error::{AppError, AppResult},
    domain::entities::{
        payment_method::PaymentMethod, payment_transaction::PaymentTransaction,
        subscription_period::SubscriptionPeriod,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/history", get(get_history))
        .route("/pay", post(start_card_payment))
        .route("/manual-pay", post(start_manual_payment))
}

async fn get_status(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let view = app_state.subscription_use_cases.status(user_id).await?;
    Ok(Json(view))
}

#[derive(Serialize)]
struct HistoryResponse {
    transactions: Vec<PaymentTransaction>,
}

async fn get_history(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let transactions = app_state.subscription_use_cases.history(user_id).await?;
    Ok(Json(HistoryResponse { transactions }))
}

async fn start_card_payment(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;
    let response = app_state
        .payment_use_cases
        .initiate_card_payment(user_id)
        .await?;
    Ok(Json(response))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManualPayRequest {
    payment_method: String,
    #[serde(default)]
    subscription_period: Option<String>,
}

async fn start_manual_payment(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<ManualPayRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;

    let method: PaymentMethod = body.payment_method.parse().map_err(|_| {
        AppError::ValidationError("Payment method must be instapay or vodafone".into())
    })?;
    let period = match body.subscription_period.as_deref() {
        None => SubscriptionPeriod::Monthly,
        Some(raw) => raw.parse().map_err(|_| {
            AppError::ValidationError("Subscription period must be monthly or yearly".into())
        })?,
    };

    let response = app_state
        .payment_use_cases
        .initiate_manual_payment(user_id, method, period)
        .await?;
    Ok(Json(response))
}
