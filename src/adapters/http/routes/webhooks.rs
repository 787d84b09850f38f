//! Inbound callbacks from the payment gateway and the admin Telegram bot.
//! Both always answer 200 so the sender does not retry on our failures.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    routing::post,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    adapters::http::{app_state::AppState, auth::header_secret_matches},
    use_cases::payment_confirmation::{AdminCallback, WebhookOutcome},
};

const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/paymob", post(paymob_webhook))
        .route("/telegram", post(telegram_webhook))
}

#[derive(Deserialize)]
struct PaymobQuery {
    hmac: Option<String>,
}

async fn paymob_webhook(
    State(app_state): State<AppState>,
    Query(query): Query<PaymobQuery>,
    body: Bytes,
) -> Json<Value> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Gateway callback with unreadable body");
            return Json(json!({ "success": false }));
        }
    };

    match app_state
        .confirmation_use_cases
        .handle_paymob_webhook(&payload, query.hmac.as_deref())
        .await
    {
        Ok(outcome) => {
            tracing::info!(?outcome, "Gateway callback handled");
            let success = matches!(
                outcome,
                WebhookOutcome::Activated | WebhookOutcome::Failed | WebhookOutcome::AlreadyProcessed
            );
            Json(json!({ "success": success }))
        }
        Err(e) => {
            tracing::error!(error = ?e, "Gateway callback processing failed");
            Json(json!({ "success": false }))
        }
    }
}

#[derive(Deserialize)]
struct TelegramUpdate {
    callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize)]
struct CallbackQuery {
    id: String,
    data: Option<String>,
    message: Option<CallbackMessage>,
}

#[derive(Deserialize)]
struct CallbackMessage {
    message_id: i64,
    chat: Chat,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
}

impl From<CallbackQuery> for AdminCallback {
    fn from(query: CallbackQuery) -> Self {
        AdminCallback {
            callback_id: query.id,
            data: query.data,
            chat_id: query.message.as_ref().map(|m| m.chat.id),
            message_id: query.message.as_ref().map(|m| m.message_id),
        }
    }
}

async fn telegram_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    if !header_secret_matches(
        &headers,
        TELEGRAM_SECRET_HEADER,
        &app_state.config.telegram.webhook_secret,
    ) {
        tracing::warn!("Bot webhook with missing or wrong secret token");
        return "OK";
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable bot update");
            return "OK";
        }
    };
    let Some(query) = update.callback_query else {
        return "OK";
    };

    match app_state
        .confirmation_use_cases
        .handle_admin_callback(query.into())
        .await
    {
        Ok(outcome) => tracing::info!(?outcome, "Admin callback handled"),
        Err(e) => tracing::error!(error = ?e, "Admin callback processing failed"),
    }
    "OK"
}
