use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::notifications::AdminNotifier,
    infra::{config::TelegramConfig, http_client::build_client},
};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client posting approval requests to the admin chat.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    bot_token: SecretString,
    admin_chat_id: i64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: build_client(),
            bot_token: config.bot_token.clone(),
            admin_chat_id: config.admin_chat_id,
        }
    }

    async fn call(&self, method: &str, body: Value) -> AppResult<Option<Value>> {
        let url = format!(
            "{TELEGRAM_API_BASE}/bot{}/{method}",
            self.bot_token.expose_secret()
        );
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Telegram request failed: {}", e.without_url())))?;

        let status = response.status();
        let parsed: TelegramResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Telegram response: {e}")))?;

        if !parsed.ok {
            let description = parsed.description.unwrap_or_default();
            tracing::error!(method, status = %status, description = %description, "Telegram API error");
            return Err(AppError::Upstream(format!("Telegram {method} failed: {description}")));
        }
        Ok(parsed.result)
    }
}

fn approval_keyboard(transaction_id: Uuid) -> Value {
    json!({
        "inline_keyboard": [[
            { "text": "✅ Confirm", "callback_data": format!("confirm_{transaction_id}") },
            { "text": "❌ Reject", "callback_data": format!("reject_{transaction_id}") }
        ]]
    })
}

fn message_id(result: Option<Value>) -> AppResult<i64> {
    result
        .as_ref()
        .and_then(|r| r.get("message_id"))
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Upstream("Telegram response has no message_id".into()))
}

#[async_trait]
impl AdminNotifier for TelegramClient {
    async fn request_approval(&self, transaction_id: Uuid, text: &str) -> AppResult<i64> {
        let result = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": self.admin_chat_id,
                    "text": text,
                    "parse_mode": "Markdown",
                    "reply_markup": approval_keyboard(transaction_id),
                }),
            )
            .await?;
        message_id(result)
    }

    async fn update_approval(&self, message_id: i64, text: &str) -> AppResult<()> {
        self.call(
            "editMessageText",
            json!({
                "chat_id": self.admin_chat_id,
                "message_id": message_id,
                "text": text,
                "parse_mode": "Markdown",
            }),
        )
        .await
        .map(|_| ())
    }

    async fn acknowledge_callback(&self, callback_id: &str, text: &str) -> AppResult<()> {
        self.call(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_id, "text": text }),
        )
        .await
        .map(|_| ())
    }
}
