use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::notifications::MessageSender,
    infra::{config::EvolutionConfig, http_client::build_client},
};

/// Digits only, with the Egyptian `2` country prefix: `01001234567` and
/// `+20 100 123 4567` both become `201001234567`.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.starts_with('2') {
        digits
    } else {
        format!("2{digits}")
    }
}

/// WhatsApp sender backed by an Evolution API instance.
#[derive(Clone)]
pub struct EvolutionClient {
    client: Client,
    send_url: String,
    api_key: SecretString,
}

impl EvolutionClient {
    pub fn new(config: &EvolutionConfig) -> Self {
        let send_url = format!(
            "{}/message/sendText/{}",
            config.api_url.as_str().trim_end_matches('/'),
            config.instance_name
        );
        Self {
            client: build_client(),
            send_url,
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl MessageSender for EvolutionClient {
    async fn send_text(&self, phone: &str, text: &str) -> AppResult<()> {
        let number = normalize_phone(phone);
        let response = self
            .client
            .post(&self.send_url)
            .header("apikey", self.api_key.expose_secret())
            .json(&json!({ "number": number, "text": text }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("WhatsApp request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Evolution API error");
            return Err(AppError::Upstream(format!("WhatsApp send failed: {status}")));
        }

        tracing::debug!(number = %number, "WhatsApp message sent");
        Ok(())
    }
}
