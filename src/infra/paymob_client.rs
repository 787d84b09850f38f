use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        Intention, IntentionExtras, IntentionRequest, PaymentGateway,
    },
    infra::{config::PaymobConfig, http_client::build_client, paymob_hmac::verify_hmac},
};

const ITEM_NAME: &str = "WhatSou subscription";

#[derive(Debug, Serialize)]
struct BillingData<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: String,
    phone_number: &'a str,
    country: &'a str,
    city: &'a str,
    street: &'a str,
    building: &'a str,
    floor: &'a str,
    apartment: &'a str,
}

impl<'a> BillingData<'a> {
    /// The gateway requires full billing details; only the phone is known.
    fn from_phone(phone: &'a str) -> Self {
        Self {
            first_name: "Customer",
            last_name: phone,
            email: format!("{phone}@whatsou.com"),
            phone_number: phone,
            country: "EG",
            city: "Cairo",
            street: "N/A",
            building: "N/A",
            floor: "N/A",
            apartment: "N/A",
        }
    }
}

#[derive(Debug, Serialize)]
struct IntentionItem<'a> {
    name: &'a str,
    amount: i64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct IntentionPayload<'a> {
    amount: i64,
    currency: &'a str,
    payment_methods: [i64; 1],
    items: [IntentionItem<'a>; 1],
    billing_data: BillingData<'a>,
    extras: &'a IntentionExtras,
    special_reference: &'a str,
    redirection_url: &'a str,
    notification_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct IntentionResponse {
    id: Value,
    client_secret: String,
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Clone)]
pub struct PaymobClient {
    client: Client,
    api_base: Url,
    secret_key: SecretString,
    public_key: String,
    integration_id: i64,
    hmac_secret: SecretString,
    redirection_url: String,
    notification_url: String,
}

impl PaymobClient {
    pub fn new(config: &PaymobConfig, site_url: &Url, public_api_url: &Url) -> Self {
        Self {
            client: build_client(),
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
            public_key: config.public_key.clone(),
            integration_id: config.card_integration_id,
            hmac_secret: config.hmac_secret.clone(),
            redirection_url: join(site_url, "dashboard/subscription?status=complete"),
            notification_url: join(public_api_url, "api/webhooks/paymob"),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        join(&self.api_base, path)
    }

    /// Hosted checkout page for an intention, used when the gateway does not
    /// return a redirect URL of its own.
    fn unified_checkout_url(&self, client_secret: &str) -> String {
        let base = self.endpoint("unifiedcheckout/");
        match Url::parse_with_params(
            &base,
            &[
                ("publicKey", self.public_key.as_str()),
                ("clientSecret", client_secret),
            ],
        ) {
            Ok(url) => url.to_string(),
            Err(_) => base,
        }
    }
}

fn join(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

fn intention_id(id: &Value) -> AppResult<String> {
    match id {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(AppError::Upstream("Paymob intention has no id".into())),
    }
}

#[async_trait]
impl PaymentGateway for PaymobClient {
    async fn create_intention(&self, request: &IntentionRequest) -> AppResult<Intention> {
        let payload = IntentionPayload {
            amount: request.amount_cents,
            currency: &request.currency,
            payment_methods: [self.integration_id],
            items: [IntentionItem {
                name: ITEM_NAME,
                amount: request.amount_cents,
                quantity: 1,
            }],
            billing_data: BillingData::from_phone(&request.phone),
            extras: &request.extras,
            special_reference: &request.special_reference,
            redirection_url: &self.redirection_url,
            notification_url: &self.notification_url,
        };

        let response = self
            .client
            .post(self.endpoint("v1/intention/"))
            .header(
                "Authorization",
                format!("Token {}", self.secret_key.expose_secret()),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Paymob request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read Paymob response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Paymob intention API error");
            return Err(AppError::Upstream(format!("Paymob API error: {status}")));
        }

        let parsed: IntentionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Paymob response");
            AppError::Upstream(format!("Failed to parse Paymob response: {e}"))
        })?;

        let checkout_url = parsed
            .redirect_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.unified_checkout_url(&parsed.client_secret));

        Ok(Intention {
            id: intention_id(&parsed.id)?,
            checkout_url,
            client_secret: parsed.client_secret,
            public_key: self.public_key.clone(),
        })
    }

    fn verify_callback(&self, transaction: &Value, received_hmac: &str) -> AppResult<()> {
        if verify_hmac(self.hmac_secret.expose_secret(), transaction, received_hmac) {
            Ok(())
        } else {
            Err(AppError::VerificationFailure)
        }
    }
}
