use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::{
    application::use_cases::payment::ManualPaymentSettings, domain::entities::pricing::Pricing,
};

pub struct PaymobConfig {
    pub api_base: Url,
    pub secret_key: SecretString,
    pub public_key: String,
    pub card_integration_id: i64,
    pub hmac_secret: SecretString,
}

pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub admin_chat_id: i64,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header on every bot update.
    pub webhook_secret: SecretString,
}

pub struct EvolutionConfig {
    pub api_url: Url,
    pub api_key: SecretString,
    pub instance_name: String,
}

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    /// Public dashboard origin, used in reminder links.
    pub site_url: Url,
    /// Public origin of this API, used for gateway callback URLs.
    pub public_api_url: Url,
    pub currency: String,
    pub pricing: Pricing,
    pub paymob: PaymobConfig,
    pub telegram: TelegramConfig,
    pub evolution: EvolutionConfig,
    pub manual_payments: ManualPaymentSettings,
    pub cron_secret: SecretString,
    /// In-process sweep ticker; disabled when unset.
    pub sweep_interval_secs: Option<u64>,
    pub storefront_pause_cache_ttl_secs: u64,
}

fn secret(var: &'static str) -> SecretString {
    SecretString::new(get_env::<String>(var).into())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());

        let pricing = Pricing {
            first_subscription_cents: get_env_default("FIRST_SUBSCRIPTION_CENTS", 10_000),
            monthly_cents: get_env_default("MONTHLY_PRICE_CENTS", 30_000),
            yearly_multiplier: get_env_default("YEARLY_PRICE_MULTIPLIER", 10),
        };

        let paymob = PaymobConfig {
            api_base: get_env_default(
                "PAYMOB_API_BASE",
                Url::parse("https://accept.paymob.com").expect("default Paymob URL is valid"),
            ),
            secret_key: secret("PAYMOB_SECRET_KEY"),
            public_key: get_env("PAYMOB_PUBLIC_KEY"),
            card_integration_id: get_env("PAYMOB_CARD_INTEGRATION_ID"),
            hmac_secret: secret("PAYMOB_HMAC_SECRET"),
        };

        let telegram = TelegramConfig {
            bot_token: secret("TELEGRAM_BOT_TOKEN"),
            admin_chat_id: get_env("TELEGRAM_ADMIN_CHAT_ID"),
            webhook_secret: secret("TELEGRAM_WEBHOOK_SECRET"),
        };

        let evolution = EvolutionConfig {
            api_url: get_env("EVOLUTION_API_URL"),
            api_key: secret("EVOLUTION_API_KEY"),
            instance_name: get_env_default("EVOLUTION_INSTANCE_NAME", "whatsou".to_string()),
        };

        let manual_payments = ManualPaymentSettings {
            instapay_link: get_env("INSTAPAY_LINK"),
            vodafone_cash_link: get_env("VODAFONE_CASH_LINK"),
            whatsapp_admin_number: get_env("WHATSAPP_ADMIN_NUMBER"),
        };

        let sweep_interval_secs: Option<u64> = std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0);

        Self {
            jwt_secret: secret("JWT_SECRET"),
            cors_origin,
            bind_addr,
            database_url: get_env("DATABASE_URL"),
            redis_url,
            site_url: get_env("SITE_URL"),
            public_api_url: get_env("PUBLIC_API_URL"),
            currency: get_env_default("CURRENCY", "EGP".to_string()),
            pricing,
            paymob,
            telegram,
            evolution,
            manual_payments,
            cron_secret: secret("CRON_SECRET"),
            sweep_interval_secs,
            storefront_pause_cache_ttl_secs: get_env_default("STOREFRONT_PAUSE_CACHE_TTL_SECS", 300),
        }
    }
}
