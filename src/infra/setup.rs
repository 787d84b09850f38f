use crate::{
    adapters::http::app_state::AppState,
    application::ports::{
        clock::{Clock, SystemClock},
        notifications::{AdminNotifier, MessageSender},
        payment_gateway::PaymentGateway,
    },
    infra::{
        config::AppConfig, db::run_migrations, evolution_client::EvolutionClient,
        pause_cache::RedisPauseCache, paymob_client::PaymobClient, postgres_persistence,
        telegram_client::TelegramClient,
    },
    use_cases::{
        payment::{PaymentTransactionRepo, PaymentUseCases},
        payment_confirmation::ConfirmationUseCases,
        store::{StoreRepo, StoreUseCases},
        storefront::{PauseCache, StorefrontUseCases},
        subscription::{SubscriptionRepo, SubscriptionUseCases},
        subscription_sweep::SweepUseCases,
        user::UserRepo,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    run_migrations(postgres_arc.pool()).await?;

    let pause_cache = Arc::new(
        RedisPauseCache::new(&config.redis_url, config.storefront_pause_cache_ttl_secs).await?,
    ) as Arc<dyn PauseCache>;

    let gateway = Arc::new(PaymobClient::new(
        &config.paymob,
        &config.site_url,
        &config.public_api_url,
    )) as Arc<dyn PaymentGateway>;
    let admin_notifier = Arc::new(TelegramClient::new(&config.telegram)) as Arc<dyn AdminNotifier>;
    let message_sender = Arc::new(EvolutionClient::new(&config.evolution)) as Arc<dyn MessageSender>;
    let clock = Arc::new(SystemClock) as Arc<dyn Clock>;

    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserRepo>;
    let subscription_repo_arc = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;
    let transaction_repo_arc = postgres_arc.clone() as Arc<dyn PaymentTransactionRepo>;
    let store_repo_arc = postgres_arc.clone() as Arc<dyn StoreRepo>;

    let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
        subscription_repo_arc.clone(),
        transaction_repo_arc.clone(),
        clock.clone(),
        config.pricing,
    ));

    let payment_use_cases = PaymentUseCases::new(
        user_repo_arc.clone(),
        subscription_repo_arc.clone(),
        transaction_repo_arc.clone(),
        gateway.clone(),
        admin_notifier.clone(),
        clock.clone(),
        config.pricing,
        config.currency.clone(),
        config.manual_payments.clone(),
    );

    let confirmation_use_cases = ConfirmationUseCases::new(
        subscription_repo_arc.clone(),
        transaction_repo_arc.clone(),
        user_repo_arc.clone(),
        gateway,
        admin_notifier,
        message_sender.clone(),
        clock.clone(),
        config.telegram.admin_chat_id,
        config.currency.clone(),
    );

    let sweep_use_cases = SweepUseCases::new(
        subscription_repo_arc.clone(),
        message_sender,
        config.site_url.to_string(),
    );

    let store_use_cases = StoreUseCases::new(store_repo_arc.clone(), subscription_use_cases.clone());

    let storefront_use_cases = StorefrontUseCases::new(
        store_repo_arc,
        subscription_repo_arc,
        pause_cache,
        clock.clone(),
    );

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases,
        payment_use_cases: Arc::new(payment_use_cases),
        confirmation_use_cases: Arc::new(confirmation_use_cases),
        sweep_use_cases: Arc::new(sweep_use_cases),
        store_use_cases: Arc::new(store_use_cases),
        storefront_use_cases: Arc::new(storefront_use_cases),
        clock,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "whatsou=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs); skipped when the file cannot be created.
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
