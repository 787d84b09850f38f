//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires every use case against in-memory repositories
//! and recording fakes, all driven by one `FixedClock`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::jwt,
    application::use_cases::{
        payment::{ManualPaymentSettings, PaymentUseCases},
        payment_confirmation::ConfirmationUseCases,
        store::StoreUseCases,
        storefront::StorefrontUseCases,
        subscription::SubscriptionUseCases,
        subscription_sweep::SweepUseCases,
    },
    domain::entities::{
        payment_transaction::PaymentTransaction,
        pricing::Pricing,
        store::{Product, Store},
        subscription::SubscriptionRecord,
    },
    infra::config::{AppConfig, EvolutionConfig, PaymobConfig, TelegramConfig},
    test_utils::{
        FakePaymentGateway, FixedClock, InMemoryPauseCache, InMemoryPaymentTransactionRepo,
        InMemoryStoreRepo, InMemorySubscriptionRepo, InMemoryUserRepo, RecordingAdminNotifier,
        RecordingMessageSender, test_now,
    },
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";
pub const TEST_CRON_SECRET: &str = "test_cron_secret";
pub const TEST_TELEGRAM_SECRET: &str = "test_telegram_secret";
pub const TEST_ADMIN_CHAT_ID: i64 = -1001;
pub const TEST_PHONE: &str = "01001234567";

/// Handles to the in-memory collaborators behind a built `AppState`.
pub struct TestMocks {
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub transactions: Arc<InMemoryPaymentTransactionRepo>,
    pub stores: Arc<InMemoryStoreRepo>,
    pub gateway: Arc<FakePaymentGateway>,
    pub notifier: Arc<RecordingAdminNotifier>,
    pub sender: Arc<RecordingMessageSender>,
    pub clock: Arc<FixedClock>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let user_id = Uuid::new_v4();
/// let (app_state, mocks) = TestAppStateBuilder::new()
///     .with_user(user_id)
///     .with_subscription(create_test_subscription(user_id, |_| {}))
///     .build_with_mocks();
/// ```
pub struct TestAppStateBuilder {
    users: Vec<(Uuid, String)>,
    subscriptions: Vec<SubscriptionRecord>,
    transactions: Vec<PaymentTransaction>,
    stores: Vec<Store>,
    products: Vec<Product>,
    now: DateTime<Utc>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            subscriptions: vec![],
            transactions: vec![],
            stores: vec![],
            products: vec![],
            now: test_now(),
        }
    }

    /// Register an owner account with the default test phone.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.users.push((user_id, TEST_PHONE.to_string()));
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionRecord) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_transaction(mut self, transaction: PaymentTransaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.stores.push(store);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let clock = Arc::new(FixedClock::new(self.now));
        let subscriptions = Arc::new(InMemorySubscriptionRepo::with_subscriptions(
            self.subscriptions,
        ));
        for (user_id, phone) in &self.users {
            subscriptions.set_phone(*user_id, phone);
        }
        let transactions = Arc::new(
            InMemoryPaymentTransactionRepo::with_transactions(self.transactions)
                .linked_to(subscriptions.clone()),
        );
        let users = Arc::new(InMemoryUserRepo::with_users(self.users));
        let stores = Arc::new(InMemoryStoreRepo::with_stores(self.stores));
        for product in self.products {
            stores.insert_product(product);
        }
        let gateway = Arc::new(FakePaymentGateway::new());
        let notifier = Arc::new(RecordingAdminNotifier::new());
        let sender = Arc::new(RecordingMessageSender::new());
        let pause_cache = Arc::new(InMemoryPauseCache::new(clock.clone(), Duration::seconds(300)));

        let config = test_config();

        let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
            subscriptions.clone(),
            transactions.clone(),
            clock.clone(),
            config.pricing,
        ));

        let payment_use_cases = Arc::new(PaymentUseCases::new(
            users.clone(),
            subscriptions.clone(),
            transactions.clone(),
            gateway.clone(),
            notifier.clone(),
            clock.clone(),
            config.pricing,
            config.currency.clone(),
            config.manual_payments.clone(),
        ));

        let confirmation_use_cases = Arc::new(ConfirmationUseCases::new(
            subscriptions.clone(),
            transactions.clone(),
            users,
            gateway.clone(),
            notifier.clone(),
            sender.clone(),
            clock.clone(),
            TEST_ADMIN_CHAT_ID,
            config.currency.clone(),
        ));

        let sweep_use_cases = Arc::new(SweepUseCases::new(
            subscriptions.clone(),
            sender.clone(),
            config.site_url.to_string(),
        ));

        let store_use_cases = Arc::new(StoreUseCases::new(
            stores.clone(),
            subscription_use_cases.clone(),
        ));

        let storefront_use_cases = Arc::new(StorefrontUseCases::new(
            stores.clone(),
            subscriptions.clone(),
            pause_cache,
            clock.clone(),
        ));

        let app_state = AppState {
            config: Arc::new(config),
            subscription_use_cases,
            payment_use_cases,
            confirmation_use_cases,
            sweep_use_cases,
            store_use_cases,
            storefront_use_cases,
            clock: clock.clone(),
        };

        let mocks = TestMocks {
            subscriptions,
            transactions,
            stores,
            gateway,
            notifier,
            sender,
            clock,
        };

        (app_state, mocks)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed session token for the given owner, as the sign-in service issues it.
pub fn token_for(user_id: Uuid) -> String {
    jwt::issue(
        user_id,
        TEST_PHONE,
        &SecretString::new(TEST_JWT_SECRET.into()),
        time::Duration::hours(1),
    )
    .unwrap()
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        database_url: String::new(),
        redis_url: String::new(),
        site_url: Url::parse("https://whatsou.test").unwrap(),
        public_api_url: Url::parse("https://api.whatsou.test").unwrap(),
        currency: "EGP".to_string(),
        pricing: Pricing::default(),
        paymob: PaymobConfig {
            api_base: Url::parse("https://accept.paymob.test").unwrap(),
            secret_key: SecretString::new("sk_test".into()),
            public_key: "pk_test".to_string(),
            card_integration_id: 1,
            hmac_secret: SecretString::new("hmac_test".into()),
        },
        telegram: TelegramConfig {
            bot_token: SecretString::new("bot_test".into()),
            admin_chat_id: TEST_ADMIN_CHAT_ID,
            webhook_secret: SecretString::new(TEST_TELEGRAM_SECRET.into()),
        },
        evolution: EvolutionConfig {
            api_url: Url::parse("https://evolution.test").unwrap(),
            api_key: SecretString::new("evo_test".into()),
            instance_name: "whatsou".to_string(),
        },
        manual_payments: ManualPaymentSettings {
            instapay_link: "https://ipn.eg/S/whatsou/instapay/0".to_string(),
            vodafone_cash_link: "https://vf.eg/whatsou".to_string(),
            whatsapp_admin_number: "201000000000".to_string(),
        },
        cron_secret: SecretString::new(TEST_CRON_SECRET.into()),
        sweep_interval_secs: None,
        storefront_pause_cache_ttl_secs: 300,
    }
}
