//! In-memory implementations of the repository traits and the pause cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::clock::Clock,
        use_cases::{
            payment::{NewPaymentTransaction, PaymentTransactionRepo, Settlement},
            store::{NewProduct, NewStore, ProductUpdate, StoreRepo, StoreUpdate},
            storefront::PauseCache,
            subscription::{Activation, ReminderTarget, SubscriptionRepo},
            user::UserRepo,
        },
    },
    domain::entities::{
        payment_method::PaymentMethod,
        payment_status::PaymentStatus,
        payment_transaction::PaymentTransaction,
        store::{Product, Store},
        subscription::SubscriptionRecord,
        subscription_status::SubscriptionStatus,
    },
};

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, SubscriptionRecord>>,
    /// Owner phones joined into reminder targets.
    phones: Mutex<HashMap<Uuid, String>>,
    activations: AtomicUsize,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<SubscriptionRecord>) -> Self {
        let map = subscriptions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            subscriptions: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn get(&self, id: Uuid) -> Option<SubscriptionRecord> {
        self.subscriptions.lock().unwrap().get(&id).cloned()
    }

    pub fn replace(&self, record: SubscriptionRecord) {
        self.subscriptions.lock().unwrap().insert(record.id, record);
    }

    pub fn set_phone(&self, user_id: Uuid, phone: &str) {
        self.phones
            .lock()
            .unwrap()
            .insert(user_id, phone.to_string());
    }

    /// Number of successful activations.
    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    /// Writes the billing window the way a confirmed payment does.
    pub fn apply_activation(&self, id: Uuid, activation: &Activation) -> AppResult<()> {
        self.update(id, |s| {
            s.status = SubscriptionStatus::Active;
            s.is_first_subscription = false;
            s.started_at = Some(activation.window.started_at);
            s.expires_at = Some(activation.window.expires_at);
            s.grace_ends_at = Some(activation.window.grace_ends_at);
            s.storefront_paused_at = Some(activation.window.storefront_paused_at);
            s.amount_paid_cents = Some(activation.amount_paid_cents);
            if let Some(order_id) = &activation.paymob_order_id {
                s.paymob_order_id = Some(order_id.clone());
            }
            s.pending_payment_method = None;
            s.pending_payment_at = None;
            s.pending_expires_at = None;
        })?;
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn targets(&self, filter: impl Fn(&SubscriptionRecord) -> bool) -> Vec<ReminderTarget> {
        let phones = self.phones.lock().unwrap();
        self.subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter(s))
            .filter_map(|s| {
                phones.get(&s.user_id).map(|phone| ReminderTarget {
                    subscription_id: s.id,
                    user_id: s.user_id,
                    phone: phone.clone(),
                    expires_at: s.expires_at,
                    storefront_paused_at: s.storefront_paused_at,
                    last_notified_at: s.last_notified_at,
                })
            })
            .collect()
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut SubscriptionRecord)) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let record = subscriptions.get_mut(&id).ok_or(AppError::NotFound)?;
        f(record);
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    fn transition(
        &self,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        due: impl Fn(&SubscriptionRecord) -> bool,
    ) -> u64 {
        let mut count = 0;
        for record in self.subscriptions.lock().unwrap().values_mut() {
            if record.status == from && due(record) {
                record.status = to;
                count += 1;
            }
        }
        count
    }
}

fn within(value: Option<DateTime<Utc>>, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    value.is_some_and(|v| v >= from && v <= to)
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionRecord>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn get_or_create(&self, user_id: Uuid) -> AppResult<SubscriptionRecord> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(existing) = subscriptions.values().find(|s| s.user_id == user_id) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            user_id,
            status: SubscriptionStatus::Inactive,
            is_first_subscription: true,
            started_at: None,
            expires_at: None,
            grace_ends_at: None,
            storefront_paused_at: None,
            pending_payment_method: None,
            pending_payment_at: None,
            pending_expires_at: None,
            last_notified_at: None,
            paymob_order_id: None,
            amount_paid_cents: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        subscriptions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_paymob_order_id(&self, id: Uuid, paymob_order_id: &str) -> AppResult<()> {
        self.update(id, |s| s.paymob_order_id = Some(paymob_order_id.to_string()))
    }

    async fn set_pending_grant(
        &self,
        id: Uuid,
        method: PaymentMethod,
        granted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.update(id, |s| {
            s.pending_payment_method = Some(method);
            s.pending_payment_at = Some(granted_at);
            s.pending_expires_at = Some(expires_at);
        })
    }

    async fn clear_pending_grant(&self, id: Uuid) -> AppResult<()> {
        self.update(id, |s| {
            s.pending_payment_method = None;
            s.pending_payment_at = None;
            s.pending_expires_at = None;
        })
    }

    async fn mark_grace(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.transition(SubscriptionStatus::Active, SubscriptionStatus::Grace, |s| {
            s.expires_at.is_some_and(|at| at < now)
        }))
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.transition(SubscriptionStatus::Grace, SubscriptionStatus::Expired, |s| {
            s.grace_ends_at.is_some_and(|at| at < now)
        }))
    }

    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderTarget>> {
        Ok(self.targets(|s| {
            s.status == SubscriptionStatus::Active && within(s.expires_at, from, to)
        }))
    }

    async fn list_in_grace(&self) -> AppResult<Vec<ReminderTarget>> {
        Ok(self.targets(|s| s.status == SubscriptionStatus::Grace))
    }

    async fn list_pausing_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderTarget>> {
        Ok(self.targets(|s| {
            s.status == SubscriptionStatus::Expired && within(s.storefront_paused_at, from, to)
        }))
    }

    async fn mark_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.update(id, |s| s.last_notified_at = Some(at))
    }
}

// ============================================================================
// InMemoryPaymentTransactionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryPaymentTransactionRepo {
    pub transactions: Mutex<HashMap<Uuid, PaymentTransaction>>,
    /// Target of `settle_and_activate`.
    subscriptions: Arc<InMemorySubscriptionRepo>,
}

impl InMemoryPaymentTransactionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<PaymentTransaction>) -> Self {
        let map = transactions.into_iter().map(|t| (t.id, t)).collect();
        Self {
            transactions: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn linked_to(mut self, subscriptions: Arc<InMemorySubscriptionRepo>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    pub fn get(&self, id: Uuid) -> Option<PaymentTransaction> {
        self.transactions.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<PaymentTransaction> {
        self.transactions.lock().unwrap().values().cloned().collect()
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut PaymentTransaction)) -> AppResult<()> {
        let mut transactions = self.transactions.lock().unwrap();
        let tx = transactions.get_mut(&id).ok_or(AppError::NotFound)?;
        f(tx);
        tx.updated_at = Some(Utc::now());
        Ok(())
    }
}

fn apply_settlement(tx: &mut PaymentTransaction, settlement: &Settlement) {
    tx.status = settlement.status;
    if settlement.paymob_transaction_id.is_some() {
        tx.paymob_transaction_id = settlement.paymob_transaction_id.clone();
    }
    tx.hmac_verified = settlement.hmac_verified;
    if settlement.raw_response.is_some() {
        tx.raw_response = settlement.raw_response.clone();
    }
    tx.error_message = settlement.error_message.clone();
    tx.confirmed_by = Some(settlement.confirmed_by);
    tx.updated_at = Some(Utc::now());
}

#[async_trait]
impl PaymentTransactionRepo for InMemoryPaymentTransactionRepo {
    async fn create(&self, input: &NewPaymentTransaction) -> AppResult<PaymentTransaction> {
        let now = Utc::now();
        let tx = PaymentTransaction {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            subscription_id: input.subscription_id,
            amount_cents: input.amount_cents,
            payment_method: input.payment_method,
            subscription_period: input.subscription_period,
            status: PaymentStatus::Pending,
            paymob_order_id: None,
            paymob_transaction_id: None,
            telegram_message_id: None,
            hmac_verified: false,
            raw_response: None,
            error_message: None,
            confirmed_by: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.transactions
            .lock()
            .unwrap()
            .insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PaymentTransaction>> {
        Ok(self.get(id))
    }

    async fn get_by_paymob_order_id(
        &self,
        paymob_order_id: &str,
    ) -> AppResult<Option<PaymentTransaction>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .values()
            .find(|t| t.paymob_order_id.as_deref() == Some(paymob_order_id))
            .cloned())
    }

    async fn get_by_paymob_transaction_id(
        &self,
        paymob_transaction_id: &str,
    ) -> AppResult<Option<PaymentTransaction>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .values()
            .find(|t| t.paymob_transaction_id.as_deref() == Some(paymob_transaction_id))
            .cloned())
    }

    async fn set_paymob_order_id(&self, id: Uuid, paymob_order_id: &str) -> AppResult<()> {
        self.update(id, |t| t.paymob_order_id = Some(paymob_order_id.to_string()))
    }

    async fn set_telegram_message_id(&self, id: Uuid, message_id: i64) -> AppResult<()> {
        self.update(id, |t| t.telegram_message_id = Some(message_id))
    }

    async fn record_verification_failure(
        &self,
        id: Uuid,
        raw_response: &Value,
        error_message: &str,
    ) -> AppResult<()> {
        self.update(id, |t| {
            t.hmac_verified = false;
            t.raw_response = Some(raw_response.clone());
            t.error_message = Some(error_message.to_string());
        })
    }

    async fn settle(&self, id: Uuid, settlement: &Settlement) -> AppResult<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        match transactions.get_mut(&id) {
            Some(tx) if tx.status == PaymentStatus::Pending => {
                apply_settlement(tx, settlement);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle_and_activate(
        &self,
        id: Uuid,
        settlement: &Settlement,
        subscription_id: Uuid,
        activation: &Activation,
    ) -> AppResult<bool> {
        // The ledger lock is held across both writes, like a database transaction.
        let mut transactions = self.transactions.lock().unwrap();
        let Some(tx) = transactions.get_mut(&id) else {
            return Ok(false);
        };
        if tx.status != PaymentStatus::Pending {
            return Ok(false);
        }
        self.subscriptions
            .apply_activation(subscription_id, activation)?;
        apply_settlement(tx, settlement);
        Ok(true)
    }

    async fn list_recent_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<PaymentTransaction>> {
        let mut rows: Vec<PaymentTransaction> = self
            .transactions
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub phones: Mutex<HashMap<Uuid, String>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<(Uuid, String)>) -> Self {
        Self {
            phones: Mutex::new(users.into_iter().collect()),
        }
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_phone(&self, user_id: Uuid) -> AppResult<Option<String>> {
        Ok(self.phones.lock().unwrap().get(&user_id).cloned())
    }
}

// ============================================================================
// InMemoryStoreRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryStoreRepo {
    stores: Mutex<HashMap<Uuid, Store>>,
    products: Mutex<HashMap<Uuid, Product>>,
}

impl InMemoryStoreRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stores(stores: Vec<Store>) -> Self {
        Self {
            stores: Mutex::new(stores.into_iter().map(|s| (s.id, s)).collect()),
            ..Self::default()
        }
    }

    pub fn insert_product(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    pub fn stores(&self) -> Vec<Store> {
        self.stores.lock().unwrap().values().cloned().collect()
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl StoreRepo for InMemoryStoreRepo {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<Store>> {
        Ok(self
            .stores
            .lock()
            .unwrap()
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Store>> {
        Ok(self
            .stores
            .lock()
            .unwrap()
            .values()
            .find(|s| s.slug == slug)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, input: &NewStore) -> AppResult<Store> {
        let now = Utc::now();
        let store = Store {
            id: Uuid::new_v4(),
            user_id,
            slug: input.slug.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            whatsapp_number: input.whatsapp_number.clone(),
            logo_url: input.logo_url.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.stores.lock().unwrap().insert(store.id, store.clone());
        Ok(store)
    }

    async fn update(&self, store_id: Uuid, input: &StoreUpdate) -> AppResult<Store> {
        let mut stores = self.stores.lock().unwrap();
        let store = stores.get_mut(&store_id).ok_or(AppError::NotFound)?;
        if let Some(name) = &input.name {
            store.name = name.trim().to_string();
        }
        if input.description.is_some() {
            store.description = input.description.clone();
        }
        if input.whatsapp_number.is_some() {
            store.whatsapp_number = input.whatsapp_number.clone();
        }
        if input.logo_url.is_some() {
            store.logo_url = input.logo_url.clone();
        }
        store.updated_at = Some(Utc::now());
        Ok(store.clone())
    }

    async fn list_products(&self, store_id: Uuid, available_only: bool) -> AppResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.store_id == store_id && (!available_only || p.is_available))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(products)
    }

    async fn create_product(&self, store_id: Uuid, input: &NewProduct) -> AppResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            store_id,
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            price_cents: input.price_cents,
            is_available: input.is_available,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.insert_product(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        input: &ProductUpdate,
    ) -> AppResult<Option<Product>> {
        let mut products = self.products.lock().unwrap();
        let Some(product) = products
            .get_mut(&product_id)
            .filter(|p| p.store_id == store_id)
        else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            product.name = name.trim().to_string();
        }
        if input.description.is_some() {
            product.description = input.description.clone();
        }
        if let Some(price) = input.price_cents {
            product.price_cents = price;
        }
        if let Some(available) = input.is_available {
            product.is_available = available;
        }
        product.updated_at = Some(Utc::now());
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, store_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let mut products = self.products.lock().unwrap();
        match products.get(&product_id) {
            Some(p) if p.store_id == store_id => {
                products.remove(&product_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ============================================================================
// InMemoryPauseCache
// ============================================================================

/// Expires entries against the injected clock, like `SET EX` would.
pub struct InMemoryPauseCache {
    entries: Mutex<HashMap<Uuid, (bool, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryPauseCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }
}

#[async_trait]
impl PauseCache for InMemoryPauseCache {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<bool>> {
        let now = self.clock.now();
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&user_id)
            .filter(|(_, stored_at)| now - *stored_at < self.ttl)
            .map(|(paused, _)| *paused))
    }

    async fn put(&self, user_id: Uuid, paused: bool) -> AppResult<()> {
        let now = self.clock.now();
        self.entries.lock().unwrap().insert(user_id, (paused, now));
        Ok(())
    }
}
