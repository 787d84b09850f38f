//! Test data factories. Each returns a complete record with sensible
//! defaults; the closure overrides individual fields.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    payment_method::PaymentMethod,
    payment_status::PaymentStatus,
    payment_transaction::PaymentTransaction,
    store::{Product, Store},
    subscription::SubscriptionRecord,
    subscription_period::SubscriptionPeriod,
    subscription_status::SubscriptionStatus,
};

/// Fixed reference instant used across tests.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

/// Inactive first-time subscription with no dates set.
pub fn create_test_subscription(
    user_id: Uuid,
    overrides: impl FnOnce(&mut SubscriptionRecord),
) -> SubscriptionRecord {
    let mut subscription = SubscriptionRecord {
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
        created_at: Some(test_now()),
        updated_at: Some(test_now()),
    };
    overrides(&mut subscription);
    subscription
}

/// Pending monthly card transaction for the first-time price.
pub fn create_test_transaction(
    user_id: Uuid,
    subscription_id: Uuid,
    overrides: impl FnOnce(&mut PaymentTransaction),
) -> PaymentTransaction {
    let mut transaction = PaymentTransaction {
        id: Uuid::new_v4(),
        user_id,
        subscription_id,
        amount_cents: 10_000,
        payment_method: PaymentMethod::Card,
        subscription_period: SubscriptionPeriod::Monthly,
        status: PaymentStatus::Pending,
        paymob_order_id: None,
        paymob_transaction_id: None,
        telegram_message_id: None,
        hmac_verified: false,
        raw_response: None,
        error_message: None,
        confirmed_by: None,
        created_at: Some(test_now()),
        updated_at: Some(test_now()),
    };
    overrides(&mut transaction);
    transaction
}

pub fn create_test_store(user_id: Uuid, overrides: impl FnOnce(&mut Store)) -> Store {
    let mut store = Store {
        id: Uuid::new_v4(),
        user_id,
        slug: format!("shop-{}", &user_id.simple().to_string()[..8]),
        name: "Test Shop".to_string(),
        description: Some("Home-made food".to_string()),
        whatsapp_number: Some("201000000000".to_string()),
        logo_url: None,
        created_at: Some(test_now()),
        updated_at: Some(test_now()),
    };
    overrides(&mut store);
    store
}

pub fn create_test_product(store_id: Uuid, overrides: impl FnOnce(&mut Product)) -> Product {
    let mut product = Product {
        id: Uuid::new_v4(),
        store_id,
        name: "Falafel sandwich".to_string(),
        description: None,
        price_cents: 2_500,
        is_available: true,
        created_at: Some(test_now()),
        updated_at: Some(test_now()),
    };
    overrides(&mut product);
    product
}
