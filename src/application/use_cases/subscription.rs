use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::clock::Clock,
    domain::entities::{
        payment_method::PaymentMethod,
        payment_transaction::PaymentTransaction,
        pricing::{Pricing, to_major_units},
        subscription::{BillingWindow, SubscriptionRecord, derive_status},
        subscription_status::SubscriptionStatus,
    },
};

use super::payment::PaymentTransactionRepo;

/// Number of ledger rows shown on the billing page.
pub const HISTORY_LIMIT: i64 = 10;

// ============================================================================
// Profile Types
// ============================================================================

/// Fields written when a payment is confirmed.
#[derive(Debug, Clone)]
pub struct Activation {
    pub window: BillingWindow,
    pub amount_paid_cents: i64,
    /// Replaces the stored gateway correlation id when present.
    pub paymob_order_id: Option<String>,
}

/// A subscription due for a WhatsApp reminder, joined with the owner phone.
#[derive(Debug, Clone)]
pub struct ReminderTarget {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub phone: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub storefront_paused_at: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// Billing page payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: Option<Uuid>,
    pub status: SubscriptionStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub is_read_only: bool,
    /// Next payment in whole currency units.
    pub amount: f64,
    pub amount_cents: i64,
    pub is_first_subscription: bool,
    pub show_renewal_warning: bool,
    pub storefront_paused_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionRecord>>;
    /// Returns the owner's row, inserting an inactive first-time row if none exists.
    async fn get_or_create(&self, user_id: Uuid) -> AppResult<SubscriptionRecord>;
    async fn set_paymob_order_id(&self, id: Uuid, paymob_order_id: &str) -> AppResult<()>;
    async fn set_pending_grant(
        &self,
        id: Uuid,
        method: PaymentMethod,
        granted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;
    async fn clear_pending_grant(&self, id: Uuid) -> AppResult<()>;
    /// `active` rows whose `expires_at` passed move to `grace`. Returns the count.
    async fn mark_grace(&self, now: DateTime<Utc>) -> AppResult<u64>;
    /// `grace` rows whose `grace_ends_at` passed move to `expired`. Returns the count.
    async fn mark_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderTarget>>;
    async fn list_in_grace(&self) -> AppResult<Vec<ReminderTarget>>;
    async fn list_pausing_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderTarget>>;
    async fn mark_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
    transaction_repo: Arc<dyn PaymentTransactionRepo>,
    clock: Arc<dyn Clock>,
    pricing: Pricing,
}

impl SubscriptionUseCases {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepo>,
        transaction_repo: Arc<dyn PaymentTransactionRepo>,
        clock: Arc<dyn Clock>,
        pricing: Pricing,
    ) -> Self {
        Self {
            subscription_repo,
            transaction_repo,
            clock,
            pricing,
        }
    }

    #[instrument(skip(self))]
    pub async fn status(&self, user_id: Uuid) -> AppResult<SubscriptionView> {
        let subscription = self.subscription_repo.get_by_user(user_id).await?;
        let derived = derive_status(subscription.as_ref(), self.clock.now(), &self.pricing);

        Ok(SubscriptionView {
            id: subscription.as_ref().map(|s| s.id),
            status: derived.status,
            expires_at: subscription.as_ref().and_then(|s| s.expires_at),
            days_remaining: derived.days_remaining,
            is_read_only: derived.is_read_only,
            amount: to_major_units(derived.amount_due_cents),
            amount_cents: derived.amount_due_cents,
            is_first_subscription: subscription
                .as_ref()
                .is_none_or(|s| s.is_first_subscription),
            show_renewal_warning: derived.show_renewal_warning,
            storefront_paused_at: subscription.as_ref().and_then(|s| s.storefront_paused_at),
        })
    }

    #[instrument(skip(self))]
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<PaymentTransaction>> {
        self.transaction_repo
            .list_recent_by_user(user_id, HISTORY_LIMIT)
            .await
    }

    /// Dashboard write gate. Status is derived fresh on every call.
    #[instrument(skip(self))]
    pub async fn ensure_writable(&self, user_id: Uuid) -> AppResult<()> {
        let subscription = self.subscription_repo.get_by_user(user_id).await?;
        let derived = derive_status(subscription.as_ref(), self.clock.now(), &self.pricing);
        if derived.is_read_only {
            tracing::debug!(user_id = %user_id, status = %derived.status, "Write blocked");
            return Err(AppError::SubscriptionRequired);
        }
        Ok(())
    }
}
