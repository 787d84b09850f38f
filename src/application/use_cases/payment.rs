use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        messages,
        ports::{
            clock::Clock,
            notifications::AdminNotifier,
            payment_gateway::{IntentionExtras, IntentionRequest, PaymentGateway},
        },
    },
    domain::entities::{
        payment_method::PaymentMethod,
        payment_status::PaymentStatus,
        payment_transaction::{ConfirmedBy, PaymentTransaction},
        pricing::{Pricing, to_major_units},
        subscription::PENDING_GRANT_HOURS,
        subscription_period::SubscriptionPeriod,
    },
};

use super::{
    subscription::{Activation, SubscriptionRepo},
    user::UserRepo,
};

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPaymentTransaction {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub subscription_period: SubscriptionPeriod,
}

/// Terminal update applied by a confirmer.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub status: PaymentStatus,
    pub paymob_transaction_id: Option<String>,
    pub hmac_verified: bool,
    pub raw_response: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub confirmed_by: ConfirmedBy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPaymentResponse {
    pub payment_url: String,
    pub client_secret: String,
    pub public_key: String,
    pub amount: f64,
    pub amount_cents: i64,
    pub currency: String,
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPaymentResponse {
    pub payment_link: String,
    pub whatsapp_link: String,
    pub amount: f64,
    pub amount_cents: i64,
    pub pending_expires_at: DateTime<Utc>,
    pub transaction_id: Uuid,
}

/// Static destinations for manual transfers.
#[derive(Debug, Clone)]
pub struct ManualPaymentSettings {
    pub instapay_link: String,
    pub vodafone_cash_link: String,
    pub whatsapp_admin_number: String,
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait PaymentTransactionRepo: Send + Sync {
    async fn create(&self, input: &NewPaymentTransaction) -> AppResult<PaymentTransaction>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PaymentTransaction>>;
    async fn get_by_paymob_order_id(
        &self,
        paymob_order_id: &str,
    ) -> AppResult<Option<PaymentTransaction>>;
    async fn get_by_paymob_transaction_id(
        &self,
        paymob_transaction_id: &str,
    ) -> AppResult<Option<PaymentTransaction>>;
    async fn set_paymob_order_id(&self, id: Uuid, paymob_order_id: &str) -> AppResult<()>;
    async fn set_telegram_message_id(&self, id: Uuid, message_id: i64) -> AppResult<()>;
    /// Records a callback whose signature did not verify. Status is untouched.
    async fn record_verification_failure(
        &self,
        id: Uuid,
        raw_response: &serde_json::Value,
        error_message: &str,
    ) -> AppResult<()>;
    /// Applies the settlement only while the row is still pending.
    /// Returns `false` when another confirmer already settled it.
    async fn settle(&self, id: Uuid, settlement: &Settlement) -> AppResult<bool>;
    /// Settles the row and writes the billing window on its subscription in
    /// one database transaction. Nothing is written unless both succeed.
    /// Returns `false` when another confirmer already settled it.
    async fn settle_and_activate(
        &self,
        id: Uuid,
        settlement: &Settlement,
        subscription_id: Uuid,
        activation: &Activation,
    ) -> AppResult<bool>;
    async fn list_recent_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<PaymentTransaction>>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct PaymentUseCases {
    user_repo: Arc<dyn UserRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    transaction_repo: Arc<dyn PaymentTransactionRepo>,
    gateway: Arc<dyn PaymentGateway>,
    admin_notifier: Arc<dyn AdminNotifier>,
    clock: Arc<dyn Clock>,
    pricing: Pricing,
    currency: String,
    manual: ManualPaymentSettings,
}

impl PaymentUseCases {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        transaction_repo: Arc<dyn PaymentTransactionRepo>,
        gateway: Arc<dyn PaymentGateway>,
        admin_notifier: Arc<dyn AdminNotifier>,
        clock: Arc<dyn Clock>,
        pricing: Pricing,
        currency: String,
        manual: ManualPaymentSettings,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            transaction_repo,
            gateway,
            admin_notifier,
            clock,
            pricing,
            currency,
            manual,
        }
    }

    async fn owner_phone(&self, user_id: Uuid) -> AppResult<String> {
        self.user_repo
            .get_phone(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Opens a hosted card checkout for one month. The pending ledger row is
    /// kept even when the gateway call fails.
    #[instrument(skip(self))]
    pub async fn initiate_card_payment(&self, user_id: Uuid) -> AppResult<CardPaymentResponse> {
        let phone = self.owner_phone(user_id).await?;
        let subscription = self.subscription_repo.get_or_create(user_id).await?;

        let is_first = subscription.is_first_subscription;
        let period = SubscriptionPeriod::Monthly;
        let amount_cents = self.pricing.amount_due(is_first, period);

        let transaction = self
            .transaction_repo
            .create(&NewPaymentTransaction {
                user_id,
                subscription_id: subscription.id,
                amount_cents,
                payment_method: PaymentMethod::Card,
                subscription_period: period,
            })
            .await?;

        let request = IntentionRequest {
            amount_cents,
            currency: self.currency.clone(),
            phone,
            extras: IntentionExtras {
                user_id,
                subscription_id: subscription.id,
                transaction_id: transaction.id,
                is_first,
            },
            special_reference: transaction.id.to_string(),
        };

        let intention = self
            .gateway
            .create_intention(&request)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    transaction_id = %transaction.id,
                    error = %e,
                    "Payment intention failed, transaction left pending"
                );
            })?;

        self.transaction_repo
            .set_paymob_order_id(transaction.id, &intention.id)
            .await?;
        self.subscription_repo
            .set_paymob_order_id(subscription.id, &intention.id)
            .await?;

        tracing::info!(
            transaction_id = %transaction.id,
            paymob_order_id = %intention.id,
            amount_cents,
            "Card payment initiated"
        );

        Ok(CardPaymentResponse {
            payment_url: intention.checkout_url,
            client_secret: intention.client_secret,
            public_key: intention.public_key,
            amount: to_major_units(amount_cents),
            amount_cents,
            currency: self.currency.clone(),
            transaction_id: transaction.id,
        })
    }

    /// Starts an InstaPay or Vodafone Cash payment and grants 24 hours of
    /// provisional access while the admin checks the transfer.
    #[instrument(skip(self))]
    pub async fn initiate_manual_payment(
        &self,
        user_id: Uuid,
        method: PaymentMethod,
        requested_period: SubscriptionPeriod,
    ) -> AppResult<ManualPaymentResponse> {
        let payment_link = match method {
            PaymentMethod::Instapay => self.manual.instapay_link.clone(),
            PaymentMethod::Vodafone => self.manual.vodafone_cash_link.clone(),
            PaymentMethod::Card => {
                return Err(AppError::ValidationError(
                    "Payment method must be instapay or vodafone".into(),
                ));
            }
        };

        let phone = self.owner_phone(user_id).await?;
        let subscription = self.subscription_repo.get_or_create(user_id).await?;

        let is_first = subscription.is_first_subscription;
        let period = self.pricing.effective_period(is_first, requested_period);
        let amount_cents = self.pricing.amount_due(is_first, period);

        let transaction = self
            .transaction_repo
            .create(&NewPaymentTransaction {
                user_id,
                subscription_id: subscription.id,
                amount_cents,
                payment_method: method,
                subscription_period: period,
            })
            .await?;

        let now = self.clock.now();
        let pending_expires_at = now + Duration::hours(PENDING_GRANT_HOURS);
        self.subscription_repo
            .set_pending_grant(subscription.id, method, now, pending_expires_at)
            .await?;

        let text = messages::approval_request_text(
            &phone,
            amount_cents,
            &self.currency,
            method,
            period,
            is_first,
        );
        match self
            .admin_notifier
            .request_approval(transaction.id, &text)
            .await
        {
            Ok(message_id) => {
                if let Err(e) = self
                    .transaction_repo
                    .set_telegram_message_id(transaction.id, message_id)
                    .await
                {
                    tracing::warn!(transaction_id = %transaction.id, error = %e, "Failed to store approval message id");
                }
            }
            Err(e) => {
                tracing::warn!(transaction_id = %transaction.id, error = %e, "Admin approval request failed");
            }
        }

        let whatsapp_link = messages::whatsapp_payment_link(
            &self.manual.whatsapp_admin_number,
            &phone,
            amount_cents,
            &self.currency,
            method,
        );

        tracing::info!(
            transaction_id = %transaction.id,
            method = %method,
            period = %period,
            amount_cents,
            "Manual payment requested"
        );

        Ok(ManualPaymentResponse {
            payment_link,
            whatsapp_link,
            amount: to_major_units(amount_cents),
            amount_cents,
            pending_expires_at,
            transaction_id: transaction.id,
        })
    }
}
