use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        messages,
        ports::{
            clock::Clock,
            notifications::{AdminNotifier, MessageSender},
            payment_gateway::PaymentGateway,
        },
    },
    domain::entities::{
        payment_status::PaymentStatus,
        payment_transaction::{ConfirmedBy, PaymentTransaction},
        subscription::BillingWindow,
    },
};

use super::{
    payment::{PaymentTransactionRepo, Settlement},
    subscription::{Activation, SubscriptionRepo},
    user::UserRepo,
};

const HMAC_FAILURE_MESSAGE: &str = "HMAC verification failed";
const GATEWAY_FAILURE_MESSAGE: &str = "Payment failed";
const ADMIN_REJECTION_MESSAGE: &str = "Rejected by admin";
const AMOUNT_MISMATCH_MESSAGE: &str = "Signed amount does not match transaction";
const REUSED_CHARGE_MESSAGE: &str = "Gateway transaction already settled another payment";

// ============================================================================
// Outcomes
// ============================================================================

/// Result of one gateway callback delivery. The HTTP layer answers 200 for
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Missing signature or data, or no matching transaction.
    Ignored,
    /// The transaction was already settled by an earlier delivery.
    AlreadyProcessed,
    /// The signature did not verify; the transaction stays pending.
    HmacRejected,
    /// The signature verified but the signed charge belongs to another
    /// payment; the transaction stays pending.
    Mismatched,
    /// Verified failure; the transaction is marked failed.
    Failed,
    /// Verified success; the billing window was written.
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminDecision {
    Confirm,
    Reject,
}

impl AdminDecision {
    /// Parses callback data of the form `confirm_<uuid>` or `reject_<uuid>`.
    pub fn parse(data: &str) -> Option<(AdminDecision, Uuid)> {
        let (action, id) = data.split_once('_')?;
        let decision = match action {
            "confirm" => AdminDecision::Confirm,
            "reject" => AdminDecision::Reject,
            _ => return None,
        };
        let id = Uuid::parse_str(id).ok()?;
        Some((decision, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualOutcome {
    Confirmed { expires_at: DateTime<Utc> },
    Rejected,
    AlreadyProcessed,
    /// Card transactions are settled by the gateway only.
    NotManual,
}

/// A button press in the admin chat.
#[derive(Debug, Clone)]
pub struct AdminCallback {
    pub callback_id: String,
    pub data: Option<String>,
    pub chat_id: Option<i64>,
    pub message_id: Option<i64>,
}

// ============================================================================
// Callback field helpers
// ============================================================================

/// Gateway ids arrive as strings or numbers.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn merchant_reference(txn: &Value) -> Option<Uuid> {
    let raw = txn
        .pointer("/order/merchant_order_id")
        .and_then(json_id)
        .or_else(|| txn.get("special_reference").and_then(json_id))?;
    Uuid::parse_str(&raw).ok()
}

fn gateway_order_id(txn: &Value) -> Option<String> {
    txn.pointer("/intention/id")
        .and_then(json_id)
        .or_else(|| txn.pointer("/order/id").and_then(json_id))
}

/// Signed charge amount. Some callbacks encode it as a float.
fn signed_amount_cents(txn: &Value) -> Option<i64> {
    let value = txn.get("amount_cents")?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn is_successful_charge(txn: &Value) -> bool {
    txn.get("success").and_then(Value::as_bool) == Some(true)
        && txn.get("pending").and_then(Value::as_bool) == Some(false)
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ConfirmationUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
    transaction_repo: Arc<dyn PaymentTransactionRepo>,
    user_repo: Arc<dyn UserRepo>,
    gateway: Arc<dyn PaymentGateway>,
    admin_notifier: Arc<dyn AdminNotifier>,
    message_sender: Arc<dyn MessageSender>,
    clock: Arc<dyn Clock>,
    admin_chat_id: i64,
    currency: String,
}

impl ConfirmationUseCases {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepo>,
        transaction_repo: Arc<dyn PaymentTransactionRepo>,
        user_repo: Arc<dyn UserRepo>,
        gateway: Arc<dyn PaymentGateway>,
        admin_notifier: Arc<dyn AdminNotifier>,
        message_sender: Arc<dyn MessageSender>,
        clock: Arc<dyn Clock>,
        admin_chat_id: i64,
        currency: String,
    ) -> Self {
        Self {
            subscription_repo,
            transaction_repo,
            user_repo,
            gateway,
            admin_notifier,
            message_sender,
            clock,
            admin_chat_id,
            currency,
        }
    }

    async fn find_transaction(&self, txn: &Value) -> AppResult<Option<PaymentTransaction>> {
        if let Some(id) = merchant_reference(txn)
            && let Some(found) = self.transaction_repo.get_by_id(id).await?
        {
            return Ok(Some(found));
        }
        match gateway_order_id(txn) {
            Some(order_id) => self.transaction_repo.get_by_paymob_order_id(&order_id).await,
            None => Ok(None),
        }
    }

    // ========================================================================
    // Gateway callback
    // ========================================================================

    /// Reconciles one gateway callback. Deliveries may repeat; only the first
    /// verified delivery changes state.
    #[instrument(skip(self, payload, query_hmac))]
    pub async fn handle_paymob_webhook(
        &self,
        payload: &Value,
        query_hmac: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        let txn = payload
            .get("obj")
            .filter(|obj| obj.is_object())
            .unwrap_or(payload);
        let received_hmac = payload
            .get("hmac")
            .and_then(Value::as_str)
            .or(query_hmac)
            .filter(|h| !h.is_empty());

        let Some(received_hmac) = received_hmac else {
            tracing::warn!("Gateway callback without signature");
            return Ok(WebhookOutcome::Ignored);
        };
        if !txn.is_object() {
            tracing::warn!("Gateway callback without transaction data");
            return Ok(WebhookOutcome::Ignored);
        }

        let Some(transaction) = self.find_transaction(txn).await? else {
            tracing::warn!(
                merchant_reference = ?merchant_reference(txn),
                paymob_order_id = ?gateway_order_id(txn),
                "Gateway callback for unknown transaction"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        if transaction.status.is_terminal() {
            tracing::info!(transaction_id = %transaction.id, status = %transaction.status, "Callback already processed");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        if let Err(e) = self.gateway.verify_callback(txn, received_hmac) {
            tracing::warn!(transaction_id = %transaction.id, error = %e, "Gateway callback rejected");
            self.transaction_repo
                .record_verification_failure(transaction.id, txn, HMAC_FAILURE_MESSAGE)
                .await?;
            return Ok(WebhookOutcome::HmacRejected);
        }

        // Lookup keys are outside the signed fields, so the charge itself
        // must match this transaction.
        let paymob_transaction_id = txn.get("id").and_then(json_id);
        if signed_amount_cents(txn) != Some(transaction.amount_cents) {
            return self
                .reject_mismatch(&transaction, txn, AMOUNT_MISMATCH_MESSAGE)
                .await;
        }
        if let Some(charge_id) = paymob_transaction_id.as_deref()
            && let Some(owner) = self
                .transaction_repo
                .get_by_paymob_transaction_id(charge_id)
                .await?
            && owner.id != transaction.id
        {
            tracing::warn!(other_transaction_id = %owner.id, charge_id, "Gateway charge reused");
            return self
                .reject_mismatch(&transaction, txn, REUSED_CHARGE_MESSAGE)
                .await;
        }

        let succeeded = is_successful_charge(txn);
        let settlement = Settlement {
            status: if succeeded {
                PaymentStatus::Success
            } else {
                PaymentStatus::Failed
            },
            paymob_transaction_id,
            hmac_verified: true,
            raw_response: Some(txn.clone()),
            error_message: (!succeeded).then(|| {
                txn.pointer("/data/message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(GATEWAY_FAILURE_MESSAGE)
                    .to_string()
            }),
            confirmed_by: ConfirmedBy::Gateway,
        };

        if !succeeded {
            if !self
                .transaction_repo
                .settle(transaction.id, &settlement)
                .await?
            {
                tracing::info!(transaction_id = %transaction.id, "Lost settlement race, skipping");
                return Ok(WebhookOutcome::AlreadyProcessed);
            }
            tracing::info!(
                transaction_id = %transaction.id,
                reason = ?settlement.error_message,
                "Card payment failed"
            );
            return Ok(WebhookOutcome::Failed);
        }

        let window = BillingWindow::starting_at(self.clock.now(), transaction.subscription_period);
        let activation = Activation {
            window,
            amount_paid_cents: transaction.amount_cents,
            paymob_order_id: gateway_order_id(txn),
        };
        if !self
            .transaction_repo
            .settle_and_activate(
                transaction.id,
                &settlement,
                transaction.subscription_id,
                &activation,
            )
            .await?
        {
            tracing::info!(transaction_id = %transaction.id, "Lost settlement race, skipping");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        tracing::info!(
            transaction_id = %transaction.id,
            subscription_id = %transaction.subscription_id,
            expires_at = %window.expires_at,
            "Subscription activated by card payment"
        );
        Ok(WebhookOutcome::Activated)
    }

    async fn reject_mismatch(
        &self,
        transaction: &PaymentTransaction,
        txn: &Value,
        reason: &str,
    ) -> AppResult<WebhookOutcome> {
        tracing::warn!(transaction_id = %transaction.id, reason, "Signed callback does not match transaction");
        self.transaction_repo
            .record_verification_failure(transaction.id, txn, reason)
            .await?;
        Ok(WebhookOutcome::Mismatched)
    }

    // ========================================================================
    // Admin approval
    // ========================================================================

    /// Handles a button press from the admin chat. Presses from other chats
    /// and malformed data are ignored.
    #[instrument(skip(self, callback), fields(callback_id = %callback.callback_id))]
    pub async fn handle_admin_callback(
        &self,
        callback: AdminCallback,
    ) -> AppResult<Option<ManualOutcome>> {
        if callback.chat_id != Some(self.admin_chat_id) {
            tracing::warn!(chat_id = ?callback.chat_id, "Callback from unexpected chat ignored");
            return Ok(None);
        }

        if let Err(e) = self
            .admin_notifier
            .acknowledge_callback(&callback.callback_id, "Processing...")
            .await
        {
            tracing::warn!(error = %e, "Failed to acknowledge callback");
        }

        let Some((decision, transaction_id)) =
            callback.data.as_deref().and_then(AdminDecision::parse)
        else {
            tracing::warn!(data = ?callback.data, "Unrecognised callback data");
            return Ok(None);
        };

        match self
            .resolve_manual_payment(transaction_id, decision, callback.message_id)
            .await
        {
            Ok(outcome) => Ok(Some(outcome)),
            Err(AppError::NotFound) => {
                tracing::warn!(transaction_id = %transaction_id, "Callback for unknown transaction");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Settles a manual payment on the admin's decision. Owner and admin
    /// messages are best-effort and never change the settlement.
    #[instrument(skip(self))]
    pub async fn resolve_manual_payment(
        &self,
        transaction_id: Uuid,
        decision: AdminDecision,
        message_id: Option<i64>,
    ) -> AppResult<ManualOutcome> {
        let transaction = self
            .transaction_repo
            .get_by_id(transaction_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !transaction.payment_method.is_manual() {
            tracing::warn!(transaction_id = %transaction_id, "Admin decision on card transaction ignored");
            return Ok(ManualOutcome::NotManual);
        }
        if transaction.status.is_terminal() {
            return Ok(ManualOutcome::AlreadyProcessed);
        }

        let settlement = match decision {
            AdminDecision::Confirm => Settlement {
                status: PaymentStatus::Success,
                paymob_transaction_id: None,
                hmac_verified: false,
                raw_response: None,
                error_message: None,
                confirmed_by: ConfirmedBy::Admin,
            },
            AdminDecision::Reject => Settlement {
                status: PaymentStatus::Failed,
                paymob_transaction_id: None,
                hmac_verified: false,
                raw_response: None,
                error_message: Some(ADMIN_REJECTION_MESSAGE.to_string()),
                confirmed_by: ConfirmedBy::Admin,
            },
        };

        let window = BillingWindow::starting_at(self.clock.now(), transaction.subscription_period);
        let settled = match decision {
            AdminDecision::Confirm => {
                self.transaction_repo
                    .settle_and_activate(
                        transaction.id,
                        &settlement,
                        transaction.subscription_id,
                        &Activation {
                            window,
                            amount_paid_cents: transaction.amount_cents,
                            paymob_order_id: None,
                        },
                    )
                    .await?
            }
            AdminDecision::Reject => {
                self.transaction_repo
                    .settle(transaction.id, &settlement)
                    .await?
            }
        };
        if !settled {
            return Ok(ManualOutcome::AlreadyProcessed);
        }

        let phone = self
            .user_repo
            .get_phone(transaction.user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %transaction.user_id, error = %e, "Owner phone lookup failed");
                None
            });
        let message_id = message_id.or(transaction.telegram_message_id);
        let phone_label = phone.as_deref().unwrap_or("unknown");

        let (outcome, owner_text, admin_text) = match decision {
            AdminDecision::Confirm => {
                tracing::info!(
                    transaction_id = %transaction.id,
                    expires_at = %window.expires_at,
                    "Manual payment confirmed"
                );
                (
                    ManualOutcome::Confirmed {
                        expires_at: window.expires_at,
                    },
                    messages::owner_payment_confirmed(window.expires_at),
                    messages::approval_confirmed_text(
                        phone_label,
                        transaction.amount_cents,
                        &self.currency,
                        window.expires_at,
                    ),
                )
            }
            AdminDecision::Reject => {
                self.subscription_repo
                    .clear_pending_grant(transaction.subscription_id)
                    .await?;
                tracing::info!(transaction_id = %transaction.id, "Manual payment rejected");
                (
                    ManualOutcome::Rejected,
                    messages::owner_payment_rejected(),
                    messages::approval_rejected_text(
                        phone_label,
                        transaction.amount_cents,
                        &self.currency,
                    ),
                )
            }
        };

        if let Some(phone) = phone.as_deref()
            && let Err(e) = self.message_sender.send_text(phone, &owner_text).await
        {
            tracing::warn!(transaction_id = %transaction.id, error = %e, "Owner notification failed");
        }
        if let Some(message_id) = message_id
            && let Err(e) = self
                .admin_notifier
                .update_approval(message_id, &admin_text)
                .await
        {
            tracing::warn!(transaction_id = %transaction.id, error = %e, "Approval message update failed");
        }

        Ok(outcome)
    }
}
