use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::app_error::AppResult;

// ============================================================================
// Port Types
// ============================================================================

/// Metadata echoed back by the gateway in its callback.
#[derive(Debug, Clone, Serialize)]
pub struct IntentionExtras {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub transaction_id: Uuid,
    pub is_first: bool,
}

/// Everything the gateway needs to open a hosted checkout.
#[derive(Debug, Clone)]
pub struct IntentionRequest {
    pub amount_cents: i64,
    pub currency: String,
    /// Owner phone; billing details are synthesized from it.
    pub phone: String,
    pub extras: IntentionExtras,
    /// Our transaction id, returned as `special_reference` in callbacks.
    pub special_reference: String,
}

/// A created payment intention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intention {
    /// Gateway-side identifier, stored as `paymob_order_id`.
    pub id: String,
    /// Where the owner completes the payment.
    pub checkout_url: String,
    pub client_secret: String,
    pub public_key: String,
}

// ============================================================================
// Port Trait
// ============================================================================

/// Card payment gateway (hosted checkout plus signed server callbacks).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intention. Transport or gateway failures map to
    /// `AppError::Upstream`.
    async fn create_intention(&self, request: &IntentionRequest) -> AppResult<Intention>;

    /// Checks the callback signature over the transaction object.
    /// Returns `AppError::VerificationFailure` on mismatch.
    fn verify_callback(&self, transaction: &serde_json::Value, received_hmac: &str)
    -> AppResult<()>;
}
