use async_trait::async_trait;
use uuid::Uuid;

use crate::app_error::AppResult;

/// Admin chat used to approve or reject manual payments.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    /// Posts an approval request with confirm/reject buttons bound to the
    /// transaction. Returns the chat message id.
    async fn request_approval(&self, transaction_id: Uuid, text: &str) -> AppResult<i64>;

    /// Replaces the text of an earlier approval request and drops its buttons.
    async fn update_approval(&self, message_id: i64, text: &str) -> AppResult<()>;

    /// Acknowledges a button press so the admin's client stops spinning.
    async fn acknowledge_callback(&self, callback_id: &str, text: &str) -> AppResult<()>;
}

/// Direct messages to store owners over WhatsApp.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, phone: &str, text: &str) -> AppResult<()>;
}
