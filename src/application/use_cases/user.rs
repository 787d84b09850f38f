use async_trait::async_trait;
use uuid::Uuid;

use crate::app_error::AppResult;

/// Read access to owner accounts. Accounts are created by the sign-in
/// service; this crate never writes them.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_phone(&self, user_id: Uuid) -> AppResult<Option<String>>;
}
