use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::user::UserRepo,
};

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_phone(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT phone FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(|r| r.get("phone")))
    }
}
