use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use uuid::Uuid;

use super::error::InfraError;
use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::storefront::PauseCache,
};

fn key(user_id: Uuid) -> String {
    format!("storefront:paused:{user_id}")
}

/// Redis-backed pause cache. Entries are written with `SET EX` so they lapse
/// after the configured TTL.
#[derive(Clone)]
pub struct RedisPauseCache {
    manager: ConnectionManager,
    ttl_secs: u64,
}

impl RedisPauseCache {
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self { manager, ttl_secs })
    }
}

#[async_trait]
impl PauseCache for RedisPauseCache {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<bool>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn
            .get(key(user_id))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(value.map(|v| v == "1"))
    }

    async fn put(&self, user_id: Uuid, paused: bool) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let value = if paused { "1" } else { "0" };
        conn.set_ex::<_, _, ()>(key(user_id), value, self.ttl_secs)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
