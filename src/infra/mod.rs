use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod evolution_client;
pub mod http_client;
pub mod pause_cache;
pub mod paymob_client;
pub mod paymob_hmac;
pub mod setup;
pub mod sweep_worker;
pub mod telegram_client;

pub async fn postgres_persistence(database_url: &str) -> anyhow::Result<PostgresPersistence> {
    let pool = init_db(database_url).await?;
    let persistence = PostgresPersistence::new(pool);
    Ok(persistence)
}
