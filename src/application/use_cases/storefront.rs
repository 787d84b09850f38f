use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::clock::Clock,
    domain::entities::store::{Product, Store},
};

use super::{store::StoreRepo, subscription::SubscriptionRepo};

/// Short-lived per-owner cache of the storefront pause decision. Entries
/// expire on their own; the implementation owns the TTL.
#[async_trait]
pub trait PauseCache: Send + Sync {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<bool>>;
    async fn put(&self, user_id: Uuid, paused: bool) -> AppResult<()>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum StorefrontView {
    Live {
        store: Store,
        products: Vec<Product>,
    },
    /// Shown to customers once the owner's subscription lapsed long enough.
    Paused {
        store_name: String,
        whatsapp_number: Option<String>,
    },
}

#[derive(Clone)]
pub struct StorefrontUseCases {
    store_repo: Arc<dyn StoreRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    pause_cache: Arc<dyn PauseCache>,
    clock: Arc<dyn Clock>,
}

impl StorefrontUseCases {
    pub fn new(
        store_repo: Arc<dyn StoreRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        pause_cache: Arc<dyn PauseCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store_repo,
            subscription_repo,
            pause_cache,
            clock,
        }
    }

    #[instrument(skip(self))]
    pub async fn view(&self, slug: &str) -> AppResult<StorefrontView> {
        let store = self
            .store_repo
            .get_by_slug(&slug.to_lowercase())
            .await?
            .ok_or(AppError::NotFound)?;

        if self.is_paused(store.user_id).await? {
            return Ok(StorefrontView::Paused {
                store_name: store.name,
                whatsapp_number: store.whatsapp_number,
            });
        }

        let products = self.store_repo.list_products(store.id, true).await?;
        Ok(StorefrontView::Live { store, products })
    }

    /// Only the pause deadline matters here. Owners without a subscription
    /// row stay live.
    async fn is_paused(&self, user_id: Uuid) -> AppResult<bool> {
        match self.pause_cache.get(user_id).await {
            Ok(Some(paused)) => return Ok(paused),
            Ok(None) => {}
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Pause cache read failed"),
        }

        let paused = self
            .subscription_repo
            .get_by_user(user_id)
            .await?
            .is_some_and(|s| s.is_storefront_paused(self.clock.now()));

        if let Err(e) = self.pause_cache.put(user_id, paused).await {
            tracing::warn!(user_id = %user_id, error = %e, "Pause cache write failed");
        }
        Ok(paused)
    }
}
