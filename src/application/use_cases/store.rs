use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::store::{Product, Store, is_valid_slug},
};

use super::subscription::SubscriptionUseCases;

const MAX_NAME_LEN: usize = 120;

// ============================================================================
// Input Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStore {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub whatsapp_number: Option<String>,
    pub logo_url: Option<String>,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub whatsapp_number: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub is_available: Option<bool>,
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait StoreRepo: Send + Sync {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<Store>>;
    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Store>>;
    async fn create(&self, user_id: Uuid, input: &NewStore) -> AppResult<Store>;
    async fn update(&self, store_id: Uuid, input: &StoreUpdate) -> AppResult<Store>;
    async fn list_products(&self, store_id: Uuid, available_only: bool) -> AppResult<Vec<Product>>;
    async fn create_product(&self, store_id: Uuid, input: &NewProduct) -> AppResult<Product>;
    /// Scoped to the store; `None` when the product belongs elsewhere.
    async fn update_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        input: &ProductUpdate,
    ) -> AppResult<Option<Product>>;
    async fn delete_product(&self, store_id: Uuid, product_id: Uuid) -> AppResult<bool>;
}

// ============================================================================
// Validation
// ============================================================================

fn validate_name(name: &str, what: &str) -> AppResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::ValidationError(format!(
            "{what} name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_price(price_cents: i64) -> AppResult<()> {
    if price_cents < 0 {
        return Err(AppError::ValidationError("Price cannot be negative".into()));
    }
    Ok(())
}

// ============================================================================
// Use Cases
// ============================================================================

/// Owner dashboard for the store and its catalogue. Every write passes the
/// subscription gate first; reads are always allowed.
#[derive(Clone)]
pub struct StoreUseCases {
    store_repo: Arc<dyn StoreRepo>,
    subscriptions: Arc<SubscriptionUseCases>,
}

impl StoreUseCases {
    pub fn new(store_repo: Arc<dyn StoreRepo>, subscriptions: Arc<SubscriptionUseCases>) -> Self {
        Self {
            store_repo,
            subscriptions,
        }
    }

    async fn own_store(&self, user_id: Uuid) -> AppResult<Store> {
        self.store_repo
            .get_by_user(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn get_store(&self, user_id: Uuid) -> AppResult<Option<Store>> {
        self.store_repo.get_by_user(user_id).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_store(&self, user_id: Uuid, input: NewStore) -> AppResult<Store> {
        self.subscriptions.ensure_writable(user_id).await?;

        let input = NewStore {
            slug: input.slug.trim().to_lowercase(),
            name: input.name.trim().to_string(),
            ..input
        };
        if !is_valid_slug(&input.slug) {
            return Err(AppError::ValidationError(
                "Slug must be 3 to 48 lowercase letters, digits or hyphens".into(),
            ));
        }
        validate_name(&input.name, "Store")?;

        if self.store_repo.get_by_user(user_id).await?.is_some() {
            return Err(AppError::InvalidInput("Store already exists".into()));
        }
        if self.store_repo.get_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::InvalidInput("Slug is already taken".into()));
        }

        let store = self.store_repo.create(user_id, &input).await?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");
        Ok(store)
    }

    #[instrument(skip(self, input))]
    pub async fn update_store(&self, user_id: Uuid, input: StoreUpdate) -> AppResult<Store> {
        self.subscriptions.ensure_writable(user_id).await?;
        if let Some(name) = &input.name {
            validate_name(name, "Store")?;
        }
        let store = self.own_store(user_id).await?;
        self.store_repo.update(store.id, &input).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, user_id: Uuid) -> AppResult<Vec<Product>> {
        let store = self.own_store(user_id).await?;
        self.store_repo.list_products(store.id, false).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(&self, user_id: Uuid, input: NewProduct) -> AppResult<Product> {
        self.subscriptions.ensure_writable(user_id).await?;
        validate_name(&input.name, "Product")?;
        validate_price(input.price_cents)?;

        let store = self.own_store(user_id).await?;
        self.store_repo.create_product(store.id, &input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: ProductUpdate,
    ) -> AppResult<Product> {
        self.subscriptions.ensure_writable(user_id).await?;
        if let Some(name) = &input.name {
            validate_name(name, "Product")?;
        }
        if let Some(price) = input.price_cents {
            validate_price(price)?;
        }

        let store = self.own_store(user_id).await?;
        self.store_repo
            .update_product(store.id, product_id, &input)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        self.subscriptions.ensure_writable(user_id).await?;
        let store = self.own_store(user_id).await?;
        if !self.store_repo.delete_product(store.id, product_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
