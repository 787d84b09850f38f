use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::store::{NewProduct, NewStore, ProductUpdate, StoreRepo, StoreUpdate},
    domain::entities::store::{Product, Store},
};

fn row_to_store(row: &sqlx::postgres::PgRow) -> Store {
    Store {
        id: row.get("id"),
        user_id: row.get("user_id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        whatsapp_number: row.get("whatsapp_number"),
        logo_url: row.get("logo_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_product(row: &sqlx::postgres::PgRow) -> Product {
    Product {
        id: row.get("id"),
        store_id: row.get("store_id"),
        name: row.get("name"),
        description: row.get("description"),
        price_cents: row.get("price_cents"),
        is_available: row.get("is_available"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const STORE_COLS: &str = r#"
    id, user_id, slug, name, description, whatsapp_number, logo_url, created_at, updated_at
"#;

const PRODUCT_COLS: &str = r#"
    id, store_id, name, description, price_cents, is_available, created_at, updated_at
"#;

#[async_trait]
impl StoreRepo for PostgresPersistence {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<Store>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM stores WHERE user_id = $1",
            STORE_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_store))
    }

    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Store>> {
        let row = sqlx::query(&format!("SELECT {} FROM stores WHERE slug = $1", STORE_COLS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_store))
    }

    async fn create(&self, user_id: Uuid, input: &NewStore) -> AppResult<Store> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO stores (user_id, slug, name, description, whatsapp_number, logo_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            STORE_COLS
        ))
        .bind(user_id)
        .bind(&input.slug)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.whatsapp_number.as_deref())
        .bind(input.logo_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_store(&row))
    }

    async fn update(&self, store_id: Uuid, input: &StoreUpdate) -> AppResult<Store> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE stores
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                whatsapp_number = COALESCE($4, whatsapp_number),
                logo_url = COALESCE($5, logo_url),
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            STORE_COLS
        ))
        .bind(store_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.whatsapp_number.as_deref())
        .bind(input.logo_url.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;
        Ok(row_to_store(&row))
    }

    async fn list_products(&self, store_id: Uuid, available_only: bool) -> AppResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM products
            WHERE store_id = $1 AND ($2 = FALSE OR is_available)
            ORDER BY created_at
            "#,
            PRODUCT_COLS
        ))
        .bind(store_id)
        .bind(available_only)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn create_product(&self, store_id: Uuid, input: &NewProduct) -> AppResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (store_id, name, description, price_cents, is_available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PRODUCT_COLS
        ))
        .bind(store_id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.price_cents)
        .bind(input.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_product(&row))
    }

    async fn update_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        input: &ProductUpdate,
    ) -> AppResult<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price_cents = COALESCE($5, price_cents),
                is_available = COALESCE($6, is_available),
                updated_at = now()
            WHERE id = $2 AND store_id = $1
            RETURNING {}
            "#,
            PRODUCT_COLS
        ))
        .bind(store_id)
        .bind(product_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.price_cents)
        .bind(input.is_available)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_product))
    }

    async fn delete_product(&self, store_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $2 AND store_id = $1")
            .bind(store_id)
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
