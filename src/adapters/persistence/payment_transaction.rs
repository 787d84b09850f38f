use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::{
        payment::{NewPaymentTransaction, PaymentTransactionRepo, Settlement},
        subscription::Activation,
    },
    domain::entities::{
        payment_method::PaymentMethod,
        payment_status::PaymentStatus,
        payment_transaction::{ConfirmedBy, PaymentTransaction},
        subscription_period::SubscriptionPeriod,
    },
};

fn row_to_transaction(row: &sqlx::postgres::PgRow) -> PaymentTransaction {
    PaymentTransaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        subscription_id: row.get("subscription_id"),
        amount_cents: row.get("amount_cents"),
        payment_method: row.get::<PaymentMethod, _>("payment_method"),
        subscription_period: row.get::<SubscriptionPeriod, _>("subscription_period"),
        status: row.get::<PaymentStatus, _>("status"),
        paymob_order_id: row.get("paymob_order_id"),
        paymob_transaction_id: row.get("paymob_transaction_id"),
        telegram_message_id: row.get("telegram_message_id"),
        hmac_verified: row.get("hmac_verified"),
        raw_response: row.get("raw_response"),
        error_message: row.get("error_message"),
        confirmed_by: row.get::<Option<ConfirmedBy>, _>("confirmed_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, subscription_id, amount_cents, payment_method,
    subscription_period, status, paymob_order_id, paymob_transaction_id,
    telegram_message_id, hmac_verified, raw_response, error_message,
    confirmed_by, created_at, updated_at
"#;

/// Terminal update guarded on `pending`, so only one confirmer wins.
fn settle_query(
    id: Uuid,
    settlement: &Settlement,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        UPDATE payment_transactions
        SET status = $2,
            paymob_transaction_id = COALESCE($3, paymob_transaction_id),
            hmac_verified = $4,
            raw_response = COALESCE($5, raw_response),
            error_message = $6,
            confirmed_by = $7,
            updated_at = now()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id)
    .bind(settlement.status)
    .bind(settlement.paymob_transaction_id.as_deref())
    .bind(settlement.hmac_verified)
    .bind(settlement.raw_response.as_ref())
    .bind(settlement.error_message.as_deref())
    .bind(settlement.confirmed_by)
}

#[async_trait]
impl PaymentTransactionRepo for PostgresPersistence {
    async fn create(&self, input: &NewPaymentTransaction) -> AppResult<PaymentTransaction> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payment_transactions
                (user_id, subscription_id, amount_cents, payment_method, subscription_period, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(input.user_id)
        .bind(input.subscription_id)
        .bind(input.amount_cents)
        .bind(input.payment_method)
        .bind(input.subscription_period)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_transaction(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PaymentTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payment_transactions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_transaction))
    }

    async fn get_by_paymob_order_id(
        &self,
        paymob_order_id: &str,
    ) -> AppResult<Option<PaymentTransaction>> {
        // Retried intentions can share an id; the newest attempt wins.
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM payment_transactions
            WHERE paymob_order_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(paymob_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_transaction))
    }

    async fn get_by_paymob_transaction_id(
        &self,
        paymob_transaction_id: &str,
    ) -> AppResult<Option<PaymentTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payment_transactions WHERE paymob_transaction_id = $1",
            SELECT_COLS
        ))
        .bind(paymob_transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_transaction))
    }

    async fn set_paymob_order_id(&self, id: Uuid, paymob_order_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE payment_transactions SET paymob_order_id = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(paymob_order_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn set_telegram_message_id(&self, id: Uuid, message_id: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE payment_transactions SET telegram_message_id = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(message_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn record_verification_failure(
        &self,
        id: Uuid,
        raw_response: &serde_json::Value,
        error_message: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE payment_transactions
            SET raw_response = $2, error_message = $3, hmac_verified = FALSE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(raw_response)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn settle(&self, id: Uuid, settlement: &Settlement) -> AppResult<bool> {
        let result = settle_query(id, settlement)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn settle_and_activate(
        &self,
        id: Uuid,
        settlement: &Settlement,
        subscription_id: Uuid,
        activation: &Activation,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let settled = settle_query(id, settlement)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        if settled.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        let window = &activation.window;
        let activated = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'active',
                is_first_subscription = FALSE,
                started_at = $2,
                expires_at = $3,
                grace_ends_at = $4,
                storefront_paused_at = $5,
                amount_paid_cents = $6,
                paymob_order_id = COALESCE($7, paymob_order_id),
                pending_payment_method = NULL,
                pending_payment_at = NULL,
                pending_expires_at = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(subscription_id)
        .bind(window.started_at)
        .bind(window.expires_at)
        .bind(window.grace_ends_at)
        .bind(window.storefront_paused_at)
        .bind(activation.amount_paid_cents)
        .bind(activation.paymob_order_id.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;
        if activated.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(true)
    }

    async fn list_recent_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM payment_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_transaction).collect())
    }
}
