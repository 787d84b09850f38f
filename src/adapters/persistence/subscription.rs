use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::{ReminderTarget, SubscriptionRepo},
    domain::entities::{
        payment_method::PaymentMethod, subscription::SubscriptionRecord,
        subscription_status::SubscriptionStatus,
    },
};

fn row_to_record(row: &sqlx::postgres::PgRow) -> SubscriptionRecord {
    SubscriptionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: row.get::<SubscriptionStatus, _>("status"),
        is_first_subscription: row.get("is_first_subscription"),
        started_at: row.get("started_at"),
        expires_at: row.get("expires_at"),
        grace_ends_at: row.get("grace_ends_at"),
        storefront_paused_at: row.get("storefront_paused_at"),
        pending_payment_method: row.get::<Option<PaymentMethod>, _>("pending_payment_method"),
        pending_payment_at: row.get("pending_payment_at"),
        pending_expires_at: row.get("pending_expires_at"),
        last_notified_at: row.get("last_notified_at"),
        paymob_order_id: row.get("paymob_order_id"),
        amount_paid_cents: row.get("amount_paid_cents"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_target(row: &sqlx::postgres::PgRow) -> ReminderTarget {
    ReminderTarget {
        subscription_id: row.get("id"),
        user_id: row.get("user_id"),
        phone: row.get("phone"),
        expires_at: row.get("expires_at"),
        storefront_paused_at: row.get("storefront_paused_at"),
        last_notified_at: row.get("last_notified_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, status, is_first_subscription, started_at, expires_at,
    grace_ends_at, storefront_paused_at, pending_payment_method,
    pending_payment_at, pending_expires_at, last_notified_at, paymob_order_id,
    amount_paid_cents, created_at, updated_at
"#;

const TARGET_SELECT: &str = r#"
    SELECT s.id, s.user_id, u.phone, s.expires_at, s.storefront_paused_at, s.last_notified_at
    FROM subscriptions s
    JOIN users u ON u.id = s.user_id
"#;

impl PostgresPersistence {
    async fn execute_on_subscription(&self, query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>) -> AppResult<()> {
        let result = query.execute(&self.pool).await.map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn reminder_targets(
        &self,
        filter: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<Vec<ReminderTarget>> {
        let sql = format!("{TARGET_SELECT} WHERE {filter}");
        let mut query = sqlx::query(&sql);
        if let Some((from, to)) = range {
            query = query.bind(from).bind(to);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_target).collect())
    }
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn get_or_create(&self, user_id: Uuid) -> AppResult<SubscriptionRecord> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions (user_id, status, is_first_subscription)
            VALUES ($1, 'inactive', TRUE)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(&row))
    }

    async fn set_paymob_order_id(&self, id: Uuid, paymob_order_id: &str) -> AppResult<()> {
        self.execute_on_subscription(
            sqlx::query(
                "UPDATE subscriptions SET paymob_order_id = $2, updated_at = now() WHERE id = $1",
            )
            .bind(id)
            .bind(paymob_order_id),
        )
        .await
    }

    async fn set_pending_grant(
        &self,
        id: Uuid,
        method: PaymentMethod,
        granted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.execute_on_subscription(
            sqlx::query(
                r#"
                UPDATE subscriptions
                SET pending_payment_method = $2, pending_payment_at = $3,
                    pending_expires_at = $4, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(method)
            .bind(granted_at)
            .bind(expires_at),
        )
        .await
    }

    async fn clear_pending_grant(&self, id: Uuid) -> AppResult<()> {
        self.execute_on_subscription(
            sqlx::query(
                r#"
                UPDATE subscriptions
                SET pending_payment_method = NULL, pending_payment_at = NULL,
                    pending_expires_at = NULL, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id),
        )
        .await
    }

    async fn mark_grace(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'grace', updated_at = now()
            WHERE status = 'active' AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'expired', updated_at = now()
            WHERE status = 'grace' AND grace_ends_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderTarget>> {
        self.reminder_targets(
            "s.status = 'active' AND s.expires_at BETWEEN $1 AND $2",
            Some((from, to)),
        )
        .await
    }

    async fn list_in_grace(&self) -> AppResult<Vec<ReminderTarget>> {
        self.reminder_targets("s.status = 'grace'", None).await
    }

    async fn list_pausing_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderTarget>> {
        self.reminder_targets(
            "s.status = 'expired' AND s.storefront_paused_at BETWEEN $1 AND $2",
            Some((from, to)),
        )
        .await
    }

    async fn mark_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.execute_on_subscription(
            sqlx::query(
                "UPDATE subscriptions SET last_notified_at = $2, updated_at = now() WHERE id = $1",
            )
            .bind(id)
            .bind(at),
        )
        .await
    }
}
