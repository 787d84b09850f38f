use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::instrument;

use crate::{
    app_error::AppResult,
    application::{messages, ports::notifications::MessageSender},
    domain::entities::subscription::days_until,
};

use super::subscription::{ReminderTarget, SubscriptionRepo};

const MAX_CONCURRENT_SENDS: usize = 10;
const REMINDER_THROTTLE_HOURS: i64 = 24;
const REMINDER_WINDOW_START_DAYS: i64 = 2;
const REMINDER_WINDOW_END_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub active_to_grace: u64,
    pub grace_to_expired: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
}

struct Reminder {
    target: ReminderTarget,
    text: String,
}

fn recently_notified(target: &ReminderTarget, now: DateTime<Utc>) -> bool {
    target
        .last_notified_at
        .is_some_and(|at| now - at < Duration::hours(REMINDER_THROTTLE_HOURS))
}

#[derive(Clone)]
pub struct SweepUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
    message_sender: Arc<dyn MessageSender>,
    site_url: String,
}

impl SweepUseCases {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepo>,
        message_sender: Arc<dyn MessageSender>,
        site_url: String,
    ) -> Self {
        Self {
            subscription_repo,
            message_sender,
            site_url,
        }
    }

    /// Refreshes stored status hints and sends due reminders. Reminder
    /// failures are counted, never returned.
    #[instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let active_to_grace = self.subscription_repo.mark_grace(now).await?;
        let grace_to_expired = self.subscription_repo.mark_expired(now).await?;

        let reminders = self.collect_reminders(now).await?;
        let (notifications_sent, notifications_failed) = self.send_all(reminders, now).await;

        let report = SweepReport {
            active_to_grace,
            grace_to_expired,
            notifications_sent,
            notifications_failed,
        };
        tracing::info!(?report, "Subscription sweep finished");
        Ok(report)
    }

    async fn collect_reminders(&self, now: DateTime<Utc>) -> AppResult<Vec<Reminder>> {
        let from = now + Duration::days(REMINDER_WINDOW_START_DAYS);
        let to = now + Duration::days(REMINDER_WINDOW_END_DAYS);
        let mut reminders = Vec::new();

        for target in self.subscription_repo.list_expiring_between(from, to).await? {
            let days_left = target.expires_at.map_or(0, |at| days_until(at, now));
            let text = messages::expiring_soon_reminder(&self.site_url, days_left);
            reminders.push(Reminder { target, text });
        }
        for target in self.subscription_repo.list_in_grace().await? {
            let text = messages::grace_reminder(&self.site_url);
            reminders.push(Reminder { target, text });
        }
        for target in self.subscription_repo.list_pausing_between(from, to).await? {
            let days_left = target
                .storefront_paused_at
                .map_or(0, |at| days_until(at, now));
            let text = messages::storefront_pause_reminder(&self.site_url, days_left);
            reminders.push(Reminder { target, text });
        }

        let before = reminders.len();
        reminders.retain(|r| !recently_notified(&r.target, now));
        tracing::debug!(
            due = reminders.len(),
            throttled = before - reminders.len(),
            "Reminders collected"
        );
        Ok(reminders)
    }

    async fn send_all(&self, reminders: Vec<Reminder>, now: DateTime<Utc>) -> (u64, u64) {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SENDS));
        let mut handles = Vec::with_capacity(reminders.len());

        for reminder in reminders {
            let sender = Arc::clone(&self.message_sender);
            let repo = Arc::clone(&self.subscription_repo);
            let sem = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return false;
                };
                send_one(sender.as_ref(), repo.as_ref(), &reminder, now).await
            }));
        }

        let mut sent = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.await {
                Ok(true) => sent += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Reminder task panicked");
                    failed += 1;
                }
            }
        }
        (sent, failed)
    }
}

async fn send_one(
    sender: &dyn MessageSender,
    repo: &dyn SubscriptionRepo,
    reminder: &Reminder,
    now: DateTime<Utc>,
) -> bool {
    let target = &reminder.target;
    if let Err(e) = sender.send_text(&target.phone, &reminder.text).await {
        tracing::warn!(
            subscription_id = %target.subscription_id,
            error = %e,
            "Reminder send failed"
        );
        return false;
    }
    if let Err(e) = repo.mark_notified(target.subscription_id, now).await {
        tracing::warn!(
            subscription_id = %target.subscription_id,
            error = %e,
            "Failed to stamp reminder time"
        );
    }
    true
}
