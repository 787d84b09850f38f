use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::entities::{
    payment_method::PaymentMethod, subscription_period::SubscriptionPeriod,
};

const BRAND_NAME: &str = "WhatSou";

/// "300" for whole amounts, "300.50" otherwise.
pub fn format_amount(amount_cents: i64) -> String {
    if amount_cents % 100 == 0 {
        format!("{}", amount_cents / 100)
    } else {
        format!("{}.{:02}", amount_cents / 100, (amount_cents % 100).abs())
    }
}

fn renew_url(site_url: &str) -> String {
    format!("{}/dashboard/subscription", site_url.trim_end_matches('/'))
}

fn period_label(period: SubscriptionPeriod) -> &'static str {
    match period {
        SubscriptionPeriod::Monthly => "1 month",
        SubscriptionPeriod::Yearly => "1 year",
    }
}

// ============================================================================
// Admin chat (Markdown)
// ============================================================================

pub fn approval_request_text(
    phone: &str,
    amount_cents: i64,
    currency: &str,
    method: PaymentMethod,
    period: SubscriptionPeriod,
    is_first: bool,
) -> String {
    let kind = if is_first { "New subscription" } else { "Renewal" };
    format!(
        "💳 *Manual payment request*\n\n📱 Phone: `{phone}`\n💰 Amount: {} {currency}\n🏦 Method: {}\n📅 Period: {}\n🔖 Type: {kind}\n\nCheck the transfer, then confirm or reject.",
        format_amount(amount_cents),
        method.label(),
        period_label(period),
    )
}

pub fn approval_confirmed_text(
    phone: &str,
    amount_cents: i64,
    currency: &str,
    expires_at: DateTime<Utc>,
) -> String {
    format!(
        "✅ *Payment confirmed*\n\n📱 Phone: `{phone}`\n💰 Amount: {} {currency}\n\n🎉 Subscription active until {}",
        format_amount(amount_cents),
        expires_at.format("%Y-%m-%d"),
    )
}

pub fn approval_rejected_text(phone: &str, amount_cents: i64, currency: &str) -> String {
    format!(
        "❌ *Payment rejected*\n\n📱 Phone: `{phone}`\n💰 Amount: {} {currency}",
        format_amount(amount_cents),
    )
}

// ============================================================================
// Owner WhatsApp messages
// ============================================================================

pub fn owner_payment_confirmed(expires_at: DateTime<Utc>) -> String {
    format!(
        "✅ Your {BRAND_NAME} subscription is confirmed!\n\nThank you for using {BRAND_NAME}.\n\nYour subscription is valid until {}.",
        expires_at.format("%Y-%m-%d"),
    )
}

pub fn owner_payment_rejected() -> String {
    "❌ Your payment request was rejected.\n\nWe could not confirm the transfer. Please contact us if you think this is a mistake.".to_string()
}

pub fn expiring_soon_reminder(site_url: &str, days_left: i64) -> String {
    format!(
        "⚠️ Your {BRAND_NAME} subscription ends in {days_left} days.\n\nRenew now to keep your store running:\n{}",
        renew_url(site_url),
    )
}

pub fn grace_reminder(site_url: &str) -> String {
    format!(
        "🔴 Your {BRAND_NAME} subscription has ended!\n\nYour dashboard is now read-only.\nRenew within 48 hours to keep your store online:\n{}",
        renew_url(site_url),
    )
}

pub fn storefront_pause_reminder(site_url: &str, days_left: i64) -> String {
    format!(
        "⛔ Final warning!\n\nYour store will be hidden from customers in {days_left} days.\n\nRenew now:\n{}",
        renew_url(site_url),
    )
}

// ============================================================================
// Deep links
// ============================================================================

/// `wa.me` link to the admin number with the payment details prefilled.
pub fn whatsapp_payment_link(
    admin_number: &str,
    phone: &str,
    amount_cents: i64,
    currency: &str,
    method: PaymentMethod,
) -> String {
    let text = format!(
        "Hello, I paid {} {currency} via {} for my {BRAND_NAME} subscription.\nPhone: {phone}\nI will attach the payment screenshot.",
        format_amount(amount_cents),
        method.label(),
    );
    let digits: String = admin_number.chars().filter(char::is_ascii_digit).collect();
    let base = format!("https://wa.me/{digits}");
    match Url::parse_with_params(&base, &[("text", text.as_str())]) {
        Ok(url) => url.to_string(),
        Err(_) => base,
    }
}
