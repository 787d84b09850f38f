//! Fakes for the outbound ports: clock, card gateway, admin chat and
//! WhatsApp sender. Each records what it was asked to do.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        clock::Clock,
        notifications::{AdminNotifier, MessageSender},
        payment_gateway::{Intention, IntentionRequest, PaymentGateway},
    },
};

/// Signature accepted by `FakePaymentGateway::verify_callback`.
pub const VALID_TEST_HMAC: &str = "valid-hmac";

// ============================================================================
// FixedClock
// ============================================================================

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// FakePaymentGateway
// ============================================================================

#[derive(Default)]
pub struct FakePaymentGateway {
    requests: Mutex<Vec<IntentionRequest>>,
    fail: bool,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every intention call fails as an upstream error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<IntentionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn create_intention(&self, request: &IntentionRequest) -> AppResult<Intention> {
        if self.fail {
            return Err(AppError::Upstream("gateway unavailable".into()));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let n = requests.len();
        Ok(Intention {
            id: format!("intention_{n}"),
            checkout_url: format!(
                "https://accept.paymob.test/unifiedcheckout/?publicKey=pk_test&clientSecret=cs_test_{n}"
            ),
            client_secret: format!("cs_test_{n}"),
            public_key: "pk_test".to_string(),
        })
    }

    fn verify_callback(&self, _transaction: &Value, received_hmac: &str) -> AppResult<()> {
        if received_hmac == VALID_TEST_HMAC {
            Ok(())
        } else {
            Err(AppError::VerificationFailure)
        }
    }
}

// ============================================================================
// RecordingAdminNotifier
// ============================================================================

#[derive(Default)]
pub struct RecordingAdminNotifier {
    approvals: Mutex<Vec<(Uuid, String)>>,
    updates: Mutex<Vec<(i64, String)>>,
    acks: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingAdminNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn approvals(&self) -> Vec<(Uuid, String)> {
        self.approvals.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(i64, String)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<(String, String)> {
        self.acks.lock().unwrap().clone()
    }

    fn check(&self) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Upstream("telegram unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminNotifier for RecordingAdminNotifier {
    async fn request_approval(&self, transaction_id: Uuid, text: &str) -> AppResult<i64> {
        self.check()?;
        let mut approvals = self.approvals.lock().unwrap();
        approvals.push((transaction_id, text.to_string()));
        Ok(approvals.len() as i64)
    }

    async fn update_approval(&self, message_id: i64, text: &str) -> AppResult<()> {
        self.check()?;
        self.updates
            .lock()
            .unwrap()
            .push((message_id, text.to_string()));
        Ok(())
    }

    async fn acknowledge_callback(&self, callback_id: &str, text: &str) -> AppResult<()> {
        self.check()?;
        self.acks
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.to_string()));
        Ok(())
    }
}

// ============================================================================
// RecordingMessageSender
// ============================================================================

#[derive(Default)]
pub struct RecordingMessageSender {
    sent: Mutex<Vec<(String, String)>>,
    fail_all: bool,
    failing_phones: Vec<String>,
}

impl RecordingMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Fails only for the given phone number.
    pub fn failing_for(phone: &str) -> Self {
        Self {
            failing_phones: vec![phone.to_string()],
            ..Self::default()
        }
    }

    /// Successfully delivered messages as `(phone, text)`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingMessageSender {
    async fn send_text(&self, phone: &str, text: &str) -> AppResult<()> {
        if self.fail_all || self.failing_phones.iter().any(|p| p == phone) {
            return Err(AppError::Upstream("whatsapp unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), text.to_string()));
        Ok(())
    }
}
