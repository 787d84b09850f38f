//! HTTP client factory with consistent timeouts. Outbound clients (Paymob,
//! Telegram, Evolution) are built here rather than with `Client::new()`.

use reqwest::Client;
use std::time::Duration;

/// Connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request/response time for gateway and messaging calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Panics if the client cannot be built (TLS misconfiguration). Clients are
/// built once at startup, where failing fast is acceptable.
pub fn build_client() -> Client {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}
