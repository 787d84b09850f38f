pub mod clock;
pub mod notifications;
pub mod payment_gateway;
