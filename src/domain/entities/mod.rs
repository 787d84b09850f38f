pub mod payment_method;
pub mod payment_status;
pub mod payment_transaction;
pub mod pricing;
pub mod store;
pub mod subscription;
pub mod subscription_period;
pub mod subscription_status;
