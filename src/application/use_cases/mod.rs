pub mod payment;
pub mod payment_confirmation;
pub mod store;
pub mod storefront;
pub mod subscription;
pub mod subscription_sweep;
pub mod user;
