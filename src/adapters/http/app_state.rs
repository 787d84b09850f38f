use std::sync::Arc;

use crate::{
    application::ports::clock::Clock,
    infra::config::AppConfig,
    use_cases::{
        payment::PaymentUseCases, payment_confirmation::ConfirmationUseCases, store::StoreUseCases,
        storefront::StorefrontUseCases, subscription::SubscriptionUseCases,
        subscription_sweep::SweepUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub payment_use_cases: Arc<PaymentUseCases>,
    pub confirmation_use_cases: Arc<ConfirmationUseCases>,
    pub sweep_use_cases: Arc<SweepUseCases>,
    pub store_use_cases: Arc<StoreUseCases>,
    pub storefront_use_cases: Arc<StorefrontUseCases>,
    pub clock: Arc<dyn Clock>,
}
