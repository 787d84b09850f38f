pub mod app_error;
pub mod jwt;
pub mod messages;
pub mod ports;
pub mod use_cases;
