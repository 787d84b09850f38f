//! Test utilities shared by use-case and route tests.
//!
//! - Fixture factories with override closures
//! - In-memory repositories and recording fakes for the outbound ports
//! - `TestAppStateBuilder` for HTTP tests

mod app_state_builder;
mod factories;
mod port_fakes;
mod repo_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use port_fakes::*;
pub use repo_mocks::*;
