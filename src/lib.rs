//! Campus events backend: accounts, event listings and "interested"
//! markers held in process memory behind an axum JSON API.

pub mod api;
pub mod config;
pub mod error;
pub mod registry;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
