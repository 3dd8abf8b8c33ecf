//! Shared savings tracker for a small group of profiles.
//!
//! The ledger, target tracker and session manager are plain Rust over the
//! [`gateway::DataGateway`] port; [`view`] renders them with Yew.

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod gateway;
pub mod ledger;
pub mod model;
pub mod session;
pub mod target;
pub mod view;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{Error, ValidationError};
