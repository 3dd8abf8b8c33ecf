//! Port to the hosted data backend.
//!
//! The backend owns persistence, authentication and row-level authorization.
//! Adapters implement [`DataGateway`]; the controller and session manager only
//! see this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    NewTarget, NewTransaction, Profile, ProfileId, Target, TargetId, TargetPatch, Transaction,
    TransactionId, TransactionPatch,
};

mod rest;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use rest::RestGateway;

#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryGateway;

/// Failures reported by gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network failure or backend outage.
    #[error("gateway unavailable: {message}")]
    Unavailable { message: String },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    /// The backend refused the request, e.g. a row-level policy violation.
    #[error("gateway rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// A write scoped by id and owner affected nothing.
    #[error("write did not match any row")]
    NoMatchingRow,
    #[error("could not decode gateway response: {message}")]
    Decode { message: String },
}

impl GatewayError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Row-level CRUD over `users`, `transactions` and `targets`.
///
/// Futures are not `Send`: browser fetches are bound to the UI thread.
#[async_trait(?Send)]
pub trait DataGateway {
    /// All profiles ordered by name.
    async fn list_profiles(&self) -> Result<Vec<Profile>, GatewayError>;

    async fn get_profile(&self, id: &ProfileId) -> Result<Profile, GatewayError>;

    /// Every transaction joined with its owner's display fields, newest first.
    async fn list_transactions(&self) -> Result<Vec<Transaction>, GatewayError>;

    async fn insert_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, GatewayError>;

    /// Update the row matching both `id` and `owner_id`.
    async fn update_transaction(
        &self,
        id: &TransactionId,
        owner_id: &ProfileId,
        patch: &TransactionPatch,
    ) -> Result<(), GatewayError>;

    /// Delete the row matching both `id` and `owner_id`.
    async fn delete_transaction(
        &self,
        id: &TransactionId,
        owner_id: &ProfileId,
    ) -> Result<(), GatewayError>;

    /// The least-recently-updated target row, ties broken by ascending id.
    async fn get_active_target(&self) -> Result<Target, GatewayError>;

    async fn insert_target(&self, target: &NewTarget) -> Result<Target, GatewayError>;

    async fn update_target(&self, id: &TargetId, patch: &TargetPatch)
        -> Result<(), GatewayError>;
}
