//! Client error taxonomy.
//!
//! `Display` output doubles as the message shown to the user when a write
//! fails, so variants read as sentences.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::model::TransactionId;
use crate::session::StorageError;

/// Input rejected before any gateway call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be greater than zero, got {value}")]
    NonPositiveAmount { value: i64 },
    #[error("amount must be a whole number")]
    NonNumericAmount,
    #[error("withdrawal of {requested} exceeds the saved balance of {balance}")]
    InsufficientBalance { requested: i64, balance: i64 },
    #[error("target amount must be greater than zero")]
    NonPositiveTarget,
    #[error("target duration must be at least one month")]
    NonPositiveMonths,
    #[error("no profile selected")]
    EmptySelection,
    #[error("nothing to change")]
    EmptyPatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("the savings backend is unavailable: {message}")]
    GatewayUnavailable { message: String },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("transaction {transaction_id} belongs to another profile")]
    AuthorizationMismatch { transaction_id: TransactionId },
    #[error("local session storage failed: {message}")]
    SessionStorage { message: String },
}

impl Error {
    pub fn gateway_unavailable(message: impl Into<String>) -> Self {
        Self::GatewayUnavailable {
            message: message.into(),
        }
    }

    /// Map a gateway failure on a write scoped to `transaction_id`.
    ///
    /// A scoped write that matched no row means the row is gone or belongs to
    /// someone else; both surface as an ownership mismatch, as does a 403 from
    /// the row-level policy. Other rejections stay gateway failures.
    pub fn from_scoped_write(error: GatewayError, transaction_id: &TransactionId) -> Self {
        match error {
            GatewayError::NoMatchingRow | GatewayError::Rejected { status: 403, .. } => {
                Self::AuthorizationMismatch {
                    transaction_id: transaction_id.clone(),
                }
            }
            other => other.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<GatewayError> for Error {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound { entity } => Self::NotFound { entity },
            GatewayError::Unavailable { message } => Self::GatewayUnavailable { message },
            GatewayError::Decode { message } => {
                Self::gateway_unavailable(format!("unreadable response: {message}"))
            }
            GatewayError::Rejected { status, message } => {
                Self::gateway_unavailable(format!("request rejected ({status}): {message}"))
            }
            GatewayError::NoMatchingRow => {
                Self::gateway_unavailable("write did not match any row".to_owned())
            }
        }
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        Self::SessionStorage {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_write_without_match_is_an_ownership_mismatch() {
        let id = TransactionId::new("tx-9");
        let error = Error::from_scoped_write(GatewayError::NoMatchingRow, &id);
        assert_eq!(error, Error::AuthorizationMismatch { transaction_id: id });
    }

    #[test]
    fn scoped_write_outage_stays_an_outage() {
        let id = TransactionId::new("tx-9");
        let error = Error::from_scoped_write(GatewayError::unavailable("offline"), &id);
        assert!(matches!(error, Error::GatewayUnavailable { .. }));
    }

    #[test]
    fn scoped_write_with_bad_credentials_is_not_blamed_on_ownership() {
        let id = TransactionId::new("tx-9");
        let rejected = GatewayError::Rejected {
            status: 401,
            message: "Invalid API key".to_owned(),
        };
        let error = Error::from_scoped_write(rejected, &id);
        assert!(matches!(error, Error::GatewayUnavailable { .. }));
        assert!(!error.to_string().contains("another profile"));
    }

    #[test]
    fn scoped_write_forbidden_by_policy_is_an_ownership_mismatch() {
        let id = TransactionId::new("tx-9");
        let rejected = GatewayError::Rejected {
            status: 403,
            message: "row-level security".to_owned(),
        };
        let error = Error::from_scoped_write(rejected, &id);
        assert_eq!(error, Error::AuthorizationMismatch { transaction_id: id });
    }

    #[test]
    fn validation_messages_are_human_readable() {
        let error = Error::from(ValidationError::InsufficientBalance {
            requested: 500,
            balance: 200,
        });
        assert_eq!(
            error.to_string(),
            "withdrawal of 500 exceeds the saved balance of 200"
        );
        assert!(error.is_validation());
    }
}
