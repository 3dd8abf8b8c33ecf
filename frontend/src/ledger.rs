//! Ledger engine: balance and ordered view derived from the transaction log.
//!
//! The balance is always folded over the complete set of rows returned by the
//! gateway. Display truncation happens afterwards and never feeds back into
//! the totals.

use crate::error::{Error, ValidationError};
use crate::model::{Amount, ProfileId, Transaction, TransactionId, TransactionKind};

/// Number of transactions shown on the dashboard.
pub const RECENT_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub deposited: i64,
    pub withdrawn: i64,
}

impl LedgerTotals {
    pub fn balance(self) -> i64 {
        self.deposited - self.withdrawn
    }
}

/// Σ deposits − Σ withdrawals over `transactions`, in any order.
pub fn balance_of<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> i64 {
    transactions
        .into_iter()
        .map(Transaction::signed_amount)
        .sum()
}

/// Transactions as fetched, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    /// Build a ledger, restoring newest-first order if the source did not
    /// provide it.
    pub fn new(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { transactions }
    }

    pub fn balance(&self) -> i64 {
        balance_of(&self.transactions)
    }

    pub fn totals(&self) -> LedgerTotals {
        self.transactions
            .iter()
            .fold(LedgerTotals::default(), |mut totals, tx| {
                match tx.kind {
                    TransactionKind::Deposit => totals.deposited += tx.amount.get(),
                    TransactionKind::Withdraw => totals.withdrawn += tx.amount.get(),
                }
                totals
            })
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The page shown to the user.
    pub fn recent(&self) -> &[Transaction] {
        let end = self.transactions.len().min(RECENT_LIMIT);
        &self.transactions[..end]
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| &tx.id == id)
    }

    /// Client-side ownership check run before any edit or delete.
    ///
    /// The gateway enforces the same rule; this only saves a round trip.
    pub fn authorize(&self, id: &TransactionId, acting: &ProfileId) -> Result<&Transaction, Error> {
        let tx = self.get(id).ok_or(Error::NotFound {
            entity: "transaction",
        })?;
        if tx.is_owned_by(acting) {
            Ok(tx)
        } else {
            Err(Error::AuthorizationMismatch {
                transaction_id: id.clone(),
            })
        }
    }

    /// Reject withdrawals that would take more than is currently saved.
    pub fn check_withdrawal(&self, amount: Amount) -> Result<(), ValidationError> {
        let balance = self.balance();
        if amount.get() > balance {
            Err(ValidationError::InsufficientBalance {
                requested: amount.get(),
                balance,
            })
        } else {
            Ok(())
        }
    }
}
