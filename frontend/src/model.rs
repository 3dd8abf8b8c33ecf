//! Domain records shared by the ledger, target tracker and session manager.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Opaque key of a profile row.
    ProfileId
}

string_id! {
    /// Opaque key of a transaction row.
    TransactionId
}

string_id! {
    /// Opaque key of a target row.
    TargetId
}

/// A user identity within the shared ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    /// Styling token chosen in the backend, e.g. `from-blue-500 to-blue-600`.
    pub color_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Profile {
    /// First character of the name, used as a fallback avatar.
    pub fn initial(&self) -> String {
        self.name.chars().next().map(String::from).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    /// Sign applied to the amount when folding it into a balance.
    pub fn sign(self) -> i64 {
        match self {
            Self::Deposit => 1,
            Self::Withdraw => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }
}

/// Positive amount in minor currency units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(ValidationError::NonPositiveAmount { value })
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// Name and colour of the transaction owner, joined in by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDisplay {
    pub name: String,
    pub color_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: ProfileId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Absent when the owning profile no longer exists.
    pub owner_display: Option<OwnerDisplay>,
}

impl Transaction {
    /// Contribution of this transaction to the running balance.
    pub fn signed_amount(&self) -> i64 {
        self.kind.sign() * self.amount.get()
    }

    pub fn is_owned_by(&self, profile: &ProfileId) -> bool {
        &self.owner_id == profile
    }

    pub fn owner_name(&self) -> &str {
        self.owner_display
            .as_ref()
            .map_or("Unknown", |owner| owner.name.as_str())
    }

    /// Apply an edit. Identity and ownership are never touched.
    pub fn apply(&mut self, patch: &TransactionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(note) = &patch.note {
            self.note = normalize_note(note.clone());
        }
    }
}

/// Payload for a new ledger entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub owner_id: ProfileId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub note: Option<String>,
}

impl NewTransaction {
    pub fn new(
        owner_id: ProfileId,
        kind: TransactionKind,
        amount: Amount,
        note: Option<String>,
    ) -> Self {
        Self {
            owner_id,
            kind,
            amount,
            note: note.and_then(normalize_note),
        }
    }
}

/// Fields an owner may change on an existing transaction.
///
/// `note: Some("")` clears the note.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub amount: Option<Amount>,
    pub note: Option<String>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.amount.is_none() && self.note.is_none()
    }
}

/// Blank notes are stored as absent.
pub fn normalize_note(note: String) -> Option<String> {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == note.len() {
        Some(note)
    } else {
        Some(trimmed.to_owned())
    }
}

/// Shared savings goal row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub owner_id: ProfileId,
    pub target_amount: i64,
    pub target_months: u32,
    pub start_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTarget {
    pub owner_id: ProfileId,
    pub target_amount: i64,
    pub target_months: u32,
    pub start_date: NaiveDate,
}

/// Full replacement written on every settings save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPatch {
    pub target_amount: i64,
    pub target_months: u32,
    pub start_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(i64::MIN)]
    fn amount_rejects_non_positive_values(#[case] value: i64) {
        assert_eq!(
            Amount::new(value),
            Err(ValidationError::NonPositiveAmount { value })
        );
    }

    #[test]
    fn amount_deserialization_enforces_positivity() {
        assert!(serde_json::from_str::<Amount>("0").is_err());
        let amount: Amount = serde_json::from_str("2500").expect("positive amount");
        assert_eq!(amount.get(), 2500);
    }

    #[test]
    fn transaction_kind_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&TransactionKind::Withdraw).expect("serialize");
        assert_eq!(json, "\"withdraw\"");
    }

    #[test]
    fn apply_patch_keeps_identity_and_owner() {
        let mut tx = Transaction {
            id: TransactionId::new("tx-1"),
            owner_id: ProfileId::new("opang"),
            kind: TransactionKind::Deposit,
            amount: Amount::new(100).expect("amount"),
            note: Some("lunch money".into()),
            created_at: DateTime::<Utc>::default(),
            owner_display: None,
        };
        let patch = TransactionPatch {
            kind: Some(TransactionKind::Withdraw),
            amount: Some(Amount::new(40).expect("amount")),
            note: Some("  ".into()),
        };

        tx.apply(&patch);

        assert_eq!(tx.id.as_str(), "tx-1");
        assert_eq!(tx.owner_id.as_str(), "opang");
        assert_eq!(tx.kind, TransactionKind::Withdraw);
        assert_eq!(tx.amount.get(), 40);
        assert_eq!(tx.note, None);
        assert_eq!(tx.owner_name(), "Unknown");
    }

    #[rstest]
    #[case("", None)]
    #[case("   ", None)]
    #[case(" buku ", Some("buku"))]
    #[case("buku", Some("buku"))]
    fn normalize_note_trims_and_drops_blank(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_note(raw.to_owned()).as_deref(), expected);
    }
}
