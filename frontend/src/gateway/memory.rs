//! In-memory gateway mirroring the backend's ordering and row-level rules.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{DataGateway, GatewayError};
use crate::model::{
    NewTarget, NewTransaction, OwnerDisplay, Profile, ProfileId, Target, TargetId, TargetPatch,
    Transaction, TransactionId, TransactionPatch,
};

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    transactions: Vec<Transaction>,
    targets: Vec<Target>,
}

/// Single-threaded fake backend for tests.
///
/// Writes scoped by owner behave like a row-level policy: a mismatched owner
/// affects no row and yields [`GatewayError::NoMatchingRow`].
pub struct InMemoryGateway {
    tables: RefCell<Tables>,
    next_id: Cell<u64>,
    clock_base: DateTime<Utc>,
    reads_fail: Cell<bool>,
    writes_fail: Cell<bool>,
    calls: Cell<usize>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            tables: RefCell::default(),
            next_id: Cell::new(1),
            clock_base: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            reads_fail: Cell::new(false),
            writes_fail: Cell::new(false),
            calls: Cell::new(0),
        }
    }

    pub fn with_profiles(self, profiles: impl IntoIterator<Item = Profile>) -> Self {
        self.tables.borrow_mut().profiles.extend(profiles);
        self
    }

    pub fn push_transaction(&self, transaction: Transaction) {
        self.tables.borrow_mut().transactions.push(transaction);
    }

    pub fn push_target(&self, target: Target) {
        self.tables.borrow_mut().targets.push(target);
    }

    pub fn remove_profile(&self, id: &ProfileId) {
        self.tables.borrow_mut().profiles.retain(|p| &p.id != id);
    }

    /// Make every read fail with [`GatewayError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.set(fail);
    }

    /// Make every write fail with [`GatewayError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.set(fail);
    }

    /// Number of gateway operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.tables.borrow().transactions.clone()
    }

    pub fn targets(&self) -> Vec<Target> {
        self.tables.borrow().targets.clone()
    }

    fn read(&self) -> Result<(), GatewayError> {
        self.calls.set(self.calls.get() + 1);
        if self.reads_fail.get() {
            Err(GatewayError::unavailable("read failure injected"))
        } else {
            Ok(())
        }
    }

    fn write(&self) -> Result<(), GatewayError> {
        self.calls.set(self.calls.get() + 1);
        if self.writes_fail.get() {
            Err(GatewayError::unavailable("write failure injected"))
        } else {
            Ok(())
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn stamp(&self, seq: u64) -> DateTime<Utc> {
        self.clock_base + Duration::seconds(i64::try_from(seq).unwrap_or(i64::MAX))
    }

    /// Inserted rows always sort as the newest, seeded rows included.
    fn creation_stamp(&self, seq: u64) -> DateTime<Utc> {
        let stamp = self.stamp(seq);
        match self.tables.borrow().transactions.iter().map(|tx| tx.created_at).max() {
            Some(latest) if latest >= stamp => latest + Duration::seconds(1),
            _ => stamp,
        }
    }
}

#[async_trait(?Send)]
impl DataGateway for InMemoryGateway {
    async fn list_profiles(&self) -> Result<Vec<Profile>, GatewayError> {
        self.read()?;
        let mut profiles = self.tables.borrow().profiles.clone();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    async fn get_profile(&self, id: &ProfileId) -> Result<Profile, GatewayError> {
        self.read()?;
        self.tables
            .borrow()
            .profiles
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(GatewayError::NotFound { entity: "profile" })
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, GatewayError> {
        self.read()?;
        let tables = self.tables.borrow();
        let mut rows: Vec<Transaction> = tables
            .transactions
            .iter()
            .cloned()
            .map(|mut tx| {
                tx.owner_display = tables
                    .profiles
                    .iter()
                    .find(|p| p.id == tx.owner_id)
                    .map(|p| OwnerDisplay {
                        name: p.name.clone(),
                        color_token: p.color_token.clone(),
                    });
                tx
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, GatewayError> {
        self.write()?;
        let seq = self.next_id();
        let created_at = self.creation_stamp(seq);
        let row = Transaction {
            id: TransactionId::new(format!("tx-{seq}")),
            owner_id: transaction.owner_id.clone(),
            kind: transaction.kind,
            amount: transaction.amount,
            note: transaction.note.clone(),
            created_at,
            owner_display: None,
        };
        self.tables.borrow_mut().transactions.push(row.clone());
        Ok(row)
    }

    async fn update_transaction(
        &self,
        id: &TransactionId,
        owner_id: &ProfileId,
        patch: &TransactionPatch,
    ) -> Result<(), GatewayError> {
        self.write()?;
        let mut tables = self.tables.borrow_mut();
        let row = tables
            .transactions
            .iter_mut()
            .find(|tx| &tx.id == id && &tx.owner_id == owner_id)
            .ok_or(GatewayError::NoMatchingRow)?;
        row.apply(patch);
        Ok(())
    }

    async fn delete_transaction(
        &self,
        id: &TransactionId,
        owner_id: &ProfileId,
    ) -> Result<(), GatewayError> {
        self.write()?;
        let mut tables = self.tables.borrow_mut();
        let before = tables.transactions.len();
        tables
            .transactions
            .retain(|tx| !(&tx.id == id && &tx.owner_id == owner_id));
        if tables.transactions.len() == before {
            return Err(GatewayError::NoMatchingRow);
        }
        Ok(())
    }

    async fn get_active_target(&self) -> Result<Target, GatewayError> {
        self.read()?;
        self.tables
            .borrow()
            .targets
            .iter()
            .min_by(|a, b| (a.updated_at, &a.id).cmp(&(b.updated_at, &b.id)))
            .cloned()
            .ok_or(GatewayError::NotFound { entity: "target" })
    }

    async fn insert_target(&self, target: &NewTarget) -> Result<Target, GatewayError> {
        self.write()?;
        let seq = self.next_id();
        let row = Target {
            id: TargetId::new(format!("target-{seq}")),
            owner_id: target.owner_id.clone(),
            target_amount: target.target_amount,
            target_months: target.target_months,
            start_date: target.start_date,
            updated_at: self.stamp(seq),
        };
        self.tables.borrow_mut().targets.push(row.clone());
        Ok(row)
    }

    async fn update_target(
        &self,
        id: &TargetId,
        patch: &TargetPatch,
    ) -> Result<(), GatewayError> {
        self.write()?;
        let mut tables = self.tables.borrow_mut();
        let row = tables
            .targets
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or(GatewayError::NotFound { entity: "target" })?;
        row.target_amount = patch.target_amount;
        row.target_months = patch.target_months;
        row.start_date = patch.start_date;
        row.updated_at = patch.updated_at;
        Ok(())
    }
}
