//! Application controller: sole owner of dashboard state.
//!
//! Every mutation is validated locally, sent to the gateway, and followed by a
//! full re-fetch. Derived values are only ever computed from fetched rows, so
//! a failed write leaves the previous state untouched.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;

use crate::error::{Error, ValidationError};
use crate::gateway::DataGateway;
use crate::ledger::{Ledger, LedgerTotals};
use crate::model::{
    Amount, NewTarget, NewTransaction, Profile, TargetPatch, Transaction, TransactionId,
    TransactionKind, TransactionPatch,
};
use crate::target::{GoalSettings, TargetProgress, TargetSettings};

#[derive(Clone, Debug, PartialEq)]
struct AppState {
    ledger: Ledger,
    target: TargetSettings,
    loaded: bool,
}

/// Read-only view of the dashboard handed to the view layer.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardSnapshot {
    pub profile: Profile,
    pub balance: i64,
    pub totals: LedgerTotals,
    pub recent: Vec<Transaction>,
    pub transaction_count: usize,
    pub target: TargetSettings,
    pub progress: TargetProgress,
    pub today: NaiveDate,
    /// False until the first refresh completes.
    pub loaded: bool,
}

impl DashboardSnapshot {
    pub fn can_modify(&self, transaction: &Transaction) -> bool {
        transaction.is_owned_by(&self.profile.id)
    }
}

pub struct AppController<G: ?Sized> {
    gateway: Rc<G>,
    clock: Arc<dyn Clock>,
    profile: Profile,
    state: RefCell<AppState>,
}

impl<G> AppController<G>
where
    G: DataGateway + ?Sized,
{
    pub fn new(gateway: Rc<G>, clock: Arc<dyn Clock>, profile: Profile) -> Self {
        let today = clock.utc().date_naive();
        Self {
            gateway,
            clock,
            profile,
            state: RefCell::new(AppState {
                ledger: Ledger::default(),
                target: TargetSettings::default_from(today),
                loaded: false,
            }),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.borrow();
        let now = self.now();
        let balance = state.ledger.balance();
        DashboardSnapshot {
            profile: self.profile.clone(),
            balance,
            totals: state.ledger.totals(),
            recent: state.ledger.recent().to_vec(),
            transaction_count: state.ledger.len(),
            target: state.target.clone(),
            progress: state.target.progress(balance, now),
            today: now.date_naive(),
            loaded: state.loaded,
        }
    }

    /// Re-fetch transactions and the active target.
    ///
    /// Read failures are logged and degrade to safe values: the previous
    /// transaction list, and the default goal for the target.
    pub async fn refresh(&self) {
        let transactions = self.gateway.list_transactions().await;
        let target = self.gateway.get_active_target().await;
        let today = self.now().date_naive();

        let mut state = self.state.borrow_mut();
        match transactions {
            Ok(rows) => state.ledger = Ledger::new(rows),
            Err(err) => log::error!("failed to load transactions: {err}"),
        }
        state.target = match target {
            Ok(target) => TargetSettings::from(&target),
            Err(err) if err.is_not_found() => {
                log::debug!("no target saved yet, using default goal");
                TargetSettings::default_from(today)
            }
            Err(err) => {
                log::error!("failed to load target: {err}");
                TargetSettings::default_from(today)
            }
        };
        state.loaded = true;
    }

    pub async fn add_transaction(
        &self,
        kind: TransactionKind,
        amount: Amount,
        note: Option<String>,
    ) -> Result<(), Error> {
        if kind == TransactionKind::Withdraw {
            self.state.borrow().ledger.check_withdrawal(amount)?;
        }

        let new = NewTransaction::new(self.profile.id.clone(), kind, amount, note);
        self.gateway.insert_transaction(&new).await.map_err(|err| {
            log::error!("failed to add {} of {}: {err}", kind.as_str(), amount.get());
            Error::from(err)
        })?;
        log::info!("{} added {} of {}", self.profile.name, kind.as_str(), amount.get());
        self.refresh().await;
        Ok(())
    }

    /// Change kind, amount or note of one of the acting profile's entries.
    pub async fn update_transaction(
        &self,
        id: &TransactionId,
        patch: TransactionPatch,
    ) -> Result<(), Error> {
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }
        self.state
            .borrow()
            .ledger
            .authorize(id, &self.profile.id)
            .map(|_| ())?;

        self.gateway
            .update_transaction(id, &self.profile.id, &patch)
            .await
            .map_err(|err| {
                log::error!("failed to update transaction {id}: {err}");
                Error::from_scoped_write(err, id)
            })?;
        self.refresh().await;
        Ok(())
    }

    pub async fn delete_transaction(&self, id: &TransactionId) -> Result<(), Error> {
        self.state
            .borrow()
            .ledger
            .authorize(id, &self.profile.id)
            .map(|_| ())?;

        self.gateway
            .delete_transaction(id, &self.profile.id)
            .await
            .map_err(|err| {
                log::error!("failed to delete transaction {id}: {err}");
                Error::from_scoped_write(err, id)
            })?;
        self.refresh().await;
        Ok(())
    }

    /// Persist a new goal and restart its countdown from today.
    pub async fn save_settings(&self, goal: GoalSettings) -> Result<(), Error> {
        let now = self.now();
        let today = now.date_naive();
        let existing = self.state.borrow().target.id.clone();

        let result = match existing {
            Some(id) => {
                let patch = TargetPatch {
                    target_amount: goal.target_amount(),
                    target_months: goal.target_months(),
                    start_date: today,
                    updated_at: now,
                };
                self.gateway.update_target(&id, &patch).await
            }
            None => {
                let new = NewTarget {
                    owner_id: self.profile.id.clone(),
                    target_amount: goal.target_amount(),
                    target_months: goal.target_months(),
                    start_date: today,
                };
                self.gateway.insert_target(&new).await.map(|_| ())
            }
        };
        result.map_err(|err| {
            log::error!("failed to save target settings: {err}");
            Error::from(err)
        })?;
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::ledger::RECENT_LIMIT;
    use crate::model::{ProfileId, Target, TargetId};
    use crate::target::DEFAULT_TARGET_AMOUNT;
    use crate::test_support::{profile, transaction, MutableClock};
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    struct Harness {
        gateway: Rc<InMemoryGateway>,
        clock: Arc<MutableClock>,
        opang: Profile,
        lia: Profile,
    }

    impl Harness {
        fn controller_for(&self, profile: &Profile) -> AppController<InMemoryGateway> {
            AppController::new(self.gateway.clone(), self.clock.clone(), profile.clone())
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let opang = profile("p-opang", "Opang");
        let lia = profile("p-lia", "Lia");
        let gateway = InMemoryGateway::new().with_profiles([opang.clone(), lia.clone()]);
        let base = now() - Duration::days(10);
        gateway.push_transaction(transaction(
            "t1",
            &opang,
            TransactionKind::Deposit,
            500_000,
            base,
        ));
        gateway.push_transaction(transaction(
            "t2",
            &lia,
            TransactionKind::Withdraw,
            200_000,
            base + Duration::hours(1),
        ));
        gateway.push_transaction(transaction(
            "t3",
            &opang,
            TransactionKind::Deposit,
            100_000,
            base + Duration::hours(2),
        ));
        Harness {
            gateway: Rc::new(gateway),
            clock: Arc::new(MutableClock::new(now())),
            opang,
            lia,
        }
    }

    fn amount(value: i64) -> Amount {
        Amount::new(value).expect("positive amount")
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_derives_balance_and_default_goal(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        assert!(!controller.snapshot().loaded);

        controller.refresh().await;
        let snapshot = controller.snapshot();

        assert!(snapshot.loaded);
        assert_eq!(snapshot.balance, 400_000);
        assert_eq!(snapshot.recent.first().map(|t| t.id.as_str()), Some("t3"));
        assert_eq!(snapshot.target.id, None);
        assert_eq!(snapshot.target.target_amount, DEFAULT_TARGET_AMOUNT);
        assert_eq!(snapshot.progress.remaining_amount, DEFAULT_TARGET_AMOUNT - 400_000);
    }

    #[rstest]
    #[tokio::test]
    async fn deposit_is_reflected_after_refetch(harness: Harness) {
        let controller = harness.controller_for(&harness.lia);
        controller.refresh().await;

        controller
            .add_transaction(TransactionKind::Deposit, amount(50_000), Some("jajan".into()))
            .await
            .expect("deposit succeeds");

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.balance, 450_000);
        assert_eq!(snapshot.transaction_count, 4);
        let newest = snapshot.recent.first().expect("new row listed");
        assert_eq!(newest.owner_id, harness.lia.id);
        assert_eq!(newest.owner_name(), "Lia");
    }

    #[rstest]
    #[tokio::test]
    async fn overdrawn_withdrawal_never_reaches_gateway(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;
        let calls = harness.gateway.calls();

        let error = controller
            .add_transaction(TransactionKind::Withdraw, amount(400_001), None)
            .await
            .expect_err("more than saved");

        assert!(error.is_validation());
        assert_eq!(harness.gateway.calls(), calls);
        assert_eq!(controller.snapshot().balance, 400_000);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_write_leaves_state_unchanged(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;
        let before = controller.snapshot();
        harness.gateway.fail_writes(true);

        let error = controller
            .add_transaction(TransactionKind::Deposit, amount(1_000), None)
            .await
            .expect_err("write fails");

        assert!(matches!(error, Error::GatewayUnavailable { .. }));
        assert_eq!(controller.snapshot(), before);
    }

    #[rstest]
    #[tokio::test]
    async fn editing_another_profiles_entry_is_rejected_locally(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;
        let calls = harness.gateway.calls();

        let patch = TransactionPatch {
            amount: Some(amount(1)),
            ..TransactionPatch::default()
        };
        let error = controller
            .update_transaction(&TransactionId::new("t2"), patch)
            .await
            .expect_err("lia owns t2");

        assert_eq!(
            error,
            Error::AuthorizationMismatch {
                transaction_id: TransactionId::new("t2"),
            }
        );
        assert_eq!(harness.gateway.calls(), calls);
        assert_eq!(controller.snapshot().balance, 400_000);
    }

    #[rstest]
    #[tokio::test]
    async fn edit_changes_only_kind_amount_and_note(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;

        let patch = TransactionPatch {
            kind: Some(TransactionKind::Withdraw),
            amount: Some(amount(100_000)),
            note: Some("salah input".into()),
        };
        controller
            .update_transaction(&TransactionId::new("t3"), patch)
            .await
            .expect("owner may edit");

        let snapshot = controller.snapshot();
        let edited = snapshot
            .recent
            .iter()
            .find(|t| t.id.as_str() == "t3")
            .expect("row kept its id");
        assert_eq!(edited.owner_id, harness.opang.id);
        assert_eq!(edited.kind, TransactionKind::Withdraw);
        assert_eq!(edited.note.as_deref(), Some("salah input"));
        assert_eq!(snapshot.balance, 200_000);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_edit_is_a_validation_error(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;

        let error = controller
            .update_transaction(&TransactionId::new("t3"), TransactionPatch::default())
            .await
            .expect_err("nothing to change");
        assert_eq!(error, Error::Validation(ValidationError::EmptyPatch));
    }

    #[rstest]
    #[tokio::test]
    async fn stale_delete_surfaces_gateway_mismatch(harness: Harness) {
        let first = harness.controller_for(&harness.opang);
        let stale = harness.controller_for(&harness.opang);
        first.refresh().await;
        stale.refresh().await;

        first
            .delete_transaction(&TransactionId::new("t1"))
            .await
            .expect("delete succeeds");
        let error = stale
            .delete_transaction(&TransactionId::new("t1"))
            .await
            .expect_err("row already gone");

        assert!(matches!(error, Error::AuthorizationMismatch { .. }));
        assert_eq!(stale.snapshot().balance, 400_000);
        assert_eq!(first.snapshot().balance, -100_000);
    }

    #[rstest]
    #[tokio::test]
    async fn saving_settings_creates_then_restarts_the_goal(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;

        let goal = GoalSettings::new(1_000_000, 6).expect("valid goal");
        controller.save_settings(goal).await.expect("insert target");
        let created = controller.snapshot();
        assert!(created.target.id.is_some());
        assert_eq!(created.target.start_date, now().date_naive());
        assert_eq!(created.progress.remaining_amount, 600_000);

        harness.clock.advance_hours(24 * 40);
        let goal = GoalSettings::new(2_000_000, 3).expect("valid goal");
        controller.save_settings(goal).await.expect("update target");

        let updated = controller.snapshot();
        assert_eq!(updated.target.id, created.target.id);
        assert_eq!(updated.target.target_months, 3);
        assert_eq!(
            updated.target.start_date,
            (now() + Duration::days(40)).date_naive()
        );
        assert_eq!(harness.gateway.targets().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn least_recently_updated_target_wins(harness: Harness) {
        let older = Target {
            id: TargetId::new("b-target"),
            owner_id: harness.lia.id.clone(),
            target_amount: 3_000_000,
            target_months: 12,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            updated_at: now() - Duration::days(30),
        };
        let newer = Target {
            id: TargetId::new("a-target"),
            updated_at: now() - Duration::days(1),
            ..older.clone()
        };
        harness.gateway.push_target(newer);
        harness.gateway.push_target(older);
        let controller = harness.controller_for(&harness.opang);

        controller.refresh().await;

        assert_eq!(
            controller.snapshot().target.id,
            Some(TargetId::new("b-target"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn read_outage_keeps_ledger_and_defaults_goal(harness: Harness) {
        let controller = harness.controller_for(&harness.opang);
        controller.refresh().await;
        harness.gateway.fail_reads(true);

        controller.refresh().await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.balance, 400_000);
        assert_eq!(snapshot.target.target_amount, DEFAULT_TARGET_AMOUNT);
    }

    #[rstest]
    #[tokio::test]
    async fn display_page_is_capped(harness: Harness) {
        for i in 0..15 {
            harness.gateway.push_transaction(transaction(
                &format!("bulk-{i}"),
                &harness.lia,
                TransactionKind::Deposit,
                1_000,
                now() - Duration::minutes(i),
            ));
        }
        let controller = harness.controller_for(&harness.lia);

        controller.refresh().await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.recent.len(), RECENT_LIMIT);
        assert_eq!(snapshot.transaction_count, 18);
        assert_eq!(snapshot.balance, 415_000);
        assert!(snapshot.can_modify(&snapshot.recent[0]));
        assert!(!snapshot.recent.iter().any(|t| t.owner_id == ProfileId::new("p-opang")));
    }
}
