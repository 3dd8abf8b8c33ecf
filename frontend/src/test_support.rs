//! Shared fixtures for unit and integration tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::model::{
    Amount, OwnerDisplay, Profile, ProfileId, Transaction, TransactionId, TransactionKind,
};

/// Clock frozen at a chosen instant that tests can move forward.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_hours(&self, hours: i64) {
        *self.lock_clock() += TimeDelta::hours(hours);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

pub fn profile(id: &str, name: &str) -> Profile {
    Profile {
        id: ProfileId::new(id),
        name: name.to_owned(),
        color_token: "from-blue-500 to-blue-600".to_owned(),
        avatar: None,
    }
}

/// A stored transaction owned by `owner`, created at `created_at`.
pub fn transaction(
    id: &str,
    owner: &Profile,
    kind: TransactionKind,
    amount: i64,
    created_at: DateTime<Utc>,
) -> Transaction {
    let amount = match Amount::new(amount) {
        Ok(amount) => amount,
        Err(err) => panic!("fixture amount must be positive: {err}"),
    };
    Transaction {
        id: TransactionId::new(id),
        owner_id: owner.id.clone(),
        kind,
        amount,
        note: None,
        created_at,
        owner_display: Some(OwnerDisplay {
            name: owner.name.clone(),
            color_token: owner.color_token.clone(),
        }),
    }
}
