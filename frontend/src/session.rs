//! Session manager: keeps the chosen profile across reloads.
//!
//! A session is trusted in two phases. The local cache is read and checked
//! for shape and age first; a surviving entry is then verified against the
//! gateway before the profile is considered authenticated. Any failure along
//! the way purges the cache and routes the user back to login.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, ValidationError};
use crate::gateway::DataGateway;
use crate::model::{Profile, ProfileId};

/// Local storage key of the cached session.
pub const SESSION_KEY: &str = "fundlove_session";

/// Cached sessions older than this are discarded without asking the gateway.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("local storage is not available")]
    Unavailable,
    #[error("local storage write failed: {message}")]
    Write { message: String },
}

/// Key-value slot holding the serialized session.
pub trait SessionStorage {
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&self, raw: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// `window.localStorage` under a fixed key.
#[derive(Clone, Debug)]
pub struct BrowserStorage {
    key: &'static str,
}

impl BrowserStorage {
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }

    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|window| window.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

impl Default for BrowserStorage {
    fn default() -> Self {
        Self::new(SESSION_KEY)
    }
}

impl SessionStorage for BrowserStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(self.key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn write(&self, raw: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(self.key, raw)
            .map_err(|err| StorageError::Write {
                message: format!("{err:?}"),
            })
    }

    fn clear(&self) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(self.key)
            .map_err(|err| StorageError::Write {
                message: format!("{err:?}"),
            })
    }
}

/// Process-local slot; stands in for `localStorage` off the browser.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct MemoryStorage(std::cell::RefCell<Option<String>>);

#[cfg(any(test, feature = "test-support"))]
impl MemoryStorage {
    pub fn holding(raw: impl Into<String>) -> Self {
        Self(std::cell::RefCell::new(Some(raw.into())))
    }

    pub fn raw(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.0.borrow().clone())
    }

    fn write(&self, raw: &str) -> Result<(), StorageError> {
        *self.0.borrow_mut() = Some(raw.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.0.borrow_mut() = None;
        Ok(())
    }
}

/// Persisted record: `{"profile": {...}, "established_at": <unix millis>}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub profile: Profile,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.established_at < Duration::hours(SESSION_TTL_HOURS)
    }
}

/// `Unauthenticated → Validating → {Authenticated, Unauthenticated}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Validating,
    Authenticated(Profile),
}

impl AuthStatus {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            Self::Unauthenticated | Self::Validating => None,
        }
    }
}

pub struct SessionManager<S> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S: SessionStorage> SessionManager<S> {
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Phase one: a fresh, well-formed cache entry, or nothing.
    ///
    /// Absent entries are left alone; expired or malformed ones are purged.
    pub fn cached(&self) -> Option<Session> {
        let raw = match self.storage.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("cannot read cached session: {err}");
                return None;
            }
        };

        let session = match serde_json::from_str::<Session>(&raw) {
            Ok(session) => session,
            Err(err) => {
                log::warn!("discarding malformed cached session: {err}");
                self.purge();
                return None;
            }
        };

        if session.is_fresh(self.clock.utc()) {
            Some(session)
        } else {
            log::info!("cached session for {} expired", session.profile.id);
            self.purge();
            None
        }
    }

    /// Phase two: confirm the cached profile still exists remotely.
    pub async fn restore<G>(&self, gateway: &G) -> AuthStatus
    where
        G: DataGateway + ?Sized,
    {
        let Some(session) = self.cached() else {
            return AuthStatus::Unauthenticated;
        };

        match gateway.get_profile(&session.profile.id).await {
            Ok(profile) => {
                log::info!("restored session for {}", profile.name);
                AuthStatus::Authenticated(profile)
            }
            Err(err) => {
                log::warn!(
                    "cached profile {} failed verification: {err}",
                    session.profile.id
                );
                self.purge();
                AuthStatus::Unauthenticated
            }
        }
    }

    /// Verify the selection against the gateway and cache a fresh session.
    pub async fn login<G>(&self, gateway: &G, selected: Option<&ProfileId>) -> Result<Profile, Error>
    where
        G: DataGateway + ?Sized,
    {
        let id = selected.ok_or(ValidationError::EmptySelection)?;
        let profile = gateway.get_profile(id).await.map_err(|err| {
            log::error!("login verification for {id} failed: {err}");
            Error::from(err)
        })?;

        let session = Session {
            profile: profile.clone(),
            established_at: self.clock.utc(),
        };
        let raw = serde_json::to_string(&session).map_err(|err| Error::SessionStorage {
            message: err.to_string(),
        })?;
        self.storage.write(&raw)?;
        log::info!("{} logged in", profile.name);
        Ok(profile)
    }

    /// Drop the cached session. No gateway call is made.
    pub fn logout(&self) {
        self.purge();
    }

    fn purge(&self) {
        if let Err(err) = self.storage.clear() {
            log::warn!("cannot clear cached session: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::test_support::{profile, MutableClock};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn cached_raw(profile: &Profile, at: DateTime<Utc>) -> String {
        serde_json::to_string(&Session {
            profile: profile.clone(),
            established_at: at,
        })
        .expect("serialize session")
    }

    fn manager(storage: MemoryStorage, clock: &Arc<MutableClock>) -> SessionManager<MemoryStorage> {
        SessionManager::new(storage, clock.clone())
    }

    #[tokio::test]
    async fn fresh_session_with_existing_profile_is_restored() {
        let opang = profile("p-opang", "Opang");
        let gateway = InMemoryGateway::new().with_profiles([opang.clone()]);
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::holding(cached_raw(&opang, t0())), &clock);
        clock.advance_hours(23);

        let status = sessions.restore(&gateway).await;

        assert_eq!(status, AuthStatus::Authenticated(opang));
        assert!(sessions.storage().raw().is_some());
    }

    #[tokio::test]
    async fn expired_session_routes_to_login_without_gateway_call() {
        let opang = profile("p-opang", "Opang");
        let gateway = InMemoryGateway::new().with_profiles([opang.clone()]);
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::holding(cached_raw(&opang, t0())), &clock);
        clock.advance_hours(25);

        let status = sessions.restore(&gateway).await;

        assert_eq!(status, AuthStatus::Unauthenticated);
        assert_eq!(gateway.calls(), 0);
        assert!(sessions.storage().raw().is_none());
    }

    #[tokio::test]
    async fn session_for_vanished_profile_is_discarded() {
        let ghost = profile("p-ghost", "Ghost");
        let gateway = InMemoryGateway::new().with_profiles([profile("p-lia", "Lia")]);
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::holding(cached_raw(&ghost, t0())), &clock);

        let status = sessions.restore(&gateway).await;

        assert_eq!(status, AuthStatus::Unauthenticated);
        assert!(sessions.storage().raw().is_none());
    }

    #[tokio::test]
    async fn malformed_cache_is_purged() {
        let gateway = InMemoryGateway::new();
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::holding("{\"user\": 7"), &clock);

        assert_eq!(sessions.restore(&gateway).await, AuthStatus::Unauthenticated);
        assert!(sessions.storage().raw().is_none());
    }

    #[tokio::test]
    async fn gateway_outage_during_restore_discards_session() {
        let opang = profile("p-opang", "Opang");
        let gateway = InMemoryGateway::new().with_profiles([opang.clone()]);
        gateway.fail_reads(true);
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::holding(cached_raw(&opang, t0())), &clock);

        assert_eq!(sessions.restore(&gateway).await, AuthStatus::Unauthenticated);
        assert!(sessions.storage().raw().is_none());
    }

    #[tokio::test]
    async fn login_reverifies_and_stamps_the_cache() {
        let lia = profile("p-lia", "Lia");
        let gateway = InMemoryGateway::new().with_profiles([lia.clone()]);
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::default(), &clock);

        let logged_in = sessions
            .login(&gateway, Some(&lia.id))
            .await
            .expect("login succeeds");

        assert_eq!(logged_in, lia);
        let stored: Session =
            serde_json::from_str(&sessions.storage().raw().expect("cached")).expect("decode");
        assert_eq!(stored.established_at, t0());
        assert_eq!(stored.profile, lia);
    }

    #[tokio::test]
    async fn login_rejects_profiles_missing_from_gateway() {
        let gateway = InMemoryGateway::new();
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::default(), &clock);

        let error = sessions
            .login(&gateway, Some(&ProfileId::new("p-stale")))
            .await
            .expect_err("stale selection");

        assert!(matches!(error, Error::NotFound { .. }));
        assert!(sessions.storage().raw().is_none());
    }

    #[tokio::test]
    async fn login_requires_a_selection() {
        let gateway = InMemoryGateway::new();
        let clock = Arc::new(MutableClock::new(t0()));
        let sessions = manager(MemoryStorage::default(), &clock);

        let error = sessions.login(&gateway, None).await.expect_err("empty");
        assert_eq!(error, Error::Validation(ValidationError::EmptySelection));
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn logout_purges_cache() {
        let clock = Arc::new(MutableClock::new(t0()));
        let raw = cached_raw(&profile("p-lia", "Lia"), t0());
        let sessions = manager(MemoryStorage::holding(raw), &clock);

        sessions.logout();

        assert!(sessions.storage().raw().is_none());
        assert!(sessions.cached().is_none());
    }

    #[test]
    fn session_record_uses_millisecond_timestamps() {
        let raw = cached_raw(&profile("p-lia", "Lia"), t0());
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["established_at"], t0().timestamp_millis());
    }
}
