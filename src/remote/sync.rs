//! Remote-or-local sync adapter.
//!
//! Every logical operation runs the same state machine: attempt the remote
//! service; on `Unauthorized` stop and propagate (stale local data must never
//! mask a real auth problem); on `Unavailable` run the same-semantics
//! operation against the local [`ProfileStore`] exactly once. Results carry a
//! [`Source`] tag for diagnostics so callers can stay oblivious to which path
//! served them.

use std::fmt;

use log::{debug, warn};

use crate::engine::errors::EcoQuestError;
use crate::engine::rewards::{self, ActivityOutcome};
use crate::engine::store::ProfileStore;
use crate::engine::types::{ActivityKind, GardenItem, Profile, ProfilePatch};
use crate::remote::{GardenPurchase, RemoteApi, RemoteError};

/// Which path served a request. Diagnostics only; UI logic must not branch on
/// it beyond optional display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Local,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Remote => write!(f, "remote"),
            Source::Local => write!(f, "local"),
        }
    }
}

/// An operation result plus the path that produced it.
#[derive(Debug, Clone)]
pub struct Synced<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Synced<T> {
    fn remote(value: T) -> Self {
        Self {
            value,
            source: Source::Remote,
        }
    }

    fn local(value: T) -> Self {
        Self {
            value,
            source: Source::Local,
        }
    }
}

/// Tries the remote service first, falling back to the local profile store
/// when the remote is unreachable. Remote and local accounts are mutually
/// exclusive data domains: state written on one path is not reconciled with
/// the other.
pub struct SyncAdapter<R: RemoteApi> {
    remote: Option<R>,
    store: ProfileStore,
}

impl<R: RemoteApi> SyncAdapter<R> {
    pub fn new(remote: R, store: ProfileStore) -> Self {
        Self {
            remote: Some(remote),
            store,
        }
    }

    /// Adapter that never touches the network (remote disabled in config).
    pub fn local_only(store: ProfileStore) -> Self {
        Self {
            remote: None,
            store,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn remote(&self) -> Option<&R> {
        self.remote.as_ref()
    }

    /// Resolve the local account for a fallback. When the operation got here
    /// because the remote was down and there is no local session either, the
    /// transport failure is the error worth reporting.
    fn fallback_username(&self, remote_down: Option<String>) -> Result<String, EcoQuestError> {
        match (self.store.active_username()?, remote_down) {
            (Some(username), _) => Ok(username),
            (None, Some(reason)) => Err(EcoQuestError::RemoteUnavailable(reason)),
            (None, None) => Err(EcoQuestError::NotFound("active session".to_string())),
        }
    }

    /// Persist the remote bearer token so later processes can resume.
    fn persist_token(&self) -> Result<(), EcoQuestError> {
        if let Some(token) = self.remote.as_ref().and_then(|r| r.token()) {
            self.store.set_token(token)?;
        }
        Ok(())
    }

    fn on_unauthorized(&mut self) -> EcoQuestError {
        if let Some(remote) = self.remote.as_mut() {
            remote.forget_session();
        }
        if let Err(e) = self.store.clear_token() {
            warn!("failed to clear persisted token: {}", e);
        }
        EcoQuestError::Unauthorized
    }

    pub async fn signup(
        &mut self,
        username: &str,
        password: &str,
        avatar: &str,
    ) -> Result<Synced<Profile>, EcoQuestError> {
        if let Some(remote) = self.remote.as_mut() {
            match remote.signup(username, password, avatar).await {
                Ok(profile) => {
                    self.persist_token()?;
                    debug!("signup served remotely for {}", username);
                    return Ok(Synced::remote(profile));
                }
                Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                Err(RemoteError::Unavailable(reason)) => {
                    warn!("remote signup unavailable ({}); using local store", reason);
                }
            }
        }
        let profile = self.store.create(username, password, avatar)?;
        self.store.set_active_username(username)?;
        Ok(Synced::local(profile))
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Synced<Profile>, EcoQuestError> {
        if let Some(remote) = self.remote.as_mut() {
            match remote.login(username, password).await {
                Ok(profile) => {
                    self.persist_token()?;
                    debug!("login served remotely for {}", username);
                    return Ok(Synced::remote(profile));
                }
                Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                Err(RemoteError::Unavailable(reason)) => {
                    warn!("remote login unavailable ({}); using local store", reason);
                }
            }
        }
        let profile = self.store.authenticate(username, password)?;
        self.store.set_active_username(username)?;
        Ok(Synced::local(profile))
    }

    pub async fn fetch_profile(&mut self) -> Result<Synced<Profile>, EcoQuestError> {
        let mut remote_down = None;
        if let Some(remote) = self.remote.as_mut() {
            if remote.is_authenticated() {
                match remote.fetch_profile().await {
                    Ok(profile) => return Ok(Synced::remote(profile)),
                    // A 401 here means the token expired: never consult the
                    // local store, force a fresh login instead.
                    Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                    Err(RemoteError::Unavailable(reason)) => {
                        warn!("remote profile fetch unavailable ({}); using local store", reason);
                        remote_down = Some(reason);
                    }
                }
            }
        }
        let username = self.fallback_username(remote_down)?;
        Ok(Synced::local(self.store.get(&username)?))
    }

    pub async fn apply_patch(
        &mut self,
        patch: &ProfilePatch,
    ) -> Result<Synced<Profile>, EcoQuestError> {
        let mut remote_down = None;
        if let Some(remote) = self.remote.as_mut() {
            if remote.is_authenticated() {
                match remote.update_profile(patch).await {
                    Ok(profile) => return Ok(Synced::remote(profile)),
                    Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                    Err(RemoteError::Unavailable(reason)) => {
                        warn!("remote profile update unavailable ({}); using local store", reason);
                        remote_down = Some(reason);
                    }
                }
            }
        }
        let username = self.fallback_username(remote_down)?;
        Ok(Synced::local(self.store.apply_patch(&username, patch)?))
    }

    /// Record a passed lesson/story/challenge. Callers gate on the pass
    /// condition; failed attempts never reach the adapter.
    pub async fn complete_activity(
        &mut self,
        kind: ActivityKind,
        item_id: &str,
        score: u32,
        xp_value: u32,
    ) -> Result<Synced<(Profile, ActivityOutcome)>, EcoQuestError> {
        let mut remote_down = None;
        if let Some(remote) = self.remote.as_mut() {
            if remote.is_authenticated() {
                match remote.complete_item(kind, item_id, score, xp_value).await {
                    Ok(report) => {
                        let outcome = ActivityOutcome {
                            rewarded: report.rewarded,
                            leveled_up: report.leveled_up,
                        };
                        return Ok(Synced::remote((report.profile, outcome)));
                    }
                    Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                    Err(RemoteError::Unavailable(reason)) => {
                        warn!("remote completion unavailable ({}); using local store", reason);
                        remote_down = Some(reason);
                    }
                }
            }
        }
        let username = self.fallback_username(remote_down)?;
        let (profile, outcome) = self.store.update(&username, |p| {
            Ok(rewards::complete_activity(p, kind, item_id, xp_value, true))
        })?;
        Ok(Synced::local((profile, outcome)))
    }

    /// Record a finished mini-game session; grants only on a win.
    pub async fn complete_game(
        &mut self,
        game_id: &str,
        score: u32,
        xp_if_won: u32,
        won: bool,
    ) -> Result<Synced<(Profile, ActivityOutcome)>, EcoQuestError> {
        let xp_earned = if won { xp_if_won } else { 0 };
        let mut remote_down = None;
        if let Some(remote) = self.remote.as_mut() {
            if remote.is_authenticated() {
                match remote.complete_game(game_id, score, xp_earned).await {
                    Ok(report) => {
                        let outcome = ActivityOutcome {
                            rewarded: report.rewarded,
                            leveled_up: report.leveled_up,
                        };
                        return Ok(Synced::remote((report.profile, outcome)));
                    }
                    Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                    Err(RemoteError::Unavailable(reason)) => {
                        warn!("remote game result unavailable ({}); using local store", reason);
                        remote_down = Some(reason);
                    }
                }
            }
        }
        let username = self.fallback_username(remote_down)?;
        let (profile, outcome) = self
            .store
            .update(&username, |p| Ok(rewards::complete_game(p, xp_if_won, won)))?;
        Ok(Synced::local((profile, outcome)))
    }

    /// Buy a garden item. Funds are validated by the caller against the
    /// current snapshot before any network round-trip, and revalidated by
    /// whichever store executes the purchase.
    pub async fn buy_garden_item(
        &mut self,
        item: &GardenItem,
    ) -> Result<Synced<GardenPurchase>, EcoQuestError> {
        let mut remote_down = None;
        if let Some(remote) = self.remote.as_mut() {
            if remote.is_authenticated() {
                match remote.buy_garden_item(item).await {
                    Ok(purchase) => return Ok(Synced::remote(purchase)),
                    Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                    Err(RemoteError::Unavailable(reason)) => {
                        warn!("remote purchase unavailable ({}); using local store", reason);
                        remote_down = Some(reason);
                    }
                }
            }
        }
        let username = self.fallback_username(remote_down)?;
        let (profile, _) = self.store.update(&username, |p| {
            rewards::purchase_garden_item(p, item, chrono::Utc::now())
        })?;
        Ok(Synced::local(GardenPurchase {
            eco_coins: profile.eco_coins,
            garden: profile.garden,
        }))
    }

    /// Persist a freshly earned achievement id (union, never replace).
    pub async fn earn_achievement(
        &mut self,
        achievement_id: &str,
    ) -> Result<Synced<()>, EcoQuestError> {
        let mut remote_down = None;
        if let Some(remote) = self.remote.as_mut() {
            if remote.is_authenticated() {
                match remote.earn_achievement(achievement_id).await {
                    Ok(()) => return Ok(Synced::remote(())),
                    Err(RemoteError::Unauthorized) => return Err(self.on_unauthorized()),
                    Err(RemoteError::Unavailable(reason)) => {
                        warn!("remote achievement unavailable ({}); using local store", reason);
                        remote_down = Some(reason);
                    }
                }
            }
        }
        let username = self.fallback_username(remote_down)?;
        self.store.update(&username, |p| {
            p.achievements.insert(achievement_id.to_string());
            Ok(())
        })?;
        Ok(Synced::local(()))
    }

    /// Clear the active pointer and any session token. The stored profile
    /// record is never deleted.
    pub fn end_session(&mut self) -> Result<(), EcoQuestError> {
        if let Some(remote) = self.remote.as_mut() {
            remote.forget_session();
        }
        self.store.clear_token()?;
        self.store.clear_active_username()?;
        Ok(())
    }
}
