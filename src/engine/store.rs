//! Sled-backed profile store: the canonical local record of every user's
//! progression, and the only durable state when the remote service is
//! unreachable.
//!
//! All reads deserialize a fresh copy, so callers get snapshot isolation for
//! free: mutating a returned `Profile` never touches the stored record.
//! Mutations go through [`ProfileStore::update`], a single read-modify-write
//! call, so the UI layer never observes a half-applied change.

use std::path::{Path, PathBuf};

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sled::IVec;

use crate::engine::errors::EcoQuestError;
use crate::engine::types::{
    Profile, ProfilePatch, ProfileRecord, PROFILE_SCHEMA_VERSION,
};

const TREE_PROFILES: &str = "ecoquest_profiles";
const TREE_SESSION: &str = "ecoquest_session";

const KEY_ACTIVE_USERNAME: &[u8] = b"active_username";
const KEY_BEARER_TOKEN: &[u8] = b"bearer_token";

/// Helper builder so tests can easily create throwaway stores with custom
/// paths and cheap hashing parameters.
pub struct ProfileStoreBuilder {
    path: PathBuf,
    argon2_params: Option<Params>,
}

impl ProfileStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            argon2_params: None,
        }
    }

    /// Override Argon2id parameters (e.g. low-memory settings from config,
    /// or minimal cost in tests).
    pub fn with_argon2_params(mut self, params: Params) -> Self {
        self.argon2_params = Some(params);
        self
    }

    pub fn open(self) -> Result<ProfileStore, EcoQuestError> {
        ProfileStore::open_with_params(self.path, self.argon2_params)
    }
}

/// Sled-backed persistence for EcoQuest profiles and the active-session
/// pointer/token.
pub struct ProfileStore {
    _db: sled::Db,
    profiles: sled::Tree,
    session: sled::Tree,
    argon2: Argon2<'static>,
}

impl ProfileStore {
    /// Open (or create) the profile store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EcoQuestError> {
        Self::open_with_params(path, None)
    }

    fn open_with_params<P: AsRef<Path>>(
        path: P,
        params: Option<Params>,
    ) -> Result<Self, EcoQuestError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let profiles = db.open_tree(TREE_PROFILES)?;
        let session = db.open_tree(TREE_SESSION)?;
        let argon2 = match params {
            Some(p) => Argon2::new(Algorithm::Argon2id, Version::V0x13, p),
            None => Argon2::default(),
        };
        Ok(Self {
            _db: db,
            profiles,
            session,
            argon2,
        })
    }

    // Usernames are case-sensitive identities: "Luna" and "luna" are
    // distinct accounts.
    fn profile_key(username: &str) -> Vec<u8> {
        format!("profiles:{}", username).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, EcoQuestError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, EcoQuestError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn get_record(&self, username: &str) -> Result<ProfileRecord, EcoQuestError> {
        let key = Self::profile_key(username);
        let Some(bytes) = self.profiles.get(&key)? else {
            return Err(EcoQuestError::NotFound(format!("profile: {}", username)));
        };
        let record: ProfileRecord = Self::deserialize(bytes)?;
        if record.schema_version != PROFILE_SCHEMA_VERSION {
            return Err(EcoQuestError::SchemaMismatch {
                entity: "profile",
                expected: PROFILE_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn put_record(&self, mut record: ProfileRecord) -> Result<(), EcoQuestError> {
        record.schema_version = PROFILE_SCHEMA_VERSION;
        let key = Self::profile_key(&record.profile.username);
        let bytes = Self::serialize(&record)?;
        self.profiles.insert(key, bytes)?;
        self.profiles.flush()?;
        Ok(())
    }

    /// Create a new profile with the standard starting state. Fails with
    /// `DuplicateUsername` when the exact username already exists.
    pub fn create(
        &self,
        username: &str,
        password: &str,
        avatar: &str,
    ) -> Result<Profile, EcoQuestError> {
        let key = Self::profile_key(username);
        if self.profiles.contains_key(&key)? {
            return Err(EcoQuestError::DuplicateUsername(username.to_string()));
        }
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| EcoQuestError::Hash(e.to_string()))?;
        let record = ProfileRecord {
            profile: Profile::new(username, avatar),
            password_hash: hash.to_string(),
            schema_version: PROFILE_SCHEMA_VERSION,
        };
        let profile = record.profile.clone();
        self.put_record(record)?;
        Ok(profile)
    }

    /// Verify credentials and return a profile snapshot. Unknown users and
    /// wrong passwords are indistinguishable to the caller.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Profile, EcoQuestError> {
        let record = match self.get_record(username) {
            Ok(record) => record,
            Err(EcoQuestError::NotFound(_)) => return Err(EcoQuestError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|e| EcoQuestError::Hash(format!("corrupt password hash: {}", e)))?;
        if self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(EcoQuestError::InvalidCredentials);
        }
        Ok(record.profile)
    }

    /// Fetch a profile snapshot by username.
    pub fn get(&self, username: &str) -> Result<Profile, EcoQuestError> {
        Ok(self.get_record(username)?.profile)
    }

    /// List all stored usernames.
    pub fn list_usernames(&self) -> Result<Vec<String>, EcoQuestError> {
        let mut ids = Vec::new();
        for entry in self.profiles.scan_prefix(b"profiles:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(username) = text.strip_prefix("profiles:") {
                ids.push(username.to_string());
            }
        }
        Ok(ids)
    }

    /// Shallow-merge `patch` into the stored record and return the updated
    /// snapshot. Collection fields present in the patch replace wholesale.
    pub fn apply_patch(
        &self,
        username: &str,
        patch: &ProfilePatch,
    ) -> Result<Profile, EcoQuestError> {
        let (profile, _) = self.update(username, |profile| {
            patch.apply(profile);
            Ok(())
        })?;
        Ok(profile)
    }

    /// Read-modify-write as a single store call. When `f` errors the stored
    /// record is left untouched, which is what makes engine-level failures
    /// (e.g. insufficient funds) mutation-free.
    pub fn update<R>(
        &self,
        username: &str,
        f: impl FnOnce(&mut Profile) -> Result<R, EcoQuestError>,
    ) -> Result<(Profile, R), EcoQuestError> {
        let mut record = self.get_record(username)?;
        let out = f(&mut record.profile)?;
        record.profile.touch();
        let profile = record.profile.clone();
        self.put_record(record)?;
        Ok((profile, out))
    }

    /// Overwrite the last-active timestamp directly, bypassing the re-stamp
    /// that [`ProfileStore::update`] performs. Used when restoring state or
    /// simulating a past activity day (streak cadence checks).
    pub fn set_last_active(
        &self,
        username: &str,
        when: DateTime<Utc>,
    ) -> Result<Profile, EcoQuestError> {
        let mut record = self.get_record(username)?;
        record.profile.last_active = when;
        let profile = record.profile.clone();
        self.put_record(record)?;
        Ok(profile)
    }

    /// Record which local account is the active session.
    pub fn set_active_username(&self, username: &str) -> Result<(), EcoQuestError> {
        self.session
            .insert(KEY_ACTIVE_USERNAME, username.as_bytes())?;
        self.session.flush()?;
        Ok(())
    }

    pub fn active_username(&self) -> Result<Option<String>, EcoQuestError> {
        Ok(self
            .session
            .get(KEY_ACTIVE_USERNAME)?
            .map(|v| String::from_utf8_lossy(&v).to_string()))
    }

    /// Logout clears the active pointer; the profile record itself stays.
    pub fn clear_active_username(&self) -> Result<(), EcoQuestError> {
        self.session.remove(KEY_ACTIVE_USERNAME)?;
        self.session.flush()?;
        Ok(())
    }

    /// Stash the remote bearer token so CLI invocations can resume a remote
    /// session.
    pub fn set_token(&self, token: &str) -> Result<(), EcoQuestError> {
        self.session.insert(KEY_BEARER_TOKEN, token.as_bytes())?;
        self.session.flush()?;
        Ok(())
    }

    pub fn token(&self) -> Result<Option<String>, EcoQuestError> {
        Ok(self
            .session
            .get(KEY_BEARER_TOKEN)?
            .map(|v| String::from_utf8_lossy(&v).to_string()))
    }

    pub fn clear_token(&self) -> Result<(), EcoQuestError> {
        self.session.remove(KEY_BEARER_TOKEN)?;
        self.session.flush()?;
        Ok(())
    }
}

/// Minimal-cost Argon2 parameters for tests. Never use outside tests.
pub fn insecure_test_params() -> Params {
    Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
        .expect("valid minimal argon2 params")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> ProfileStore {
        ProfileStoreBuilder::new(dir.path())
            .with_argon2_params(insecure_test_params())
            .open()
            .expect("store")
    }

    #[test]
    fn create_then_get_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        let created = store.create("luna", "wildflowers", "🌱").expect("create");
        let fetched = store.get("luna").expect("get");
        assert_eq!(fetched, created);
        assert_eq!(fetched.eco_coins, 50);
    }

    #[test]
    fn duplicate_username_is_rejected_exactly() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "pw1", "🌱").unwrap();
        let err = store.create("luna", "pw2", "🌊").unwrap_err();
        assert!(matches!(err, EcoQuestError::DuplicateUsername(_)));
        // Different case is a different account.
        store.create("Luna", "pw3", "🦉").unwrap();
        assert_eq!(store.list_usernames().unwrap().len(), 2);
    }

    #[test]
    fn authenticate_hides_unknown_user_from_wrong_password() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "wildflowers", "🌱").unwrap();

        assert!(store.authenticate("luna", "wildflowers").is_ok());
        let wrong = store.authenticate("luna", "nope").unwrap_err();
        let unknown = store.authenticate("ghost", "nope").unwrap_err();
        assert!(matches!(wrong, EcoQuestError::InvalidCredentials));
        assert!(matches!(unknown, EcoQuestError::InvalidCredentials));
    }

    #[test]
    fn password_is_stored_hashed_not_verbatim() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "wildflowers", "🌱").unwrap();
        let record = store.get_record("luna").unwrap();
        assert_ne!(record.password_hash, "wildflowers");
        assert!(record.password_hash.starts_with("$argon2"));
    }

    #[test]
    fn reads_are_snapshots() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "pw", "🌱").unwrap();
        let mut snapshot = store.get("luna").unwrap();
        snapshot.eco_coins = 9999;
        snapshot.achievements.insert("a1".to_string());
        let fresh = store.get("luna").unwrap();
        assert_eq!(fresh.eco_coins, 50);
        assert!(fresh.achievements.is_empty());
    }

    #[test]
    fn update_is_atomic_on_failure() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "pw", "🌱").unwrap();
        let result: Result<(Profile, ()), _> = store.update("luna", |p| {
            p.eco_coins = 0;
            Err(EcoQuestError::InsufficientFunds)
        });
        assert!(result.is_err());
        assert_eq!(store.get("luna").unwrap().eco_coins, 50);
    }

    #[test]
    fn apply_patch_overwrites_fields_shallowly() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "pw", "🌱").unwrap();
        let patch = ProfilePatch {
            avatar: Some("🐬".to_string()),
            streak: Some(7),
            ..Default::default()
        };
        let updated = store.apply_patch("luna", &patch).unwrap();
        assert_eq!(updated.avatar, "🐬");
        assert_eq!(updated.streak, 7);
        assert_eq!(updated.eco_coins, 50);
    }

    #[test]
    fn set_last_active_survives_the_automatic_restamp() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.create("luna", "pw", "🌱").unwrap();

        let yesterday = Utc::now() - chrono::Duration::days(1);
        let profile = store.set_last_active("luna", yesterday).unwrap();
        assert_eq!(profile.last_active, yesterday);
        assert_eq!(store.get("luna").unwrap().last_active, yesterday);

        // A regular update re-stamps to now again.
        store.update("luna", |_| Ok(())).unwrap();
        assert!(store.get("luna").unwrap().last_active > yesterday);
    }

    #[test]
    fn active_pointer_and_token_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        assert!(store.active_username().unwrap().is_none());
        store.set_active_username("luna").unwrap();
        store.set_token("jwt-abc").unwrap();
        assert_eq!(store.active_username().unwrap().as_deref(), Some("luna"));
        assert_eq!(store.token().unwrap().as_deref(), Some("jwt-abc"));
        store.clear_active_username().unwrap();
        store.clear_token().unwrap();
        assert!(store.active_username().unwrap().is_none());
        assert!(store.token().unwrap().is_none());
    }

    #[test]
    fn store_survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = open_store(&dir);
            store.create("luna", "pw", "🌱").unwrap();
            store
                .update("luna", |p| {
                    p.xp = 120;
                    p.level = 2;
                    Ok(())
                })
                .unwrap();
        }
        let store = open_store(&dir);
        let profile = store.get("luna").unwrap();
        assert_eq!(profile.xp, 120);
        assert_eq!(profile.level, 2);
    }
}
