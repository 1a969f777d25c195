use thiserror::Error;

/// Errors that can arise anywhere in the EcoQuest core.
///
/// Validation errors (duplicate username, invalid credentials, insufficient
/// funds) are terminal and surfaced to the caller verbatim. Transport failures
/// are recovered by the sync adapter's local fallback and only reach callers
/// as `RemoteUnavailable` when the local path also cannot serve the request.
#[derive(Debug, Error)]
pub enum EcoQuestError {
    /// Signup attempted with a username that already exists (exact match).
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    /// Login mismatch. Deliberately does not distinguish "unknown user" from
    /// "wrong password" to avoid username enumeration.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The remote service rejected our bearer token. Forces re-authentication
    /// and never triggers local fallback.
    #[error("session rejected by remote service, please log in again")]
    Unauthorized,

    /// Purchase attempted without enough EcoCoins.
    #[error("not enough EcoCoins")]
    InsufficientFunds,

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Remote service unreachable and no local fallback could serve the call.
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Input rejected before reaching the store or the remote service.
    #[error("invalid input: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Password hashing or verification failure (corrupt hash, bad params).
    #[error("password hash failure: {0}")]
    Hash(String),
}
