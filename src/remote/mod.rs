//! Remote EcoQuest service client.
//!
//! Thin HTTP layer over the remote API: signup/login issue a bearer token,
//! authenticated calls attach it, and a 401 clears it and surfaces as
//! [`RemoteError::Unauthorized`]. Every other failure (timeout, connection
//! refused, non-2xx) collapses into [`RemoteError::Unavailable`], which the
//! sync adapter treats as "fall back to the local store".

pub mod sync;

use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::config::RemoteConfig;
use crate::engine::types::{ActivityKind, GardenEntry, GardenItem, Profile, ProfilePatch};

pub use sync::{Source, SyncAdapter, Synced};

/// Failure classes of a remote call. `Unauthorized` is terminal for the whole
/// operation; `Unavailable` triggers exactly one local retry.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote service rejected the session")]
    Unauthorized,

    #[error("remote service unavailable: {0}")]
    Unavailable(String),
}

/// Result of a progress-completion call: the updated profile plus the reward
/// flags the presentation layer needs for toasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub profile: Profile,
    pub rewarded: bool,
    pub leveled_up: bool,
}

/// Result of a garden purchase: the remote returns only the fields it
/// changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenPurchase {
    pub eco_coins: u32,
    pub garden: Vec<GardenEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest<'a> {
    username: &'a str,
    password: &'a str,
    avatar: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    profile: Profile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest<'a> {
    item_type: &'a str,
    item_id: &'a str,
    score: u32,
    xp_earned: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GardenBuyRequest<'a> {
    item_id: &'a str,
    name: &'a str,
    emoji: &'a str,
    item_type: &'a str,
    cost: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementRequest<'a> {
    achievement_id: &'a str,
}

/// The remote operation set the sync adapter depends on. Implemented by
/// [`RemoteClient`] for production and by stubs in tests.
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
    async fn signup(
        &mut self,
        username: &str,
        password: &str,
        avatar: &str,
    ) -> Result<Profile, RemoteError>;

    async fn login(&mut self, username: &str, password: &str) -> Result<Profile, RemoteError>;

    async fn fetch_profile(&mut self) -> Result<Profile, RemoteError>;

    async fn update_profile(&mut self, patch: &ProfilePatch) -> Result<Profile, RemoteError>;

    async fn complete_item(
        &mut self,
        kind: ActivityKind,
        item_id: &str,
        score: u32,
        xp_earned: u32,
    ) -> Result<ActivityReport, RemoteError>;

    async fn complete_game(
        &mut self,
        game_id: &str,
        score: u32,
        xp_earned: u32,
    ) -> Result<ActivityReport, RemoteError>;

    async fn buy_garden_item(&mut self, item: &GardenItem) -> Result<GardenPurchase, RemoteError>;

    async fn earn_achievement(&mut self, achievement_id: &str) -> Result<(), RemoteError>;

    /// Whether this client currently holds a session token.
    fn is_authenticated(&self) -> bool;

    /// Current bearer token, for persistence between CLI invocations.
    fn token(&self) -> Option<&str>;

    /// Drop the held token (logout or forced re-authentication).
    fn forget_session(&mut self);
}

/// Reqwest-backed client for the remote EcoQuest API.
pub struct RemoteClient {
    base_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
    token: Option<String>,
    client: reqwest::Client,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.timeout_seconds),
            health_timeout: Duration::from_secs(config.health_timeout_seconds),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Resume a previous session with a persisted bearer token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &mut self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = timeout(self.request_timeout, request.send())
            .await
            .map_err(|_| {
                RemoteError::Unavailable(format!(
                    "timeout after {}s",
                    self.request_timeout.as_secs()
                ))
            })?
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // A rejected token must never be reused or masked by fallback.
            self.token = None;
            warn!("remote rejected session token (401)");
            return Err(RemoteError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(RemoteError::Unavailable(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(response)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let request = self.client.post(&url).json(body);
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("bad response body: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&mut self, path: &str) -> Result<T, RemoteError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let request = self.client.get(&url);
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("bad response body: {}", e)))
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let url = self.url(path);
        debug!("PUT {}", url);
        let request = self.client.put(&url).json(body);
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("bad response body: {}", e)))
    }

    /// Optional liveness probe with its own short timeout. Never errors;
    /// an unreachable service is simply "not healthy".
    pub async fn health(&self) -> bool {
        let url = self.url("/health");
        let request = self.client.get(&url);
        match timeout(self.health_timeout, request.send()).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        }
    }
}

impl RemoteApi for RemoteClient {
    async fn signup(
        &mut self,
        username: &str,
        password: &str,
        avatar: &str,
    ) -> Result<Profile, RemoteError> {
        let body = SignupRequest {
            username,
            password,
            avatar,
        };
        let auth: AuthResponse = self.post_json("/auth/signup", &body).await?;
        self.token = Some(auth.token);
        Ok(auth.profile)
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<Profile, RemoteError> {
        let body = LoginRequest { username, password };
        let auth: AuthResponse = self.post_json("/auth/login", &body).await?;
        self.token = Some(auth.token);
        Ok(auth.profile)
    }

    async fn fetch_profile(&mut self) -> Result<Profile, RemoteError> {
        self.get_json("/user/me").await
    }

    async fn update_profile(&mut self, patch: &ProfilePatch) -> Result<Profile, RemoteError> {
        self.put_json("/user/me", patch).await
    }

    async fn complete_item(
        &mut self,
        kind: ActivityKind,
        item_id: &str,
        score: u32,
        xp_earned: u32,
    ) -> Result<ActivityReport, RemoteError> {
        let body = CompleteRequest {
            item_type: kind.as_str(),
            item_id,
            score,
            xp_earned,
        };
        self.post_json("/progress/complete", &body).await
    }

    async fn complete_game(
        &mut self,
        game_id: &str,
        score: u32,
        xp_earned: u32,
    ) -> Result<ActivityReport, RemoteError> {
        let body = CompleteRequest {
            item_type: "game",
            item_id: game_id,
            score,
            xp_earned,
        };
        self.post_json("/progress/complete", &body).await
    }

    async fn buy_garden_item(&mut self, item: &GardenItem) -> Result<GardenPurchase, RemoteError> {
        let body = GardenBuyRequest {
            item_id: &item.id,
            name: &item.name,
            emoji: &item.emoji,
            item_type: &item.kind,
            cost: item.cost,
        };
        self.post_json("/garden/buy", &body).await
    }

    async fn earn_achievement(&mut self, achievement_id: &str) -> Result<(), RemoteError> {
        let body = AchievementRequest { achievement_id };
        // Only the ack matters; the body is ignored.
        let _ack: serde_json::Value = self.post_json("/achievements/earn", &body).await?;
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn forget_session(&mut self) {
        self.token = None;
    }
}
