//! Session controller: the single entry point client frontends talk to.
//!
//! Holds the signed-in profile snapshot, routes every operation through the
//! sync adapter, and turns state transitions into [`SessionEvent`]s by
//! diffing the profile before and after. Level-ups and achievement unlocks
//! are detected here, never in the reward arithmetic.

use chrono::{Duration, NaiveDate, Utc};
use log::{debug, info, warn};

use crate::engine::achievements::{self, AchievementDef, BUILTIN_ACHIEVEMENTS};
use crate::engine::content;
use crate::engine::errors::EcoQuestError;
use crate::engine::types::{ActivityKind, Profile, ProfilePatch};
use crate::remote::{RemoteApi, Source, SyncAdapter};
use crate::validation;

/// Next daily-streak value given the last recorded activity day: consecutive
/// UTC days extend the streak, a gap resets it to 1, and a same-day return
/// changes nothing (`None`).
fn next_streak(last: NaiveDate, today: NaiveDate, streak: u32) -> Option<u32> {
    if last == today {
        None
    } else if last + Duration::days(1) == today {
        Some(streak + 1)
    } else {
        Some(1)
    }
}

/// A user-visible state transition produced by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LeveledUp { from: u32, to: u32 },
    AchievementUnlocked { id: String },
}

/// Outcome of a session operation: the fresh profile snapshot, the path that
/// served it (`None` when nothing left the session, e.g. a failed attempt),
/// and any transitions the frontend should announce.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub profile: Profile,
    pub source: Option<Source>,
    pub events: Vec<SessionEvent>,
}

/// One signed-in player working through the sync adapter.
pub struct Session<R: RemoteApi> {
    adapter: SyncAdapter<R>,
    profile: Option<Profile>,
    achievement_defs: &'static [AchievementDef],
}

impl<R: RemoteApi> Session<R> {
    pub fn new(adapter: SyncAdapter<R>) -> Self {
        Self {
            adapter,
            profile: None,
            achievement_defs: BUILTIN_ACHIEVEMENTS,
        }
    }

    /// Swap in a custom achievement set (tests use small deterministic ones).
    pub fn with_achievements(mut self, defs: &'static [AchievementDef]) -> Self {
        self.achievement_defs = defs;
        self
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn adapter(&self) -> &SyncAdapter<R> {
        &self.adapter
    }

    fn current(&self) -> Result<&Profile, EcoQuestError> {
        self.profile
            .as_ref()
            .ok_or_else(|| EcoQuestError::NotFound("active session".to_string()))
    }

    /// Install the snapshot as the session profile, then publish achievement
    /// unlocks through the adapter. The snapshot is installed first so a
    /// completed operation is never lost to a failed unlock publication;
    /// unpublished unlocks simply fire again on the next evaluation because
    /// the predicates are stateless.
    async fn finish(
        &mut self,
        mut profile: Profile,
        source: Source,
        mut events: Vec<SessionEvent>,
    ) -> Result<SessionUpdate, EcoQuestError> {
        self.profile = Some(profile.clone());
        for id in achievements::newly_earned(&profile, self.achievement_defs) {
            match self.adapter.earn_achievement(&id).await {
                Ok(_) => {
                    info!("achievement unlocked: {}", id);
                    profile.achievements.insert(id.clone());
                    events.push(SessionEvent::AchievementUnlocked { id });
                }
                Err(e @ EcoQuestError::Unauthorized) => return Err(e),
                Err(e) => {
                    warn!("could not record achievement {}: {}", id, e);
                    break;
                }
            }
        }
        self.profile = Some(profile.clone());
        Ok(SessionUpdate {
            profile,
            source: Some(source),
            events,
        })
    }

    /// Apply the daily streak cadence for a (re)established session.
    async fn refresh_streak(&mut self, profile: Profile, source: Source) -> Result<SessionUpdate, EcoQuestError> {
        let today = Utc::now().date_naive();
        let new_streak = next_streak(profile.last_active.date_naive(), today, profile.streak);

        let profile = match new_streak {
            None => profile,
            Some(streak) => {
                debug!("streak {} -> {}", profile.streak, streak);
                // The session profile must be set before apply_patch so the
                // local path can resolve the account; install the pre-patch
                // snapshot first.
                self.profile = Some(profile);
                let patch = ProfilePatch {
                    streak: Some(streak),
                    ..ProfilePatch::default()
                };
                self.adapter.apply_patch(&patch).await?.value
            }
        };
        self.finish(profile, source, Vec::new()).await
    }

    /// Create an account and sign in. Starts with 50 EcoCoins, level 1, an
    /// empty garden, and a streak of 1.
    pub async fn signup(
        &mut self,
        username: &str,
        password: &str,
        avatar: &str,
    ) -> Result<SessionUpdate, EcoQuestError> {
        let username = validation::validate_username(username)?;
        validation::validate_password(password)?;
        validation::validate_avatar(avatar)?;

        let synced = self.adapter.signup(&username, password, avatar).await?;
        info!("signed up {} via {}", username, synced.source);
        self.finish(synced.value, synced.source, Vec::new()).await
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<SessionUpdate, EcoQuestError> {
        let synced = self.adapter.login(username, password).await?;
        info!("logged in {} via {}", username, synced.source);
        self.refresh_streak(synced.value, synced.source).await
    }

    /// Re-fetch the profile for an already-established session (e.g. a CLI
    /// process resuming with a persisted token or active-account pointer).
    pub async fn refresh(&mut self) -> Result<SessionUpdate, EcoQuestError> {
        let synced = self.adapter.fetch_profile().await?;
        self.refresh_streak(synced.value, synced.source).await
    }

    /// Record a lesson, story, or challenge attempt. A failed attempt
    /// (`passed == false`) changes nothing and emits no events.
    pub async fn complete_activity(
        &mut self,
        kind: ActivityKind,
        item_id: &str,
        score: u32,
        xp_value: u32,
        passed: bool,
    ) -> Result<SessionUpdate, EcoQuestError> {
        let before = self.current()?.level;
        if !passed {
            return Ok(SessionUpdate {
                profile: self.current()?.clone(),
                source: None,
                events: Vec::new(),
            });
        }

        let synced = self
            .adapter
            .complete_activity(kind, item_id, score, xp_value)
            .await?;
        let (profile, outcome) = synced.value;

        let mut events = Vec::new();
        if outcome.leveled_up {
            events.push(SessionEvent::LeveledUp {
                from: before,
                to: profile.level,
            });
        }
        self.finish(profile, synced.source, events).await
    }

    /// Complete a lesson from the catalog. Finishing the quiz counts as a
    /// pass at any score.
    pub async fn complete_lesson(
        &mut self,
        lesson_id: &str,
        score: u32,
    ) -> Result<SessionUpdate, EcoQuestError> {
        let lesson = content::find_lesson(lesson_id)
            .ok_or_else(|| EcoQuestError::NotFound(format!("lesson {}", lesson_id)))?;
        self.complete_activity(ActivityKind::Lesson, lesson.id, score, lesson.xp, true)
            .await
    }

    /// Mark a story as read.
    pub async fn read_story(&mut self, story_id: &str) -> Result<SessionUpdate, EcoQuestError> {
        let story = content::find_story(story_id)
            .ok_or_else(|| EcoQuestError::NotFound(format!("story {}", story_id)))?;
        self.complete_activity(ActivityKind::Story, story.id, 0, story.xp, true)
            .await
    }

    /// Record a mini-game session. Rewards are granted only when the score
    /// meets the game's win threshold; a loss still counts as a play.
    pub async fn play_game(
        &mut self,
        game_id: &str,
        score: u32,
    ) -> Result<SessionUpdate, EcoQuestError> {
        let game = content::find_game(game_id)
            .ok_or_else(|| EcoQuestError::NotFound(format!("game {}", game_id)))?;
        let before = self.current()?.level;
        let won = score >= game.win_threshold;

        let synced = self
            .adapter
            .complete_game(game.id, score, game.xp, won)
            .await?;
        let (profile, outcome) = synced.value;

        let mut events = Vec::new();
        if outcome.leveled_up {
            events.push(SessionEvent::LeveledUp {
                from: before,
                to: profile.level,
            });
        }
        self.finish(profile, synced.source, events).await
    }

    /// Buy a shop item for the garden. Funds are checked against the session
    /// snapshot before any network round-trip.
    pub async fn buy_garden_item(&mut self, item_id: &str) -> Result<SessionUpdate, EcoQuestError> {
        let entry = content::find_shop_item(item_id)
            .ok_or_else(|| EcoQuestError::NotFound(format!("shop item {}", item_id)))?;
        let item = entry.to_item();
        let mut profile = self.current()?.clone();
        if profile.eco_coins < item.cost {
            return Err(EcoQuestError::InsufficientFunds);
        }

        let synced = self.adapter.buy_garden_item(&item).await?;
        profile.eco_coins = synced.value.eco_coins;
        profile.garden = synced.value.garden;
        self.finish(profile, synced.source, Vec::new()).await
    }

    /// Change the profile avatar; the new one must come from the avatar set.
    pub async fn change_avatar(&mut self, avatar: &str) -> Result<SessionUpdate, EcoQuestError> {
        validation::validate_avatar(avatar)?;
        self.current()?;
        let patch = ProfilePatch {
            avatar: Some(avatar.to_string()),
            ..ProfilePatch::default()
        };
        let synced = self.adapter.apply_patch(&patch).await?;
        self.finish(synced.value, synced.source, Vec::new()).await
    }

    /// Sign out: forget the in-memory snapshot and any persisted session
    /// state. The account itself is kept.
    pub fn logout(&mut self) -> Result<(), EcoQuestError> {
        self.adapter.end_session()?;
        self.profile = None;
        Ok(())
    }
}
