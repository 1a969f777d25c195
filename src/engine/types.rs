use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const PROFILE_SCHEMA_VERSION: u8 = 1;

/// XP required per level. Level is always `xp / XP_PER_LEVEL + 1`.
pub const XP_PER_LEVEL: u32 = 100;

/// EcoCoins a brand-new profile starts with.
pub const STARTING_ECO_COINS: u32 = 50;

/// The three reward-bearing activity families tracked per profile.
/// Mini-game sessions are counted separately via `games_played`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Lesson,
    Story,
    Challenge,
}

impl ActivityKind {
    /// Wire name used by the remote progress endpoint (`item_type`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Lesson => "lesson",
            ActivityKind::Story => "story",
            ActivityKind::Challenge => "challenge",
        }
    }
}

/// One purchasable garden shop item definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GardenItem {
    pub id: String,
    pub name: String,
    pub emoji: String,
    /// Catalog grouping ("flower", "tree", "creature", ...). Display only.
    pub kind: String,
    pub cost: u32,
}

/// One planted item instance. Every purchase produces a distinct entry, so the
/// same item id may appear many times; insertion order is the display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GardenEntry {
    pub item_id: String,
    pub name: String,
    pub emoji: String,
    pub kind: String,
    pub acquired_at: DateTime<Utc>,
}

/// The persistent record of one user's progression and inventory.
///
/// `level` is derived from `xp` and recomputed on every grant; it is never set
/// directly. `eco_coins` and `carbon_saved` only change through the reward
/// engine (grants) or garden purchases (spend). Serialized as camelCase, which
/// is also the wire shape exchanged with the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub level: u32,
    pub xp: u32,
    pub eco_coins: u32,
    pub carbon_saved: f64,
    pub streak: u32,
    pub completed_lessons: BTreeSet<String>,
    pub completed_stories: BTreeSet<String>,
    pub completed_challenges: BTreeSet<String>,
    /// Unlocked achievement ids. A cache of past evaluator results: only ever
    /// unioned with newly satisfied predicates, never shrunk.
    pub achievements: BTreeSet<String>,
    pub garden: Vec<GardenEntry>,
    pub games_played: u32,
    pub join_date: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Profile {
    pub fn new(username: &str, avatar: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            avatar: avatar.to_string(),
            level: 1,
            xp: 0,
            eco_coins: STARTING_ECO_COINS,
            carbon_saved: 0.0,
            streak: 1,
            completed_lessons: BTreeSet::new(),
            completed_stories: BTreeSet::new(),
            completed_challenges: BTreeSet::new(),
            achievements: BTreeSet::new(),
            garden: Vec::new(),
            games_played: 0,
            join_date: now,
            last_active: now,
        }
    }

    pub fn completed(&self, kind: ActivityKind) -> &BTreeSet<String> {
        match kind {
            ActivityKind::Lesson => &self.completed_lessons,
            ActivityKind::Story => &self.completed_stories,
            ActivityKind::Challenge => &self.completed_challenges,
        }
    }

    pub(crate) fn completed_mut(&mut self, kind: ActivityKind) -> &mut BTreeSet<String> {
        match kind {
            ActivityKind::Lesson => &mut self.completed_lessons,
            ActivityKind::Story => &mut self.completed_stories,
            ActivityKind::Challenge => &mut self.completed_challenges,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Stored form of a profile. The password hash lives next to the profile but
/// is stripped before any snapshot leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile: Profile,
    pub password_hash: String,
    pub schema_version: u8,
}

/// Partial profile update with shallow field-overwrite semantics: a collection
/// field present in the patch replaces the stored collection wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub garden: Option<Vec<GardenEntry>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.avatar.is_none()
            && self.streak.is_none()
            && self.achievements.is_none()
            && self.garden.is_none()
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(avatar) = &self.avatar {
            profile.avatar = avatar.clone();
        }
        if let Some(streak) = self.streak {
            profile.streak = streak;
        }
        if let Some(achievements) = &self.achievements {
            profile.achievements = achievements.clone();
        }
        if let Some(garden) = &self.garden {
            profile.garden = garden.clone();
        }
    }
}
