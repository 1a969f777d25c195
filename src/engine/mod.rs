//! EcoQuest progression data model and persistence.
//! Covers the reward rules, the sled-backed profile store, the achievement
//! evaluator, and the session controller that republishes profile updates
//! to presentation layers.

pub mod achievements;
pub mod content;
pub mod errors;
pub mod rewards;
pub mod session;
pub mod store;
pub mod types;

pub use achievements::{evaluate, newly_earned, AchievementDef, BUILTIN_ACHIEVEMENTS};
pub use errors::EcoQuestError;
pub use rewards::{complete_activity, complete_game, grant_xp, purchase_garden_item, ActivityOutcome};
pub use session::{Session, SessionEvent, SessionUpdate};
pub use store::{ProfileStore, ProfileStoreBuilder};
pub use types::*;
