//! Reward engine: the single code path by which XP-derived fields change.
//!
//! Everything here is a pure function over a `Profile`; persistence and event
//! publication happen in the store and session layers. Keeping the arithmetic
//! in one place is what guarantees the level/xp invariant and makes repeat
//! completions safe to replay.

use chrono::{DateTime, Utc};

use crate::engine::errors::EcoQuestError;
use crate::engine::types::{ActivityKind, GardenEntry, GardenItem, Profile, XP_PER_LEVEL};

/// Level as a pure function of xp: `floor(xp / 100) + 1`.
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

/// Outcome of a reward-bearing operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityOutcome {
    /// Whether XP was actually granted (false for retries and losses).
    pub rewarded: bool,
    /// Whether the grant crossed a level boundary.
    pub leveled_up: bool,
}

/// Grant `amount` XP and its derived rewards, returning whether the profile
/// crossed a level boundary.
///
/// Effects: `xp += amount`, `eco_coins += amount / 2`,
/// `carbon_saved += amount * 0.1`, level recomputed. A zero grant is a no-op.
pub fn grant_xp(profile: &mut Profile, amount: u32) -> bool {
    let old_level = profile.level;
    profile.xp += amount;
    profile.eco_coins += amount / 2;
    profile.carbon_saved += f64::from(amount) * 0.1;
    profile.level = level_for_xp(profile.xp);
    profile.level > old_level
}

/// Record completion of a lesson, story, or challenge.
///
/// Failed attempts change nothing (the activity may be retried freely).
/// Passing an activity that is already in the completion set grants nothing
/// either: content can be replayed for practice but never farmed.
pub fn complete_activity(
    profile: &mut Profile,
    kind: ActivityKind,
    activity_id: &str,
    xp_value: u32,
    passed: bool,
) -> ActivityOutcome {
    if !passed {
        return ActivityOutcome::default();
    }
    if !profile.completed_mut(kind).insert(activity_id.to_string()) {
        // Already completed once; replay grants nothing.
        return ActivityOutcome::default();
    }
    let leveled_up = grant_xp(profile, xp_value);
    ActivityOutcome {
        rewarded: true,
        leveled_up,
    }
}

/// Record a finished mini-game session.
///
/// `games_played` increments regardless of outcome; `xp_if_won` is granted
/// only when the caller signals a win (win thresholds are game-specific and
/// decided outside this core).
pub fn complete_game(profile: &mut Profile, xp_if_won: u32, won: bool) -> ActivityOutcome {
    profile.games_played += 1;
    if !won {
        return ActivityOutcome::default();
    }
    let leveled_up = grant_xp(profile, xp_if_won);
    ActivityOutcome {
        rewarded: true,
        leveled_up,
    }
}

/// Spend EcoCoins on a garden item, appending a fresh garden entry.
///
/// Fails without mutation when the profile cannot afford the item. The same
/// item definition may be purchased repeatedly; each purchase is its own
/// entry with its own acquisition timestamp.
pub fn purchase_garden_item(
    profile: &mut Profile,
    item: &GardenItem,
    acquired_at: DateTime<Utc>,
) -> Result<(), EcoQuestError> {
    if profile.eco_coins < item.cost {
        return Err(EcoQuestError::InsufficientFunds);
    }
    profile.eco_coins -= item.cost;
    profile.garden.push(GardenEntry {
        item_id: item.id.clone(),
        name: item.name.clone(),
        emoji: item.emoji.clone(),
        kind: item.kind.clone(),
        acquired_at,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sunflower() -> GardenItem {
        GardenItem {
            id: "p1".to_string(),
            name: "Sunflower".to_string(),
            emoji: "🌻".to_string(),
            kind: "flower".to_string(),
            cost: 20,
        }
    }

    #[test]
    fn level_tracks_xp_over_any_grant_sequence() {
        let mut p = Profile::new("luna", "🌱");
        for amount in [0, 20, 25, 30, 15, 35, 100, 7] {
            grant_xp(&mut p, amount);
            assert_eq!(p.level, p.xp / XP_PER_LEVEL + 1);
        }
    }

    #[test]
    fn zero_grant_is_a_no_op() {
        let mut p = Profile::new("luna", "🌱");
        grant_xp(&mut p, 30);
        let before = p.clone();
        let leveled = grant_xp(&mut p, 0);
        assert!(!leveled);
        assert_eq!(p.xp, before.xp);
        assert_eq!(p.eco_coins, before.eco_coins);
        assert_eq!(p.carbon_saved, before.carbon_saved);
        assert_eq!(p.level, before.level);
    }

    #[test]
    fn grant_derives_coins_and_carbon() {
        let mut p = Profile::new("luna", "🌱");
        grant_xp(&mut p, 25);
        assert_eq!(p.xp, 25);
        // floor(25 / 2) = 12 on top of the 50 starting coins
        assert_eq!(p.eco_coins, 62);
        assert!((p.carbon_saved - 2.5).abs() < 1e-9);
        assert_eq!(p.level, 1);
    }

    #[test]
    fn level_up_flag_fires_exactly_on_the_crossing_grant() {
        let mut p = Profile::new("luna", "🌱");
        assert!(!grant_xp(&mut p, 99));
        assert!(grant_xp(&mut p, 1));
        assert_eq!(p.level, 2);
        assert!(!grant_xp(&mut p, 50));
    }

    #[test]
    fn completing_same_lesson_twice_grants_once() {
        let mut p = Profile::new("luna", "🌱");
        let first = complete_activity(&mut p, ActivityKind::Lesson, "l1", 20, true);
        assert!(first.rewarded);
        assert_eq!(p.xp, 20);

        let replay = complete_activity(&mut p, ActivityKind::Lesson, "l1", 20, true);
        assert!(!replay.rewarded);
        assert_eq!(p.xp, 20, "replay must not re-grant");
        assert_eq!(p.completed_lessons.len(), 1);
    }

    #[test]
    fn failed_attempt_changes_nothing() {
        let mut p = Profile::new("luna", "🌱");
        let out = complete_activity(&mut p, ActivityKind::Story, "s1", 25, false);
        assert!(!out.rewarded);
        assert_eq!(p.xp, 0);
        assert!(p.completed_stories.is_empty());
    }

    #[test]
    fn completion_sets_are_independent_per_kind() {
        let mut p = Profile::new("luna", "🌱");
        complete_activity(&mut p, ActivityKind::Lesson, "x1", 20, true);
        complete_activity(&mut p, ActivityKind::Story, "x1", 25, true);
        complete_activity(&mut p, ActivityKind::Challenge, "x1", 30, true);
        assert_eq!(p.xp, 75);
        assert!(p.completed_lessons.contains("x1"));
        assert!(p.completed_stories.contains("x1"));
        assert!(p.completed_challenges.contains("x1"));
    }

    #[test]
    fn games_count_wins_and_losses_but_reward_only_wins() {
        let mut p = Profile::new("luna", "🌱");
        let lost = complete_game(&mut p, 15, false);
        assert!(!lost.rewarded);
        assert_eq!(p.games_played, 1);
        assert_eq!(p.xp, 0);

        let won = complete_game(&mut p, 15, true);
        assert!(won.rewarded);
        assert_eq!(p.games_played, 2);
        assert_eq!(p.xp, 15);
    }

    #[test]
    fn purchase_rejects_without_mutation_when_broke() {
        let mut p = Profile::new("luna", "🌱");
        let mut pricey = sunflower();
        pricey.cost = 51;
        let err = purchase_garden_item(&mut p, &pricey, Utc::now()).unwrap_err();
        assert!(matches!(err, EcoQuestError::InsufficientFunds));
        assert_eq!(p.eco_coins, 50);
        assert!(p.garden.is_empty());
    }

    #[test]
    fn purchase_at_exact_balance_drains_to_zero() {
        let mut p = Profile::new("luna", "🌱");
        let mut item = sunflower();
        item.cost = 50;
        purchase_garden_item(&mut p, &item, Utc::now()).unwrap();
        assert_eq!(p.eco_coins, 0);
        assert_eq!(p.garden.len(), 1);
    }

    #[test]
    fn repeat_purchases_stack_in_the_garden() {
        let mut p = Profile::new("luna", "🌱");
        let item = sunflower();
        purchase_garden_item(&mut p, &item, Utc::now()).unwrap();
        purchase_garden_item(&mut p, &item, Utc::now()).unwrap();
        assert_eq!(p.eco_coins, 10);
        assert_eq!(p.garden.len(), 2);
        assert_eq!(p.garden[0].item_id, p.garden[1].item_id);
    }
}
