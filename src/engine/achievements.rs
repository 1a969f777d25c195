//! Achievement evaluator: a stateless predicate set over the profile snapshot.
//!
//! `evaluate` reports everything currently satisfied; the session controller
//! diffs that against the persisted set to find new unlocks. The persisted set
//! is authoritative and only ever grows, so an achievement stays earned even
//! if the profile would no longer satisfy its predicate.

use std::collections::BTreeSet;

use crate::engine::content::{LESSONS, STORIES};
use crate::engine::types::Profile;

/// One achievement definition: a display identity plus a pure predicate.
#[derive(Clone, Copy)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub predicate: fn(&Profile) -> bool,
}

impl std::fmt::Debug for AchievementDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementDef")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish()
    }
}

pub const BUILTIN_ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "a1",
        title: "First Steps",
        emoji: "👣",
        description: "Complete 1 lesson",
        predicate: |p| !p.completed_lessons.is_empty(),
    },
    AchievementDef {
        id: "a2",
        title: "Story Lover",
        emoji: "📚",
        description: "Read 1 story",
        predicate: |p| !p.completed_stories.is_empty(),
    },
    AchievementDef {
        id: "a3",
        title: "Eco Warrior",
        emoji: "🛡️",
        description: "Reach Level 3",
        predicate: |p| p.level >= 3,
    },
    AchievementDef {
        id: "a4",
        title: "Knowledge",
        emoji: "🧠",
        description: "Complete 3 lessons",
        predicate: |p| p.completed_lessons.len() >= 3,
    },
    AchievementDef {
        id: "a5",
        title: "Green Thumb",
        emoji: "🌿",
        description: "Plant 3 items",
        predicate: |p| p.garden.len() >= 3,
    },
    AchievementDef {
        id: "a6",
        title: "Protector",
        emoji: "🌍",
        description: "Earn 200 XP",
        predicate: |p| p.xp >= 200,
    },
    AchievementDef {
        id: "a7",
        title: "All Stories",
        emoji: "📖",
        description: "Read all stories",
        predicate: |p| p.completed_stories.len() >= STORIES.len(),
    },
    AchievementDef {
        id: "a8",
        title: "Master",
        emoji: "👑",
        description: "Complete all lessons",
        predicate: |p| p.completed_lessons.len() >= LESSONS.len(),
    },
];

pub fn find_achievement(id: &str) -> Option<&'static AchievementDef> {
    BUILTIN_ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// All achievement ids whose predicate currently holds against `profile`.
/// Order-independent and side-effect free; callers diff against the persisted
/// set to detect fresh unlocks.
pub fn evaluate(profile: &Profile, defs: &[AchievementDef]) -> BTreeSet<String> {
    defs.iter()
        .filter(|def| (def.predicate)(profile))
        .map(|def| def.id.to_string())
        .collect()
}

/// Satisfied achievements not yet in the profile's persisted set, in
/// definition order (stable notification order for the UI).
pub fn newly_earned(profile: &Profile, defs: &[AchievementDef]) -> Vec<String> {
    defs.iter()
        .filter(|def| !profile.achievements.contains(def.id) && (def.predicate)(profile))
        .map(|def| def.id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rewards::{complete_activity, grant_xp};
    use crate::engine::types::ActivityKind;

    #[test]
    fn fresh_profile_satisfies_nothing() {
        let p = Profile::new("luna", "🌱");
        assert!(evaluate(&p, BUILTIN_ACHIEVEMENTS).is_empty());
    }

    #[test]
    fn eco_warrior_requires_200_xp() {
        let mut p = Profile::new("luna", "🌱");
        grant_xp(&mut p, 199);
        assert!(!evaluate(&p, BUILTIN_ACHIEVEMENTS).contains("a3"));
        grant_xp(&mut p, 1);
        assert_eq!(p.level, 3);
        assert!(evaluate(&p, BUILTIN_ACHIEVEMENTS).contains("a3"));
    }

    #[test]
    fn lesson_milestones_unlock_in_order() {
        let mut p = Profile::new("luna", "🌱");
        complete_activity(&mut p, ActivityKind::Lesson, "l1", 20, true);
        let satisfied = evaluate(&p, BUILTIN_ACHIEVEMENTS);
        assert!(satisfied.contains("a1"));
        assert!(!satisfied.contains("a4"));

        complete_activity(&mut p, ActivityKind::Lesson, "l2", 20, true);
        complete_activity(&mut p, ActivityKind::Lesson, "l3", 30, true);
        assert!(evaluate(&p, BUILTIN_ACHIEVEMENTS).contains("a4"));
    }

    #[test]
    fn newly_earned_skips_already_persisted() {
        let mut p = Profile::new("luna", "🌱");
        complete_activity(&mut p, ActivityKind::Lesson, "l1", 20, true);
        assert_eq!(newly_earned(&p, BUILTIN_ACHIEVEMENTS), vec!["a1"]);

        p.achievements.insert("a1".to_string());
        assert!(newly_earned(&p, BUILTIN_ACHIEVEMENTS).is_empty());
    }

    #[test]
    fn persisted_achievements_survive_a_profile_that_no_longer_qualifies() {
        // The evaluator is advisory; the persisted set is the authority and
        // is only ever unioned, never shrunk.
        let mut p = Profile::new("luna", "🌱");
        grant_xp(&mut p, 250);
        p.achievements
            .extend(newly_earned(&p, BUILTIN_ACHIEVEMENTS));
        assert!(p.achievements.contains("a3"));

        // Hypothetical regression of xp must not remove the unlock.
        p.xp = 0;
        p.level = 1;
        let union: BTreeSet<String> = p
            .achievements
            .union(&evaluate(&p, BUILTIN_ACHIEVEMENTS))
            .cloned()
            .collect();
        assert!(union.contains("a3"));
    }

    #[test]
    fn all_stories_and_master_track_catalog_sizes() {
        let mut p = Profile::new("luna", "🌱");
        for story in crate::engine::content::STORIES {
            complete_activity(&mut p, ActivityKind::Story, story.id, story.xp, true);
        }
        assert!(evaluate(&p, BUILTIN_ACHIEVEMENTS).contains("a7"));
        assert!(!evaluate(&p, BUILTIN_ACHIEVEMENTS).contains("a8"));

        for lesson in crate::engine::content::LESSONS {
            complete_activity(&mut p, ActivityKind::Lesson, lesson.id, lesson.xp, true);
        }
        assert!(evaluate(&p, BUILTIN_ACHIEVEMENTS).contains("a8"));
    }
}
