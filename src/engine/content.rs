//! Static content catalogs: lesson/story/game metadata, the garden shop, the
//! avatar set, and the rotating eco tips.
//!
//! Only the metadata the core needs lives here (ids, XP values, costs, win
//! thresholds); the actual story pages and quiz questions are presentation
//! data owned by the client apps.

use crate::engine::types::GardenItem;

#[derive(Debug, Clone, Copy)]
pub struct LessonMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub emoji: &'static str,
    pub category: &'static str,
    pub xp: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct StoryMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub emoji: &'static str,
    pub category: &'static str,
    pub xp: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct GameMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub xp: u32,
    /// Minimum score that counts as a win for this game.
    pub win_threshold: u32,
}

/// Garden shop catalog entry. `to_item` produces the owned form used by
/// purchases and the remote wire.
#[derive(Debug, Clone, Copy)]
pub struct ShopEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub kind: &'static str,
    pub cost: u32,
}

impl ShopEntry {
    pub fn to_item(&self) -> GardenItem {
        GardenItem {
            id: self.id.to_string(),
            name: self.name.to_string(),
            emoji: self.emoji.to_string(),
            kind: self.kind.to_string(),
            cost: self.cost,
        }
    }
}

pub const LESSONS: &[LessonMeta] = &[
    LessonMeta { id: "l1", title: "What is Recycling?", emoji: "♻️", category: "waste", xp: 20 },
    LessonMeta { id: "l2", title: "Save Water!", emoji: "💧", category: "water", xp: 20 },
    LessonMeta { id: "l3", title: "Climate Change Basics", emoji: "🌡️", category: "climate", xp: 30 },
    LessonMeta { id: "l4", title: "Composting Magic", emoji: "🪱", category: "waste", xp: 20 },
    LessonMeta { id: "l5", title: "Renewable Energy", emoji: "☀️", category: "energy", xp: 30 },
    LessonMeta { id: "l6", title: "Plastic Planet", emoji: "🥤", category: "ocean", xp: 30 },
];

pub const STORIES: &[StoryMeta] = &[
    StoryMeta { id: "s1", title: "Luna & the Last Bee", emoji: "🐝", category: "biodiversity", xp: 25 },
    StoryMeta { id: "s2", title: "Captain Coral's Ocean Rescue", emoji: "🐙", category: "ocean", xp: 25 },
    StoryMeta { id: "s3", title: "The Tree Who Talked", emoji: "🌳", category: "forests", xp: 35 },
    StoryMeta { id: "s4", title: "Sparky's Electric Adventure", emoji: "⚡", category: "energy", xp: 35 },
];

pub const GAMES: &[GameMeta] = &[
    GameMeta {
        id: "sort",
        title: "Eco Sorter",
        emoji: "🗑️",
        description: "Sort waste into the right bins!",
        xp: 15,
        win_threshold: 7,
    },
    GameMeta {
        id: "water",
        title: "Water Drop Quest",
        emoji: "💧",
        description: "Catch falling water drops!",
        xp: 15,
        win_threshold: 8,
    },
];

pub const GARDEN_SHOP: &[ShopEntry] = &[
    ShopEntry { id: "p1", name: "Sunflower", emoji: "🌻", kind: "flower", cost: 20 },
    ShopEntry { id: "p2", name: "Oak Tree", emoji: "🌳", kind: "tree", cost: 50 },
    ShopEntry { id: "p3", name: "Cactus", emoji: "🌵", kind: "plant", cost: 15 },
    ShopEntry { id: "p4", name: "Rose", emoji: "🌹", kind: "flower", cost: 25 },
    ShopEntry { id: "p5", name: "Mushroom", emoji: "🍄", kind: "fungi", cost: 10 },
    ShopEntry { id: "p6", name: "Palm", emoji: "🌴", kind: "tree", cost: 60 },
    ShopEntry { id: "p7", name: "Tulip", emoji: "🌷", kind: "flower", cost: 20 },
    ShopEntry { id: "p8", name: "Cherry", emoji: "🌸", kind: "tree", cost: 40 },
    ShopEntry { id: "p9", name: "Butterfly", emoji: "🦋", kind: "creature", cost: 35 },
    ShopEntry { id: "p10", name: "Ladybug", emoji: "🐞", kind: "creature", cost: 30 },
    ShopEntry { id: "p11", name: "Frog", emoji: "🐸", kind: "creature", cost: 45 },
    ShopEntry { id: "p12", name: "Bee Hive", emoji: "🐝", kind: "creature", cost: 55 },
];

/// The fixed avatar emoji set offered at signup.
pub const AVATARS: &[&str] = &[
    "🌱", "🌍", "🌊", "🦁", "🐢", "🦋", "🌺", "🐝", "🦊", "🐧", "🦉", "🐬",
];

pub const ECO_TIPS: &[&str] = &[
    "💡 Turn off lights when leaving a room!",
    "🚰 5-min shower saves 40L vs a bath!",
    "🚶 Walking to school saves ~1kg CO2!",
    "🌱 One tree absorbs 22kg CO2/year!",
    "♻️ Recycling 1 can = 3 hours of TV energy!",
    "🐝 1/3 of food depends on bees!",
    "📦 Reusing a bag 5x cuts impact by 80%!",
    "🍎 Local food = less transport pollution!",
];

pub fn find_lesson(id: &str) -> Option<&'static LessonMeta> {
    LESSONS.iter().find(|l| l.id == id)
}

pub fn find_story(id: &str) -> Option<&'static StoryMeta> {
    STORIES.iter().find(|s| s.id == id)
}

pub fn find_game(id: &str) -> Option<&'static GameMeta> {
    GAMES.iter().find(|g| g.id == id)
}

pub fn find_shop_item(id: &str) -> Option<&'static ShopEntry> {
    GARDEN_SHOP.iter().find(|i| i.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        for catalog in [
            LESSONS.iter().map(|l| l.id).collect::<Vec<_>>(),
            STORIES.iter().map(|s| s.id).collect::<Vec<_>>(),
            GAMES.iter().map(|g| g.id).collect::<Vec<_>>(),
            GARDEN_SHOP.iter().map(|i| i.id).collect::<Vec<_>>(),
        ] {
            let mut sorted = catalog.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), catalog.len());
        }
    }

    #[test]
    fn lookups_find_known_content() {
        assert_eq!(find_lesson("l3").unwrap().xp, 30);
        assert_eq!(find_story("s1").unwrap().xp, 25);
        assert_eq!(find_game("sort").unwrap().win_threshold, 7);
        assert_eq!(find_shop_item("p12").unwrap().cost, 55);
        assert!(find_lesson("nope").is_none());
    }
}
