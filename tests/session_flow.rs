//! End-to-end progression flow against the local store (remote disabled).
use tempfile::TempDir;

use ecoquest::engine::session::{Session, SessionEvent};
use ecoquest::engine::store::{insecure_test_params, ProfileStoreBuilder};
use ecoquest::engine::types::STARTING_ECO_COINS;
use ecoquest::remote::{RemoteClient, Source, SyncAdapter};
use ecoquest::EcoQuestError;

fn open_session(dir: &TempDir) -> Session<RemoteClient> {
    let store = ProfileStoreBuilder::new(dir.path().join("profiles.db"))
        .with_argon2_params(insecure_test_params())
        .open()
        .unwrap();
    Session::new(SyncAdapter::local_only(store))
}

#[tokio::test]
async fn full_progression_scenario() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(&dir);

    // Fresh account: 50 coins, level 1, empty garden.
    let update = session.signup("luna", "wildflowers", "🌱").await.unwrap();
    assert_eq!(update.profile.eco_coins, STARTING_ECO_COINS);
    assert_eq!(update.profile.level, 1);
    assert_eq!(update.source, Some(Source::Local));

    // Buy a sunflower (20 coins).
    let update = session.buy_garden_item("p1").await.unwrap();
    assert_eq!(update.profile.eco_coins, 30);
    assert_eq!(update.profile.garden.len(), 1);

    // First lesson: 30 XP, +15 coins, first-steps achievement.
    let update = session.complete_lesson("l3", 5).await.unwrap();
    assert_eq!(update.profile.xp, 30);
    assert_eq!(update.profile.eco_coins, 45);
    assert_eq!(update.profile.level, 1);
    assert!(update
        .events
        .contains(&SessionEvent::AchievementUnlocked { id: "a1".to_string() }));

    // Two more 30-XP lessons: 90 XP total, still level 1, no level event.
    for id in ["l5", "l6"] {
        let update = session.complete_lesson(id, 5).await.unwrap();
        assert_eq!(update.profile.level, 1);
        assert!(!update
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::LeveledUp { .. })));
    }

    // A 20-XP lesson crosses 100: exactly one level-up, 1 -> 2.
    let update = session.complete_lesson("l1", 5).await.unwrap();
    assert_eq!(update.profile.xp, 110);
    assert_eq!(update.profile.level, 2);
    let level_ups: Vec<_> = update
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::LeveledUp { .. }))
        .collect();
    assert_eq!(level_ups.len(), 1);
    assert_eq!(
        level_ups[0],
        &SessionEvent::LeveledUp { from: 1, to: 2 }
    );

    // Carbon tracking: 110 XP -> 11.0 kg.
    assert!((update.profile.carbon_saved - 11.0).abs() < 1e-9);
}

#[tokio::test]
async fn progress_survives_a_process_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = open_session(&dir);
        session.signup("luna", "wildflowers", "🌱").await.unwrap();
        session.complete_lesson("l1", 5).await.unwrap();
        session.buy_garden_item("p5").await.unwrap();
    }

    // New process: resume via the active-account pointer, then log in fresh.
    let mut session = open_session(&dir);
    let update = session.refresh().await.unwrap();
    assert_eq!(update.profile.username, "luna");
    assert_eq!(update.profile.xp, 20);
    assert_eq!(update.profile.garden.len(), 1);

    session.logout().unwrap();
    assert!(matches!(
        session.refresh().await,
        Err(EcoQuestError::NotFound(_))
    ));
    let update = session.login("luna", "wildflowers").await.unwrap();
    assert_eq!(update.profile.xp, 20);
}

#[tokio::test]
async fn wrong_password_and_duplicate_signup_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(&dir);
    session.signup("luna", "wildflowers", "🌱").await.unwrap();

    assert!(matches!(
        session.login("luna", "sunflowers").await,
        Err(EcoQuestError::InvalidCredentials)
    ));
    // Unknown accounts fail the same way as bad passwords.
    assert!(matches!(
        session.login("nova", "wildflowers").await,
        Err(EcoQuestError::InvalidCredentials)
    ));
    assert!(matches!(
        session.signup("luna", "other", "🌍").await,
        Err(EcoQuestError::DuplicateUsername(_))
    ));
}
