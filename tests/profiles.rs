mod common;

use common::{ALICE, BOB, seed_value, session};
use serde_json::json;

use loudwhispers::{AppError, Client, DEFAULT_LOBBY, LocalStore, Session};

#[tokio::test]
async fn saved_profiles_come_back_trimmed() {
    let store = LocalStore::new();
    let mut alice: Client<LocalStore> = Client::new(store.clone(), DEFAULT_LOBBY);
    alice.set_session(Session::new(ALICE));

    let saved = alice.save_profile("  Alice  ", "   ").await.unwrap();
    assert_eq!(saved.name, "Alice");
    assert_eq!(saved.pronouns, None);

    let bob: Client<LocalStore> = Client::new(store.clone(), DEFAULT_LOBBY);
    let seen = bob.fetch_profile(ALICE).await.unwrap().unwrap();
    assert_eq!(seen.name, "Alice");
    assert_eq!(seen.pronouns, None);
}

#[tokio::test]
async fn the_newest_profile_wins() {
    let store = LocalStore::new();
    seed_value(
        &store,
        ALICE,
        ALICE,
        json!({ "type": "Profile", "name": "Old Alice", "published": 1_000 }),
    )
    .await;
    seed_value(
        &store,
        ALICE,
        ALICE,
        json!({
            "type": "Profile",
            "name": "New Alice",
            "pronouns": "they/them",
            "published": 9_000,
        }),
    )
    .await;

    let reader: Client<LocalStore> = Client::new(store, DEFAULT_LOBBY);
    let seen = reader.fetch_profile(ALICE).await.unwrap().unwrap();
    assert_eq!(seen.name, "New Alice");
    assert_eq!(seen.pronouns.as_deref(), Some("they/them"));
}

#[tokio::test]
async fn exact_profile_ties_keep_the_later_put() {
    let store = LocalStore::new();
    seed_value(
        &store,
        ALICE,
        ALICE,
        json!({ "type": "Profile", "name": "First", "published": 5_000 }),
    )
    .await;
    seed_value(
        &store,
        ALICE,
        ALICE,
        json!({ "type": "Profile", "name": "Second", "published": 5_000 }),
    )
    .await;

    let reader: Client<LocalStore> = Client::new(store, DEFAULT_LOBBY);
    let seen = reader.fetch_profile(ALICE).await.unwrap().unwrap();
    assert_eq!(seen.name, "Second");
}

#[tokio::test]
async fn unknown_actors_have_no_profile() {
    let store = LocalStore::new();
    let reader: Client<LocalStore> = Client::new(store, DEFAULT_LOBBY);
    assert!(reader.fetch_profile(BOB).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_requires_a_name_and_a_session() {
    let store = LocalStore::new();
    let mut nobody: Client<LocalStore> = Client::new(store.clone(), DEFAULT_LOBBY);
    assert!(matches!(
        nobody.save_profile("Alice", "").await,
        Err(AppError::Unauthenticated)
    ));

    nobody.set_session(Session::new(ALICE));
    assert!(matches!(
        nobody.save_profile("   ", "").await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn logout_clears_the_loaded_profile() {
    let store = LocalStore::new();
    let mut alice: Client<LocalStore> = Client::new(store.clone(), DEFAULT_LOBBY);

    // Loading while signed out is quietly nothing.
    assert!(alice.load_profile().await.unwrap().is_none());

    alice.set_session(Session::new(ALICE));
    alice.save_profile("Alice", "she/her").await.unwrap();
    assert!(alice.profile().is_some());

    alice.logout();
    assert!(alice.profile().is_none());
    assert!(alice.session().is_none());

    // The record itself is still in the store.
    alice.set_session(session(ALICE));
    let reloaded = alice.load_profile().await.unwrap().unwrap();
    assert_eq!(reloaded.name, "Alice");
    assert_eq!(reloaded.pronouns.as_deref(), Some("she/her"));
}
