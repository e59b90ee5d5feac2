mod common;

use common::{ALICE, BOB, seed_message, seed_overlay, session};
use serde_json::json;

use loudwhispers::object::NewObject;
use loudwhispers::schema::View;
use loudwhispers::store::{PatchOp, ValuePatch};
use loudwhispers::{LocalStore, ObjectStore};

#[tokio::test]
async fn put_stamps_actor_channels_and_a_fresh_url() {
    let store = LocalStore::new();
    let first = store
        .put(
            NewObject::new(json!({ "content": "a", "published": 1 }), vec!["ch1".into()]),
            &session(ALICE),
        )
        .await
        .unwrap();
    let second = seed_message(&store, "ch1", ALICE, "b", 2).await;

    assert_ne!(first.url, second.url);
    assert_eq!(first.actor, ALICE);
    assert_eq!(first.channels, vec!["ch1".to_owned()]);
    assert_eq!(store.object(&first.url).unwrap().value["content"], "a");
}

#[tokio::test]
async fn discover_filters_by_channel_and_predicate() {
    let store = LocalStore::new();
    seed_message(&store, "ch1", ALICE, "in channel one", 1).await;
    seed_message(&store, "ch2", ALICE, "in channel two", 2).await;
    seed_overlay(&store, "ch1", ALICE, "Renamed", 3).await;

    let timeline = View::Timeline.schema();
    let hits = store.discover(&["ch1".to_owned()], &timeline).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|o| o.channels.contains(&"ch1".to_owned())));

    let groups = View::GroupListing.schema();
    let none = store.discover(&["ch1".to_owned()], &groups).await.unwrap();
    assert!(none.is_empty());

    let both = store
        .discover(&["ch1".to_owned(), "ch2".to_owned()], &timeline)
        .await
        .unwrap();
    assert_eq!(both.len(), 3);
}

#[tokio::test]
async fn patch_supports_replace_add_and_remove() {
    let store = LocalStore::new();
    let target = seed_message(&store, "ch1", ALICE, "original", 1).await;
    let owner = session(ALICE);

    store
        .patch(
            &ValuePatch::replace("/content", json!("edited")),
            &target,
            &owner,
        )
        .await
        .unwrap();
    assert_eq!(store.object(&target.url).unwrap().value["content"], "edited");

    store
        .patch(
            &ValuePatch::single(PatchOp::Add {
                path: "/likes".to_owned(),
                value: json!(["alice"]),
            }),
            &target,
            &owner,
        )
        .await
        .unwrap();
    assert_eq!(store.object(&target.url).unwrap().value["likes"], json!(["alice"]));

    store
        .patch(
            &ValuePatch::single(PatchOp::Remove { path: "/likes".to_owned() }),
            &target,
            &owner,
        )
        .await
        .unwrap();
    assert!(store.object(&target.url).unwrap().value.get("likes").is_none());
}

#[tokio::test]
async fn a_failing_op_rolls_the_whole_patch_back() {
    let store = LocalStore::new();
    let target = seed_message(&store, "ch1", ALICE, "untouched", 1).await;

    let patch = ValuePatch {
        value: vec![
            PatchOp::Replace { path: "/content".to_owned(), value: json!("halfway") },
            PatchOp::Remove { path: "/missing".to_owned() },
        ],
    };
    let err = store.patch(&patch, &target, &session(ALICE)).await;
    assert!(err.is_err());
    assert_eq!(
        store.object(&target.url).unwrap().value["content"],
        "untouched"
    );
}

#[tokio::test]
async fn only_the_owner_may_patch_or_delete() {
    let store = LocalStore::new();
    let target = seed_message(&store, "ch1", ALICE, "mine", 1).await;

    let refused = store
        .patch(
            &ValuePatch::replace("/content", json!("taken over")),
            &target,
            &session(BOB),
        )
        .await
        .unwrap_err();
    assert!(refused.to_string().contains("owner"));

    let refused = store.delete(&target, &session(BOB)).await.unwrap_err();
    assert!(refused.to_string().contains("owner"));
    assert_eq!(store.len(), 1);

    store.delete(&target, &session(ALICE)).await.unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn operations_on_absent_objects_report_the_gap() {
    let store = LocalStore::new();
    let target = seed_message(&store, "ch1", ALICE, "here once", 1).await;
    store.delete(&target, &session(ALICE)).await.unwrap();

    let err = store.delete(&target, &session(ALICE)).await.unwrap_err();
    assert!(err.to_string().contains("no object"));

    let err = store
        .patch(
            &ValuePatch::replace("/content", json!("x")),
            &target,
            &session(ALICE),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no object"));
}
