//! Subscription and event delivery around a fresh link.

use tether_tests::prelude::*;

#[tokio::test]
async fn test_originating_channel_is_subscribed_not_echoed() {
    // GIVEN
    let world = World::new();
    let origin = ChannelId::new("socket-1");
    let daisy = world.animal("Daisy");

    // WHEN
    world
        .link_with(
            "animals",
            json!({"id": daisy.raw()}),
            RequestContext::over_channel("socket-1"),
        )
        .await
        .unwrap();

    // THEN
    assert_eq!(world.hub.subscribers(&world.farm), vec![origin.clone()]);
    assert!(world.hub.inbox(&origin).is_empty());
    assert_eq!(world.hub.events().len(), 1);
}

#[tokio::test]
async fn test_other_watchers_receive_event() {
    // GIVEN
    let world = World::new();
    let watcher = ChannelId::new("dashboard");
    world.hub.subscribe(&watcher, &world.farm).await;

    // WHEN
    let outcome = world
        .link_with(
            "animals",
            json!({"name": "Jimmy"}),
            RequestContext::over_channel("socket-1").with_request_id("req-42"),
        )
        .await
        .unwrap();

    // THEN
    assert_eq!(world.hub.subscribers(&world.farm).len(), 2);
    let inbox = world.hub.inbox(&watcher);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].relation, "animals");
    assert_eq!(inbox[0].added, outcome.child);
    assert_eq!(inbox[0].payload["child"]["id"], json!(outcome.child.key.raw()));
}

#[tokio::test]
async fn test_mirror_echoes_to_origin() {
    let world = World::new();
    let origin = ChannelId::new("socket-1");

    world
        .link_with(
            "animals",
            json!({"name": "Jimmy"}),
            RequestContext::over_channel("socket-1").with_mirror(),
        )
        .await
        .unwrap();

    assert_eq!(world.hub.inbox(&origin).len(), 1);
}

#[tokio::test]
async fn test_created_child_suppresses_reverse_event() {
    // GIVEN
    let world = World::new();

    // WHEN
    world.link("animals", json!({"name": "Jimmy"})).await.unwrap();

    // THEN
    let events = world.hub.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].no_reverse);
}

#[tokio::test]
async fn test_existing_child_room_gets_reverse_event() {
    // GIVEN
    let world = World::new();
    let organic = world.tag("organic");
    let tag_room = RecordRef::new("Tag", organic);
    let watcher = ChannelId::new("tag-watcher");
    world.hub.subscribe(&watcher, &tag_room).await;

    // WHEN
    world.link("tags", json!({"id": organic.raw()})).await.unwrap();

    // THEN
    let inbox = world.hub.inbox(&watcher);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].relation, "farms");
    assert_eq!(inbox[0].added, world.farm);
    assert_eq!(inbox[0].payload["child"]["id"], json!(world.farm.key.raw()));
}

#[tokio::test]
async fn test_duplicate_never_notifies() {
    // GIVEN
    let world = World::new();
    let watcher = ChannelId::new("dashboard");
    world.hub.subscribe(&watcher, &world.farm).await;
    let daisy = world.animal("Daisy");

    // WHEN
    for _ in 0..3 {
        world.link("animals", json!({"id": daisy.raw()})).await.unwrap();
    }

    // THEN
    assert_eq!(world.hub.inbox(&watcher).len(), 1);
}

#[tokio::test]
async fn test_notifications_disabled() {
    let world = World::with_config(LinkConfig::new().with_notify(false));

    let outcome = world
        .link_with(
            "animals",
            json!({"name": "Jimmy"}),
            RequestContext::over_channel("socket-1"),
        )
        .await
        .unwrap();

    assert!(outcome.is_fresh());
    assert!(world.hub.events().is_empty());
    assert!(world.hub.subscribers(&world.farm).is_empty());
}

#[tokio::test]
async fn test_linker_without_notifier() {
    // GIVEN
    let world = World::new();
    let linker = Linker::new(world.registry.clone(), world.memory.clone());

    // WHEN
    let outcome = linker
        .link(LinkRequest::new(
            world.farm.clone(),
            "animals",
            ChildDescriptor::by_value(fields! { "name" => "Jimmy" }),
        ))
        .await
        .unwrap();

    // THEN
    assert!(outcome.is_fresh());
    assert!(world.hub.events().is_empty());
}
