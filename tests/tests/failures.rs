//! Failure classification.

use tether_tests::prelude::*;

mod not_found {
    use super::*;

    #[tokio::test]
    async fn test_undeclared_relation_on_existing_parent() {
        // GIVEN
        let world = World::new();

        // WHEN
        let err = world.link("tractors", json!({"name": "Deere"})).await.unwrap_err();

        // THEN
        assert!(
            matches!(&err, LinkError::NotFoundParent { relation, .. } if relation == "tractors")
        );
        assert_eq!(err.status(), 404);
        assert!(world.hub.events().is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_record() {
        // GIVEN
        let world = World::new();
        let request = LinkRequest::new(
            RecordRef::new("Farm", 404),
            "animals",
            ChildDescriptor::by_value(fields! { "name" => "Jimmy" }),
        );

        // WHEN
        let err = world.linker.link(request).await.unwrap_err();

        // THEN
        assert!(matches!(err, LinkError::NotFoundParent { key, .. } if key == RecordId(404)));
        assert_eq!(world.memory.count("Animal"), 0);
    }

    #[tokio::test]
    async fn test_unknown_parent_type() {
        let world = World::new();
        let request = LinkRequest::new(
            RecordRef::new("Barn", 1),
            "animals",
            ChildDescriptor::by_key(1),
        );

        let err = world.linker.link(request).await.unwrap_err();

        assert_eq!(err.status(), 404);
    }
}

mod invalid_request {
    use super::*;

    #[tokio::test]
    async fn test_missing_parent_param() {
        let world = World::new();

        let err = world
            .linker
            .link_params("Farm", "animals", json!({"id": 1}), RequestContext::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::RequestInvalid { .. }));
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn test_no_child_supplied() {
        let world = World::new();

        let err = world.link("animals", json!({"sort": "name"})).await.unwrap_err();

        assert!(matches!(err, LinkError::RequestInvalid { .. }));
        assert_eq!(world.memory.count("Animal"), 0);
    }

    #[tokio::test]
    async fn test_direct_request_with_only_control_fields() {
        // GIVEN
        let world = World::new();
        let request = LinkRequest::new(
            world.farm.clone(),
            "tags",
            ChildDescriptor::by_value(fields! { "limit" => 5 }),
        );

        // WHEN
        let first = world.linker.link(request.clone()).await;
        let second = world.linker.link(request).await;

        // THEN
        for result in [first, second] {
            let err = result.unwrap_err();
            assert!(matches!(err, LinkError::RequestInvalid { .. }));
            assert_eq!(err.status(), 400);
        }
        assert_eq!(world.memory.count("Tag"), 0);
        assert!(world.hub.events().is_empty());
    }

    #[tokio::test]
    async fn test_direct_request_with_empty_or_key_only_payload() {
        let world = World::new();
        let empty = LinkRequest::new(
            world.farm.clone(),
            "animals",
            ChildDescriptor::by_value(Fields::new()),
        );
        let key_only = LinkRequest::new(
            world.farm.clone(),
            "tags",
            ChildDescriptor::by_value(fields! { "tag_id" => 1 }),
        );

        for request in [empty, key_only] {
            let err = world.linker.link(request).await.unwrap_err();
            assert!(matches!(err, LinkError::RequestInvalid { .. }));
        }
        assert_eq!(world.memory.count("Animal"), 0);
        assert_eq!(world.memory.count("Tag"), 0);
    }

    #[tokio::test]
    async fn test_empty_relation_on_direct_request() {
        let world = World::new();
        let request = LinkRequest::new(world.farm.clone(), "", ChildDescriptor::by_key(1));

        let err = world.linker.link(request).await.unwrap_err();

        assert_eq!(err.status(), 400);
    }
}

mod child_resolution {
    use super::*;

    #[tokio::test]
    async fn test_store_rejects_child_payload() {
        // GIVEN
        let world = World::new();

        // WHEN
        let err = world.link("animals", json!({"species": "horse"})).await.unwrap_err();

        // THEN
        match err {
            LinkError::ChildResolutionFailed(cause) => {
                assert_eq!(cause.kind, StoreErrorKind::Invalid)
            }
            other => panic!("expected ChildResolutionFailed, got {:?}", other),
        }
        assert!(world.hub.events().is_empty());
    }

    #[tokio::test]
    async fn test_store_unavailable_during_lookup() {
        // GIVEN
        let world = World::with_store(|memory| {
            FaultyStore::new(memory).fail_on(
                Op::FindOrCreate,
                StoreError::unavailable("connection reset"),
            )
        });

        // WHEN
        let err = world.link("animals", json!({"name": "Jimmy"})).await.unwrap_err();

        // THEN
        assert!(matches!(err, LinkError::ChildResolutionFailed(_)));
        assert_eq!(err.status(), 500);
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn test_save_failure_is_fatal_and_silent() {
        // GIVEN
        let world = World::with_store(|memory| {
            FaultyStore::new(memory).fail_on(Op::Save, StoreError::unavailable("disk full"))
        });
        let daisy = world.animal("Daisy");

        // WHEN
        let err = world.link("animals", json!({"id": daisy.raw()})).await.unwrap_err();

        // THEN
        match err {
            LinkError::PersistenceFailed(cause) => {
                assert_eq!(cause, StoreError::unavailable("disk full"))
            }
            other => panic!("expected PersistenceFailed, got {:?}", other),
        }
        assert!(world.hub.events().is_empty());
    }

    #[tokio::test]
    async fn test_parent_lookup_failure_is_store_error() {
        let world = World::with_store(|memory| {
            FaultyStore::new(memory).fail_on(Op::FindOne, StoreError::other("boom"))
        });

        let err = world.link("animals", json!({"name": "Jimmy"})).await.unwrap_err();

        assert!(matches!(err, LinkError::Store(_)));
        assert_eq!(err.status(), 500);
    }
}

mod reload {
    use super::*;

    #[tokio::test]
    async fn test_parent_vanishes_before_reload() {
        // GIVEN
        let world = World::with_store(|memory| FaultyStore::new(memory).vanish_after_save());

        // WHEN
        let err = world.link("animals", json!({"name": "Jimmy"})).await.unwrap_err();

        // THEN
        assert!(matches!(err, LinkError::ReloadFailed { .. }));
        // The link was committed before the reload, so the event went out.
        assert_eq!(world.hub.events().len(), 1);
    }

    #[tokio::test]
    async fn test_populate_failure() {
        let world = World::with_store(|memory| {
            FaultyStore::new(memory).fail_on(Op::Populate, StoreError::unavailable("timeout"))
        });

        let err = world.link("animals", json!({"name": "Jimmy"})).await.unwrap_err();

        assert!(matches!(err, LinkError::ReloadFailed { reason, .. } if reason.contains("timeout")));
    }
}
