//! Integration tests for the realtime engine: join protocol, membership,
//! rank-filtered dispatch and teardown, driven through the public
//! `ConnectionManager` surface with a stub session resolver.

use std::sync::Arc;

use serde_json::json;

use openchat_realtime::{ChatFrame, FrameKind, RejectCode, RoomKey};

use crate::helpers::{self, StubResolver};

#[tokio::test]
async fn test_single_member_receives_own_chat_exactly_once() {
    let manager = helpers::engine(StubResolver::with_profile("tok-u1", helpers::profile("u1")));

    let (joined, mut rx) = manager
        .join(Some("tok-u1"), "general", Some("General"))
        .await
        .expect("admitted");
    assert!(joined.first_join);

    manager
        .handle_frame(&joined, r#"{"type":"chat","value":"hi","meta":{}}"#)
        .await;

    let text = rx.try_recv().expect("chat delivered");
    let frame = ChatFrame::parse(&text).expect("valid frame");
    assert_eq!(frame.kind(), FrameKind::Chat);
    assert_eq!(frame.value(), "hi");
    assert!(rx.try_recv().is_err(), "no duplicate delivery");

    manager.finish(&joined).await;
}

#[tokio::test]
async fn test_member_departs_only_with_last_connection() {
    let manager = helpers::engine(StubResolver::with_profile("tok-u1", helpers::profile("u1")));

    // Same account from two devices.
    let (desktop, mut desktop_rx) = manager
        .join(Some("tok-u1"), "general", None)
        .await
        .expect("first device");
    let (phone, mut phone_rx) = manager
        .join(Some("tok-u1"), "general", None)
        .await
        .expect("second device");
    assert!(desktop.first_join);
    assert!(!phone.first_join);
    assert_eq!(desktop.room.member_count().await, 1);

    manager.finish(&desktop).await;
    assert_eq!(phone.room.member_count().await, 1, "member still present");

    manager
        .handle_frame(&phone, r#"{"type":"chat","value":"still here","meta":{}}"#)
        .await;
    let frame = ChatFrame::parse(&phone_rx.try_recv().expect("surviving device reached")).unwrap();
    assert_eq!(frame.value(), "still here");
    assert!(desktop_rx.try_recv().is_err(), "closed device gets nothing");

    manager.finish(&phone).await;
    assert_eq!(phone.room.member_count().await, 0);
    // The room itself stays listed once empty.
    assert_eq!(manager.registry().room_count(), 1);
}

#[tokio::test]
async fn test_duplicate_close_is_counted_never_raised() {
    let manager = helpers::engine(StubResolver::with_profile("tok-u1", helpers::profile("u1")));

    let (joined, _rx) = manager
        .join(Some("tok-u1"), "general", None)
        .await
        .expect("admitted");

    manager.finish(&joined).await;
    manager.finish(&joined).await;

    assert_eq!(joined.room.member_count().await, 0);
    assert_eq!(manager.metrics().snapshot().state_inconsistencies, 1);
}

#[tokio::test]
async fn test_unresolved_session_earns_one_error_frame() {
    let manager = helpers::engine(StubResolver::default());

    let rejection = manager
        .join(Some("tok-ghost"), "general", None)
        .await
        .expect_err("unknown token");
    assert_eq!(rejection.code, RejectCode::Unauthenticated);

    let frame = rejection.to_frame();
    assert_eq!(frame.kind(), FrameKind::Error);
    assert_eq!(frame.meta().get("code"), Some(&json!("UNAUTHENTICATED")));

    // Nothing was registered on the way out.
    assert_eq!(manager.registry().room_count(), 0);
    assert_eq!(manager.metrics().snapshot().joins_rejected, 1);
}

#[tokio::test]
async fn test_room_scoped_rank_gates_filtered_dispatch() {
    let profile =
        helpers::profile_with_grants("mod", vec![helpers::scoped_grant(2, "general")]);
    let manager = helpers::engine(StubResolver::with_profile("tok-mod", profile));

    let (joined, mut rx) = manager
        .join(Some("tok-mod"), "general", None)
        .await
        .expect("admitted");

    // Rank 2 in this room does not reach a rank-3 dispatch.
    let report = joined.room.dispatch(&ChatFrame::admin("lockdown"), Some(3)).await;
    assert_eq!(report.members, 0);
    assert_eq!(report.connections, 0);
    assert!(rx.try_recv().is_err());

    let report = joined.room.dispatch(&ChatFrame::admin("notice"), Some(2)).await;
    assert_eq!(report.members, 1);
    assert_eq!(report.connections, 1);
    let frame = ChatFrame::parse(&rx.try_recv().expect("rank reached")).unwrap();
    assert_eq!(frame.kind(), FrameKind::Admin);
}

#[tokio::test]
async fn test_grant_scoped_elsewhere_does_not_rank_here() {
    let profile =
        helpers::profile_with_grants("elsewhere", vec![helpers::scoped_grant(5, "lounge")]);
    let manager = helpers::engine(StubResolver::with_profile("tok-el", profile));

    let (joined, mut rx) = manager
        .join(Some("tok-el"), "general", None)
        .await
        .expect("admitted");

    let report = joined.room.dispatch(&ChatFrame::admin("sweep"), Some(1)).await;
    assert_eq!(report.members, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_admin_frames_require_privileged_sender() {
    let mut resolver = StubResolver::default();
    resolver.insert(
        "tok-admin",
        helpers::profile_with_grants("admin", vec![helpers::global_grant(4)]),
    );
    resolver.insert("tok-plain", helpers::profile("plain"));
    let manager = helpers::engine(resolver);

    let (admin, mut admin_rx) = manager
        .join(Some("tok-admin"), "general", None)
        .await
        .expect("admin admitted");
    let (plain, mut plain_rx) = manager
        .join(Some("tok-plain"), "general", None)
        .await
        .expect("plain admitted");

    // An unranked sender is refused and nobody else hears it.
    manager
        .handle_frame(&plain, r#"{"type":"admin","value":"takeover","meta":{}}"#)
        .await;
    let refusal = ChatFrame::parse(&plain_rx.try_recv().expect("refusal sent")).unwrap();
    assert_eq!(refusal.kind(), FrameKind::Error);
    assert_eq!(refusal.meta().get("code"), Some(&json!("FORBIDDEN")));
    assert!(admin_rx.try_recv().is_err());

    // A ranked sender fans out to ranked recipients only.
    manager
        .handle_frame(&admin, r#"{"type":"admin","value":"lockdown","meta":{}}"#)
        .await;
    let directive = ChatFrame::parse(&admin_rx.try_recv().expect("directive delivered")).unwrap();
    assert_eq!(directive.kind(), FrameKind::Admin);
    assert_eq!(directive.value(), "lockdown");
    assert!(plain_rx.try_recv().is_err(), "unranked member skipped");
}

#[tokio::test]
async fn test_dispatch_snapshot_excludes_later_joiners() {
    let mut resolver = StubResolver::default();
    resolver.insert("tok-u1", helpers::profile("u1"));
    resolver.insert("tok-u2", helpers::profile("u2"));
    let manager = helpers::engine(resolver);

    let (first, mut first_rx) = manager
        .join(Some("tok-u1"), "general", None)
        .await
        .expect("admitted");

    let report = first.room.dispatch(&ChatFrame::chat("early"), None).await;
    assert_eq!(report.members, 1);
    assert_eq!(ChatFrame::parse(&first_rx.try_recv().unwrap()).unwrap().value(), "early");

    // A member arriving after the fanout sees nothing from it.
    let (_second, mut second_rx) = manager
        .join(Some("tok-u2"), "general", None)
        .await
        .expect("admitted");
    assert!(second_rx.try_recv().is_err());

    let report = first.room.dispatch(&ChatFrame::chat("late"), None).await;
    assert_eq!(report.members, 2);
    assert_eq!(ChatFrame::parse(&first_rx.try_recv().unwrap()).unwrap().value(), "late");
    assert_eq!(ChatFrame::parse(&second_rx.try_recv().unwrap()).unwrap().value(), "late");
}

#[tokio::test]
async fn test_concurrent_joins_settle_to_exact_membership() {
    let mut resolver = StubResolver::default();
    for i in 0..8 {
        resolver.insert(&format!("tok-{i}"), helpers::profile(&format!("user-{i}")));
    }
    let manager = Arc::new(helpers::engine(resolver));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move {
            let token = format!("tok-{i}");
            manager
                .join(Some(&token), "general", None)
                .await
                .expect("admitted")
        }));
    }
    // Keep the receivers alive so every queued frame counts as delivered.
    let mut connections = Vec::new();
    for task in tasks {
        connections.push(task.await.expect("join task"));
    }

    let key = RoomKey::parse("general").unwrap();
    let room = manager.registry().get(&key).expect("room open");
    assert_eq!(room.member_count().await, 8);

    let report = room.dispatch(&ChatFrame::chat("fan"), None).await;
    assert_eq!(report.members, 8);
    assert_eq!(report.connections, 8);
    assert_eq!(report.failures, 0);
}
