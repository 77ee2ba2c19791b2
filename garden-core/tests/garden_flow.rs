//! End-to-end garden flows against a scripted language model.
//!
//! Run with: `cargo test -p garden-core --test garden_flow`

use garden_core::gateway::parse_emotion;
use garden_core::scene::GroupTag;
use garden_core::{
    AiGateway, Emotion, GardenConfig, GardenEvent, GardenSession, GroundPosition, MemoryDraft,
    MemoryId, MockBackend, Zone,
};
use glam::{Vec2, Vec3};
use std::time::Duration;
use tokio::runtime::Handle;

fn session_with(backend: &MockBackend) -> GardenSession {
    let mut session = GardenSession::create(GardenConfig::default(), 2024);
    session.set_gateway(Some(AiGateway::new(backend.clone())));
    session
}

async fn settle(session: &mut GardenSession) -> usize {
    let mut added = 0;
    for _ in 0..200 {
        added += session.poll_pending();
        if session.pending_lookups() == 0 {
            return added;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("lookups never settled");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_planted_memory_grows_one_tree() {
    let backend = MockBackend::new();
    let mut session = session_with(&backend);

    let id = session
        .plant(
            MemoryDraft::new("Test", "A test memory").with_emotion("joy"),
            &Handle::current(),
        )
        .unwrap();

    let trees: Vec<_> = session
        .tree_groups()
        .into_iter()
        .filter(|g| g.tag.memory_id() == Some(id))
        .collect();
    assert_eq!(trees.len(), 1);
    assert_eq!(
        trees[0].tag,
        GroupTag::Tree {
            memory_id: id,
            emotion: Emotion::Joy
        }
    );
    assert_eq!(
        trees[0].parts[1].material.base_color,
        Zone::of(Emotion::Joy).palette.secondary
    );

    // A lone memory has nothing to relate to
    assert_eq!(session.pending_lookups(), 0);
    assert!(backend.requests().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_related_memories_are_connected() {
    let backend = MockBackend::new().respond("1, 2");
    let mut session = session_with(&backend);
    let rt = Handle::current();

    let beach = session.plant(MemoryDraft::new("Beach", "Sand castles"), &rt).unwrap();
    let lake = session.plant(MemoryDraft::new("Lake", "Skipping stones"), &rt).unwrap();
    assert_eq!(session.pending_lookups(), 1);

    let added = settle(&mut session).await;
    assert_eq!(added, 1);

    // The model echoed the subject; only the other memory is linked
    let related: Vec<MemoryId> = session.connections().related(lake).collect();
    assert_eq!(related, vec![beach]);

    let segments = session.connection_segments();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start.y, 2.0);
    let lake_pos = session.memory(lake).unwrap().position.unwrap();
    assert_eq!(segments[0].start, lake_pos.to_vec3(2.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_lookup_leaves_no_connections() {
    let backend = MockBackend::new().fail("rate limited");
    let mut session = session_with(&backend);
    let rt = Handle::current();

    session.plant(MemoryDraft::new("a", "one"), &rt).unwrap();
    session.plant(MemoryDraft::new("b", "two"), &rt).unwrap();
    assert_eq!(settle(&mut session).await, 0);
    assert!(session.connections().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dispose_cancels_lookups() {
    let backend = MockBackend::new().respond("1");
    let mut session = session_with(&backend);
    let rt = Handle::current();

    session.plant(MemoryDraft::new("a", "one"), &rt).unwrap();
    session.plant(MemoryDraft::new("b", "two"), &rt).unwrap();
    session.dispose(0.0);

    assert_eq!(session.pending_lookups(), 0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.poll_pending(), 0);
    assert!(session.connections().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_drag_commits_position() {
    let mut session = GardenSession::create(GardenConfig::default(), 9);
    let id = session
        .plant(
            MemoryDraft::new("Oak", "Old tree").with_location(Vec3::new(0.0, 0.0, -12.0)),
            &Handle::current(),
        )
        .unwrap();

    let interaction = session.interaction_mut();
    interaction.camera.position = Vec3::new(0.0, 4.0, 0.0);
    interaction.camera.yaw = 0.0;
    interaction.camera.pitch = 0.0;
    interaction.set_pointer(Some(Vec2::ZERO));

    assert_eq!(session.pointer_down(true), Some(GardenEvent::DragStarted(id)));

    session.interaction_mut().camera.pitch = -0.4;
    session.interaction_mut().set_pointer(Some(Vec2::new(0.2, -0.1)));
    session.tick(1.0 / 60.0, 0.0);
    let (_, last) = session.interaction().drag_preview().unwrap();

    let event = session.pointer_up();
    assert_eq!(event, Some(GardenEvent::DragCommitted { id, position: last }));
    assert_eq!(session.memory(id).unwrap().position, Some(last));

    // The tree is re-derived at the committed spot
    let tree = &session.tree_groups()[0];
    assert_eq!(tree.translation, last.to_vec3(0.0));
    assert_ne!(last, GroundPosition::new(0.0, -12.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plain_click_selects() {
    let mut session = GardenSession::create(GardenConfig::default(), 9);
    let id = session
        .plant(
            MemoryDraft::new("Oak", "Old tree").with_location(Vec3::new(0.0, 0.0, -12.0)),
            &Handle::current(),
        )
        .unwrap();
    let interaction = session.interaction_mut();
    interaction.camera.position = Vec3::new(0.0, 4.0, 0.0);
    interaction.camera.pitch = 0.0;
    interaction.camera.yaw = 0.0;
    interaction.set_pointer(Some(Vec2::ZERO));

    assert_eq!(session.pointer_down(false), Some(GardenEvent::MemorySelected(id)));
    assert_eq!(session.pointer_up(), None);
}

#[test]
fn test_walking_between_zones_switches_tone() {
    let mut session = GardenSession::create(GardenConfig::default(), 1);
    session.interaction_mut().camera.position = Vec3::new(20.0, 5.0, 0.1);
    let events = session.tick(0.0, 1.0);
    let start = session.current_zone();
    assert!(events.iter().all(|e| matches!(e, GardenEvent::ZoneChanged { .. })));

    session.interaction_mut().camera.position = Vec3::new(-20.0, 5.0, -0.1);
    let events = session.tick(0.0, 2.0);
    assert_eq!(
        events,
        vec![GardenEvent::ZoneChanged {
            from: start,
            to: Emotion::Joy
        }]
    );
    assert_eq!(session.mixer().active_zone(), Some(Emotion::Joy));
}

#[tokio::test]
async fn test_sentiment_is_always_a_zone() {
    let outputs = ["joy", "SADNESS", "", "maybe anger?", "{\"emotion\":\"fear\"}", "nostalgia\n"];
    let backend = MockBackend::new();
    for out in outputs {
        backend.push(garden_core::testing::MockReply::Text(out.to_string()));
    }
    backend.push(garden_core::testing::MockReply::Fail("timeout".to_string()));

    let gateway = AiGateway::new(backend);
    for out in outputs {
        let emotion = gateway.classify_sentiment("some day").await;
        assert!(Emotion::ALL.contains(&emotion));
        assert_eq!(emotion, parse_emotion(out));
    }
    assert_eq!(gateway.classify_sentiment("some day").await, Emotion::Peace);
}
