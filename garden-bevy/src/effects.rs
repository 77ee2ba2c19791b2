//! Garden-event-to-UI mapping.
//!
//! The interaction loop reports what happened as [`GardenEvent`]s; this
//! module turns them into overlays and status messages.

use bevy::prelude::*;
use garden_core::{GardenEvent, GardenSession, Zone};
use tracing::debug;

use crate::state::{ActiveOverlay, AppState, Garden};

/// A garden event, published on the Bevy event bus.
#[derive(Event, Debug, Clone, Copy)]
pub struct GardenNotice(pub GardenEvent);

/// Apply one garden event to the UI state.
pub fn process_event(
    app_state: &mut AppState,
    session: &GardenSession,
    event: &GardenEvent,
    time: f64,
) {
    match *event {
        GardenEvent::MemorySelected(id) => {
            if session.memory(id).is_some() {
                app_state.overlay = ActiveOverlay::MemoryDetail(id);
            }
        }

        GardenEvent::DragStarted(id) => {
            if let Some(memory) = session.memory(id) {
                app_state.set_status(format!("Moving \"{}\"...", memory.title), time);
            }
        }

        GardenEvent::DragCommitted { id, .. } => {
            if let Some(memory) = session.memory(id) {
                app_state.set_status(format!("Replanted \"{}\"", memory.title), time);
            }
        }

        GardenEvent::ZoneChanged { to, .. } => {
            app_state.set_status(format!("Entering {}", Zone::of(to).display_name), time);
        }
    }
}

/// Drain garden events into the UI.
pub fn handle_garden_notices(
    mut notices: EventReader<GardenNotice>,
    garden: Res<Garden>,
    mut app_state: ResMut<AppState>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for GardenNotice(event) in notices.read() {
        debug!(?event, "garden event");
        process_event(&mut app_state, &garden.session, event, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::{Emotion, GardenConfig, GroundPosition, MemoryDraft, MemoryId};

    fn session_with_memory() -> (GardenSession, MemoryId) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let mut session = GardenSession::create(GardenConfig::default(), 5);
        let id = session
            .plant(MemoryDraft::new("Picnic", "Cherries"), rt.handle())
            .unwrap();
        (session, id)
    }

    #[test]
    fn test_selection_opens_detail() {
        let (session, id) = session_with_memory();
        let mut state = AppState::default();
        process_event(&mut state, &session, &GardenEvent::MemorySelected(id), 0.0);
        assert_eq!(state.overlay, ActiveOverlay::MemoryDetail(id));
    }

    #[test]
    fn test_unknown_selection_is_ignored() {
        let (session, _) = session_with_memory();
        let mut state = AppState::default();
        let event = GardenEvent::MemorySelected(MemoryId::new(99));
        process_event(&mut state, &session, &event, 0.0);
        assert_eq!(state.overlay, ActiveOverlay::None);
    }

    #[test]
    fn test_drag_and_zone_status() {
        let (session, id) = session_with_memory();
        let mut state = AppState::default();

        process_event(&mut state, &session, &GardenEvent::DragStarted(id), 1.0);
        assert_eq!(state.status_message.as_deref(), Some("Moving \"Picnic\"..."));
        assert_eq!(state.status_set_time, Some(1.0));

        let committed = GardenEvent::DragCommitted {
            id,
            position: GroundPosition::new(1.0, 2.0),
        };
        process_event(&mut state, &session, &committed, 2.0);
        assert_eq!(state.status_message.as_deref(), Some("Replanted \"Picnic\""));
        assert_eq!(state.status_set_time, Some(2.0));

        let zone = GardenEvent::ZoneChanged {
            from: Emotion::Joy,
            to: Emotion::Peace,
        };
        process_event(&mut state, &session, &zone, 3.0);
        let expected = format!("Entering {}", Zone::of(Emotion::Peace).display_name);
        assert_eq!(state.status_message, Some(expected));
    }
}
