//! Feeding keyboard and mouse into the interaction loop, and applying its
//! camera and ambience back onto the Bevy camera.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;
use garden_core::MoveKey;

use crate::effects::GardenNotice;
use crate::state::Garden;
use crate::world::rgb_color;

/// Marks the garden's 3D camera.
#[derive(Component)]
pub struct GardenCamera;

/// Radians of turn per pixel of mouse motion.
const LOOK_SENSITIVITY: f32 = 0.003;

const BINDINGS: [(MoveKey, [KeyCode; 2]); 6] = [
    (MoveKey::Forward, [KeyCode::KeyW, KeyCode::ArrowUp]),
    (MoveKey::Backward, [KeyCode::KeyS, KeyCode::ArrowDown]),
    (MoveKey::Left, [KeyCode::KeyA, KeyCode::ArrowLeft]),
    (MoveKey::Right, [KeyCode::KeyD, KeyCode::ArrowRight]),
    (MoveKey::Up, [KeyCode::Space, KeyCode::Space]),
    (MoveKey::Down, [KeyCode::ControlLeft, KeyCode::ControlRight]),
];

/// Convert a cursor position in window pixels to normalized device
/// coordinates (x right, y up, both in `-1..=1`).
pub fn cursor_to_ndc(cursor: Vec2, size: Vec2) -> Option<Vec2> {
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        cursor.x / size.x * 2.0 - 1.0,
        1.0 - cursor.y / size.y * 2.0,
    ))
}

/// Held keys, mouse look, pointer position and clicks.
pub fn handle_garden_input(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
    mut garden: ResMut<Garden>,
    mut notices: EventWriter<GardenNotice>,
) {
    let ctx = contexts.ctx_mut();
    let typing = ctx.wants_keyboard_input();
    let over_ui = ctx.is_pointer_over_area() || ctx.wants_pointer_input();

    let session = &mut garden.session;
    if session.is_disposed() {
        return;
    }
    let interaction = session.interaction_mut();

    // Movement
    if typing {
        interaction.keys.clear();
    } else {
        for (key, codes) in BINDINGS {
            interaction.keys.set(key, codes.iter().any(|c| keys.pressed(*c)));
        }
    }

    // Mouse look while the right button is held
    let delta: Vec2 = motion.read().map(|m| m.delta).sum();
    if mouse.pressed(MouseButton::Right) && !over_ui {
        interaction
            .camera
            .rotate(-delta.x * LOOK_SENSITIVITY, -delta.y * LOOK_SENSITIVITY);
    }

    // Pointer
    let Ok(window) = windows.get_single() else {
        interaction.set_pointer(None);
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    if size.y > 0.0 {
        interaction.camera.aspect = size.x / size.y;
    }
    let ndc = window
        .cursor_position()
        .filter(|_| !over_ui)
        .and_then(|cursor| cursor_to_ndc(cursor, size));
    interaction.set_pointer(ndc);

    // Clicks
    if mouse.just_pressed(MouseButton::Left) && !over_ui {
        let modifier = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
        if let Some(event) = session.pointer_down(modifier) {
            notices.send(GardenNotice(event));
        }
    }
    if mouse.just_released(MouseButton::Left) {
        if let Some(event) = session.pointer_up() {
            notices.send(GardenNotice(event));
        }
    }
}

/// Run one interaction tick and publish what happened.
pub fn tick_garden(
    time: Res<Time>,
    mut garden: ResMut<Garden>,
    mut notices: EventWriter<GardenNotice>,
) {
    let events = garden
        .session
        .tick(time.delta_secs(), time.elapsed_secs_f64());
    notices.send_batch(events.into_iter().map(GardenNotice));
}

/// Copy the rig onto the camera and apply the zone's fog and sky.
pub fn sync_camera(
    garden: Res<Garden>,
    mut clear_color: ResMut<ClearColor>,
    mut cameras: Query<(&mut Transform, &mut DistanceFog), With<GardenCamera>>,
) {
    let interaction = garden.session.interaction();
    let rig = &interaction.camera;
    let ambient = interaction.ambient();

    for (mut transform, mut fog) in &mut cameras {
        transform.translation = rig.position;
        transform.rotation = rig.rotation();
        fog.color = rgb_color(ambient.fog_color);
    }
    clear_color.0 = rgb_color(ambient.clear_color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_to_ndc() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(cursor_to_ndc(Vec2::new(400.0, 300.0), size), Some(Vec2::ZERO));
        assert_eq!(cursor_to_ndc(Vec2::ZERO, size), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(cursor_to_ndc(size, size), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(cursor_to_ndc(Vec2::ZERO, Vec2::ZERO), None);
    }

    #[test]
    fn test_every_move_key_is_bound() {
        for key in [
            MoveKey::Forward,
            MoveKey::Backward,
            MoveKey::Left,
            MoveKey::Right,
            MoveKey::Up,
            MoveKey::Down,
        ] {
            assert!(BINDINGS.iter().any(|(bound, _)| *bound == key));
        }
    }
}
