//! Per-frame camera movement, picking, dragging and zone tracking.
//!
//! [`InteractionState`] is a small state machine over idle and dragging.
//! The host feeds it held keys, the pointer position and button edges; it
//! answers with [`GardenEvent`]s in the order they were detected within the
//! frame. Nothing here suspends, so a tick always runs to completion.

use crate::color::Rgb;
use crate::geometry::Ray;
use crate::memory::{GroundPosition, MemoryId};
use crate::scene::{GroundPlane, TreeBounds};
use crate::store::MemoryStore;
use crate::zone::{Emotion, Zone};
use glam::{EulerRot, Quat, Vec2, Vec3};
use std::collections::HashSet;
use std::f32::consts::{PI, TAU};
use tracing::{debug, info, warn};

/// Camera speed in world units per second.
pub const MOVE_SPEED: f32 = 6.0;

/// The camera never drops below this height.
pub const MIN_ALTITUDE: f32 = 3.0;

/// Pitch is clamped to this many radians either side of level.
pub const MAX_PITCH: f32 = 85.0 * PI / 180.0;

/// Weight of the zone color when tinting the sky.
pub const AMBIENT_BLEND: f32 = 0.3;

/// A movement binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveKey {
    /// Unit step in camera-local space.
    fn local_direction(self) -> Vec3 {
        match self {
            MoveKey::Forward => Vec3::NEG_Z,
            MoveKey::Backward => Vec3::Z,
            MoveKey::Left => Vec3::NEG_X,
            MoveKey::Right => Vec3::X,
            MoveKey::Up => Vec3::Y,
            MoveKey::Down => Vec3::NEG_Y,
        }
    }
}

/// Movement keys currently held down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys(HashSet<MoveKey>);

impl HeldKeys {
    pub fn press(&mut self, key: MoveKey) {
        self.0.insert(key);
    }

    pub fn release(&mut self, key: MoveKey) {
        self.0.remove(&key);
    }

    pub fn set(&mut self, key: MoveKey, held: bool) {
        if held {
            self.press(key);
        } else {
            self.release(key);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Sum of the held directions in camera-local space. Opposite keys cancel.
    pub fn local_direction(&self) -> Vec3 {
        self.0.iter().map(|k| k.local_direction()).sum()
    }
}

/// First-person camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    /// Rotation about +Y in radians.
    pub yaw: f32,
    /// Rotation about local +X in radians.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width over height.
    pub aspect: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            yaw: 0.0,
            pitch: -0.2,
            fov_y: 75f32.to_radians(),
            aspect: 16.0 / 9.0,
        }
    }
}

impl CameraRig {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Turn the camera, keeping pitch short of straight up or down.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Ray through a point given in normalized device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        Ray::from_camera(self.position, self.rotation(), self.fov_y, self.aspect, ndc)
    }

    /// Move by the held keys for `dt` seconds.
    pub fn advance(&mut self, keys: &HeldKeys, dt: f32) {
        let local = keys.local_direction();
        if local != Vec3::ZERO {
            self.position += self.rotation() * local * MOVE_SPEED * dt;
        }
        self.position.y = self.position.y.max(MIN_ALTITUDE);
    }
}

/// What the pointer is doing to the trees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    Dragging {
        memory_id: MemoryId,
        /// Where the tree is shown while dragging.
        preview: GroundPosition,
        /// Whether the pointer has hit the ground plane since the drag began.
        moved: bool,
    },
}

/// Notifications produced by the interaction loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GardenEvent {
    MemorySelected(MemoryId),
    DragStarted(MemoryId),
    DragCommitted {
        id: MemoryId,
        position: GroundPosition,
    },
    ZoneChanged {
        from: Emotion,
        to: Emotion,
    },
}

/// Fog and sky colors for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientEffect {
    pub fog_color: Rgb,
    pub clear_color: Rgb,
}

impl AmbientEffect {
    pub fn for_zone(emotion: Emotion) -> Self {
        let primary = Zone::of(emotion).palette.primary;
        Self {
            fog_color: primary,
            clear_color: Rgb::SKY.lerp(primary, AMBIENT_BLEND),
        }
    }
}

/// Zone bucket for a ground position: `floor(((atan2(z, x) + π) / 2π) * 8) mod 8`.
pub fn determine_zone(x: f32, z: f32) -> Emotion {
    zone_for_angle(z.atan2(x))
}

/// Bucket an angle in radians. Periodic in `2π`.
pub fn zone_for_angle(angle: f32) -> Emotion {
    let turns = (angle + PI).rem_euclid(TAU) / TAU;
    let index = (turns * Emotion::COUNT as f32).floor() as usize;
    Emotion::from_index(index)
}

/// Camera, pointer and drag state for one viewport.
#[derive(Debug, Clone)]
pub struct InteractionState {
    pub camera: CameraRig,
    pub keys: HeldKeys,
    pointer_ndc: Option<Vec2>,
    drag: DragMode,
    current_zone: Emotion,
    hovered: Option<MemoryId>,
    ground_plane: GroundPlane,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(CameraRig::default(), GroundPlane::default())
    }
}

impl InteractionState {
    pub fn new(camera: CameraRig, ground_plane: GroundPlane) -> Self {
        Self {
            current_zone: determine_zone(camera.position.x, camera.position.z),
            camera,
            keys: HeldKeys::default(),
            pointer_ndc: None,
            drag: DragMode::Idle,
            hovered: None,
            ground_plane,
        }
    }

    /// Pointer position in normalized device coordinates, or `None` when it
    /// has left the viewport.
    pub fn set_pointer(&mut self, ndc: Option<Vec2>) {
        self.pointer_ndc = ndc;
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer_ndc
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag
    }

    /// The tree being dragged and where it is shown.
    pub fn drag_preview(&self) -> Option<(MemoryId, GroundPosition)> {
        match self.drag {
            DragMode::Dragging {
                memory_id, preview, ..
            } => Some((memory_id, preview)),
            DragMode::Idle => None,
        }
    }

    pub fn current_zone(&self) -> Emotion {
        self.current_zone
    }

    /// Tree under the pointer as of the last tick.
    pub fn hovered(&self) -> Option<MemoryId> {
        self.hovered
    }

    pub fn ambient(&self) -> AmbientEffect {
        AmbientEffect::for_zone(self.current_zone)
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32, store: &MemoryStore) -> Vec<GardenEvent> {
        let mut events = Vec::new();

        self.camera.advance(&self.keys, dt);

        let ray = self.pointer_ndc.map(|ndc| self.camera.ray(ndc));
        match (&mut self.drag, ray) {
            (DragMode::Dragging { preview, moved, .. }, Some(ray)) => {
                if let Some(hit) = self.ground_plane.intersect(&ray) {
                    *preview = GroundPosition::from_vec3(hit);
                    *moved = true;
                }
                self.hovered = None;
            }
            (DragMode::Idle, Some(ray)) => {
                self.hovered = pick_tree(&ray, store);
            }
            (_, None) => self.hovered = None,
        }

        let zone = determine_zone(self.camera.position.x, self.camera.position.z);
        if zone != self.current_zone {
            info!(from = %self.current_zone, to = %zone, "entered zone");
            events.push(GardenEvent::ZoneChanged {
                from: self.current_zone,
                to: zone,
            });
            self.current_zone = zone;
        }

        events
    }

    /// Primary button pressed. With `modifier` held a tree under the pointer
    /// starts dragging; without it the tree is selected.
    pub fn pointer_down(&mut self, modifier: bool, store: &MemoryStore) -> Option<GardenEvent> {
        let ray = self.camera.ray(self.pointer_ndc?);
        let id = pick_tree(&ray, store)?;

        if modifier {
            let preview = store.position_of(id)?;
            debug!(id = %id, "drag started");
            self.drag = DragMode::Dragging {
                memory_id: id,
                preview,
                moved: false,
            };
            Some(GardenEvent::DragStarted(id))
        } else {
            Some(GardenEvent::MemorySelected(id))
        }
    }

    /// Primary button released. Commits a drag that moved.
    pub fn pointer_up(&mut self, store: &mut MemoryStore) -> Option<GardenEvent> {
        let DragMode::Dragging {
            memory_id,
            preview,
            moved,
        } = std::mem::take(&mut self.drag)
        else {
            return None;
        };

        if !moved {
            return None;
        }
        match store.set_position(memory_id, preview) {
            Ok(()) => {
                debug!(id = %memory_id, x = preview.x, z = preview.z, "drag committed");
                Some(GardenEvent::DragCommitted {
                    id: memory_id,
                    position: preview,
                })
            }
            Err(e) => {
                warn!("Dropping drag: {}", e);
                None
            }
        }
    }

    /// Abandon any drag without committing it.
    pub fn cancel_drag(&mut self) {
        self.drag = DragMode::Idle;
    }
}

/// Nearest tree hit by `ray`.
pub fn pick_tree(ray: &Ray, store: &MemoryStore) -> Option<MemoryId> {
    store
        .iter()
        .filter_map(|memory| {
            let position = store.position_of(memory.id)?;
            let t = TreeBounds::at(position).intersect(ray)?;
            Some((memory.id, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
