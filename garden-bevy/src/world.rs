//! Rendering the garden scene description.
//!
//! The core produces engine-neutral [`MeshGroup`]s; this module turns them
//! into Bevy entities, keeps the memory trees in step with the store and
//! draws the connection lines.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use garden_core::scene::{MaterialSpec, Shape};
use garden_core::{MeshGroup, MemoryId, Rgb};
use tracing::{debug, warn};

use crate::camera::GardenCamera;
use crate::state::{AppState, Garden};

/// Marks the root entity of a memory tree.
#[derive(Component)]
pub struct TreeEntity {
    pub memory_id: MemoryId,
}

/// Store revision the tree entities were last built from.
#[derive(Resource, Default)]
pub struct TreeSync {
    revision: Option<u64>,
}

/// Connection line color (#00ff88 at 60%).
const CONNECTION_COLOR: Color = Color::srgba(0.0, 1.0, 0.533, 0.6);

pub fn rgb_color(rgb: Rgb) -> Color {
    let [r, g, b] = rgb.to_f32();
    Color::srgb(r, g, b)
}

/// Build a Bevy mesh for a primitive shape.
pub fn mesh_for(shape: Shape) -> Mesh {
    match shape {
        Shape::Sphere { radius } => Mesh::from(Sphere::new(radius)),
        Shape::Frustum {
            top_radius,
            bottom_radius,
            height,
        } => Mesh::from(ConicalFrustum {
            radius_top: top_radius,
            radius_bottom: bottom_radius,
            height,
        }),
        Shape::Cuboid { x, y, z } => Mesh::from(Cuboid::new(x, y, z)),
        Shape::Disk { radius } => Mesh::from(Circle::new(radius)),
        Shape::Dodecahedron { radius } => match Sphere::new(radius).mesh().ico(0) {
            Ok(mesh) => mesh,
            Err(e) => {
                warn!("Low-poly crystal mesh failed ({e}), using a sphere");
                Mesh::from(Sphere::new(radius))
            }
        },
        Shape::Octahedron { radius } => octahedron(radius),
    }
}

/// Flat-shaded octahedron with its tips on the Y axis.
fn octahedron(radius: f32) -> Mesh {
    let top = Vec3::Y * radius;
    let bottom = Vec3::NEG_Y * radius;
    let ring = [
        Vec3::X * radius,
        Vec3::Z * radius,
        Vec3::NEG_X * radius,
        Vec3::NEG_Z * radius,
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);

    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        // Counter-clockwise seen from outside
        for face in [[top, b, a], [bottom, a, b]] {
            let normal = (face[1] - face[0]).cross(face[2] - face[0]).normalize();
            for (vertex, uv) in face.into_iter().zip([[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]]) {
                positions.push(vertex.to_array());
                normals.push(normal.to_array());
                uvs.push(uv);
            }
        }
    }

    let indices = (0..positions.len() as u32).collect();
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

pub fn material_for(spec: &MaterialSpec) -> StandardMaterial {
    let [r, g, b] = spec.base_color.to_f32();
    let emissive = match spec.emissive {
        Some(glow) => rgb_color(glow.color).to_linear() * glow.intensity,
        None => LinearRgba::BLACK,
    };

    StandardMaterial {
        base_color: Color::srgba(r, g, b, spec.alpha),
        alpha_mode: if spec.is_transparent() {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        emissive,
        unlit: spec.unlit,
        ..default()
    }
}

/// Spawn a group as a parent entity with one child per part.
pub fn spawn_group(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    group: &MeshGroup,
) -> Entity {
    commands
        .spawn((
            Transform::from_translation(group.translation),
            Visibility::default(),
        ))
        .with_children(|parent| {
            for part in &group.parts {
                parent.spawn((
                    Mesh3d(meshes.add(mesh_for(part.shape))),
                    MeshMaterial3d(materials.add(material_for(&part.material))),
                    Transform::from_translation(part.offset).with_rotation(part.rotation),
                ));
            }
        })
        .id()
}

/// Spawn the camera, lights and the static scene.
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    garden: Res<Garden>,
) {
    let session = &garden.session;
    let rig = &session.interaction().camera;
    let ambient = session.interaction().ambient();

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: rig.fov_y,
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_translation(rig.position).with_rotation(rig.rotation()),
        DistanceFog {
            color: rgb_color(ambient.fog_color),
            falloff: FogFalloff::Linear {
                start: 10.0,
                end: 100.0,
            },
            ..default()
        },
        GardenCamera,
    ));
    commands.insert_resource(ClearColor(rgb_color(ambient.clear_color)));

    commands.insert_resource(AmbientLight {
        color: Color::srgb_u8(0x40, 0x40, 0x40),
        brightness: 600.0,
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    for group in session.scene().groups() {
        spawn_group(&mut commands, &mut meshes, &mut materials, group);
    }
    debug!(groups = session.scene().len(), "scene spawned");
}

/// Rebuild tree entities when the store changes and move the dragged tree.
pub fn sync_trees(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    garden: Res<Garden>,
    mut sync: ResMut<TreeSync>,
    mut trees: Query<(Entity, &TreeEntity, &mut Transform)>,
) {
    let session = &garden.session;
    let revision = session.store().revision();

    if sync.revision != Some(revision) {
        for (entity, _, _) in &trees {
            commands.entity(entity).despawn_recursive();
        }
        for group in session.tree_groups() {
            let Some(memory_id) = group.tag.memory_id() else {
                continue;
            };
            let entity = spawn_group(&mut commands, &mut meshes, &mut materials, &group);
            commands.entity(entity).insert(TreeEntity { memory_id });
        }
        sync.revision = Some(revision);
        return;
    }

    let preview = session.interaction().drag_preview();
    for (_, tree, mut transform) in &mut trees {
        let position = match preview {
            Some((id, position)) if id == tree.memory_id => Some(position),
            _ => session.store().position_of(tree.memory_id),
        };
        if let Some(position) = position {
            transform.translation = position.to_vec3(0.0);
        }
    }
}

/// Draw the thematic connections.
pub fn draw_connections(mut gizmos: Gizmos, garden: Res<Garden>, app_state: Res<AppState>) {
    if !app_state.show_connections {
        return;
    }
    for segment in garden.session.connection_segments() {
        gizmos.line(segment.start, segment.end, CONNECTION_COLOR);
    }
}
