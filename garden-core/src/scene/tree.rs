//! Memory trees.

use super::{GroupTag, MaterialSpec, MeshGroup, MeshPart, Shape};
use crate::color::Rgb;
use crate::geometry::Ray;
use crate::memory::{GroundPosition, Memory};
use crate::zone::Zone;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

pub const TRUNK_TOP_RADIUS: f32 = 0.3;
pub const TRUNK_BOTTOM_RADIUS: f32 = 0.5;
pub const TRUNK_HEIGHT: f32 = 3.0;
pub const FOLIAGE_RADIUS: f32 = 2.0;
pub const FOLIAGE_HEIGHT: f32 = 4.0;

/// Placement ring for trees without a stored position.
pub const FALLBACK_RADIUS: std::ops::Range<f32> = 10.0..20.0;

/// Build the tree for a memory.
///
/// The result depends only on the record: stored position if present,
/// otherwise a placement seeded by the memory id.
pub fn create_tree(memory: &Memory) -> MeshGroup {
    let zone = Zone::of(memory.emotion);
    let position = memory
        .position
        .unwrap_or_else(|| fallback_position(memory));

    MeshGroup::new(GroupTag::Tree {
        memory_id: memory.id,
        emotion: memory.emotion,
    })
    .with_parts(vec![
        MeshPart::new(
            Shape::Frustum {
                top_radius: TRUNK_TOP_RADIUS,
                bottom_radius: TRUNK_BOTTOM_RADIUS,
                height: TRUNK_HEIGHT,
            },
            MaterialSpec::solid(Rgb::BARK),
        )
        .raised(TRUNK_HEIGHT / 2.0),
        MeshPart::new(
            Shape::Sphere {
                radius: FOLIAGE_RADIUS,
            },
            MaterialSpec::solid(zone.palette.secondary),
        )
        .raised(FOLIAGE_HEIGHT),
    ])
    .at(position.to_vec3(0.0))
}

/// Deterministic stand-in position for a memory that has none.
pub fn fallback_position(memory: &Memory) -> GroundPosition {
    fallback_position_with(&mut StdRng::seed_from_u64(memory.id.get()))
}

/// Uniform angle on the full circle, radius in [`FALLBACK_RADIUS`].
pub fn fallback_position_with(rng: &mut impl Rng) -> GroundPosition {
    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen_range(FALLBACK_RADIUS);
    GroundPosition::new(angle.cos() * radius, angle.sin() * radius)
}

/// Pickable volume of a tree standing at a ground position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeBounds {
    pub base: Vec3,
}

impl TreeBounds {
    pub fn at(position: GroundPosition) -> Self {
        Self {
            base: position.to_vec3(0.0),
        }
    }

    /// Distance along `ray` to the trunk or foliage, whichever is nearer.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let trunk = ray.intersect_vertical_cylinder(self.base, TRUNK_BOTTOM_RADIUS, TRUNK_HEIGHT);
        let foliage =
            ray.intersect_sphere(self.base + Vec3::Y * FOLIAGE_HEIGHT, FOLIAGE_RADIUS);
        match (trunk, foliage) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
