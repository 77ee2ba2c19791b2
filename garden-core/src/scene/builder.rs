//! Lays the zones out in a ring around the origin.

use super::{GroupTag, MaterialSpec, MeshGroup, MeshPart, ObjectFactory, Shape};
use crate::geometry::Ray;
use crate::zone::{Emotion, Zone, ZONES};
use glam::{Quat, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Distance from the origin to each zone's center.
pub const ZONE_RING_RADIUS: f32 = 30.0;
pub const GROUND_RADIUS: f32 = 15.0;
pub const GROUND_OPACITY: f32 = 0.7;
/// Decorations sit this far from their zone's center.
pub const OBJECT_RADIUS: std::ops::Range<f32> = 8.0..13.0;

/// Center of a zone's ground disk.
pub fn zone_center(emotion: Emotion) -> Vec3 {
    let angle = emotion.index() as f32 / Emotion::COUNT as f32 * TAU;
    Vec3::new(angle.cos(), 0.0, angle.sin()) * ZONE_RING_RADIUS
}

/// The invisible plane dragged trees slide along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub height: f32,
    pub half_extent: f32,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            height: 0.0,
            half_extent: 100.0,
        }
    }
}

impl GroundPlane {
    /// Where `ray` meets the plane, if within its extent.
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        let point = ray.at(ray.intersect_plane_y(self.height)?);
        (point.x.abs() <= self.half_extent && point.z.abs() <= self.half_extent).then_some(point)
    }
}

/// The static part of the garden: zone grounds and their decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub grounds: Vec<MeshGroup>,
    pub decorations: Vec<MeshGroup>,
    pub ground_plane: GroundPlane,
}

impl Scene {
    /// Grounds first, then decorations.
    pub fn groups(&self) -> impl Iterator<Item = &MeshGroup> {
        self.grounds.iter().chain(self.decorations.iter())
    }

    pub fn len(&self) -> usize {
        self.grounds.len() + self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build every zone's ground and decorations.
///
/// Run once per session; the caller discards any previous scene.
pub fn build_scene(factory: &ObjectFactory, rng: &mut dyn RngCore) -> Scene {
    let mut grounds = Vec::with_capacity(ZONES.len());
    let mut decorations = Vec::new();

    for zone in &ZONES {
        let center = zone_center(zone.emotion);
        grounds.push(ground_disk(zone, center));
        decorations.extend(zone_decorations(factory, zone, center, rng));
    }

    Scene {
        grounds,
        decorations,
        ground_plane: GroundPlane::default(),
    }
}

fn ground_disk(zone: &Zone, center: Vec3) -> MeshGroup {
    MeshGroup::new(GroupTag::Ground {
        emotion: zone.emotion,
    })
    .with_parts(vec![MeshPart::new(
        Shape::Disk {
            radius: GROUND_RADIUS,
        },
        MaterialSpec::solid(zone.palette.primary).with_alpha(GROUND_OPACITY),
    )
    .rotated(Quat::from_rotation_x(-FRAC_PI_2))])
    .at(center)
}

fn zone_decorations(
    factory: &ObjectFactory,
    zone: &Zone,
    center: Vec3,
    rng: &mut dyn RngCore,
) -> Vec<MeshGroup> {
    let count = zone.object_tags.len();
    zone.object_tags
        .iter()
        .enumerate()
        .filter_map(|(i, tag)| {
            let angle = i as f32 / count as f32 * TAU;
            let radius = rng.gen_range(OBJECT_RADIUS);
            let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * radius;
            factory
                .create_object(tag, zone, &mut *rng)
                .map(|group| group.at(center + offset))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene() -> Scene {
        build_scene(&ObjectFactory::standard(), &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn test_one_ground_per_zone_on_the_ring() {
        let scene = scene();
        assert_eq!(scene.grounds.len(), 8);
        for (i, ground) in scene.grounds.iter().enumerate() {
            let emotion = Emotion::from_index(i);
            assert_eq!(ground.tag, GroupTag::Ground { emotion });
            assert!((ground.translation.length() - ZONE_RING_RADIUS).abs() < 1e-4);
            let part = &ground.parts[0];
            assert_eq!(part.material.base_color, Zone::of(emotion).palette.primary);
            assert_eq!(part.material.alpha, GROUND_OPACITY);
        }
        assert!((scene.grounds[0].translation - Vec3::new(30.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_decorations_cover_every_tag_near_their_zone() {
        let scene = scene();
        let expected: usize = ZONES.iter().map(|z| z.object_tags.len()).sum();
        assert_eq!(scene.decorations.len(), expected);

        let mut index = 0;
        for zone in &ZONES {
            let center = zone_center(zone.emotion);
            for tag in zone.object_tags {
                let group = &scene.decorations[index];
                assert_eq!(group.tag, GroupTag::Decoration { tag: tag.to_string() });
                let distance = (group.translation - center).length();
                assert!((8.0 - 1e-3..13.0 + 1e-3).contains(&distance), "{tag} at {distance}");
                index += 1;
            }
        }
    }

    #[test]
    fn test_ground_plane_extent() {
        let plane = GroundPlane::default();
        let down = Ray::new(Vec3::new(5.0, 10.0, 5.0), Vec3::NEG_Y);
        assert_eq!(plane.intersect(&down), Some(Vec3::new(5.0, 0.0, 5.0)));
        let far = Ray::new(Vec3::new(150.0, 10.0, 0.0), Vec3::NEG_Y);
        assert_eq!(plane.intersect(&far), None);
    }
}
